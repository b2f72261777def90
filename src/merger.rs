//! BPE merge loop - Greedy application of ranked merge rules to one pretoken.
//!
//! Each pass scans every adjacent symbol pair, picks the pair with the lowest
//! rank and merges all of its non-overlapping occurrences from left to right.
//! Ranks are re-read from scratch after each pass because a merge creates new
//! neighbours. The loop stops once no adjacent pair has a rank, so the output
//! is always merge-closed.
//!
//! The pass structure is the one GPT-2 was trained with and must not be
//! replaced by a priority-queue walk: with an arbitrary merge list the two
//! orders can disagree, and every id downstream depends on this one.

use log::trace;

use crate::types::MergeRank;

/// Source of merge priorities for adjacent symbol pairs.
pub trait PairRanks {
    /// Returns the rank of `(left, right)`, or `None` if the pair never merges.
    fn rank_of(&self, left: &str, right: &str) -> Option<MergeRank>;
}

/// Applies merge rules to byte-level pretokens.
///
/// Borrows its rank table, so one merger can be created per call at no cost.
///
/// # Time Complexity
///
/// O(k) rank lookups per pass and at most k - 1 passes, where k is the
/// number of bytes in the pretoken.
///
/// # Example
///
/// ```ignore
/// let ranks = vocab_table; // any PairRanks
/// let merger = BpeMerger::new(&ranks);
/// assert_eq!(merger.merge("Ġthe"), vec!["Ġthe"]);
/// ```
pub struct BpeMerger<'r, R: PairRanks + ?Sized> {
    ranks: &'r R,
}

impl<'r, R: PairRanks + ?Sized> BpeMerger<'r, R> {
    /// Creates a merger backed by `ranks`.
    pub fn new(ranks: &'r R) -> Self {
        Self { ranks }
    }

    /// Merges a byte-level pretoken into its final symbols.
    ///
    /// # Arguments
    ///
    /// * `pretoken` - One pretoken already projected through the byte-level
    ///   alphabet; every character is one initial symbol.
    ///
    /// # Returns
    ///
    /// The merge-closed symbol list. Concatenating it yields `pretoken`.
    pub fn merge(&self, pretoken: &str) -> Vec<String> {
        let mut word: Vec<String> = pretoken.chars().map(String::from).collect();
        let mut passes = 0usize;

        while word.len() > 1 {
            let Some(best) = self.best_pair(&word) else {
                break;
            };
            // clone the winning pair: the pass below consumes `word`
            let left = word[best].clone();
            let right = word[best + 1].clone();
            word = merge_pass(word, &left, &right);
            passes += 1;
        }

        trace!(
            "bpe: {} bytes -> {} symbols in {passes} passes",
            pretoken.chars().count(),
            word.len()
        );
        word
    }

    /// Position of the left symbol of the lowest-ranked adjacent pair.
    ///
    /// Ranks are unique per pair, so the first position holding the minimum
    /// identifies the winning pair unambiguously.
    fn best_pair(&self, word: &[String]) -> Option<usize> {
        word.windows(2)
            .enumerate()
            .filter_map(|(i, pair)| self.ranks.rank_of(&pair[0], &pair[1]).map(|rank| (rank, i)))
            .min()
            .map(|(_, i)| i)
    }
}

/// Rebuilds `word` with every non-overlapping `(left, right)` occurrence
/// joined into one symbol, scanning left to right.
///
/// A freshly joined symbol is never re-examined within the same pass.
fn merge_pass(word: Vec<String>, left: &str, right: &str) -> Vec<String> {
    let mut merged = Vec::with_capacity(word.len());
    let mut symbols = word.into_iter().peekable();

    while let Some(mut symbol) = symbols.next() {
        if symbol == left {
            if let Some(next) = symbols.next_if(|next| next == right) {
                symbol.push_str(&next);
            }
        }
        merged.push(symbol);
    }

    merged
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// Rank table built straight from an ordered merge list.
    struct Ranks(HashMap<(String, String), MergeRank>);

    impl Ranks {
        fn new(merges: &[(&str, &str)]) -> Self {
            Self(
                merges
                    .iter()
                    .enumerate()
                    .map(|(rank, (l, r))| ((l.to_string(), r.to_string()), rank))
                    .collect(),
            )
        }
    }

    impl PairRanks for Ranks {
        fn rank_of(&self, left: &str, right: &str) -> Option<MergeRank> {
            self.0.get(&(left.to_string(), right.to_string())).copied()
        }
    }

    fn merge(merges: &[(&str, &str)], pretoken: &str) -> Vec<String> {
        let ranks = Ranks::new(merges);
        BpeMerger::new(&ranks).merge(pretoken)
    }

    #[test]
    fn test_no_merges_splits_into_chars() {
        assert_eq!(merge(&[], "abc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_and_single_symbol() {
        assert!(merge(&[("a", "b")], "").is_empty());
        assert_eq!(merge(&[("a", "b")], "a"), vec!["a"]);
    }

    #[test]
    fn test_lowest_rank_wins() {
        // (b, c) outranks (a, b), so "a" is left alone
        let out = merge(&[("b", "c"), ("a", "b")], "abc");
        assert_eq!(out, vec!["a", "bc"]);
    }

    #[test]
    fn test_merges_chain_across_passes() {
        let merges = [("h", "e"), ("l", "l"), ("he", "ll"), ("hell", "o")];
        assert_eq!(merge(&merges, "hello"), vec!["hello"]);
    }

    #[test]
    fn test_all_occurrences_merge_in_one_pass() {
        // both "ab" occurrences join before (b, a) could ever be considered
        let out = merge(&[("a", "b"), ("b", "a")], "abab");
        assert_eq!(out, vec!["ab", "ab"]);
    }

    #[test]
    fn test_overlapping_occurrences_scan_left_to_right() {
        assert_eq!(merge(&[("a", "a")], "aaa"), vec!["aa", "a"]);
        assert_eq!(merge(&[("a", "a")], "aaaa"), vec!["aa", "aa"]);
    }

    #[test]
    fn test_pass_finishes_before_lower_rank_appears() {
        // "aa" + "a" has a better rank than (a, a) itself, but the first pass
        // still joins every (a, a) occurrence before ranks are re-read
        let out = merge(&[("aa", "a"), ("a", "a")], "aaaa");
        assert_eq!(out, vec!["aa", "aa"]);
    }

    #[test]
    fn test_multibyte_symbols() {
        // "Ġ" is the byte-level stand-in for a space
        let merges = [("Ġ", "t"), ("h", "e"), ("Ġt", "he")];
        assert_eq!(merge(&merges, "Ġthe"), vec!["Ġthe"]);
    }

    #[test]
    fn test_output_is_merge_closed() {
        let merges = [("a", "b"), ("c", "d"), ("ab", "cd"), ("d", "a")];
        let ranks = Ranks::new(&merges);
        let out = BpeMerger::new(&ranks).merge("abcdabdcda");
        assert_eq!(out.concat(), "abcdabdcda");
        for pair in out.windows(2) {
            assert_eq!(ranks.rank_of(&pair[0], &pair[1]), None);
        }
    }
}
