//! Vocabulary and merge tables loaded from the trained tokenizer files.
//!
//! Two files describe a GPT-2 style tokenizer:
//!
//! - `vocab.json`: a flat JSON object mapping byte-level token strings to ids.
//! - `merges.txt`: a header line followed by one `<left> <right>` pair per
//!   line, in priority order. Line 2 has rank 0, line 3 rank 1, and so on. A
//!   blank line ends the list.
//!
//! Both are read once; the resulting [`VocabTable`] is immutable.

use std::{
    collections::{hash_map::Entry, HashMap},
    fs::{self, File},
    io::BufReader,
    path::Path,
};

use log::{debug, warn};

use crate::{
    error::{DecodeError, EncodeError, ParseError},
    merger::PairRanks,
    types::{MergeRank, TokenId},
};

/// Read-only view over the vocabulary and merge ranks.
#[derive(Debug, Clone)]
pub struct VocabTable {
    /// Maps token strings to their ids.
    encoder: HashMap<String, TokenId>,
    /// Exact inverse of `encoder`.
    decoder: HashMap<TokenId, String>,
    /// Two-level rank index: left symbol -> right symbol -> rank.
    ///
    /// Nesting lets lookups borrow both halves as `&str`.
    ranks: HashMap<String, HashMap<String, MergeRank>>,
    /// Number of merge lines read, duplicates included.
    merge_count: usize,
}

impl VocabTable {
    /// Loads the vocabulary and merges files from disk.
    ///
    /// # Arguments
    ///
    /// * `vocab_path` - Path to the JSON vocabulary.
    /// * `merges_path` - Path to the merges text file.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Io`] if either file cannot be read, or any of the
    /// parse errors described on [`VocabTable::from_parts`] and
    /// [`parse_merges`].
    pub fn load(
        vocab_path: impl AsRef<Path>,
        merges_path: impl AsRef<Path>,
    ) -> Result<Self, ParseError> {
        let vocab_path = vocab_path.as_ref();
        let merges_path = merges_path.as_ref();

        let file = File::open(vocab_path).map_err(|source| ParseError::Io {
            path: vocab_path.to_path_buf(),
            source,
        })?;
        let vocab: HashMap<String, TokenId> = serde_json::from_reader(BufReader::new(file))?;

        let merges_text = fs::read_to_string(merges_path).map_err(|source| ParseError::Io {
            path: merges_path.to_path_buf(),
            source,
        })?;

        Self::from_parts(vocab, parse_merges(&merges_text)?)
    }

    /// Builds the table from in-memory file contents.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::VocabJson`] if `vocab_json` is not an object of
    /// non-negative integers, plus the errors of [`VocabTable::from_parts`]
    /// and [`parse_merges`].
    pub fn from_sources(vocab_json: &str, merges_text: &str) -> Result<Self, ParseError> {
        let vocab: HashMap<String, TokenId> = serde_json::from_str(vocab_json)?;
        Self::from_parts(vocab, parse_merges(merges_text)?)
    }

    /// Builds the table from an already parsed vocabulary and merge list.
    ///
    /// `merges` order is the source of truth for merge priority. A pair that
    /// appears twice keeps the rank of its first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::DuplicateId`] if two tokens share an id, since the
    /// id -> token direction would then be ambiguous.
    pub fn from_parts(
        vocab: HashMap<String, TokenId>,
        merges: Vec<(String, String)>,
    ) -> Result<Self, ParseError> {
        let mut decoder: HashMap<TokenId, String> = HashMap::with_capacity(vocab.len());
        for (token, &id) in &vocab {
            match decoder.entry(id) {
                Entry::Vacant(slot) => {
                    slot.insert(token.clone());
                }
                Entry::Occupied(slot) => {
                    // report in a stable order regardless of hash iteration
                    let (first, second) = if slot.get() < token {
                        (slot.get().clone(), token.clone())
                    } else {
                        (token.clone(), slot.get().clone())
                    };
                    return Err(ParseError::DuplicateId { id, first, second });
                }
            }
        }

        let merge_count = merges.len();
        let mut ranks: HashMap<String, HashMap<String, MergeRank>> = HashMap::new();
        for (rank, (left, right)) in merges.into_iter().enumerate() {
            if let Some(kept) = ranks.get(&left).and_then(|by_right| by_right.get(&right)) {
                warn!("duplicate merge ({left:?}, {right:?}) at rank {rank}, keeping rank {kept}");
                continue;
            }
            ranks.entry(left).or_default().insert(right, rank);
        }

        debug!(
            "loaded vocabulary with {} entries and {merge_count} merges",
            vocab.len()
        );

        Ok(Self {
            encoder: vocab,
            decoder,
            ranks,
            merge_count,
        })
    }

    /// Looks up the id of a final symbol.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::UnknownSymbol`] if the symbol is absent, which
    /// means the vocabulary and merges do not belong together.
    pub fn id_of(&self, symbol: &str) -> Result<TokenId, EncodeError> {
        self.encoder
            .get(symbol)
            .copied()
            .ok_or_else(|| EncodeError::UnknownSymbol(symbol.to_string()))
    }

    /// Looks up the stored byte-level string of an id.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownId`] if no token has this id.
    pub fn symbol_of(&self, id: TokenId) -> Result<&str, DecodeError> {
        self.decoder
            .get(&id)
            .map(String::as_str)
            .ok_or(DecodeError::UnknownId(id))
    }

    /// Returns the zero-based priority of a merge pair, if it exists.
    pub fn rank_of(&self, left: &str, right: &str) -> Option<MergeRank> {
        self.ranks.get(left)?.get(right).copied()
    }

    /// Number of vocabulary entries.
    pub fn len(&self) -> usize {
        self.encoder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoder.is_empty()
    }

    /// Number of merge rules read from the merges source.
    pub fn merge_count(&self) -> usize {
        self.merge_count
    }
}

impl PairRanks for VocabTable {
    fn rank_of(&self, left: &str, right: &str) -> Option<MergeRank> {
        VocabTable::rank_of(self, left, right)
    }
}

/// Parses the contents of a merges file into an ordered pair list.
///
/// The first line is a header and is skipped whatever it contains. Parsing
/// stops at the first empty line. `\r\n` line endings are accepted.
///
/// # Errors
///
/// Returns [`ParseError::MalformedMerge`] for a non-empty line that is not
/// exactly two non-empty fields separated by a single space.
pub fn parse_merges(text: &str) -> Result<Vec<(String, String)>, ParseError> {
    let mut merges = Vec::new();

    // enumerate before skipping so `line` numbers match the file
    for (idx, line) in text.lines().enumerate().skip(1) {
        if line.is_empty() {
            break;
        }

        let malformed = || ParseError::MalformedMerge {
            line: idx + 1,
            content: line.to_string(),
        };

        let (left, right) = line.split_once(' ').ok_or_else(malformed)?;
        if left.is_empty() || right.is_empty() || right.contains(' ') {
            return Err(malformed());
        }

        merges.push((left.to_string(), right.to_string()));
    }

    Ok(merges)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const VOCAB: &str = r#"{"a": 0, "b": 1, "ab": 2, "Ġ": 3, "Ġab": 4}"#;
    const MERGES: &str = "#version: 0.2\na b\nĠ ab\n";

    fn table() -> VocabTable {
        VocabTable::from_sources(VOCAB, MERGES).expect("fixture should load")
    }

    #[test]
    fn test_lookups_in_both_directions() {
        let table = table();
        assert_eq!(table.len(), 5);
        assert_eq!(table.id_of("ab").expect("ab is in vocab"), 2);
        assert_eq!(table.symbol_of(4).expect("4 is in vocab"), "Ġab");
    }

    #[test]
    fn test_decoder_is_inverse_of_encoder() {
        let table = table();
        for id in 0..table.len() {
            let symbol = table.symbol_of(id).expect("ids are dense");
            assert_eq!(table.id_of(symbol).expect("symbol is in vocab"), id);
        }
    }

    #[test]
    fn test_unknown_lookups_error() {
        let table = table();
        assert!(matches!(
            table.id_of("zz"),
            Err(EncodeError::UnknownSymbol(s)) if s == "zz"
        ));
        assert!(matches!(table.symbol_of(99), Err(DecodeError::UnknownId(99))));
    }

    #[test]
    fn test_rank_follows_line_order() {
        let table = table();
        assert_eq!(table.merge_count(), 2);
        assert_eq!(table.rank_of("a", "b"), Some(0));
        assert_eq!(table.rank_of("Ġ", "ab"), Some(1));
        assert_eq!(table.rank_of("b", "a"), None);
        assert_eq!(table.rank_of("zz", "a"), None);
    }

    #[test]
    fn test_parse_merges_skips_header_and_stops_at_blank_line() {
        let merges = parse_merges("#version: 0.2\na b\nc d\n\ne f\n").expect("valid merges");
        assert_eq!(
            merges,
            vec![
                ("a".to_string(), "b".to_string()),
                ("c".to_string(), "d".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_merges_header_is_never_parsed() {
        // a header without the usual "#version" marker is still skipped
        let merges = parse_merges("no separator here at all\nx y").expect("valid merges");
        assert_eq!(merges, vec![("x".to_string(), "y".to_string())]);
    }

    #[test]
    fn test_parse_merges_accepts_crlf() {
        let merges = parse_merges("#version: 0.2\r\na b\r\n").expect("valid merges");
        assert_eq!(merges, vec![("a".to_string(), "b".to_string())]);
    }

    #[test]
    fn test_parse_merges_empty_inputs() {
        assert!(parse_merges("").expect("empty file").is_empty());
        assert!(parse_merges("#version: 0.2\n").expect("header only").is_empty());
    }

    #[test]
    fn test_parse_merges_rejects_line_without_space() {
        match parse_merges("#version: 0.2\na b\nabc\n") {
            Err(ParseError::MalformedMerge { line, content }) => {
                assert_eq!(line, 3);
                assert_eq!(content, "abc");
            }
            other => panic!("expected MalformedMerge, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_merges_rejects_extra_fields() {
        assert!(matches!(
            parse_merges("h\na b c\n"),
            Err(ParseError::MalformedMerge { line: 2, .. })
        ));
        assert!(matches!(
            parse_merges("h\n a\n"),
            Err(ParseError::MalformedMerge { line: 2, .. })
        ));
    }

    #[test]
    fn test_duplicate_merge_keeps_first_rank() {
        let table = VocabTable::from_sources(VOCAB, "h\na b\nĠ ab\na b\n").expect("fixture loads");
        assert_eq!(table.merge_count(), 3);
        assert_eq!(table.rank_of("a", "b"), Some(0));
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        match VocabTable::from_sources(r#"{"a": 0, "b": 0}"#, "h\n") {
            Err(ParseError::DuplicateId { id, first, second }) => {
                assert_eq!(id, 0);
                assert_eq!((first.as_str(), second.as_str()), ("a", "b"));
            }
            other => panic!("expected DuplicateId, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_vocab_is_rejected() {
        assert!(matches!(
            VocabTable::from_sources(r#"{"a": -1}"#, "h\n"),
            Err(ParseError::VocabJson(_))
        ));
        assert!(matches!(
            VocabTable::from_sources(r#"["a", "b"]"#, "h\n"),
            Err(ParseError::VocabJson(_))
        ));
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let vocab_path = dir.path().join("vocab.json");
        let merges_path = dir.path().join("merges.txt");
        File::create(&vocab_path)
            .and_then(|mut f| f.write_all(VOCAB.as_bytes()))
            .expect("write vocab");
        File::create(&merges_path)
            .and_then(|mut f| f.write_all(MERGES.as_bytes()))
            .expect("write merges");

        let table = VocabTable::load(&vocab_path, &merges_path).expect("files should load");
        assert_eq!(table.len(), 5);
        assert_eq!(table.merge_count(), 2);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("missing.json");
        match VocabTable::load(&missing, &missing) {
            Err(ParseError::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
