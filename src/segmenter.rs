//! Pretokenization - Splitting text into the spans that BPE merges within.
//!
//! The split pattern is an ordered alternation; at each position the first
//! alternative that matches wins:
//!
//! 1. Contractions: `'s`, `'t`, `'re`, `'ve`, `'m`, `'ll`, `'d`.
//! 2. An optional space followed by ASCII letters.
//! 3. An optional space followed by ASCII digits.
//! 4. An optional space followed by anything that is neither whitespace nor an
//!    ASCII letter or digit.
//! 5. Whitespace not followed by a non-whitespace character.
//! 6. Any other whitespace.
//!
//! Letter and digit classes are ASCII-only, so `é` or `日` fall into the
//! punctuation rule. Whitespace is the ASCII set (space, `\t`, `\n`, `\x0B`,
//! `\x0C`, `\r`). Together the rules cover every character, so the pretokens
//! of a text always concatenate back to it.
//!
//! Rule 5 needs a negative lookahead, hence `fancy_regex`.

use fancy_regex::{Matches, Regex};

use crate::error::{EncodeError, TokenizerInitError};

/// GPT-2 split pattern with ASCII character classes.
const PRETOKEN_PATTERN: &str = concat!(
    "'s|'t|'re|'ve|'m|'ll|'d",
    "| ?[A-Za-z]+",
    "| ?[0-9]+",
    "| ?[^\t\n\x0B\x0C\r A-Za-z0-9]+",
    "|[\t\n\x0B\x0C\r ]+(?![^\t\n\x0B\x0C\r ])",
    "|[\t\n\x0B\x0C\r ]+",
);

/// Splits text into pretokens.
#[derive(Debug, Clone)]
pub struct Segmenter {
    pattern: Regex,
}

impl Segmenter {
    /// Compiles the split pattern.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerInitError::InvalidPattern`] if the pattern fails to
    /// compile.
    pub fn new() -> Result<Self, TokenizerInitError> {
        Ok(Self {
            pattern: Regex::new(PRETOKEN_PATTERN)?,
        })
    }

    /// Lazily yields the pretokens of `text`, in order.
    ///
    /// Calling this again on the same text restarts from the beginning.
    pub fn pretokens<'r, 't>(&'r self, text: &'t str) -> Pretokens<'r, 't> {
        Pretokens {
            matches: self.pattern.find_iter(text),
        }
    }

    /// Collects all pretokens of `text`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::RegexMatch`] if the regex engine fails during
    /// text splitting (e.g. backtracking limit exceeded).
    pub fn split<'t>(&self, text: &'t str) -> Result<Vec<&'t str>, EncodeError> {
        self.pretokens(text).collect()
    }
}

/// Iterator over the pretokens of one text.
///
/// Created by [`Segmenter::pretokens`].
pub struct Pretokens<'r, 't> {
    matches: Matches<'r, 't>,
}

impl<'r, 't> Iterator for Pretokens<'r, 't> {
    type Item = Result<&'t str, EncodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mat = self.matches.next()?;
        Some(
            mat.map(|m| m.as_str())
                .map_err(|e| EncodeError::RegexMatch(e.to_string())),
        )
    }
}
