//! Type aliases and shared types for tokenization and detokenization.
//!
//! These type aliases provide semantic clarity throughout the codebase.

use std::str::FromStr;

/// Represents a token identifier in the vocabulary.
///
/// Ids come straight from the vocabulary file; the GPT-2 reference assigns
/// them densely from 0 to 50256.
pub type TokenId = usize;

/// Priority of a merge rule.
///
/// Zero-based position of the pair in the merges file. Lower values are
/// merged first (e.g., 0 = line 2 of the file, 1 = line 3).
pub type MergeRank = usize;

/// Controls how UTF-8 decoding errors are handled.
///
/// Mirrors Python's `bytes.decode(errors=...)` semantics.
/// Unknown token ids always produce errors regardless of mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Raise an error on invalid UTF-8 like Python's "strict".
    #[default]
    Strict,
    /// Replace invalid UTF-8 sequences with U+FFFD (like Python's "replace").
    Replace,
}

impl FromStr for ErrorMode {
    type Err = String;

    /// Parses a Python-style error mode string ("strict" or "replace").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "replace" => Ok(Self::Replace),
            _ => Err(format!(
                "invalid error mode: {s:?} (expected \"strict\" or \"replace\")"
            )),
        }
    }
}
