//! Error types for loading, tokenizing and detokenizing.

use std::{error::Error, fmt, io, path::PathBuf, string::FromUtf8Error};

use indicatif::style::TemplateError;

use crate::types::TokenId;

/// Errors that can occur while parsing the vocabulary or merges sources.
///
/// Any of these aborts construction; no partially loaded table is returned.
#[derive(Debug)]
pub enum ParseError {
    /// A source file could not be read.
    Io { path: PathBuf, source: io::Error },
    /// The vocabulary is not a JSON object of string to non-negative integer.
    VocabJson(serde_json::Error),
    /// Two vocabulary entries share the same id.
    DuplicateId {
        id: TokenId,
        first: String,
        second: String,
    },
    /// A merges line is not of the form `<left> <right>`.
    ///
    /// `line` is 1-based and counts the header.
    MalformedMerge { line: usize, content: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::VocabJson(e) => write!(f, "invalid vocabulary json: {e}"),
            Self::DuplicateId { id, first, second } => {
                write!(f, "vocabulary id {id} assigned to both {first:?} and {second:?}")
            }
            Self::MalformedMerge { line, content } => {
                write!(f, "invalid merge on line {line}: {content:?}")
            }
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::VocabJson(e) => Some(e),
            Self::DuplicateId { .. } | Self::MalformedMerge { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        Self::VocabJson(e)
    }
}

/// Errors that can occur during text encoding.
#[derive(Debug)]
pub enum EncodeError {
    /// A merged symbol has no vocabulary id.
    ///
    /// Signals that the vocabulary and merges files do not belong together.
    UnknownSymbol(String),
    /// A pretoken exceeds the configured byte cap.
    PretokenTooLong { len: usize, max: usize },
    /// Regex engine failed during text splitting (e.g. backtracking limit exceeded).
    RegexMatch(String),
    /// Progress bar template string was invalid.
    ProgressBarSetup(TemplateError),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSymbol(s) => write!(f, "symbol {s:?} is not in the vocabulary"),
            Self::PretokenTooLong { len, max } => {
                write!(f, "pretoken of {len} bytes exceeds the {max} byte limit")
            }
            Self::RegexMatch(msg) => write!(f, "regex match failed: {msg}"),
            Self::ProgressBarSetup(msg) => write!(f, "template parsing failed: {msg}"),
        }
    }
}

impl Error for EncodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ProgressBarSetup(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors that can occur during token decoding.
#[derive(Debug)]
pub enum DecodeError {
    /// Token id not found in vocabulary.
    UnknownId(TokenId),
    /// A stored symbol contains a code point outside the byte-level alphabet.
    NotByteLevel(char),
    /// Decoded bytes are not valid UTF-8.
    InvalidUtf8(FromUtf8Error),
    /// Progress bar template string was invalid.
    ProgressBarSetup(TemplateError),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownId(t) => write!(f, "unknown token id: {t}"),
            Self::NotByteLevel(c) => {
                write!(f, "character {c:?} (U+{:04X}) has no byte mapping", u32::from(*c))
            }
            Self::InvalidUtf8(e) => write!(f, "invalid UTF-8 in decoded bytes: {e}"),
            Self::ProgressBarSetup(msg) => write!(f, "template parsing failed: {msg}"),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidUtf8(e) => Some(e),
            Self::ProgressBarSetup(e) => Some(e),
            Self::UnknownId(_) | Self::NotByteLevel(_) => None,
        }
    }
}

/// Errors that can occur when initializing a tokenizer.
#[derive(Debug)]
pub enum TokenizerInitError {
    /// The vocabulary or merges source was rejected.
    Parse(ParseError),
    /// The regex pattern failed to compile.
    InvalidPattern(fancy_regex::Error),
}

impl fmt::Display for TokenizerInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "failed to load tokenizer tables: {e}"),
            Self::InvalidPattern(e) => write!(f, "invalid pretokenizer pattern: {e}"),
        }
    }
}

impl Error for TokenizerInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::InvalidPattern(e) => Some(e),
        }
    }
}

impl From<ParseError> for TokenizerInitError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<fancy_regex::Error> for TokenizerInitError {
    fn from(e: fancy_regex::Error) -> Self {
        Self::InvalidPattern(e)
    }
}
