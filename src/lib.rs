//! Byte-level BPE tokenizer reproducing the GPT-2 reference tokenization.
//!
//! Text is split into pretokens, each pretoken's bytes are projected onto a
//! printable alphabet, ranked merges are applied within the pretoken and the
//! resulting symbols are looked up in the vocabulary.
//!
//! ```ignore
//! use gpt2tok::Tokenizer;
//!
//! let tokenizer = Tokenizer::from_files("gpt2/vocab.json", "gpt2/merges.txt")?;
//! let ids = tokenizer.tokenize("GPT2 is a model developed by OpenAI")?;
//! assert_eq!(ids, [38, 11571, 17, 318, 257, 2746, 4166, 416, 4946, 20185]);
//! ```
//!
//! With the `python` feature the crate also builds a PyO3 extension module.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unused_must_use)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod byte_unicode;
pub mod config;
pub mod error;
pub mod merger;
pub mod segmenter;
pub mod tokenizer;
pub mod types;
pub mod vocab;

#[cfg(feature = "python")]
mod python;

pub use byte_unicode::ByteUnicodeMap;
pub use config::TokenizerConfig;
pub use error::{DecodeError, EncodeError, ParseError, TokenizerInitError};
pub use merger::{BpeMerger, PairRanks};
pub use segmenter::Segmenter;
pub use tokenizer::Tokenizer;
pub use types::{ErrorMode, MergeRank, TokenId};
pub use vocab::VocabTable;
