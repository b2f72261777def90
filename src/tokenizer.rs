//! This module provides the complete tokenization pipeline:
//! 1. Regex pattern matching to split text into pretokens.
//! 2. Byte-level projection of each pretoken's UTF-8 bytes.
//! 3. BPE merge application within each pretoken.
//! 4. Vocabulary lookup of the resulting symbols.
//!
//! Detokenization only reverses the last step and returns the stored
//! byte-level strings (`Ġis`, not ` is`). Recovering the original bytes is a
//! separate operation, see [`Tokenizer::decode_bytes`].
//!
//! The tokenizer is immutable once built and can be shared across threads;
//! batch encoding fans out over Rayon.

use std::path::Path;

use indicatif::{style::TemplateError, ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::{
    byte_unicode::ByteUnicodeMap,
    config::TokenizerConfig,
    error::{DecodeError, EncodeError, TokenizerInitError},
    merger::BpeMerger,
    segmenter::Segmenter,
    types::{ErrorMode, TokenId},
    vocab::VocabTable,
};

/// GPT-2 compatible byte-level BPE tokenizer.
///
/// Combines:
/// - A [`Segmenter`] for pretokenization.
/// - The shared [`ByteUnicodeMap`].
/// - A [`VocabTable`] holding ids and merge ranks.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    vocab: VocabTable,
    segmenter: Segmenter,
    bytes: &'static ByteUnicodeMap,
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Creates a tokenizer from loaded tables.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerInitError::InvalidPattern`] if the split pattern
    /// fails to compile.
    pub fn new(vocab: VocabTable, config: TokenizerConfig) -> Result<Self, TokenizerInitError> {
        Ok(Self {
            vocab,
            segmenter: Segmenter::new()?,
            bytes: ByteUnicodeMap::shared(),
            config,
        })
    }

    /// Loads `vocab.json` and `merges.txt` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerInitError::Parse`] if either file is unreadable or
    /// malformed.
    pub fn from_files(
        vocab_path: impl AsRef<Path>,
        merges_path: impl AsRef<Path>,
    ) -> Result<Self, TokenizerInitError> {
        Self::from_files_with_config(vocab_path, merges_path, TokenizerConfig::default())
    }

    /// Loads `vocab.json` and `merges.txt` with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Same as [`Tokenizer::from_files`].
    pub fn from_files_with_config(
        vocab_path: impl AsRef<Path>,
        merges_path: impl AsRef<Path>,
        config: TokenizerConfig,
    ) -> Result<Self, TokenizerInitError> {
        let vocab = VocabTable::load(vocab_path, merges_path)?;
        Self::new(vocab, config)
    }

    /// Encodes text into vocabulary ids.
    ///
    /// # Arguments
    ///
    /// * `text` - Input text to encode.
    ///
    /// # Returns
    ///
    /// Ids of every pretoken's final symbols, in text order. Empty text gives
    /// an empty sequence.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::UnknownSymbol`] if a merged symbol is missing from
    /// the vocabulary, [`EncodeError::PretokenTooLong`] if a pretoken exceeds
    /// the configured cap, or [`EncodeError::RegexMatch`] if splitting fails.
    pub fn tokenize(&self, text: &str) -> Result<Vec<TokenId>, EncodeError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        // pre-allocate: GPT-2 averages roughly four bytes per token
        let mut ids = Vec::with_capacity(text.len() / 4 + 1);
        let merger = BpeMerger::new(&self.vocab);

        for pretoken in self.segmenter.pretokens(text) {
            let pretoken = pretoken?;
            self.check_length(pretoken)?;

            let symbols = self.bytes.encode(pretoken.as_bytes());
            for symbol in merger.merge(&symbols) {
                ids.push(self.vocab.id_of(&symbol)?);
            }
        }

        Ok(ids)
    }

    /// Encodes many texts in parallel using Rayon.
    ///
    /// # Arguments
    ///
    /// * `texts` - Slice of text strings to encode.
    /// * `show_progress` - Whether to display a progress bar during encoding.
    ///
    /// # Returns
    ///
    /// Vector of id sequences in the same order as input texts.
    ///
    /// # Errors
    ///
    /// Returns the first [`EncodeError`] hit by any text, or
    /// [`EncodeError::ProgressBarSetup`] if the progress bar template fails to
    /// compile.
    pub fn tokenize_batch(
        &self,
        texts: &[&str],
        show_progress: bool,
    ) -> Result<Vec<Vec<TokenId>>, EncodeError> {
        let pb = progress_bar(texts.len() as u64, "Tokenizing texts", show_progress)
            .map_err(EncodeError::ProgressBarSetup)?;

        texts
            .par_iter()
            .progress_with(pb)
            .map(|text| self.tokenize(text))
            .collect()
    }

    /// Returns the pretokens of `text` without merging them.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::RegexMatch`] if splitting fails.
    pub fn pretokenize<'t>(&self, text: &'t str) -> Result<Vec<&'t str>, EncodeError> {
        self.segmenter.split(text)
    }

    /// Maps ids to their stored byte-level strings.
    ///
    /// The strings are returned as stored in the vocabulary, e.g. `Ġis` for
    /// ` is`; they are not converted back to raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownId`] for the first id that has no entry.
    pub fn detokenize(&self, ids: &[TokenId]) -> Result<Vec<String>, DecodeError> {
        ids.iter()
            .map(|&id| self.vocab.symbol_of(id).map(str::to_string))
            .collect()
    }

    /// Returns the stored byte-level string of a single id.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownId`] if the id has no entry.
    pub fn detokenize_one(&self, id: TokenId) -> Result<&str, DecodeError> {
        self.vocab.symbol_of(id)
    }

    /// Recovers the raw bytes behind a sequence of ids.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownId`] for an unknown id, or
    /// [`DecodeError::NotByteLevel`] if a stored string contains a character
    /// outside the byte-level alphabet.
    pub fn decode_bytes(&self, ids: &[TokenId]) -> Result<Vec<u8>, DecodeError> {
        let mut bytes = Vec::with_capacity(ids.len() * 4);
        for &id in ids {
            let symbol = self.vocab.symbol_of(id)?;
            bytes.extend(self.bytes.decode(symbol)?);
        }
        Ok(bytes)
    }

    /// Decodes a sequence of ids back into text.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Tokenizer::decode_bytes`], or
    /// [`DecodeError::InvalidUtf8`] if the bytes are not valid UTF-8 (only in
    /// `Strict` mode).
    pub fn decode(&self, ids: &[TokenId], errors: ErrorMode) -> Result<String, DecodeError> {
        let bytes = self.decode_bytes(ids)?;

        match errors {
            ErrorMode::Strict => String::from_utf8(bytes).map_err(DecodeError::InvalidUtf8),
            ErrorMode::Replace => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    /// Decodes multiple id sequences in parallel.
    ///
    /// # Errors
    ///
    /// Returns the first [`DecodeError`] hit by any sequence, or
    /// [`DecodeError::ProgressBarSetup`] if the progress bar template fails to
    /// compile.
    pub fn decode_batch(
        &self,
        id_seqs: &[&[TokenId]],
        errors: ErrorMode,
        show_progress: bool,
    ) -> Result<Vec<String>, DecodeError> {
        let pb = progress_bar(id_seqs.len() as u64, "Decoding tokens", show_progress)
            .map_err(DecodeError::ProgressBarSetup)?;

        id_seqs
            .par_iter()
            .progress_with(pb)
            .map(|ids| self.decode(ids, errors))
            .collect()
    }

    /// Number of vocabulary entries.
    pub fn vocabulary_size(&self) -> usize {
        self.vocab.len()
    }

    /// Number of merge rules loaded.
    pub fn merge_count(&self) -> usize {
        self.vocab.merge_count()
    }

    /// The underlying vocabulary and merge tables.
    pub fn vocab(&self) -> &VocabTable {
        &self.vocab
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    #[inline]
    fn check_length(&self, pretoken: &str) -> Result<(), EncodeError> {
        match self.config.max_pretoken_bytes {
            Some(max) if pretoken.len() > max => Err(EncodeError::PretokenTooLong {
                len: pretoken.len(),
                max,
            }),
            _ => Ok(()),
        }
    }
}

/// Creates a styled progress bar with elapsed time, a fixed-width message label,
/// and position/total counters. A hidden bar is returned when `visible` is false.
///
/// # Errors
///
/// Returns a [`TemplateError`] if the progress bar style template is invalid.
fn progress_bar(size: u64, msg: &str, visible: bool) -> Result<ProgressBar, TemplateError> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }

    let style =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {msg:<30!} {wide_bar} {pos}/{len}")?;

    let pb = ProgressBar::new(size);
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_secs(1));

    Ok(pb)
}
