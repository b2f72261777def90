//! PyO3 bindings for the tokenizer.

use pyo3::{
    exceptions::{PyKeyError, PyValueError},
    prelude::*,
};

use crate::{
    config::{TokenizerConfig, DEFAULT_MAX_PRETOKEN_BYTES},
    error::{DecodeError, EncodeError, TokenizerInitError},
    tokenizer::Tokenizer,
    types::{ErrorMode, TokenId},
};

impl From<TokenizerInitError> for PyErr {
    fn from(e: TokenizerInitError) -> Self {
        PyValueError::new_err(e.to_string())
    }
}

impl From<EncodeError> for PyErr {
    fn from(e: EncodeError) -> Self {
        PyValueError::new_err(e.to_string())
    }
}

impl From<DecodeError> for PyErr {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::UnknownId(id) => PyKeyError::new_err(id),
            other => PyValueError::new_err(other.to_string()),
        }
    }
}

/// Python wrapper for the GPT-2 tokenizer.
#[pyclass(name = "Tokenizer", frozen)]
pub struct PyTokenizer {
    inner: Tokenizer,
}

#[pymethods]
impl PyTokenizer {
    #[new]
    #[pyo3(signature = (vocab_file, merges_file, max_pretoken_bytes = Some(DEFAULT_MAX_PRETOKEN_BYTES)))]
    fn new(
        vocab_file: &str,
        merges_file: &str,
        max_pretoken_bytes: Option<usize>,
    ) -> PyResult<Self> {
        let config = TokenizerConfig::default().with_max_pretoken_bytes(max_pretoken_bytes);
        let inner = Tokenizer::from_files_with_config(vocab_file, merges_file, config)?;
        Ok(Self { inner })
    }

    fn tokenize(&self, py: Python<'_>, text: &str) -> PyResult<Vec<TokenId>> {
        Ok(py.allow_threads(|| self.inner.tokenize(text))?)
    }

    #[pyo3(signature = (texts, show_progress = false))]
    fn tokenize_batch(
        &self,
        py: Python<'_>,
        texts: Vec<String>,
        show_progress: bool,
    ) -> PyResult<Vec<Vec<TokenId>>> {
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        Ok(py.allow_threads(|| self.inner.tokenize_batch(&refs, show_progress))?)
    }

    fn detokenize(&self, ids: Vec<TokenId>) -> PyResult<Vec<String>> {
        Ok(self.inner.detokenize(&ids)?)
    }

    #[pyo3(signature = (ids, errors = "strict"))]
    fn decode(&self, ids: Vec<TokenId>, errors: &str) -> PyResult<String> {
        let mode: ErrorMode = errors.parse().map_err(PyValueError::new_err)?;
        Ok(self.inner.decode(&ids, mode)?)
    }

    fn vocabulary_size(&self) -> usize {
        self.inner.vocabulary_size()
    }

    fn merge_count(&self) -> usize {
        self.inner.merge_count()
    }
}

#[pymodule]
fn _gpt2tok(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();
    m.add_class::<PyTokenizer>()?;
    Ok(())
}
