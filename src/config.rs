//! Runtime options for [`Tokenizer`](crate::Tokenizer).

use serde::{Deserialize, Serialize};

/// Default cap on the byte length of a single pretoken.
///
/// The merge loop is quadratic in the pretoken length; real text rarely
/// produces pretokens longer than a few dozen bytes.
pub const DEFAULT_MAX_PRETOKEN_BYTES: usize = 16 * 1024;

/// Serializable tokenizer options.
///
/// Missing fields take their defaults, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Longest pretoken, in bytes, that will be merged. `None` disables the cap.
    pub max_pretoken_bytes: Option<usize>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            max_pretoken_bytes: Some(DEFAULT_MAX_PRETOKEN_BYTES),
        }
    }
}

impl TokenizerConfig {
    /// Parses a configuration from JSON.
    pub fn from_json_str(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Sets the pretoken cap.
    pub fn with_max_pretoken_bytes(mut self, max: Option<usize>) -> Self {
        self.max_pretoken_bytes = max;
        self
    }
}
