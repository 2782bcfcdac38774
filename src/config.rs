//! Binding configuration.
//!
//! # Example
//!
//! ```
//! use actionwire::config::BinderConfig;
//!
//! let config = BinderConfig::new().strict(true).max_seq_len(64);
//! assert!(config.strict);
//! assert_eq!(config.max_seq_len, 64);
//! ```

/// Default binding policy: malformed input yields zero values.
pub const DEFAULT_STRICT: bool = false;

/// Default upper bound on the number of elements bound into a sequence.
pub const DEFAULT_MAX_SEQ_LEN: usize = 1024;

/// Policy knobs for [`ParamsBinder`](crate::binding::ParamsBinder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinderConfig {
    /// Reject malformed input with a binding error instead of
    /// logging a warning and producing the zero value.
    pub strict: bool,
    /// Maximum number of elements accepted for a sequence parameter.
    pub max_seq_len: usize,
}

impl BinderConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set strict binding.
    ///
    /// Default: false
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the maximum sequence length.
    ///
    /// Default: 1024
    pub fn max_seq_len(mut self, limit: usize) -> Self {
        self.max_seq_len = limit;
        self
    }
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            strict: DEFAULT_STRICT,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
        }
    }
}
