// Error types and user-facing error helpers
//
// Configuration problems get a typed error so callers can match on them;
// everything else (file I/O, serialization) travels as anyhow::Error with
// context attached at the boundary.

use anyhow::{Context, Result};
use thiserror::Error;

/// Invalid schedule, checkpoint or metrics settings
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("epochs must be at least 1")]
    ZeroEpochs,

    #[error("anneal_pct must be in [0, 1), got {0}")]
    AnnealPctOutOfRange(f64),

    #[error("{field} must be a positive finite number, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("checkpoint_interval must be at least 1")]
    ZeroCheckpointInterval,
}

/// Check that a value is finite
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

/// Check that a value is finite and strictly positive
pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

/// Wrap an error with user-friendly context
pub trait UserFriendlyError {
    /// Add user-friendly context with a suggestion
    fn user_context_with_suggestion(self, problem: &str, suggestion: &str) -> Self;
}

impl<T> UserFriendlyError for Result<T> {
    fn user_context_with_suggestion(self, problem: &str, suggestion: &str) -> Self {
        self.with_context(|| format!("{}\n\nSuggestion: {}", problem, suggestion))
    }
}
