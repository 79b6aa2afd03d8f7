//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Loading or validating settings failed.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The settings file is not JSON.
    #[error("{} is not valid JSON: {source}", path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Parser error with line and column.
        source: serde_json::Error,
    },

    /// The merged layers do not fit the settings schema
    /// (e.g. `"topK": "three"`).
    #[error("settings do not match the schema: {0}")]
    Schema(#[from] serde_json::Error),

    /// A field holds a value the pipeline cannot run with.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted camelCase path, e.g. `retrieval.chunkOverlap`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl SettingsError {
    /// Invalid value at `field`.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Field path for [`SettingsError::InvalidValue`].
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
