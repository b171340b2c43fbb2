//! Error types for schema loading and comparison

use thiserror::Error;

/// Result type for compatibility operations
pub type Result<T> = std::result::Result<T, CompatError>;

/// Errors raised while loading schemas or configuration.
///
/// Structural differences between two schemas are never errors; they are
/// reported as items in the diff tree.
#[derive(Error, Debug)]
pub enum CompatError {
    #[error("Unsupported schema format: {0}")]
    UnsupportedFormat(String),

    #[error("File {file} not found in {source_path}")]
    FileNotFound { file: String, source_path: String },

    #[error("Unresolved type {type_name} referenced by field {field}")]
    UnresolvedType { field: String, type_name: String },

    #[error("Duplicate type name: {0}")]
    DuplicateType(String),

    #[error("Invalid default value {value:?} for field {field}: {reason}")]
    InvalidDefault {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Descriptor decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl CompatError {
    pub(crate) fn invalid_default(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CompatError::InvalidDefault {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
