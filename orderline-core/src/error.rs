//! Error types for orderline operations

use thiserror::Error;

/// Failures on the ingestion side. All of them are terminal for the message
/// that caused them: it is logged and dropped, never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("Malformed order message: {reason}")]
    MalformedInput { reason: String },

    #[error("Received order has no order_uid")]
    MissingIdentifier,

    #[error("Failed to persist order {identifier}: {reason}")]
    PersistenceFailure { identifier: String, reason: String },
}

/// Failures on the read side, surfaced to the HTTP boundary as distinct
/// statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReadError {
    #[error("Order {identifier} not found")]
    NotFound { identifier: String },

    #[error("Record store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("Stored row for order {identifier} could not be decoded: {reason}")]
    DecodeFailure { identifier: String, reason: String },
}

/// Errors reported by a record store implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Write rejected for {identifier}: {reason}")]
    WriteRejected { identifier: String, reason: String },

    #[error("Row decode failed: {reason}")]
    RowDecode { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl From<StoreError> for ReadError {
    /// Maps a store failure seen during a single-row lookup.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RowDecode { reason } => ReadError::DecodeFailure {
                identifier: String::new(),
                reason,
            },
            StoreError::Unavailable { reason } | StoreError::WriteRejected { reason, .. } => {
                ReadError::StoreUnavailable { reason }
            }
        }
    }
}

impl ReadError {
    /// Attach the identifier being looked up to a decode failure.
    pub fn for_identifier(self, id: &str) -> Self {
        match self {
            ReadError::DecodeFailure { reason, .. } => ReadError::DecodeFailure {
                identifier: id.to_string(),
                reason,
            },
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReadError::NotFound { .. })
    }
}
