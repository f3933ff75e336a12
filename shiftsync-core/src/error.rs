//! Error types for shiftsync.

use thiserror::Error;

/// Errors that can occur while extracting and reconciling shifts.
#[derive(Error, Debug)]
pub enum ShiftSyncError {
    #[error("Malformed time range: {0}")]
    MalformedTimeRange(String),

    #[error("No date could be attributed to time range '{0}'")]
    UnresolvedDate(String),

    #[error("No shifts found on page {page}")]
    EmptyParseResult { page: usize },

    #[error("Remote operation failed: {0}")]
    RemoteOperation(String),

    #[error("Operation outside sync window: {0}")]
    WindowViolation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Renderer error: {0}")]
    Renderer(String),

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("{0}")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for shiftsync operations.
pub type ShiftSyncResult<T> = Result<T, ShiftSyncError>;
