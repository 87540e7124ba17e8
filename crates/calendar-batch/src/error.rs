//! Error types for calendar-batch operations.

use thiserror::Error;

/// Errors that can occur while loading, resolving or exporting a batch.
#[derive(Error, Debug)]
pub enum BatchError {
    /// Imported or cached text was not valid JSON, or did not match any accepted shape.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The batch has no start date, or the stored one could not be parsed.
    #[error("batch start date is missing or invalid")]
    MissingStartDate,

    /// Adding an offset or duration left the representable calendar range.
    #[error("offset of {offset_millis}ms is outside the representable date range")]
    OutOfRange { offset_millis: i64 },

    /// A key/value store backend failed to read or write an entry.
    #[error("Store error: {0}")]
    Store(String),
}

/// Convenience alias used throughout calendar-batch.
pub type Result<T> = std::result::Result<T, BatchError>;
