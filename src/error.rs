//! Structured error types for dtview.
//!
//! Invalid input (bad sort column, zero page size) comes back as `Err` without
//! touching controller state. Transport failures are logged by the controller
//! and turned into an empty page, so they only surface here from the
//! transport layer itself.

/// All errors that can occur in dtview.
#[derive(Debug, thiserror::Error)]
pub enum DtviewError {
    /// Sort column outside `[0, columns - 1]`.
    #[error("Column {column} out of range (table has {columns} columns)")]
    ColumnOutOfRange { column: usize, columns: usize },

    /// Rows-per-page must be positive.
    #[error("Invalid rows per page: {0}")]
    InvalidPerPage(usize),

    /// Remote fetch failed or returned something that is not a page.
    #[error("Transport: {0}")]
    Transport(String),

    /// JSON decoding/encoding error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Search pattern could not be compiled.
    #[error("Invalid search pattern: {0}")]
    Regex(#[from] regex::Error),

    /// Invalid configuration value.
    #[error("Configuration: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DtviewError>;

impl From<String> for DtviewError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for DtviewError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<DtviewError> for wasm_bindgen::JsValue {
    fn from(e: DtviewError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
