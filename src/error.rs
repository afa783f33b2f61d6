//! Error types for flip-match.

use thiserror::Error;

/// Errors that prevent a session from starting.
///
/// Raised before any session state is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("rows and columns must be between 2 and 5 (got {rows}x{columns})")]
    GridOutOfRange { rows: u32, columns: u32 },

    #[error("a {rows}x{columns} grid has no room for a single pair")]
    NoPairs { rows: u32, columns: u32 },

    #[error("board needs {needed} unique icons but only {available} are available")]
    NotEnoughIcons { needed: usize, available: usize },
}

/// Errors raised by the persistence collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
