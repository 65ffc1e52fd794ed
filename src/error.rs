//! Error types for catalog access and playlist ingestion.

use thiserror::Error;

/// Failure of a single call to the catalog or library API.
///
/// Resolvers treat every variant as "no result"; the run loop aborts only on
/// [`CatalogError::Unauthorized`], since every later call would fail the same way.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Destination rejected the credentials (401/403)
    #[error("authorization rejected (status {status})")]
    Unauthorized { status: u16 },

    /// Any other non-success status
    #[error("unexpected status {status}")]
    Status { status: u16 },

    /// Connection, timeout or TLS failure
    #[error("transport failure: {0}")]
    Transport(String),

    /// Body was not the JSON shape we expected
    #[error("malformed response: {0}")]
    Decode(String),
}

impl CatalogError {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => CatalogError::Unauthorized { status },
            _ => CatalogError::Status { status },
        }
    }

    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, CatalogError::Unauthorized { .. })
    }
}

/// Failure to read a playlist export. Fatal for the whole file.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Header does not have the expected column at the expected position
    #[error("column {index} should be '{expected}' but is '{found}'")]
    MalformedLayout {
        index: usize,
        expected: &'static str,
        found: String,
    },

    /// A data row is too short to hold every expected column
    #[error("row {row} has {found} columns, expected at least {expected}")]
    MissingColumns {
        row: usize,
        found: usize,
        expected: usize,
    },
}
