//! Error types for the pharmacophore search core.
//!
//! One enum covers every failure surfaced by the public API. Error codes
//! follow the pattern `PHARM-XXX` for easy debugging and log correlation.

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or running a search.
#[derive(Error, Debug)]
pub enum Error {
    /// Index header magic or version did not match (PHARM-001).
    #[error("[PHARM-001] invalid index: {0}")]
    InvalidIndex(String),

    /// A record failed its range/ordering check mid-scan (PHARM-002).
    ///
    /// Not fatal: the offending record is skipped and the scan continues.
    #[error("[PHARM-002] corrupt record at offset {offset} in {table}: {reason}")]
    CorruptRecord {
        /// Table (type-triple) the record was read from.
        table: String,
        /// Byte offset of the offending record.
        offset: u64,
        /// Why the record was rejected.
        reason: String,
    },

    /// Underlying I/O failure (PHARM-003).
    #[error("[PHARM-003] I/O error on {path}: {source}")]
    Io {
        /// Path of the file being read or written.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Query exceeds the bitmask width or has fewer than 3 points (PHARM-004).
    #[error("[PHARM-004] query too large: {0}")]
    QueryTooLarge(String),

    /// Search was cancelled via the stop flag before completion (PHARM-005).
    ///
    /// Not an error condition for callers: the partial result set is still valid.
    #[error("[PHARM-005] search cancelled")]
    Cancelled,

    /// A config value failed validation (PHARM-006).
    #[error("[PHARM-006] invalid config: {field} = {value}")]
    BadConfig {
        /// Name of the rejected field.
        field: String,
        /// String rendering of the rejected value.
        value: String,
    },
}

impl Error {
    /// Returns the stable error code (e.g., "PHARM-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidIndex(_) => "PHARM-001",
            Self::CorruptRecord { .. } => "PHARM-002",
            Self::Io { .. } => "PHARM-003",
            Self::QueryTooLarge(_) => "PHARM-004",
            Self::Cancelled => "PHARM-005",
            Self::BadConfig { .. } => "PHARM-006",
        }
    }

    /// Returns true if the search can continue (skip-and-continue) rather
    /// than having to fail outright.
    ///
    /// `CorruptRecord` is skipped by the scanning loop; `Cancelled` ends the
    /// search early but the result set up to that point is valid. Everything
    /// else fails the search at the point it's encountered.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::CorruptRecord { .. } | Self::Cancelled)
    }
}
