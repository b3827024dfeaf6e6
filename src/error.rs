//! Error types for the songbook library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the songbook library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configured font file is absent or not a usable TrueType font
    #[error("Font not available: {} ({reason})", .path.display())]
    MissingFont { path: PathBuf, reason: String },

    /// A source document could not be opened or counted
    #[error("Unreadable document {}: {reason}", .path.display())]
    UnreadableDocument { path: PathBuf, reason: String },

    /// The final songbook could not be written
    #[error("Failed to write {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A name in an ordered list matches no discovered document
    #[error("Ordered list '{list}' names unknown song '{name}'")]
    UnresolvedCustomEntry { list: String, name: String },

    /// Page accounting produced an impossible value
    #[error("Page offset divergence: {0}")]
    PageOffsetDivergence(String),

    /// A document's page count changed between counting and assembly
    #[error("Page count of {} changed from {expected} to {actual}", .path.display())]
    PageCountChanged {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    /// The combined document does not have the planned number of pages
    #[error("Assembled {actual} pages but the plan has {expected}")]
    AssemblyMismatch { expected: usize, actual: usize },

    /// Nothing to assemble
    #[error("No PDF files found under {}", .0.display())]
    NoDocuments(PathBuf),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Whether the pipeline logs this error and keeps going
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnreadableDocument { .. } | Error::UnresolvedCustomEntry { .. }
        )
    }
}
