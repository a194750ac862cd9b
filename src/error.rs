//! Engine error types.
//!
//! Engine modules return [`Error`] via `thiserror`; the CLI layer wraps it
//! in `anyhow`.
//!
//! Only structural problems surface as an [`Error`]: missing inputs, an
//! unreadable session, a broken journal. Failures of a single item inside a
//! batch (one search, one file move) are recorded on that item and never
//! escape the batch.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required input was missing or malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Tags could not be read from an audio file
    #[error("Metadata error for {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// Search or library snapshot provider failed
    #[error("Provider error: {0}")]
    Provider(#[from] crate::enrichment::EnrichmentError),

    /// Session or journal JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// A move would overwrite a file it was not planned to replace
    #[error("Destination already exists: {0}")]
    Occupied(PathBuf),

    /// A file operation that can never be carried out safely
    #[error("Operation refused: {0}")]
    Refused(String),

    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn metadata(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn occupied(path: impl Into<PathBuf>) -> Self {
        Self::Occupied(path.into())
    }

    pub fn refused(reason: impl Into<String>) -> Self {
        Self::Refused(reason.into())
    }

    /// Wrap with a description of what was being attempted.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, below any added context.
    pub fn root(&self) -> &Error {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Attach context to fallible file and JSON operations.
pub trait ResultExt<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, serde_json::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Serialization(e).context(ctx))
    }
}
