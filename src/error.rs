use serde::Serialize;
use thiserror::Error;

/// Returned by [`crate::batch::pivot`] when asked to pivot zero records
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no records to export")]
pub struct EmptyBatchError;

/// Errors surfaced to callers of the extraction and export pipeline.
///
/// Field misses are not represented here: an exhausted cascade yields the
/// [`crate::NOT_FOUND`] sentinel instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed input
    #[error("invalid request: {0}")]
    Validation(String),

    /// Target unreachable, timed out, or returned non-renderable content
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The rendering backend could not be acquired
    #[error("rendering backend unavailable: {0}")]
    RenderBackend(String),

    #[error(transparent)]
    EmptyBatch(#[from] EmptyBatchError),

    /// Spreadsheet serialization failed
    #[error("export failed: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller sent bad input (as opposed to a failure on our side)
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::EmptyBatch(_))
    }

    /// Flat `{ error, details }` body reported to callers
    pub fn to_body(&self) -> ErrorBody {
        let error = match self {
            Error::Validation(_) | Error::EmptyBatch(_) => "invalid request",
            Error::Navigation(_) | Error::RenderBackend(_) => "failed to fetch page data",
            Error::Export(_) | Error::Io(_) => "failed to build spreadsheet",
            Error::Config(_) => "misconfigured scraper",
        };
        ErrorBody {
            error: error.to_string(),
            details: self.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

/// Error payload as serialized for callers
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch_is_validation() {
        let err: Error = EmptyBatchError.into();
        assert!(err.is_validation());
        assert_eq!(err.to_body().details, "no records to export");
    }

    #[test]
    fn test_navigation_body() {
        let err = Error::Navigation("timed out after 30s".to_string());
        assert!(!err.is_validation());
        let body = err.to_body();
        assert_eq!(body.error, "failed to fetch page data");
        assert_eq!(body.details, "navigation failed: timed out after 30s");
    }
}
