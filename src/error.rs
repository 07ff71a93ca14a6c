use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while extracting, assembling or splitting data.
#[derive(Debug, Error)]
pub enum Error {
    /// Input data or options cannot satisfy the operation's requirements.
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// A file could not be parsed as the container type it should be.
    #[error("{format} format mismatch: {reason}")]
    FormatMismatch {
        format: &'static str,
        reason: String,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl Error {
    pub fn precondition(message: impl Into<String>) -> Self {
        Error::PreconditionViolation(message.into())
    }

    pub fn format(format: &'static str, reason: impl Into<String>) -> Self {
        Error::FormatMismatch {
            format,
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, Error::PreconditionViolation(_))
    }

    pub fn is_format_mismatch(&self) -> bool {
        matches!(self, Error::FormatMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
