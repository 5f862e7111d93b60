//! The error type shared by every Fabula crate.
//!
//! Loading a story is all-or-nothing: the first violation anywhere in the
//! include graph aborts the load with a positioned [`Error`]. Running a
//! loaded story never produces errors; player-facing failures are story
//! messages, not `Err` values.

use crate::position::Position;
use thiserror::Error;

/// Error for all fallible Fabula operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind}")]
pub struct Error {
    kind: ErrorKind,
}

/// The specific failure inside an [`Error`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A story failed to compile.
    ///
    /// Renders as `file(line,col): message`, which hosts print verbatim.
    #[error("{position}: {message}")]
    Compile {
        /// Where the offending construct begins.
        position: Position,
        /// Description of the violation.
        message: String,
    },

    /// A source file could not be read or written.
    #[error("cannot access {path}: {message}")]
    Io {
        /// The path that failed.
        path: String,
        /// The underlying description.
        message: String,
    },
}

impl Error {
    /// Creates a compile error at a position.
    #[must_use]
    pub fn compile(position: Position, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Compile {
                position,
                message: message.into(),
            },
        }
    }

    /// Creates an I/O error for a path.
    #[must_use]
    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Io {
                path: path.into(),
                message: message.into(),
            },
        }
    }

    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the source position for compile errors.
    #[must_use]
    pub fn position(&self) -> Option<&Position> {
        match &self.kind {
            ErrorKind::Compile { position, .. } => Some(position),
            ErrorKind::Io { .. } => None,
        }
    }
}

/// Result alias used throughout Fabula.
pub type Result<T> = std::result::Result<T, Error>;
