//! Error types for pipe transport operations.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced while opening, reading or writing a pipe pair.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open inbound pipe {path}: {source}")]
    /// The inbound pipe could not be opened.
    OpenInbound {
        /// Pipe that failed.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    #[error("failed to open outbound pipe {path}: {source}")]
    /// The outbound pipe could not be opened.
    OpenOutbound {
        /// Pipe that failed.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    #[error("failed to read inbound pipe {path}: {source}")]
    /// Reading the inbound pipe failed after a reopen.
    Read {
        /// Pipe that failed.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    #[error("failed to write outbound pipe {path}: {source}")]
    /// Writing a response line failed.
    Write {
        /// Pipe that failed.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// Kind of the underlying IO error, used to deduplicate repeated warnings.
    #[must_use]
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::OpenInbound { source, .. }
            | Self::OpenOutbound { source, .. }
            | Self::Read { source, .. }
            | Self::Write { source, .. } => source.kind(),
        }
    }
}
