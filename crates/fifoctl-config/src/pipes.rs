//! Naming convention for pipe pairs.
//!
//! Every protocol instance reads from `<dir>/<name>_in` and writes to
//! `<dir>/<name>_out`. The external controller does the opposite.

use std::fmt;
use std::fs::DirBuilder;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Suffix of the pipe the protocol reads commands from.
pub const INBOUND_SUFFIX: &str = "_in";

/// Suffix of the pipe the protocol writes responses to.
pub const OUTBOUND_SUFFIX: &str = "_out";

/// Inbound/outbound pipe pair rooted at one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeLayout {
    dir: Utf8PathBuf,
    name: String,
}

impl PipeLayout {
    /// Builds a layout for `<dir>/<name>_in` and `<dir>/<name>_out`.
    #[must_use]
    pub fn new(dir: impl Into<Utf8PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    /// Derives the layout from the path of an inbound pipe, if it follows the
    /// `<name>_in` convention.
    #[must_use]
    pub fn from_inbound(path: &Utf8Path) -> Option<Self> {
        let file_name = path.file_name()?;
        let name = file_name.strip_suffix(INBOUND_SUFFIX)?;
        if name.is_empty() {
            return None;
        }
        let dir = path.parent().unwrap_or_else(|| Utf8Path::new(""));
        Some(Self::new(dir, name))
    }

    /// Directory holding both pipes.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        self.dir.as_path()
    }

    /// Base name shared by both pipes.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Pipe read by the protocol.
    #[must_use]
    pub fn inbound_path(&self) -> Utf8PathBuf {
        self.dir.join(format!("{}{INBOUND_SUFFIX}", self.name))
    }

    /// Pipe written by the protocol.
    #[must_use]
    pub fn outbound_path(&self) -> Utf8PathBuf {
        self.dir.join(format!("{}{OUTBOUND_SUFFIX}", self.name))
    }

    /// Ensures the pipes directory exists with restrictive permissions.
    pub fn prepare_filesystem(&self) -> Result<(), PipePreparationError> {
        if self.dir.as_str().is_empty() {
            return Err(PipePreparationError::MissingDirectory {
                name: self.name.clone(),
            });
        }

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        if let Err(source) = builder.create(self.dir.as_std_path())
            && source.kind() != std::io::ErrorKind::AlreadyExists
        {
            return Err(PipePreparationError::CreateDirectory {
                path: self.dir.clone(),
                source,
            });
        }

        Ok(())
    }
}

impl fmt::Display for PipeLayout {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}/{{{}{INBOUND_SUFFIX},{}{OUTBOUND_SUFFIX}}}",
            self.dir, self.name, self.name
        )
    }
}

/// Errors raised while preparing the pipes directory.
#[derive(Debug, Error)]
pub enum PipePreparationError {
    /// The layout had no directory component.
    #[error("pipe pair '{name}' has no directory")]
    MissingDirectory {
        /// Pipe base name.
        name: String,
    },
    /// Creating the directory failed.
    #[error("failed to create pipes directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Error from the filesystem.
        #[source]
        source: std::io::Error,
    },
}
