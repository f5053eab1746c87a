use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Unified error type for the Quill writer.
///
/// The type is `Clone` because one cycle outcome is delivered to every caller
/// of its completion group. I/O sources are kept behind an `Arc` so each
/// caller can still inspect the original [`io::ErrorKind`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuillError {
    /// Writing content to the staging file did not complete.
    #[error("staging write to {} failed: {source}", path.display())]
    Write {
        /// Staging file that was being written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: Arc<io::Error>,
    },

    /// Renaming the staging file onto the target did not complete.
    #[error("publish of {} onto {} failed: {source}", staging.display(), target.display())]
    Publish {
        /// Staging file that was being renamed.
        staging: PathBuf,
        /// Target the rename was aimed at.
        target: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: Arc<io::Error>,
    },

    /// The task driving a cycle went away before resolving its group.
    #[error("write cycle abandoned before completion")]
    Abandoned,

    /// Error from configuration loading or validation.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl QuillError {
    /// Build a [`QuillError::Write`] from a staging write failure.
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        QuillError::Write {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Build a [`QuillError::Publish`] from a rename failure.
    pub fn publish(
        staging: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        QuillError::Publish {
            staging: staging.into(),
            target: target.into(),
            source: Arc::new(source),
        }
    }

    /// True if the staging write stage failed.
    pub fn is_write_failure(&self) -> bool {
        matches!(self, QuillError::Write { .. })
    }

    /// True if the atomic publish stage failed.
    pub fn is_publish_failure(&self) -> bool {
        matches!(self, QuillError::Publish { .. })
    }

    /// The I/O error kind behind a write or publish failure.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            QuillError::Write { source, .. } | QuillError::Publish { source, .. } => {
                Some(source.kind())
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for QuillError {
    fn from(err: serde_json::Error) -> Self {
        QuillError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for QuillError {
    fn from(err: serde_yaml::Error) -> Self {
        QuillError::Serialization(err.to_string())
    }
}
