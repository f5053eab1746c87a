//! Tokio filesystem implementation of [`StagingIo`].

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::trace;

use quill_types::config::WriterConfig;
use quill_types::traits::StagingIo;

/// Writes the staging file with `tokio::fs` and publishes it with a rename.
#[derive(Debug, Clone, Default)]
pub struct TokioStagingIo {
    fsync: bool,
    create_parent_dirs: bool,
}

impl TokioStagingIo {
    /// Create an I/O backend honouring the durability options of `config`.
    pub fn new(config: &WriterConfig) -> Self {
        Self {
            fsync: config.fsync,
            create_parent_dirs: config.create_parent_dirs,
        }
    }
}

#[async_trait]
impl StagingIo for TokioStagingIo {
    async fn write_all(&self, staging: &Path, content: &[u8]) -> io::Result<()> {
        if self.create_parent_dirs {
            if let Some(parent) = staging.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::File::create(staging).await?;
        file.write_all(content).await?;
        // Errors from the background write only surface through `flush`.
        file.flush().await?;
        if self.fsync {
            file.sync_all().await?;
        }

        trace!(path = %staging.display(), bytes = content.len(), "staging file written");
        Ok(())
    }

    async fn publish(&self, staging: &Path, target: &Path) -> io::Result<()> {
        tokio::fs::rename(staging, target).await
    }
}
