/// Trait contracts for the collaborators of the coalescing writer.
///
/// The writer codes against these interfaces rather than against the
/// filesystem directly, so tests can gate cycles and inject faults.
use std::io;
use std::path::Path;

use async_trait::async_trait;

// ============================================================
// Staging I/O
// ============================================================

/// The two filesystem primitives a write cycle is made of.
///
/// A cycle calls [`write_all`](Self::write_all) and then, only if that
/// succeeded, [`publish`](Self::publish). The writer guarantees the two are
/// never outstanding for more than one cycle of the same target at a time.
#[async_trait]
pub trait StagingIo: Send + Sync {
    /// Write `content` fully to the staging file, replacing anything there.
    ///
    /// On failure the staging file may be left partially written; the target
    /// is never touched by this call.
    async fn write_all(&self, staging: &Path, content: &[u8]) -> io::Result<()>;

    /// Atomically replace `target` with `staging`.
    ///
    /// On failure the target must be left as it was.
    async fn publish(&self, staging: &Path, target: &Path) -> io::Result<()>;
}
