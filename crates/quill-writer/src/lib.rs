/// Write-coalescing atomic file writer.
///
/// Persists the latest version of a value to one target file under rapid-fire
/// writes, without tearing the file and without one disk write per request:
/// - **Writer**: `CoalescingWriter`, one write cycle in flight, later content
///   coalesced into a single pending slot
/// - **Staging**: staging path derivation next to the target
/// - **Fs**: tokio filesystem implementation of the staging I/O contract
pub mod fs;
pub mod staging;
pub mod writer;

pub use fs::TokioStagingIo;
pub use staging::staging_path_for;
pub use writer::CoalescingWriter;

pub use quill_types::{
    Completion, Disposition, QuillError, StagingIo, WriterConfig, WriterMetrics, WriterPhase,
};
