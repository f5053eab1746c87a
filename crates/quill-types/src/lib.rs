/// Shared types, traits, and errors for the Quill coalescing writer.
///
/// This crate is the foundation the writer crate depends on.
/// It contains:
/// - **Trait contracts** (`traits`) for the staging I/O collaborator
/// - **Outcome types** (`outcome`) reported to callers and in metrics
/// - **Error types** (`errors`) for unified error handling
/// - **Config types** (`config`, `config_loader`) for YAML configuration
pub mod config;
pub mod config_loader;
pub mod errors;
pub mod outcome;
pub mod traits;

// Re-export commonly used types at the crate root for convenience.
pub use config::{StagingNaming, WriterConfig};
pub use errors::QuillError;
pub use outcome::*;
pub use traits::*;
