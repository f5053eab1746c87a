/// Configuration types for the Quill writer.
///
/// Every field has a default, so an empty YAML document is a valid config.
use serde::{Deserialize, Serialize};

/// Per-writer configuration, usually parsed from a YAML file.
///
/// ```yaml
/// fsync: true
/// create_parent_dirs: false
/// staging:
///   prefix: "."
///   suffix: ".tmp"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Flush the staging file to stable storage before it is published.
    pub fsync: bool,
    /// Create missing parent directories of the target on the first write.
    pub create_parent_dirs: bool,
    /// How the staging file name is derived from the target file name.
    pub staging: StagingNaming,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            fsync: true,
            create_parent_dirs: false,
            staging: StagingNaming::default(),
        }
    }
}

/// Naming convention for the staging file: `{prefix}{file_name}{suffix}`,
/// placed in the target's directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingNaming {
    /// Prepended to the target file name. Default `"."` (hidden file).
    pub prefix: String,
    /// Appended to the target file name. Default `".tmp"`.
    pub suffix: String,
}

impl Default for StagingNaming {
    fn default() -> Self {
        Self {
            prefix: ".".to_string(),
            suffix: ".tmp".to_string(),
        }
    }
}
