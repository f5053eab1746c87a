/// Config file loader with validation.
///
/// Reads a [`WriterConfig`] from a YAML file and validates it on load. Invalid
/// configs are rejected before a writer is ever constructed from them.
use std::path::Path;

use crate::config::*;
use crate::errors::QuillError;

/// Loads and validates writer configuration.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a config file, parse it as YAML, and validate it.
    pub fn load(path: &Path) -> Result<WriterConfig, QuillError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| QuillError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config = Self::parse(&content)
            .map_err(|e| QuillError::Config(format!("failed to parse {}: {e}", path.display())))?;
        Self::validate(&config)?;

        tracing::info!(
            path = %path.display(),
            fsync = config.fsync,
            create_parent_dirs = config.create_parent_dirs,
            "writer config loaded"
        );
        Ok(config)
    }

    /// Parse and validate a config from a YAML string.
    pub fn from_yaml_str(content: &str) -> Result<WriterConfig, QuillError> {
        let config = Self::parse(content)?;
        Self::validate(&config)?;
        Ok(config)
    }

    fn parse(content: &str) -> Result<WriterConfig, QuillError> {
        // An empty document deserializes to unit, not to a defaulted struct.
        if content.trim().is_empty() {
            return Ok(WriterConfig::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Validate a config for internal consistency.
    ///
    /// Checks:
    /// - Staging prefix and suffix are not both empty (the staging file would
    ///   be the target itself)
    /// - Neither prefix nor suffix contains a path separator (the staging file
    ///   must stay in the target's directory)
    pub fn validate(config: &WriterConfig) -> Result<(), QuillError> {
        validate_staging_naming(&config.staging)
    }
}

/// Validate the staging file naming convention.
pub fn validate_staging_naming(naming: &StagingNaming) -> Result<(), QuillError> {
    if naming.prefix.is_empty() && naming.suffix.is_empty() {
        return Err(QuillError::Config(
            "staging prefix and suffix cannot both be empty".to_string(),
        ));
    }

    for (field, value) in [("prefix", &naming.prefix), ("suffix", &naming.suffix)] {
        if value.contains('/') || value.contains(std::path::MAIN_SEPARATOR) {
            return Err(QuillError::Config(format!(
                "staging {field} '{value}' must not contain a path separator"
            )));
        }
        if value.contains('\0') {
            return Err(QuillError::Config(format!(
                "staging {field} must not contain a NUL byte"
            )));
        }
    }

    Ok(())
}
