//! Staging path resolution.
//!
//! The staging file lives in the same directory as the target so the publish
//! step is a same-filesystem rename.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use quill_types::config::StagingNaming;
use quill_types::config_loader::validate_staging_naming;
use quill_types::errors::QuillError;

/// Derive the staging path for `target`: `{dir}/{prefix}{file_name}{suffix}`.
///
/// Deterministic, and injective over file names within one directory, so two
/// writers for different targets never share a staging file.
pub fn staging_path_for(target: &Path, naming: &StagingNaming) -> Result<PathBuf, QuillError> {
    validate_staging_naming(naming)?;

    let file_name = target.file_name().ok_or_else(|| {
        QuillError::Config(format!(
            "target {} has no file name",
            target.display()
        ))
    })?;

    let mut staged = OsString::with_capacity(
        naming.prefix.len() + file_name.len() + naming.suffix.len(),
    );
    staged.push(&naming.prefix);
    staged.push(file_name);
    staged.push(&naming.suffix);

    let staging = target.with_file_name(staged);
    if staging == target {
        return Err(QuillError::Config(format!(
            "staging path for {} collides with the target",
            target.display()
        )));
    }
    Ok(staging)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_naming_is_hidden_tmp() {
        let staging = staging_path_for(Path::new("/data/state.json"), &StagingNaming::default())
            .unwrap();
        assert_eq!(staging, PathBuf::from("/data/.state.json.tmp"));
    }

    #[test]
    fn test_relative_target_stays_relative() {
        let staging =
            staging_path_for(Path::new("state.json"), &StagingNaming::default()).unwrap();
        assert_eq!(staging, PathBuf::from(".state.json.tmp"));

        let staging =
            staging_path_for(Path::new("cfg/app.yaml"), &StagingNaming::default()).unwrap();
        assert_eq!(staging, PathBuf::from("cfg/.app.yaml.tmp"));
    }

    #[test]
    fn test_custom_naming() {
        let naming = StagingNaming {
            prefix: String::new(),
            suffix: ".partial".to_string(),
        };
        let staging = staging_path_for(Path::new("/var/lib/db.bin"), &naming).unwrap();
        assert_eq!(staging, PathBuf::from("/var/lib/db.bin.partial"));
    }

    #[test]
    fn test_distinct_targets_distinct_staging() {
        let naming = StagingNaming::default();
        let a = staging_path_for(Path::new("/d/a"), &naming).unwrap();
        let b = staging_path_for(Path::new("/d/b"), &naming).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.parent(), b.parent());
    }

    #[test]
    fn test_deterministic() {
        let naming = StagingNaming::default();
        let target = Path::new("/d/settings.toml");
        assert_eq!(
            staging_path_for(target, &naming).unwrap(),
            staging_path_for(target, &naming).unwrap()
        );
    }

    #[test]
    fn test_target_without_file_name_rejected() {
        let naming = StagingNaming::default();
        for bad in ["/", "..", "/data/.."] {
            match staging_path_for(Path::new(bad), &naming) {
                Err(QuillError::Config(msg)) => assert!(msg.contains("no file name"), "{msg}"),
                other => panic!("expected Config error for {bad}, got: {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty_naming_rejected() {
        let naming = StagingNaming {
            prefix: String::new(),
            suffix: String::new(),
        };
        assert!(staging_path_for(Path::new("/d/a"), &naming).is_err());
    }
}
