use crate::core::sequence::InstallContext;
use crate::domain::model::StepOutcome;
use crate::domain::ports::InstallStep;
use crate::utils::error::{InstallError, Result};
use async_trait::async_trait;
use std::path::Path;

/// Removes the empty macro folder left behind by older releases.
pub struct LegacyCleanupStep;

/// Removes `dir` if it is an empty directory. Symlinks and files are left
/// alone, and a non-empty directory is an error.
pub fn remove_empty_dir(dir: &Path) -> Result<bool> {
    let metadata = match std::fs::symlink_metadata(dir) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_dir() {
        return Ok(false);
    }

    if std::fs::read_dir(dir)?.next().is_some() {
        return Err(InstallError::NonEmptyLegacyDir {
            path: dir.to_path_buf(),
        });
    }

    std::fs::remove_dir(dir)?;
    Ok(true)
}

#[async_trait]
impl InstallStep for LegacyCleanupStep {
    fn get_name(&self) -> &str {
        "legacy_cleanup"
    }

    async fn execute(&self, context: &mut InstallContext) -> Result<StepOutcome> {
        let legacy_dir = context.paths().legacy_macro_dir();

        if remove_empty_dir(&legacy_dir)? {
            tracing::info!("🧹 Removed legacy folder {}", legacy_dir.display());
            context.record("removed", legacy_dir.display().to_string());
            Ok(StepOutcome::Changed)
        } else {
            Ok(StepOutcome::Unchanged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_empty_dir() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("K-ShakeTune");

        assert!(!remove_empty_dir(&dir).unwrap());

        std::fs::create_dir(&dir).unwrap();
        assert!(remove_empty_dir(&dir).unwrap());
        assert!(!dir.exists());
    }

    #[test]
    fn test_non_empty_dir_is_kept() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("K-ShakeTune");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("my_macros.cfg"), "[gcode_macro X]\n").unwrap();

        let err = remove_empty_dir(&dir).unwrap_err();

        assert!(matches!(err, InstallError::NonEmptyLegacyDir { .. }));
        assert!(dir.join("my_macros.cfg").exists());
    }

    #[test]
    fn test_symlink_is_not_followed() {
        let root = TempDir::new().unwrap();
        let target = root.path().join("real");
        std::fs::create_dir(&target).unwrap();
        let link = root.path().join("K-ShakeTune");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(!remove_empty_dir(&link).unwrap());
        assert!(target.is_dir());
    }
}
