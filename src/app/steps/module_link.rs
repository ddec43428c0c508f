use crate::core::sequence::InstallContext;
use crate::domain::model::StepOutcome;
use crate::domain::ports::InstallStep;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Links the module source into Klipper's `klippy/extras` directory.
pub struct ModuleLinkStep;

/// Path of `target` relative to the directory `base`. Both must be absolute.
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base: Vec<Component> = base.components().collect();
    let target: Vec<Component> = target.components().collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base.len() {
        relative.push("..");
    }
    for component in &target[common..] {
        relative.push(component.as_os_str());
    }
    relative
}

fn canonical_or_same(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[async_trait]
impl InstallStep for ModuleLinkStep {
    fn get_name(&self) -> &str {
        "module_link"
    }

    async fn execute(&self, context: &mut InstallContext) -> Result<StepOutcome> {
        let paths = context.paths().clone();

        // Anything at the link path counts, including a dangling symlink.
        if std::fs::symlink_metadata(&paths.extras_link).is_ok() {
            tracing::info!("🔗 {} already present", paths.extras_link.display());
            return Ok(StepOutcome::Unchanged);
        }

        let extras_dir = std::fs::canonicalize(&paths.extras_dir)?;
        let target = relative_path(&extras_dir, &canonical_or_same(&paths.module_source));

        std::os::unix::fs::symlink(&target, &paths.extras_link)?;
        tracing::info!("🔗 Linked {} -> {}", paths.extras_link.display(), target.display());

        context.record("link_target", target.display().to_string());
        Ok(StepOutcome::Changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(
                Path::new("/home/pi/klipper/klippy/extras"),
                Path::new("/home/pi/klippain_shaketune/shaketune")
            ),
            PathBuf::from("../../../klippain_shaketune/shaketune")
        );
        assert_eq!(
            relative_path(Path::new("/a/b"), Path::new("/a/b/c")),
            PathBuf::from("c")
        );
        assert_eq!(
            relative_path(Path::new("/srv/klipper/klippy/extras"), Path::new("/home/pi/mod")),
            PathBuf::from("../../../../home/pi/mod")
        );
    }
}
