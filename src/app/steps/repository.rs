use crate::core::sequence::InstallContext;
use crate::domain::model::{CommandSpec, StepOutcome};
use crate::domain::ports::InstallStep;
use crate::utils::error::{InstallError, Result};
use async_trait::async_trait;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Clones the module repository, or fast-forwards an existing checkout.
pub struct RepositoryStep;

fn git(repo_or_parent: &Path) -> CommandSpec {
    CommandSpec::new("git").args(["-C".to_string(), repo_or_parent.display().to_string()])
}

fn mark_executable(path: &Path) -> Result<()> {
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    std::fs::set_permissions(path, permissions)?;
    Ok(())
}

impl RepositoryStep {
    async fn clone_repository(&self, context: &mut InstallContext) -> Result<StepOutcome> {
        let host = context.host.clone();
        let repository = context.paths().repository.clone();
        let (parent, name) = match (repository.parent(), repository.file_name()) {
            (Some(parent), Some(name)) => (parent.to_path_buf(), name.to_string_lossy().into_owned()),
            _ => {
                return Err(InstallError::InvalidConfigValueError {
                    field: "paths.repository".to_string(),
                    value: repository.display().to_string(),
                    reason: "Repository path needs a parent directory and a name".to_string(),
                })
            }
        };

        tracing::info!("⬇️ Downloading {} into {}", context.config.repository_url, repository.display());
        std::fs::create_dir_all(&parent)?;
        host.run_checked(&git(&parent).args(["clone", context.config.repository_url.as_str(), name.as_str()]).streamed())
            .await?;

        let script = repository.join("install.sh");
        if script.is_file() {
            mark_executable(&script)?;
        }

        context.record("action", "clone");
        Ok(StepOutcome::Changed)
    }

    async fn update_repository(&self, context: &mut InstallContext) -> Result<StepOutcome> {
        let host = context.host.clone();
        let repository = context.paths().repository.clone();
        let branch = context.config.branch.clone();

        tracing::info!("🔄 Updating existing repository at {}", repository.display());
        let before = host.run_checked(&git(&repository).args(["rev-parse", "HEAD"])).await?;

        host.run_checked(&git(&repository).args(["fetch", "--all"]).streamed()).await?;
        host.run_checked(&git(&repository).args(["checkout", branch.as_str()])).await?;
        host.run_checked(&git(&repository).args(["pull", "--ff-only"]).streamed()).await?;

        let after = host.run_checked(&git(&repository).args(["rev-parse", "HEAD"])).await?;
        let head = after.stdout.trim().to_string();

        context.record("action", "update");
        context.record("head", head);

        if before.stdout.trim() == after.stdout.trim() {
            Ok(StepOutcome::Unchanged)
        } else {
            Ok(StepOutcome::Changed)
        }
    }
}

#[async_trait]
impl InstallStep for RepositoryStep {
    fn get_name(&self) -> &str {
        "repository"
    }

    async fn execute(&self, context: &mut InstallContext) -> Result<StepOutcome> {
        if context.paths().repository.is_dir() {
            self.update_repository(context).await
        } else {
            self.clone_repository(context).await
        }
    }
}
