use crate::core::sequence::InstallContext;
use crate::domain::model::{CommandOutput, CommandSpec, StepOutcome};
use crate::domain::ports::InstallStep;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Installs whichever of the configured OS packages are missing, in one batch.
pub struct PackagesStep;

/// `dpkg -s` also succeeds for removed packages whose config files remain,
/// so the status line has to be checked too.
pub fn is_installed(status: &CommandOutput) -> bool {
    status.is_success()
        && status
            .stdout
            .lines()
            .any(|line| line.trim() == "Status: install ok installed")
}

#[async_trait]
impl InstallStep for PackagesStep {
    fn get_name(&self) -> &str {
        "packages"
    }

    async fn execute(&self, context: &mut InstallContext) -> Result<StepOutcome> {
        let host = context.host.clone();
        let mut missing = Vec::new();

        for package in &context.config.system_packages {
            let status = host.run(&CommandSpec::new("dpkg").args(["-s", package.as_str()])).await?;
            if is_installed(&status) {
                tracing::info!("📦 {} is already installed", package);
            } else {
                missing.push(package.clone());
            }
        }

        if missing.is_empty() {
            return Ok(StepOutcome::Unchanged);
        }

        tracing::info!("📦 Installing missing packages: {}", missing.join(" "));
        host.run_checked(&CommandSpec::new("apt-get").arg("update").privileged().streamed())
            .await?;
        host.run_checked(
            &CommandSpec::new("apt-get")
                .args(["install", "-y"])
                .args(missing.iter().cloned())
                .privileged()
                .streamed(),
        )
        .await?;

        context.record("installed", missing);
        Ok(StepOutcome::Changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_installed() {
        let installed = CommandOutput::success("Package: python3-numpy\nStatus: install ok installed\n");
        assert!(is_installed(&installed));

        let config_files = CommandOutput::success("Package: python3-numpy\nStatus: deinstall ok config-files\n");
        assert!(!is_installed(&config_files));

        let absent = CommandOutput::failure(1, "dpkg-query: package 'foo' is not installed");
        assert!(!is_installed(&absent));
    }
}
