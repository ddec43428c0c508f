use crate::core::sequence::InstallContext;
use crate::domain::model::{CommandSpec, StepOutcome};
use crate::domain::ports::InstallStep;
use crate::utils::error::{InstallError, Result};
use async_trait::async_trait;

/// Refuses to continue as root, without Python 3, or without the Klipper unit.
pub struct PreflightStep;

/// Whether `unit` appears as a unit name in `systemctl list-units` output.
pub fn unit_listed(list_units_output: &str, unit: &str) -> bool {
    let unit = if unit.ends_with(".service") {
        unit.to_string()
    } else {
        format!("{}.service", unit)
    };

    list_units_output
        .lines()
        .any(|line| line.split_whitespace().any(|column| column == unit))
}

#[async_trait]
impl InstallStep for PreflightStep {
    fn get_name(&self) -> &str {
        "preflight"
    }

    async fn execute(&self, context: &mut InstallContext) -> Result<StepOutcome> {
        let host = context.host.clone();

        if host.is_superuser() {
            return Err(InstallError::RunningAsRoot);
        }

        let python = host.find_program("python3").ok_or(InstallError::PythonMissing)?;
        context.record("python3", python.display().to_string());

        let listing = host
            .run_checked(&CommandSpec::new("systemctl").args([
                "list-units",
                "--full",
                "--all",
                "-t",
                "service",
                "--no-legend",
            ]))
            .await?;

        let target = &context.config.target_service;
        if !unit_listed(&listing.stdout, target) {
            return Err(InstallError::ServiceMissing {
                service: target.clone(),
            });
        }

        tracing::info!("🔎 {} found, continuing", target);
        Ok(StepOutcome::Unchanged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "  klipper.service      loaded active running Klipper 3D Printer Firmware SV1\n\
● moonraker.service    loaded failed failed  API Server for Klipper SV1\n\
  ssh.service          loaded active running OpenBSD Secure Shell server\n";

    #[test]
    fn test_unit_listed() {
        assert!(unit_listed(LISTING, "klipper.service"));
        assert!(unit_listed(LISTING, "klipper"));
        assert!(unit_listed(LISTING, "moonraker.service"));
        assert!(!unit_listed(LISTING, "klipper-mcu.service"));
        assert!(!unit_listed("", "klipper.service"));
    }
}
