use crate::core::moonraker::updater_append;
use crate::core::sequence::InstallContext;
use crate::domain::model::StepOutcome;
use crate::domain::ports::InstallStep;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::io::Write;

/// Registers the module with Moonraker's update manager.
pub struct UpdaterStep;

#[async_trait]
impl InstallStep for UpdaterStep {
    fn get_name(&self) -> &str {
        "updater"
    }

    async fn execute(&self, context: &mut InstallContext) -> Result<StepOutcome> {
        let moonraker_config = context.paths().moonraker_config.clone();

        let existing = match std::fs::read_to_string(&moonraker_config) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let Some(addition) = updater_append(&existing, &context.config) else {
            tracing::info!("📝 Update manager already configured in {}", moonraker_config.display());
            return Ok(StepOutcome::Unchanged);
        };

        if let Some(parent) = moonraker_config.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&moonraker_config)?;
        file.write_all(addition.as_bytes())?;

        tracing::info!("📝 Added update manager section to {}", moonraker_config.display());
        context.record("config", moonraker_config.display().to_string());
        Ok(StepOutcome::Changed)
    }
}
