use crate::core::sequence::InstallContext;
use crate::domain::model::{CommandSpec, StepOutcome};
use crate::domain::ports::InstallStep;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Restarts Klipper and Moonraker so they pick up the module.
pub struct ServicesStep;

#[async_trait]
impl InstallStep for ServicesStep {
    fn get_name(&self) -> &str {
        "services"
    }

    fn should_execute(&self, context: &InstallContext) -> bool {
        !context.config.skip_restart && !context.config.restart_services.is_empty()
    }

    async fn execute(&self, context: &mut InstallContext) -> Result<StepOutcome> {
        let host = context.host.clone();

        for service in &context.config.restart_services {
            tracing::info!("♻️ Restarting {}", service);
            host.run_checked(
                &CommandSpec::new("systemctl")
                    .args(["restart", service.as_str()])
                    .privileged(),
            )
            .await?;
        }

        context.record("restarted", context.config.restart_services.clone());
        Ok(StepOutcome::Changed)
    }
}
