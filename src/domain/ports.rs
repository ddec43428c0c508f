use crate::core::sequence::InstallContext;
use crate::domain::model::{CommandOutput, CommandSpec, StepOutcome};
use crate::utils::error::{InstallError, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Everything the installer needs from the machine it runs on.
#[async_trait]
pub trait Host: Send + Sync {
    fn is_superuser(&self) -> bool;

    fn find_program(&self, name: &str) -> Option<PathBuf>;

    /// Runs a command to completion. A non-zero exit is reported in the
    /// returned output, not as an error.
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput>;

    /// Runs a command and turns a non-zero exit into `CommandFailed`.
    async fn run_checked(&self, command: &CommandSpec) -> Result<CommandOutput> {
        let output = self.run(command).await?;
        if output.is_success() {
            Ok(output)
        } else {
            Err(InstallError::command_failed(
                &command.program,
                &command.args,
                output.code,
                &output.stderr,
            ))
        }
    }
}

#[async_trait]
pub trait InstallStep: Send + Sync {
    fn get_name(&self) -> &str;

    /// Decide from the context whether the step runs at all.
    fn should_execute(&self, _context: &InstallContext) -> bool {
        true
    }

    async fn execute(&self, context: &mut InstallContext) -> Result<StepOutcome>;
}
