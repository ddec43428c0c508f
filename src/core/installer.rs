use crate::app::steps::default_steps;
use crate::config::install::InstallConfig;
use crate::core::sequence::InstallSequence;
use crate::domain::model::StepReport;
use crate::domain::ports::{Host, InstallStep};
use crate::utils::error::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Drives one installer run: a step sequence against a host.
pub struct Installer {
    sequence: InstallSequence,
    config: Arc<InstallConfig>,
    host: Arc<dyn Host>,
}

impl Installer {
    /// An installer running the full default pipeline.
    pub fn new(config: InstallConfig, host: Arc<dyn Host>) -> Self {
        Self::with_steps(config, host, default_steps())
    }

    pub fn with_steps(
        config: InstallConfig,
        host: Arc<dyn Host>,
        steps: Vec<Box<dyn InstallStep>>,
    ) -> Self {
        let execution_id = format!("install-{}", chrono::Utc::now().format("%Y%m%dT%H%M%SZ"));
        let mut sequence = InstallSequence::new(execution_id);
        for step in steps {
            sequence.add_step(step);
        }

        Self {
            sequence,
            config: Arc::new(config),
            host,
        }
    }

    pub fn execution_id(&self) -> &str {
        self.sequence.execution_id()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.sequence.step_names()
    }

    pub async fn run(&self) -> Result<Vec<StepReport>> {
        tracing::info!("🚀 Installing Shake&Tune ({})", self.execution_id());
        tracing::debug!("Resolved configuration: {:?}", self.config);

        self.sequence
            .execute_all(Arc::clone(&self.config), Arc::clone(&self.host))
            .await
    }

    pub fn summary(&self, reports: &[StepReport]) -> HashMap<String, serde_json::Value> {
        InstallSequence::get_execution_summary(self.execution_id(), reports)
    }
}
