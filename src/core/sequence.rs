use crate::config::install::{InstallConfig, InstallPaths};
use crate::domain::model::{StepOutcome, StepReport};
use crate::domain::ports::{Host, InstallStep};
use crate::utils::error::{InstallError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// State shared by the steps of one installer run.
pub struct InstallContext {
    pub execution_id: String,
    pub config: Arc<InstallConfig>,
    pub host: Arc<dyn Host>,
    pub previous_reports: Vec<StepReport>,
    step_metadata: HashMap<String, serde_json::Value>,
}

impl InstallContext {
    pub fn new(execution_id: String, config: Arc<InstallConfig>, host: Arc<dyn Host>) -> Self {
        Self {
            execution_id,
            config,
            host,
            previous_reports: Vec::new(),
            step_metadata: HashMap::new(),
        }
    }

    pub fn paths(&self) -> &InstallPaths {
        &self.config.paths
    }

    pub fn get_previous_report(&self) -> Option<&StepReport> {
        self.previous_reports.last()
    }

    /// Attaches a key/value to the report of the step currently running.
    pub fn record(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.step_metadata.insert(key.into(), value.into());
    }

    fn take_step_metadata(&mut self) -> HashMap<String, serde_json::Value> {
        std::mem::take(&mut self.step_metadata)
    }

    fn add_report(&mut self, report: StepReport) {
        self.previous_reports.push(report);
    }
}

/// Runs install steps strictly in insertion order, stopping at the first failure.
pub struct InstallSequence {
    steps: Vec<Box<dyn InstallStep>>,
    execution_id: String,
}

impl InstallSequence {
    pub fn new(execution_id: String) -> Self {
        Self {
            steps: Vec::new(),
            execution_id,
        }
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    pub fn add_step(&mut self, step: Box<dyn InstallStep>) {
        self.steps.push(step);
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.get_name()).collect()
    }

    pub async fn execute_all(
        &self,
        config: Arc<InstallConfig>,
        host: Arc<dyn Host>,
    ) -> Result<Vec<StepReport>> {
        let mut context = InstallContext::new(self.execution_id.clone(), config, host);

        for step in &self.steps {
            if !step.should_execute(&context) {
                tracing::info!("⏭️ Skipping step: {} (condition not met)", step.get_name());
                continue;
            }

            tracing::info!("▶️ {}", step.get_name());
            let start_time = Instant::now();

            match step.execute(&mut context).await {
                Ok(outcome) => {
                    let report = StepReport {
                        step_name: step.get_name().to_string(),
                        outcome,
                        duration: start_time.elapsed(),
                        metadata: context.take_step_metadata(),
                    };

                    tracing::info!(
                        "✅ Step finished: {} ({}, duration: {:?})",
                        report.step_name,
                        match report.outcome {
                            StepOutcome::Changed => "changed",
                            StepOutcome::Unchanged => "already up to date",
                        },
                        report.duration
                    );

                    context.add_report(report);
                }
                Err(e) => {
                    tracing::error!("❌ Step failed: {}: {}", step.get_name(), e);
                    return Err(InstallError::StepFailed {
                        step: step.get_name().to_string(),
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(context.previous_reports)
    }

    pub fn get_execution_summary(
        execution_id: &str,
        reports: &[StepReport],
    ) -> HashMap<String, serde_json::Value> {
        let mut summary = HashMap::new();

        let changed = reports
            .iter()
            .filter(|r| r.outcome == StepOutcome::Changed)
            .count();
        let total_duration: std::time::Duration = reports.iter().map(|r| r.duration).sum();

        summary.insert(
            "execution_id".to_string(),
            serde_json::Value::String(execution_id.to_string()),
        );
        summary.insert("total_steps".to_string(), serde_json::Value::Number(reports.len().into()));
        summary.insert("changed_steps".to_string(), serde_json::Value::Number(changed.into()));
        summary.insert(
            "total_duration_ms".to_string(),
            serde_json::Value::Number((total_duration.as_millis() as u64).into()),
        );

        let step_names: Vec<serde_json::Value> = reports
            .iter()
            .map(|r| serde_json::Value::String(r.step_name.clone()))
            .collect();
        summary.insert("executed_steps".to_string(), serde_json::Value::Array(step_names));

        summary
    }
}
