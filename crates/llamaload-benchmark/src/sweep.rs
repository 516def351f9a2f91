use std::sync::Arc;

use llamaload_core::{
    Result, RunSummary, ScenarioRecord, ScenarioSpec, SuitePlan, SweepResult, TargetConfig,
    TaskError, TaskResult,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::executor::run_scenario;
use crate::ollama::OllamaClient;
use crate::task::run_task;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SweepEvent {
    Warmup { model: String },
    WarmupFailed { model: String, message: String },
    RunStarted { model: String, scenario: String, concurrency: usize, current: usize, total: usize },
    TaskFailed { error: TaskError },
    RunComplete { summary: RunSummary, records: Vec<ScenarioRecord> },
    Done,
}

/// Drives a suite plan: warmup, then one measured run per
/// (model, concurrency level, scenario), strictly one after another.
pub struct SweepController {
    client: OllamaClient,
}

impl SweepController {
    pub fn new() -> Self {
        Self {
            client: OllamaClient::new(),
        }
    }

    pub fn with_client(client: OllamaClient) -> Self {
        Self { client }
    }

    /// Run the whole plan. Progress goes to `tx`; a closed receiver only
    /// silences progress, the sweep carries on.
    #[instrument(skip_all, fields(suite = ?plan.suite, runs = plan.total_runs()))]
    pub async fn run(&self, plan: &SuitePlan, tx: mpsc::Sender<SweepEvent>) -> Result<SweepResult> {
        plan.validate()?;
        info!("Starting sweep");

        let mut sweep = SweepResult::new(plan.suite);
        let total = plan.total_runs();
        let mut current = 0;

        for target in &plan.targets {
            let target = Arc::new(target.clone());

            if let Some(warmup) = &plan.warmup {
                self.warmup(&target, warmup, &tx).await;
                if !plan.warmup_pause.is_zero() {
                    tokio::time::sleep(plan.warmup_pause).await;
                }
            }

            for &level in &plan.levels {
                for scenario in &plan.scenarios {
                    current += 1;
                    let _ = tx
                        .send(SweepEvent::RunStarted {
                            model: target.model.clone(),
                            scenario: scenario.name.clone(),
                            concurrency: level,
                            current,
                            total,
                        })
                        .await;

                    let results =
                        run_scenario(&self.client, Arc::clone(&target), Arc::clone(scenario), level)
                            .await;
                    let kept = sweep.records.len();
                    let summary = Self::record_run(plan, &target, scenario, level, &results, &mut sweep);
                    let records = sweep.records[kept..].to_vec();

                    for error in &summary.errors {
                        let _ = tx.send(SweepEvent::TaskFailed { error: error.clone() }).await;
                    }
                    let _ = tx.send(SweepEvent::RunComplete { summary, records }).await;

                    if current < total && !plan.pause.is_zero() {
                        tokio::time::sleep(plan.pause).await;
                    }
                }
            }
        }

        let models: Vec<String> = plan.targets.iter().map(|t| t.model.clone()).collect();
        sweep.finish(&models);
        info!(failures = sweep.total_failures(), "Sweep complete");
        let _ = tx.send(SweepEvent::Done).await;

        Ok(sweep)
    }

    /// Unmeasured request to get the model resident. Failures are ignored.
    async fn warmup(
        &self,
        target: &TargetConfig,
        warmup: &ScenarioSpec,
        tx: &mpsc::Sender<SweepEvent>,
    ) {
        info!("Warming up model: {}", target.model);
        let _ = tx
            .send(SweepEvent::Warmup {
                model: target.model.clone(),
            })
            .await;

        if let TaskResult::Failure(e) = run_task(&self.client, target, warmup, 0).await {
            warn!("Warmup failed for {}: {}", target.model, e.detail);
            let _ = tx
                .send(SweepEvent::WarmupFailed {
                    model: target.model.clone(),
                    message: e.detail,
                })
                .await;
        }
    }

    fn record_run(
        plan: &SuitePlan,
        target: &TargetConfig,
        scenario: &ScenarioSpec,
        level: usize,
        results: &[TaskResult],
        sweep: &mut SweepResult,
    ) -> RunSummary {
        let summary =
            RunSummary::from_results(&target.model, &scenario.name, results, plan.latency_basis);

        info!(
            model = %target.model,
            scenario = %scenario.name,
            users = level,
            status = summary.status.as_str(),
            "Success/Fail {}/{}, avg {:.2} t/s, system {:.2} t/s",
            summary.successes,
            summary.failures,
            summary.avg_tps,
            summary.system_throughput
        );

        if plan.keep_records {
            for metrics in results.iter().filter_map(TaskResult::metrics) {
                sweep.push_record(ScenarioRecord {
                    model: target.model.clone(),
                    scenario: scenario.name.clone(),
                    concurrency: level,
                    metrics: metrics.clone(),
                });
            }
        }

        sweep.push_run(summary.clone());
        summary
    }
}

impl Default for SweepController {
    fn default() -> Self {
        Self::new()
    }
}
