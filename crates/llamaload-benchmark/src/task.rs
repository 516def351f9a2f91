use std::time::{Duration, Instant};

use llamaload_core::{
    extract, Extraction, FailureCause, RequestShape, ScenarioSpec, TargetConfig, TaskResult,
};
use tracing::{debug, warn};

use crate::ollama::OllamaClient;

/// Perform one measured request for `scenario` and classify the outcome.
///
/// Single attempt, never retried. Every error is turned into a
/// [`TaskResult::Failure`] here so nothing escapes to the executor.
pub async fn run_task(
    client: &OllamaClient,
    target: &TargetConfig,
    scenario: &ScenarioSpec,
    task_id: usize,
) -> TaskResult {
    let embed_latency = match &scenario.shape {
        RequestShape::Generate => None,
        RequestShape::EmbedThenGenerate { embed_prompt } => {
            Some(timed_embedding(client, target, embed_prompt, task_id).await)
        }
    };

    let start = Instant::now();
    let raw = match client.generate(target, scenario).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(task_id, scenario = %scenario.name, "Request failed: {}", e);
            return TaskResult::failure(task_id, e.failure_cause(), e.to_string());
        }
    };
    let wall = start.elapsed();

    match extract(Some(&raw), wall) {
        Extraction::Metrics(metrics) => {
            let metrics = match embed_latency {
                Some(latency) => metrics.with_embed_latency(latency),
                None => metrics,
            };
            debug!(
                task_id,
                tps = metrics.gen_tps,
                tokens = metrics.tokens_out,
                "Request finished in {:.2}s",
                wall.as_secs_f64()
            );
            TaskResult::Success { task_id, metrics }
        }
        Extraction::NoMetrics => {
            TaskResult::failure(task_id, FailureCause::Decode, "response carried no metrics")
        }
    }
}

/// Best-effort embedding call. Its failure does not fail the task.
async fn timed_embedding(
    client: &OllamaClient,
    target: &TargetConfig,
    prompt: &str,
    task_id: usize,
) -> Duration {
    let start = Instant::now();
    if let Err(e) = client.embeddings(target, prompt).await {
        warn!(task_id, "Embedding call failed: {}", e);
    }
    start.elapsed()
}
