use std::fmt;

use serde::{Deserialize, Serialize};

use crate::MetricsRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum FailureCause {
    Transport,
    Timeout,
    Status(u16),
    Decode,
    Panicked,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Transport => write!(f, "transport"),
            FailureCause::Timeout => write!(f, "timeout"),
            FailureCause::Status(code) => write!(f, "HTTP {}", code),
            FailureCause::Decode => write!(f, "decode"),
            FailureCause::Panicked => write!(f, "panicked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskError {
    pub task_id: usize,
    pub cause: FailureCause,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult {
    Success { task_id: usize, metrics: MetricsRecord },
    Failure(TaskError),
}

impl TaskResult {
    pub fn failure(task_id: usize, cause: FailureCause, detail: impl Into<String>) -> Self {
        TaskResult::Failure(TaskError {
            task_id,
            cause,
            detail: detail.into(),
        })
    }

    pub fn task_id(&self) -> usize {
        match self {
            TaskResult::Success { task_id, .. } => *task_id,
            TaskResult::Failure(e) => e.task_id,
        }
    }

    pub fn metrics(&self) -> Option<&MetricsRecord> {
        match self {
            TaskResult::Success { metrics, .. } => Some(metrics),
            TaskResult::Failure(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskResult::Success { .. })
    }
}

/// Which latency figure feeds the run's latency and system throughput.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyBasis {
    /// Server-reported `total_duration`.
    #[default]
    Server,
    /// Client-measured wall time.
    Wall,
}

impl LatencyBasis {
    fn of(self, m: &MetricsRecord) -> f64 {
        match self {
            LatencyBasis::Server => m.latency_secs,
            LatencyBasis::Wall => m.wall_secs,
        }
    }
}

/// Advisory health of one run. Never affects control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Pass,
    Warn,
    Fail,
    Critical,
}

impl RunStatus {
    pub fn classify(concurrency: usize, failures: usize) -> Self {
        if failures == concurrency {
            return RunStatus::Critical;
        }
        // more than 20% failed; a single-user run can only warn
        if concurrency > 1 && failures * 5 > concurrency {
            return RunStatus::Fail;
        }
        if failures > 0 {
            return RunStatus::Warn;
        }
        RunStatus::Pass
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pass => "PASS",
            RunStatus::Warn => "WARN",
            RunStatus::Fail => "FAIL",
            RunStatus::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub model: String,
    pub scenario: String,
    pub concurrency: usize,
    pub successes: usize,
    pub failures: usize,
    pub avg_tps: f64,
    pub min_tps: f64,
    pub max_tps: f64,
    pub avg_prompt_tps: f64,
    pub avg_latency_secs: f64,
    pub min_latency_secs: f64,
    pub max_latency_secs: f64,
    pub avg_prompt_eval_secs: f64,
    #[serde(default)]
    pub avg_embed_latency_secs: Option<f64>,
    pub total_tokens: u64,
    pub system_throughput: f64,
    pub status: RunStatus,
    #[serde(default)]
    pub errors: Vec<TaskError>,
}

impl RunSummary {
    /// Reduce one batch into a summary. Order of `results` does not matter.
    pub fn from_results(
        model: &str,
        scenario: &str,
        results: &[TaskResult],
        basis: LatencyBasis,
    ) -> Self {
        let concurrency = results.len();
        let successes: Vec<&MetricsRecord> = results.iter().filter_map(TaskResult::metrics).collect();
        let mut errors: Vec<TaskError> = results
            .iter()
            .filter_map(|r| match r {
                TaskResult::Failure(e) => Some(e.clone()),
                TaskResult::Success { .. } => None,
            })
            .collect();
        errors.sort_by_key(|e| e.task_id);

        let s = successes.len();
        let failures = concurrency - s;
        let status = RunStatus::classify(concurrency, failures);

        if s == 0 {
            return Self {
                model: model.to_string(),
                scenario: scenario.to_string(),
                concurrency,
                successes: 0,
                failures,
                avg_tps: 0.0,
                min_tps: 0.0,
                max_tps: 0.0,
                avg_prompt_tps: 0.0,
                avg_latency_secs: 0.0,
                min_latency_secs: 0.0,
                max_latency_secs: 0.0,
                avg_prompt_eval_secs: 0.0,
                avg_embed_latency_secs: None,
                total_tokens: 0,
                system_throughput: 0.0,
                status,
                errors,
            };
        }

        let n = s as f64;
        let avg_tps = successes.iter().map(|m| m.gen_tps).sum::<f64>() / n;
        let min_tps = successes
            .iter()
            .map(|m| m.gen_tps)
            .fold(f64::INFINITY, f64::min);
        let max_tps = successes
            .iter()
            .map(|m| m.gen_tps)
            .fold(f64::NEG_INFINITY, f64::max);
        let avg_prompt_tps = successes.iter().map(|m| m.prompt_tps).sum::<f64>() / n;
        let avg_latency_secs = successes.iter().map(|m| basis.of(m)).sum::<f64>() / n;
        let min_latency_secs = successes
            .iter()
            .map(|m| basis.of(m))
            .fold(f64::INFINITY, f64::min);
        let max_latency_secs = successes
            .iter()
            .map(|m| basis.of(m))
            .fold(0.0, f64::max);
        let avg_prompt_eval_secs = successes.iter().map(|m| m.prompt_eval_secs).sum::<f64>() / n;

        let embed: Vec<f64> = successes
            .iter()
            .filter_map(|m| m.embed_latency_secs)
            .collect();
        let avg_embed_latency_secs =
            (!embed.is_empty()).then(|| embed.iter().sum::<f64>() / embed.len() as f64);

        let total_tokens: u64 = successes.iter().map(|m| m.tokens_out).sum();
        let system_throughput = system_throughput(total_tokens, max_latency_secs);

        Self {
            model: model.to_string(),
            scenario: scenario.to_string(),
            concurrency,
            successes: s,
            failures,
            avg_tps,
            min_tps,
            max_tps,
            avg_prompt_tps,
            avg_latency_secs,
            min_latency_secs,
            max_latency_secs,
            avg_prompt_eval_secs,
            avg_embed_latency_secs,
            total_tokens,
            system_throughput,
            status,
            errors,
        }
    }
}

/// Tokens the server produced per second while carrying the whole batch,
/// normalized by the slowest successful request.
pub fn system_throughput(total_tokens: u64, max_latency_secs: f64) -> f64 {
    if max_latency_secs > 0.0 && max_latency_secs.is_finite() {
        total_tokens as f64 / max_latency_secs
    } else {
        0.0
    }
}
