pub mod config;
pub mod error;
pub mod metrics;
pub mod scenario;
pub mod summary;
pub mod sweep;

pub use config::{LlamaLoadConfig, OllamaConfig, OutputConfig, SuitePlan, TargetConfig, DEFAULT_API_BASE};
pub use error::{LlamaLoadError, Result};
pub use metrics::{extract, Extraction, MetricsRecord, RawServiceResponse};
pub use scenario::{RequestOptions, RequestShape, ScenarioSpec};
pub use summary::{
    system_throughput, FailureCause, LatencyBasis, RunStatus, RunSummary, TaskError, TaskResult,
};
pub use sweep::{ModelSummary, ScenarioRecord, Suite, SweepResult};
