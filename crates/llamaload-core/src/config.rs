use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{LatencyBasis, LlamaLoadError, Result, ScenarioSpec, Suite};

pub const DEFAULT_API_BASE: &str = "http://localhost:11434/api";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlamaLoadConfig {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// API root; `/generate` and `/embeddings` are appended to it.
    pub api_base: String,
    pub timeout_secs: Option<u64>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub write_csv: bool,
    pub json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            write_csv: true,
            json: false,
        }
    }
}

/// One model behind one endpoint. Immutable for the whole sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub api_base: String,
    pub model: String,
    #[serde(default)]
    pub embed_model: Option<String>,
    /// Per-request bound, kept at full precision.
    pub timeout: Duration,
}

impl TargetConfig {
    pub fn new(api_base: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: model.into(),
            embed_model: None,
            timeout,
        }
    }

    pub fn with_embed_model(mut self, embed_model: impl Into<String>) -> Self {
        self.embed_model = Some(embed_model.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn generate_url(&self) -> String {
        format!("{}/generate", self.api_base)
    }

    pub fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.api_base)
    }
}

/// Everything the sweep controller needs to run one suite.
#[derive(Debug, Clone)]
pub struct SuitePlan {
    pub suite: Suite,
    pub targets: Vec<TargetConfig>,
    pub scenarios: Vec<Arc<ScenarioSpec>>,
    pub warmup: Option<Arc<ScenarioSpec>>,
    pub levels: Vec<usize>,
    pub pause: Duration,
    pub warmup_pause: Duration,
    pub latency_basis: LatencyBasis,
    /// Keep per-task records in the sweep result for the detailed table.
    pub keep_records: bool,
}

impl SuitePlan {
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(LlamaLoadError::Config("no models to benchmark".into()));
        }
        if self.scenarios.is_empty() {
            return Err(LlamaLoadError::Config("no scenarios configured".into()));
        }
        if self.levels.is_empty() {
            return Err(LlamaLoadError::Config("no concurrency levels configured".into()));
        }
        if let Some(level) = self.levels.iter().find(|&&l| l == 0) {
            return Err(LlamaLoadError::Config(format!(
                "invalid concurrency level: {}",
                level
            )));
        }

        if let Some(target) = self.targets.iter().find(|t| t.timeout.is_zero()) {
            return Err(LlamaLoadError::Config(format!(
                "request timeout for {} must be greater than zero",
                target.model
            )));
        }

        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if !seen.insert(scenario.name.as_str()) {
                return Err(LlamaLoadError::Config(format!(
                    "duplicate scenario name: {}",
                    scenario.name
                )));
            }
            if scenario.needs_embeddings() {
                if let Some(target) = self.targets.iter().find(|t| t.embed_model.is_none()) {
                    return Err(LlamaLoadError::Config(format!(
                        "scenario {} needs an embedding model for {}",
                        scenario.name, target.model
                    )));
                }
            }
        }

        Ok(())
    }

    /// Number of measured runs the sweep will execute.
    pub fn total_runs(&self) -> usize {
        self.targets.len() * self.levels.len() * self.scenarios.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> SuitePlan {
        SuitePlan {
            suite: Suite::Text,
            targets: vec![TargetConfig::new(
                "http://localhost:11434/api/",
                "qwen3:30b",
                Duration::from_secs(60),
            )],
            scenarios: vec![Arc::new(ScenarioSpec::generate("CHAT_LIGHT", "hi"))],
            warmup: None,
            levels: vec![1, 8],
            pause: Duration::ZERO,
            warmup_pause: Duration::ZERO,
            latency_basis: LatencyBasis::Server,
            keep_records: false,
        }
    }

    #[test]
    fn test_target_urls_strip_trailing_slash() {
        let target = &plan().targets[0];
        assert_eq!(target.generate_url(), "http://localhost:11434/api/generate");
        assert_eq!(target.embeddings_url(), "http://localhost:11434/api/embeddings");
        assert_eq!(target.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_sub_second_timeout_kept() {
        let target = TargetConfig::new("http://host/api", "m", Duration::from_millis(1500));
        assert_eq!(target.timeout(), Duration::from_millis(1500));

        let target = TargetConfig::new("http://host/api", "m", Duration::from_millis(250));
        assert_eq!(target.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut plan = plan();
        plan.targets[0].timeout = Duration::ZERO;
        assert!(matches!(plan.validate(), Err(LlamaLoadError::Config(_))));
    }

    #[test]
    fn test_valid_plan() {
        let plan = plan();
        assert!(plan.validate().is_ok());
        assert_eq!(plan.total_runs(), 2);
    }

    #[test]
    fn test_zero_level_rejected() {
        let mut plan = plan();
        plan.levels = vec![1, 0];
        assert!(matches!(plan.validate(), Err(LlamaLoadError::Config(_))));
    }

    #[test]
    fn test_duplicate_scenario_rejected() {
        let mut plan = plan();
        plan.scenarios.push(Arc::new(ScenarioSpec::generate("CHAT_LIGHT", "again")));
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_rag_needs_embed_model() {
        let mut plan = plan();
        plan.scenarios
            .push(Arc::new(ScenarioSpec::embed_then_generate("RAG_FLOW", "q", "a")));
        assert!(plan.validate().is_err());

        plan.targets[0] = plan.targets[0].clone().with_embed_model("qwen3-embedding:4b");
        assert!(plan.validate().is_ok());
    }
}
