use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MetricsRecord, RunSummary};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suite {
    Models,
    Text,
    Vision,
    Load,
}

impl Suite {
    pub fn label(&self) -> &'static str {
        match self {
            Suite::Models => "MODEL SWEEP",
            Suite::Text => "TEXT SUITE",
            Suite::Vision => "VISION SUITE",
            Suite::Load => "LOAD TEST",
        }
    }

    /// File name prefix for the suite's CSV output, if it writes one.
    pub fn csv_prefix(&self) -> Option<&'static str> {
        match self {
            Suite::Models => Some("benchmark_results"),
            Suite::Text => Some("text_benchmark"),
            Suite::Vision => Some("vision_benchmark"),
            Suite::Load => None,
        }
    }
}

/// One successful task, kept for fine-grained tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub model: String,
    pub scenario: String,
    pub concurrency: usize,
    pub metrics: MetricsRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model: String,
    pub avg_tps: f64,
    pub min_tps: f64,
    pub max_tps: f64,
    pub runs: usize,
}

impl ModelSummary {
    /// Summarize a model over its records with non-zero generation speed.
    pub fn from_records(model: &str, records: &[ScenarioRecord]) -> Option<Self> {
        let speeds: Vec<f64> = records
            .iter()
            .filter(|r| r.model == model && r.metrics.gen_tps > 0.0)
            .map(|r| r.metrics.gen_tps)
            .collect();

        if speeds.is_empty() {
            return None;
        }

        Some(Self {
            model: model.to_string(),
            avg_tps: speeds.iter().sum::<f64>() / speeds.len() as f64,
            min_tps: speeds.iter().copied().fold(f64::INFINITY, f64::min),
            max_tps: speeds.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            runs: speeds.len(),
        })
    }
}

/// Everything one sweep produced. Appended to while running, then handed to
/// the reporting side read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResult {
    pub id: Uuid,
    pub suite: Suite,
    pub started_at: DateTime<Local>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Local>>,
    pub runs: Vec<RunSummary>,
    #[serde(default)]
    pub records: Vec<ScenarioRecord>,
    #[serde(default)]
    pub models: Vec<ModelSummary>,
}

impl SweepResult {
    pub fn new(suite: Suite) -> Self {
        Self {
            id: Uuid::new_v4(),
            suite,
            started_at: Local::now(),
            finished_at: None,
            runs: Vec::new(),
            records: Vec::new(),
            models: Vec::new(),
        }
    }

    pub fn push_run(&mut self, summary: RunSummary) {
        self.runs.push(summary);
    }

    pub fn push_record(&mut self, record: ScenarioRecord) {
        self.records.push(record);
    }

    /// Close the sweep and compute per-model rollups, fastest first.
    pub fn finish(&mut self, models: &[String]) {
        self.models = models
            .iter()
            .filter_map(|m| ModelSummary::from_records(m, &self.records))
            .collect();
        self.models.sort_by(|a, b| b.avg_tps.total_cmp(&a.avg_tps));
        self.finished_at = Some(Local::now());
    }

    pub fn total_failures(&self) -> usize {
        self.runs.iter().map(|r| r.failures).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(model: &str, scenario: &str, gen_tps: f64) -> ScenarioRecord {
        ScenarioRecord {
            model: model.to_string(),
            scenario: scenario.to_string(),
            concurrency: 1,
            metrics: MetricsRecord {
                gen_tps,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_model_summary_skips_zero_speed() {
        let records = vec![
            record("gemma3:27b", "Coding Task", 20.0),
            record("gemma3:27b", "Logic Puzzle", 0.0),
            record("gemma3:27b", "JSON Data", 40.0),
            record("qwen3:30b", "Coding Task", 90.0),
        ];
        let summary = ModelSummary::from_records("gemma3:27b", &records).unwrap();
        assert_eq!(summary.runs, 2);
        assert_eq!(summary.avg_tps, 30.0);
        assert_eq!(summary.min_tps, 20.0);
        assert_eq!(summary.max_tps, 40.0);
    }

    #[test]
    fn test_model_without_records_has_no_summary() {
        assert!(ModelSummary::from_records("missing", &[]).is_none());
    }

    #[test]
    fn test_finish_sorts_fastest_first() {
        let mut sweep = SweepResult::new(Suite::Models);
        sweep.push_record(record("slow", "a", 10.0));
        sweep.push_record(record("fast", "a", 80.0));
        sweep.finish(&["slow".to_string(), "fast".to_string(), "down".to_string()]);

        let order: Vec<&str> = sweep.models.iter().map(|m| m.model.as_str()).collect();
        assert_eq!(order, vec!["fast", "slow"]);
        assert!(sweep.finished_at.is_some());
    }

    #[test]
    fn test_csv_prefix() {
        assert_eq!(Suite::Text.csv_prefix(), Some("text_benchmark"));
        assert_eq!(Suite::Load.csv_prefix(), None);
    }
}
