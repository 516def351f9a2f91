use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use llamaload_core::{RunSummary, ScenarioRecord, Suite};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ModelRow<'a> {
    model: &'a str,
    scenario: &'a str,
    tps: f64,
    tokens: u64,
}

#[derive(Debug, Serialize)]
struct TextRow<'a> {
    time: String,
    scenario: &'a str,
    users: usize,
    successes: usize,
    failures: usize,
    avg_tps: f64,
    min_tps: f64,
    max_tps: f64,
    prompt_tps: f64,
    sys_throughput: f64,
    latency: f64,
    total_tokens: u64,
}

#[derive(Debug, Serialize)]
struct VisionRow<'a> {
    time: String,
    scenario: &'a str,
    users: usize,
    successes: usize,
    failures: usize,
    avg_tps: f64,
    min_tps: f64,
    max_tps: f64,
    img_proc_time: f64,
    latency: f64,
    sys_throughput: f64,
    total_tokens: u64,
}

/// Appends one CSV row per finished run. The header goes in only when the
/// file is new or empty.
pub struct CsvSink {
    suite: Suite,
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvSink {
    /// Timestamped file for `suite` under `dir`, or `None` if the suite has
    /// no CSV output.
    pub fn create(suite: Suite, dir: &Path) -> Result<Option<Self>> {
        let Some(prefix) = suite.csv_prefix() else {
            return Ok(None);
        };
        let stamp_format = match suite {
            Suite::Models => "%Y%m%d_%H%M%S",
            _ => "%Y%m%d_%H%M",
        };
        let path = dir.join(format!("{}_{}.csv", prefix, Local::now().format(stamp_format)));
        Self::open(suite, path).map(Some)
    }

    pub fn open(suite: Suite, path: PathBuf) -> Result<Self> {
        let is_new = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);

        Ok(Self {
            suite,
            path,
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, summary: &RunSummary, records: &[ScenarioRecord]) -> Result<()> {
        let time = Local::now().format("%H:%M:%S").to_string();

        match self.suite {
            Suite::Models => {
                for r in records.iter().filter(|r| r.metrics.gen_tps > 0.0) {
                    self.writer.serialize(ModelRow {
                        model: &r.model,
                        scenario: &r.scenario,
                        tps: r.metrics.gen_tps,
                        tokens: r.metrics.tokens_out,
                    })?;
                }
            }
            Suite::Vision => self.writer.serialize(VisionRow {
                time,
                scenario: &summary.scenario,
                users: summary.concurrency,
                successes: summary.successes,
                failures: summary.failures,
                avg_tps: summary.avg_tps,
                min_tps: summary.min_tps,
                max_tps: summary.max_tps,
                img_proc_time: summary.avg_prompt_eval_secs,
                latency: summary.avg_latency_secs,
                sys_throughput: summary.system_throughput,
                total_tokens: summary.total_tokens,
            })?,
            Suite::Text | Suite::Load => self.writer.serialize(TextRow {
                time,
                scenario: &summary.scenario,
                users: summary.concurrency,
                successes: summary.successes,
                failures: summary.failures,
                avg_tps: summary.avg_tps,
                min_tps: summary.min_tps,
                max_tps: summary.max_tps,
                prompt_tps: summary.avg_prompt_tps,
                sys_throughput: summary.system_throughput,
                latency: summary.avg_latency_secs,
                total_tokens: summary.total_tokens,
            })?,
        }

        self.writer.flush()?;
        Ok(())
    }
}
