mod csv_sink;
mod report;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use llamaload_benchmark::{suites, SweepController};
use llamaload_core::{LlamaLoadConfig, OllamaConfig, OutputConfig, SuitePlan, DEFAULT_API_BASE};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::csv_sink::CsvSink;
use crate::report::Progress;

#[derive(Parser)]
#[command(name = "llamaload")]
#[command(about = "LlamaLoad - Ollama load tests and throughput sweeps", long_about = None)]
struct Cli {
    /// Ollama API root, e.g. http://localhost:11434/api
    #[arg(long, global = true, env = "OLLAMA_API")]
    url: Option<String>,

    /// Per-request timeout in seconds (suite default if unset)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Directory for CSV output
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// Do not write a CSV file
    #[arg(long, global = true)]
    no_csv: bool,

    /// Print the sweep result as JSON when done
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run each scenario once on every model and rank them by speed
    Models {
        /// Models to compare, space or comma separated (built-in list if omitted)
        #[arg(short, long, num_args = 1.., value_delimiter = ',')]
        models: Vec<String>,
    },

    /// Text workloads (chat, coding, RAG) at rising concurrency
    Text {
        #[arg(short, long, default_value = suites::DEFAULT_TEXT_MODEL)]
        model: String,

        #[arg(long, default_value = suites::DEFAULT_EMBED_MODEL)]
        embed_model: String,

        /// Concurrency levels, comma separated
        #[arg(short, long, value_delimiter = ',')]
        levels: Vec<usize>,

        /// Add a long-context summarization scenario
        #[arg(long)]
        long_context: bool,
    },

    /// Visual QA on a small image at rising concurrency
    Vision {
        #[arg(short, long, default_value = suites::DEFAULT_VISION_MODEL)]
        model: String,

        /// Concurrency levels, comma separated
        #[arg(short, long, value_delimiter = ',')]
        levels: Vec<usize>,
    },

    /// Fire N simultaneous requests once and report latency spread
    Load {
        #[arg(short, long, default_value = suites::DEFAULT_LOAD_MODEL)]
        model: String,

        /// Number of simultaneous users
        #[arg(short, long, default_value_t = suites::DEFAULT_LOAD_USERS)]
        users: usize,
    },
}

/// `--url`/`OLLAMA_API` wins, then `OLLAMA_HOST` with `/api` appended, then
/// the local default.
fn resolve_api_base(url: Option<String>, ollama_host: Option<String>) -> String {
    if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
        return url.trim().trim_end_matches('/').to_string();
    }

    match ollama_host.filter(|h| !h.trim().is_empty()) {
        Some(host) => {
            let host = host.trim().trim_end_matches('/');
            if host.contains("://") {
                format!("{}/api", host)
            } else {
                format!("http://{}/api", host)
            }
        }
        None => DEFAULT_API_BASE.to_string(),
    }
}

fn non_empty(levels: Vec<usize>) -> Option<Vec<usize>> {
    (!levels.is_empty()).then_some(levels)
}

impl Cli {
    fn config(&self) -> LlamaLoadConfig {
        LlamaLoadConfig {
            ollama: OllamaConfig {
                api_base: resolve_api_base(self.url.clone(), std::env::var("OLLAMA_HOST").ok()),
                timeout_secs: self.timeout_secs,
            },
            output: OutputConfig {
                dir: self.output_dir.clone(),
                write_csv: !self.no_csv,
                json: self.json,
            },
        }
    }

    fn plan(&self, config: &LlamaLoadConfig) -> SuitePlan {
        let api_base = config.ollama.api_base.as_str();
        let timeout = config.ollama.timeout_secs.map(Duration::from_secs);

        match &self.command {
            Commands::Models { models } => {
                let models = if models.is_empty() {
                    suites::DEFAULT_SWEEP_MODELS
                        .iter()
                        .map(|m| m.to_string())
                        .collect()
                } else {
                    models.clone()
                };
                suites::models_plan(api_base, &models, timeout)
            }
            Commands::Text {
                model,
                embed_model,
                levels,
                long_context,
            } => {
                let mut plan = suites::text_plan(
                    api_base,
                    model,
                    embed_model,
                    non_empty(levels.clone()),
                    timeout,
                );
                if *long_context {
                    plan.scenarios.push(Arc::new(suites::long_summarize_scenario()));
                }
                plan
            }
            Commands::Vision { model, levels } => {
                suites::vision_plan(api_base, model, non_empty(levels.clone()), timeout)
            }
            Commands::Load { model, users } => suites::load_plan(api_base, model, *users, timeout),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    let plan = cli.plan(&config);
    plan.validate()?;

    report::print_banner(&plan);

    let sink = if config.output.write_csv {
        CsvSink::create(plan.suite, &config.output.dir).unwrap_or_else(|e| {
            warn!("CSV output disabled: {:#}", e);
            None
        })
    } else {
        None
    };
    if let Some(sink) = &sink {
        info!("Writing results to {}", sink.path().display());
    }

    let (tx, rx) = mpsc::channel(256);
    let progress = tokio::spawn(Progress::new(plan.suite, sink).drain(rx));

    let sweep = SweepController::new().run(&plan, tx).await?;
    progress.await?;

    report::print_summary(&sweep);
    report::print_banner(&plan);

    if config.output.json {
        println!("{}", serde_json::to_string_pretty(&sweep)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_api_base_precedence() {
        assert_eq!(
            resolve_api_base(Some("http://gpu:11434/api/".into()), Some("other:1".into())),
            "http://gpu:11434/api"
        );
        assert_eq!(
            resolve_api_base(None, Some("10.0.0.5:11434".into())),
            "http://10.0.0.5:11434/api"
        );
        assert_eq!(
            resolve_api_base(None, Some("https://ollama.lan/".into())),
            "https://ollama.lan/api"
        );
        assert_eq!(resolve_api_base(Some("  ".into()), None), DEFAULT_API_BASE);
        assert_eq!(resolve_api_base(None, None), DEFAULT_API_BASE);
    }

    #[test]
    fn test_text_plan_from_args() {
        let cli = Cli::parse_from([
            "llamaload",
            "--url",
            "http://gpu:11434/api",
            "text",
            "--levels",
            "1,4",
            "--long-context",
        ]);
        let config = cli.config();
        let plan = cli.plan(&config);

        assert_eq!(plan.levels, vec![1, 4]);
        assert_eq!(plan.scenarios.len(), 4);
        assert_eq!(plan.targets[0].api_base, "http://gpu:11434/api");
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_models_list_accepts_spaces_and_commas() {
        let cli = Cli::parse_from(["llamaload", "models", "--models", "a", "b", "c"]);
        let plan = cli.plan(&cli.config());
        let models: Vec<&str> = plan.targets.iter().map(|t| t.model.as_str()).collect();
        assert_eq!(models, vec!["a", "b", "c"]);

        let cli = Cli::parse_from(["llamaload", "models", "-m", "a,b", "c", "--no-csv"]);
        let plan = cli.plan(&cli.config());
        let models: Vec<&str> = plan.targets.iter().map(|t| t.model.as_str()).collect();
        assert_eq!(models, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_models_default_list() {
        let cli = Cli::parse_from(["llamaload", "--no-csv", "models"]);
        let config = cli.config();
        let plan = cli.plan(&config);

        assert!(!config.output.write_csv);
        assert_eq!(plan.targets.len(), suites::DEFAULT_SWEEP_MODELS.len());
        assert_eq!(plan.levels, vec![1]);
    }

    #[test]
    fn test_load_users_and_timeout() {
        let cli = Cli::parse_from(["llamaload", "load", "-u", "3", "--timeout-secs", "5"]);
        let config = cli.config();
        let plan = cli.plan(&config);

        assert_eq!(plan.levels, vec![3]);
        assert_eq!(plan.targets[0].timeout(), Duration::from_secs(5));
        assert_eq!(plan.targets[0].model, suites::DEFAULT_LOAD_MODEL);
    }
}
