use chrono::Local;
use llamaload_benchmark::SweepEvent;
use llamaload_core::{RunStatus, RunSummary, Suite, SuitePlan, SweepResult};
use tokio::sync::mpsc;
use tracing::warn;

use crate::csv_sink::CsvSink;

const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";

fn log(msg: &str) {
    println!("[{}] {}", Local::now().format("%H:%M:%S"), msg);
}

fn status_color(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Pass => GREEN,
        RunStatus::Warn => YELLOW,
        RunStatus::Fail | RunStatus::Critical => RED,
    }
}

pub fn print_banner(plan: &SuitePlan) {
    let models: Vec<&str> = plan.targets.iter().map(|t| t.model.as_str()).collect();
    let levels: Vec<String> = plan.levels.iter().map(|l| l.to_string()).collect();

    println!();
    println!("{:=<72}", "");
    println!("  LlamaLoad {} suite", plan.suite.label());
    println!("{:=<72}", "");
    println!("  Date:         {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("  Models:       {}", models.join(", "));
    if let Some(target) = plan.targets.first() {
        println!("  Endpoint:     {}", target.api_base);
        if let Some(embed) = &target.embed_model {
            println!("  Embed model:  {}", embed);
        }
        println!("  Timeout:      {:?}", target.timeout);
    }
    println!("  Users:        {}", levels.join(", "));
    println!("  Runs:         {}", plan.total_runs());
    println!("{:=<72}", "");
    println!();
}

/// Prints sweep progress as events arrive and feeds finished runs to the
/// CSV sink, if there is one.
pub struct Progress {
    suite: Suite,
    sink: Option<CsvSink>,
}

impl Progress {
    pub fn new(suite: Suite, sink: Option<CsvSink>) -> Self {
        Self { suite, sink }
    }

    pub async fn drain(mut self, mut rx: mpsc::Receiver<SweepEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle(event);
        }
        if let Some(sink) = &self.sink {
            log(&format!("Results saved to: {}", sink.path().display()));
        }
    }

    fn handle(&mut self, event: SweepEvent) {
        match event {
            SweepEvent::Warmup { model } => log(&format!("Warming up {}...", model)),
            SweepEvent::WarmupFailed { model, message } => {
                log(&format!("Warmup failed for {} ({}), continuing", model, message))
            }
            SweepEvent::RunStarted {
                model,
                scenario,
                concurrency,
                current,
                total,
            } => match self.suite {
                Suite::Models => {
                    log(&format!("[{}] Testing: {} [{}/{}]", model, scenario, current, total))
                }
                Suite::Load => log(&format!(
                    "Launching {} simultaneous users against {}...",
                    concurrency, model
                )),
                Suite::Text | Suite::Vision => log(&format!(
                    "--- RUNNING: {} ({} users) [{}/{}] ---",
                    scenario, concurrency, current, total
                )),
            },
            SweepEvent::TaskFailed { error } => {
                println!("   [User {}] failed: {} ({})", error.task_id, error.cause, error.detail)
            }
            SweepEvent::RunComplete { summary, records } => {
                self.print_run(&summary);
                if let Some(sink) = self.sink.as_mut() {
                    if let Err(e) = sink.append(&summary, &records) {
                        warn!("CSV output disabled: {:#}", e);
                        self.sink = None;
                    }
                }
            }
            SweepEvent::Done => {}
        }
    }

    fn print_run(&self, s: &RunSummary) {
        match self.suite {
            Suite::Models if s.successes > 0 => {
                println!("   -> {:.2} t/s ({} tokens)", s.avg_tps, s.total_tokens)
            }
            Suite::Models => println!("   -> failed"),
            Suite::Load => {}
            Suite::Text | Suite::Vision => println!(
                "   -> {}{}{} | OK {}/{} | avg {:.2} t/s | system {:.2} t/s | latency {:.2}s",
                status_color(s.status),
                s.status.as_str(),
                RESET,
                s.successes,
                s.concurrency,
                s.avg_tps,
                s.system_throughput,
                s.avg_latency_secs
            ),
        }
    }
}

pub fn print_summary(sweep: &SweepResult) {
    match sweep.suite {
        Suite::Models => print_models(sweep),
        Suite::Text => print_status_table(sweep, false),
        Suite::Vision => print_status_table(sweep, true),
        Suite::Load => print_load(sweep),
    }
}

fn print_models(sweep: &SweepResult) {
    println!();
    println!("Detailed Results:");
    println!("{:-<72}", "");
    println!("  {:<22} {:<20} {:>10} {:>10}", "Model", "Scenario", "T/s", "Tokens");
    println!("{:-<72}", "");
    for r in sweep.records.iter().filter(|r| r.metrics.gen_tps > 0.0) {
        println!(
            "  {:<22} {:<20} {:>10.2} {:>10}",
            r.model, r.scenario, r.metrics.gen_tps, r.metrics.tokens_out
        );
    }

    println!();
    println!("Model Summary (fastest first):");
    println!("{:-<72}", "");
    println!("  {:<22} {:>10} {:>10} {:>10}", "Model", "Avg T/s", "Min", "Max");
    println!("{:-<72}", "");
    for m in &sweep.models {
        println!(
            "  {:<22} {:>10.2} {:>10.2} {:>10.2}",
            m.model, m.avg_tps, m.min_tps, m.max_tps
        );
    }
    println!();
}

fn print_status_table(sweep: &SweepResult, vision: bool) {
    println!();
    if vision {
        println!(
            "  {:<16} {:>5} {:>5} {:>5} {:>9} {:>9} {:>9}   {}",
            "Scenario", "Users", "Pass", "Fail", "Avg TPS", "Sys T/s", "Img Proc", "Status"
        );
    } else {
        println!(
            "  {:<16} {:>5} {:>5} {:>5} {:>9} {:>9}   {}",
            "Scenario", "Users", "Pass", "Fail", "Avg TPS", "Sys T/s", "Status"
        );
    }
    println!("{:-<80}", "");

    for s in &sweep.runs {
        let status = format!("{}{}{}", status_color(s.status), s.status.as_str(), RESET);
        if vision {
            println!(
                "  {:<16} {:>5} {:>5} {:>5} {:>9.2} {:>9.2} {:>8.2}s   {}",
                s.scenario,
                s.concurrency,
                s.successes,
                s.failures,
                s.avg_tps,
                s.system_throughput,
                s.avg_prompt_eval_secs,
                status
            );
        } else {
            println!(
                "  {:<16} {:>5} {:>5} {:>5} {:>9.2} {:>9.2}   {}",
                s.scenario,
                s.concurrency,
                s.successes,
                s.failures,
                s.avg_tps,
                s.system_throughput,
                status
            );
        }
    }
    println!();
}

fn print_load(sweep: &SweepResult) {
    for s in &sweep.runs {
        println!();
        println!("Load Test Results ({}):", s.model);
        println!("{:-<50}", "");
        println!("  Users:             {}", s.concurrency);
        println!("  Successful:        {}", s.successes);
        println!("  Failed:            {}", s.failures);

        if s.successes == 0 {
            println!("  {}All requests failed{}", RED, RESET);
        } else {
            println!("  Avg latency:       {:.2}s", s.avg_latency_secs);
            println!("  Max latency:       {:.2}s (slowest user)", s.max_latency_secs);
            println!("  Min latency:       {:.2}s (fastest user)", s.min_latency_secs);
            println!("  Avg speed/user:    {:.2} t/s", s.avg_tps);
            println!("  System throughput: {:.2} t/s", s.system_throughput);
        }

        if !s.errors.is_empty() {
            println!();
            println!("Error Log:");
            for e in &s.errors {
                println!("  User {}: {} ({})", e.task_id, e.cause, e.detail);
            }
        }
        println!();
    }
}
