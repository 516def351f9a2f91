//! Built-in suites: scenario prompts, default models, levels and pacing.

use std::sync::Arc;
use std::time::Duration;

use llamaload_core::{LatencyBasis, RequestOptions, ScenarioSpec, Suite, SuitePlan, TargetConfig};

pub const DEFAULT_SWEEP_MODELS: &[&str] = &[
    "gpt-oss:20b",
    "qwen3-vl:30b",
    "gemma3:27b",
    "qwen3:30b",
    "deepseek-r1:32b",
];
pub const DEFAULT_TEXT_MODEL: &str = "qwen3:30b";
pub const DEFAULT_EMBED_MODEL: &str = "qwen3-embedding:4b";
pub const DEFAULT_VISION_MODEL: &str = "qwen3-vl:30b";
pub const DEFAULT_LOAD_MODEL: &str = "qwen3-vl:30b";
pub const DEFAULT_LOAD_USERS: usize = 10;

pub const TEXT_LEVELS: &[usize] = &[1, 8, 16, 32];
pub const VISION_LEVELS: &[usize] = &[1, 4, 8, 12];

const SWEEP_TIMEOUT: Duration = Duration::from_secs(300);
const TEXT_TIMEOUT: Duration = Duration::from_secs(60);
const VISION_TIMEOUT: Duration = Duration::from_secs(300);
const LOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// 32x32 JPEG used by the vision suite.
pub const TEST_IMAGE_B64: &str = concat!(
    "/9j/4AAQSkZJRgABAQAAAQABAAD/2wBDAAgGBgcGBQgHBwcJCQgKDBQNDAsLDBkSEw8UHRofHh0a",
    "HBwgJC4nICIsIxwcKDcpLDAxNDQ0Hyc5PTgyPC4zNDL/2wBDAQkJCQwLDBgNDRgyIRwhMjIyMjIy",
    "MjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjL/wAARCAAgACADASIA",
    "AhEBAxEB/8QAHwAAAQUBAQEBAQEAAAAAAAAAAAECAwQFBgcICQoL/8QAtRAAAgEDAwIEAwUFBAQA",
    "AAF9AQIDAAQRBRIhMUEGE1FhByJxFDKBkaEII0KxwRVS0fAkM2JyggkKFhcYGRolJicoKSo0NTY3",
    "ODk6Q0RFRkdISUpTVFVWV1hZWmNkZWZnaGlqc3R1dnd4eXqDhIWGh4iJipKTlJWWl5iZmqKjpKWm",
    "p6ipqrKztLW2t7i5usLDxMXGx8jJytLT1NXW19jZ2uHi4+Tl5ufo6erx8vP09fb3+Pn6/8QAHwEA",
    "AwEBAQEBAQEBAQAAAAAAAAECAwQFBgcICQoL/8QAtREAAgECBAQDBAcFBAQAAQJ3AAECAxEEBSEx",
    "BhJBUQdhcRMiMoEIFEKRobHBCSMzUvAVYnLRChYkNOEl8RcYGRomJygpKjU2Nzg5OkNERUZHSElK",
    "U1RVVldYWVpjZGVmZ2hpanN0dXZ3eHl6goOEhYaHiImKkpOUlZaXmJmaoqOkpaanqKmqsrO0tba3",
    "uLm6wsPExcbHyMnK0tPU1dbX2Nna4uPk5ebn6Onq8vP09fb3+Pn6/9oADAMBAAIRAxEAPwD5/ooo",
    "oAKKKKACiiigAooooA//2Q==",
);

/// Single-model sweep: every model runs each scenario once.
pub fn models_plan(api_base: &str, models: &[String], timeout: Option<Duration>) -> SuitePlan {
    let options = RequestOptions::default().temperature(0.7).num_predict(-1);
    let scenario = |name: &str, prompt: &str| {
        Arc::new(ScenarioSpec::generate(name, prompt).with_options(options.clone()))
    };

    SuitePlan {
        suite: Suite::Models,
        targets: models
            .iter()
            .map(|m| TargetConfig::new(api_base, m, timeout.unwrap_or(SWEEP_TIMEOUT)))
            .collect(),
        scenarios: vec![
            scenario(
                "Creative Writing",
                "Write a detailed sci-fi story about a civilization living on a dyson sphere. \
                 Describe the environment, the technology, and a conflict over resources. \
                 Write at least 400 words.",
            ),
            scenario(
                "Coding Task",
                "Write a complete Python script to scrape a website using BeautifulSoup. \
                 Include error handling (try-except), headers simulation, and comments.",
            ),
            scenario(
                "Logic Puzzle",
                "Three friends (Alice, Bob, Charlie) are wearing red, blue, and green shirts. \
                 Alice is not wearing red. Bob is not wearing blue. The person in green is \
                 older than Alice. Who is wearing which color? Explain step-by-step.",
            ),
            scenario(
                "JSON Data",
                "Generate a dummy user dataset for 10 people. Return ONLY a raw JSON array. \
                 Each object must have: id, full_name, email, job_title, and bio.",
            ),
        ],
        warmup: Some(scenario("Warmup", "Hi")),
        levels: vec![1],
        pause: Duration::ZERO,
        warmup_pause: Duration::ZERO,
        latency_basis: LatencyBasis::Server,
        keep_records: true,
    }
}

/// Text suite: chat, coding and a RAG flow at rising concurrency.
pub fn text_plan(
    api_base: &str,
    model: &str,
    embed_model: &str,
    levels: Option<Vec<usize>>,
    timeout: Option<Duration>,
) -> SuitePlan {
    let chat = Arc::new(ScenarioSpec::generate(
        "CHAT_LIGHT",
        "Explain clearly what is a Black Hole in 3 sentences.",
    ));

    SuitePlan {
        suite: Suite::Text,
        targets: vec![TargetConfig::new(api_base, model, timeout.unwrap_or(TEXT_TIMEOUT))
            .with_embed_model(embed_model)],
        scenarios: vec![
            Arc::clone(&chat),
            Arc::new(
                ScenarioSpec::generate(
                    "CODING_HEAVY",
                    "Write a Python script to implement A* Search Algorithm with detailed \
                     comments explaining the heuristic function.",
                )
                .with_options(RequestOptions::default().num_predict(512)),
            ),
            Arc::new(ScenarioSpec::embed_then_generate(
                "RAG_FLOW",
                "Database query simulation",
                "Based on this context, answer usage policy.",
            )),
        ],
        warmup: Some(chat),
        levels: levels.unwrap_or_else(|| TEXT_LEVELS.to_vec()),
        pause: Duration::from_secs(2),
        warmup_pause: Duration::ZERO,
        latency_basis: LatencyBasis::Server,
        keep_records: false,
    }
}

/// Long-context summarization prompt, for callers that want to stress
/// prompt processing rather than generation.
pub fn long_summarize_scenario() -> ScenarioSpec {
    let context = "This is a long dummy context about enterprise architecture. ".repeat(200);
    ScenarioSpec::generate(
        "LONG_SUMMARIZE",
        format!("Summarize the following text: {}", context),
    )
}

/// Vision suite: visual QA on a tiny JPEG at rising concurrency.
pub fn vision_plan(
    api_base: &str,
    model: &str,
    levels: Option<Vec<usize>>,
    timeout: Option<Duration>,
) -> SuitePlan {
    let vqa = Arc::new(
        ScenarioSpec::generate("VQA_STANDARD", "Describe this image.")
            .with_image(TEST_IMAGE_B64)
            .with_options(RequestOptions::default().num_predict(64)),
    );

    SuitePlan {
        suite: Suite::Vision,
        targets: vec![TargetConfig::new(api_base, model, timeout.unwrap_or(VISION_TIMEOUT))],
        scenarios: vec![Arc::clone(&vqa)],
        warmup: Some(vqa),
        levels: levels.unwrap_or_else(|| VISION_LEVELS.to_vec()),
        pause: Duration::from_secs(3),
        warmup_pause: Duration::from_secs(2),
        latency_basis: LatencyBasis::Server,
        keep_records: false,
    }
}

/// Raw load test: `users` simultaneous requests, once. Latency is what each
/// user waited, measured on the client.
pub fn load_plan(api_base: &str, model: &str, users: usize, timeout: Option<Duration>) -> SuitePlan {
    SuitePlan {
        suite: Suite::Load,
        targets: vec![TargetConfig::new(api_base, model, timeout.unwrap_or(LOAD_TIMEOUT))],
        scenarios: vec![Arc::new(
            ScenarioSpec::generate(
                "FIBONACCI",
                "Write a python function to calculate fibonacci sequence up to n terms. \
                 Explain the logic briefly.",
            )
            .with_options(RequestOptions::default().num_ctx(4096).temperature(0.7)),
        )],
        warmup: None,
        levels: vec![users],
        pause: Duration::ZERO,
        warmup_pause: Duration::ZERO,
        latency_basis: LatencyBasis::Wall,
        keep_records: false,
    }
}
