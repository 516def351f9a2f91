use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Timing fields of an Ollama `/generate` response.
///
/// Every field is optional on the wire. Absent, null, negative or non-numeric
/// values all read as 0, which the extractor treats as "no signal".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawServiceResponse {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub eval_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub eval_duration: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub prompt_eval_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub prompt_eval_duration: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_duration: u64,
}

fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Number(n) = value else {
        return Ok(0);
    };

    Ok(n.as_u64()
        .or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f > 0.0)
                .map(|f| f as u64)
        })
        .unwrap_or(0))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Output tokens per second during generation.
    pub gen_tps: f64,
    /// Input tokens per second during prompt processing.
    pub prompt_tps: f64,
    /// Server-reported request span in seconds.
    pub latency_secs: f64,
    pub tokens_out: u64,
    pub prompt_tokens: u64,
    /// Prompt processing time; for vision prompts this is the image encoder.
    pub prompt_eval_secs: f64,
    /// Client-measured wall time of the generate call.
    pub wall_secs: f64,
    #[serde(default)]
    pub embed_latency_secs: Option<f64>,
}

impl MetricsRecord {
    pub fn with_embed_latency(mut self, latency: Duration) -> Self {
        self.embed_latency_secs = Some(latency.as_secs_f64());
        self
    }
}

/// Outcome of metrics extraction.
///
/// `NoMetrics` means there was nothing to measure, which is distinct from a
/// response whose measured throughput happens to be zero.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Metrics(MetricsRecord),
    NoMetrics,
}

impl Extraction {
    pub fn into_metrics(self) -> Option<MetricsRecord> {
        match self {
            Extraction::Metrics(m) => Some(m),
            Extraction::NoMetrics => None,
        }
    }
}

pub fn extract(response: Option<&RawServiceResponse>, wall: Duration) -> Extraction {
    let Some(raw) = response else {
        return Extraction::NoMetrics;
    };

    Extraction::Metrics(MetricsRecord {
        gen_tps: per_second(raw.eval_count, raw.eval_duration),
        prompt_tps: per_second(raw.prompt_eval_count, raw.prompt_eval_duration),
        latency_secs: raw.total_duration as f64 / NANOS_PER_SEC,
        tokens_out: raw.eval_count,
        prompt_tokens: raw.prompt_eval_count,
        prompt_eval_secs: raw.prompt_eval_duration as f64 / NANOS_PER_SEC,
        wall_secs: wall.as_secs_f64(),
        embed_latency_secs: None,
    })
}

fn per_second(count: u64, duration_ns: u64) -> f64 {
    if duration_ns == 0 {
        return 0.0;
    }
    count as f64 / (duration_ns as f64 / NANOS_PER_SEC)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(raw: &RawServiceResponse) -> MetricsRecord {
        extract(Some(raw), Duration::from_millis(1500))
            .into_metrics()
            .unwrap()
    }

    #[test]
    fn test_throughput_from_durations() {
        let raw = RawServiceResponse {
            eval_count: 100,
            eval_duration: 2_000_000_000,
            prompt_eval_count: 30,
            prompt_eval_duration: 500_000_000,
            total_duration: 3_000_000_000,
        };
        let m = metrics(&raw);
        assert_eq!(m.gen_tps, 50.0);
        assert_eq!(m.prompt_tps, 60.0);
        assert_eq!(m.latency_secs, 3.0);
        assert_eq!(m.prompt_eval_secs, 0.5);
        assert_eq!(m.tokens_out, 100);
        assert_eq!(m.prompt_tokens, 30);
        assert_eq!(m.wall_secs, 1.5);
        assert_eq!(m.embed_latency_secs, None);
    }

    #[test]
    fn test_zero_eval_duration_yields_zero_throughput() {
        let raw = RawServiceResponse {
            eval_count: 42,
            ..Default::default()
        };
        let m = metrics(&raw);
        assert_eq!(m.gen_tps, 0.0);
        assert_eq!(m.prompt_tps, 0.0);
        assert!(m.gen_tps.is_finite());
        assert_eq!(m.tokens_out, 42);
    }

    #[test]
    fn test_missing_response_is_no_metrics() {
        assert_eq!(extract(None, Duration::ZERO), Extraction::NoMetrics);
        assert!(extract(None, Duration::ZERO).into_metrics().is_none());
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let raw: RawServiceResponse =
            serde_json::from_str(r#"{"response": "hello", "done": true}"#).unwrap();
        assert_eq!(raw, RawServiceResponse::default());
    }

    #[test]
    fn test_malformed_fields_default_to_zero() {
        let raw: RawServiceResponse = serde_json::from_str(
            r#"{"eval_count": "abc", "eval_duration": null, "prompt_eval_count": -4,
                "prompt_eval_duration": [1], "total_duration": 2.5e9}"#,
        )
        .unwrap();
        assert_eq!(raw.eval_count, 0);
        assert_eq!(raw.eval_duration, 0);
        assert_eq!(raw.prompt_eval_count, 0);
        assert_eq!(raw.prompt_eval_duration, 0);
        assert_eq!(raw.total_duration, 2_500_000_000);
    }

    #[test]
    fn test_embed_latency_attached() {
        let m = metrics(&RawServiceResponse::default())
            .with_embed_latency(Duration::from_millis(250));
        assert_eq!(m.embed_latency_secs, Some(0.25));
    }
}
