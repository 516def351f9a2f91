use llamaload_core::{
    LlamaLoadError, RawServiceResponse, RequestOptions, Result, ScenarioSpec, TargetConfig,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const BODY_PREVIEW_CHARS: usize = 500;

/// Thin client over the Ollama HTTP API. Cheap to clone; clones share one
/// connection pool.
#[derive(Debug, Clone, Default)]
pub struct OllamaClient {
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a RequestOptions>,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

impl OllamaClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// One non-streaming `/generate` call, bounded by the target's timeout.
    pub async fn generate(
        &self,
        target: &TargetConfig,
        scenario: &ScenarioSpec,
    ) -> Result<RawServiceResponse> {
        let request = GenerateRequest {
            model: &target.model,
            prompt: &scenario.prompt,
            stream: false,
            images: (!scenario.images.is_empty()).then_some(scenario.images.as_slice()),
            options: (!scenario.options.is_empty()).then_some(&scenario.options),
        };

        let resp = self
            .client
            .post(target.generate_url())
            .timeout(target.timeout())
            .json(&request)
            .send()
            .await
            .map_err(classify)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlamaLoadError::Status {
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        let body = resp.text().await.map_err(classify)?;
        decode_generate(&body)
    }

    /// `/embeddings` call used only for timing. The body is not inspected.
    pub async fn embeddings(&self, target: &TargetConfig, prompt: &str) -> Result<()> {
        let model = target.embed_model.as_deref().unwrap_or(&target.model);
        let request = EmbeddingsRequest { model, prompt };

        let resp = self
            .client
            .post(target.embeddings_url())
            .timeout(target.timeout())
            .json(&request)
            .send()
            .await
            .map_err(classify)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlamaLoadError::Status {
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        resp.bytes().await.map_err(classify)?;
        Ok(())
    }
}

fn decode_generate(body: &str) -> Result<RawServiceResponse> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        LlamaLoadError::Decode(format!("{} - Body: {}", e, preview(body)))
    })?;

    if !value.is_object() {
        return Err(LlamaLoadError::Decode(format!(
            "expected a JSON object - Body: {}",
            preview(body)
        )));
    }

    RawServiceResponse::deserialize(value).map_err(|e| LlamaLoadError::Decode(e.to_string()))
}

fn classify(e: reqwest::Error) -> LlamaLoadError {
    if e.is_timeout() {
        return LlamaLoadError::Timeout(e.to_string());
    }
    if e.is_decode() {
        return LlamaLoadError::Decode(e.to_string());
    }
    LlamaLoadError::Transport(e.to_string())
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_omits_empty_fields() {
        let request = GenerateRequest {
            model: "qwen3:30b",
            prompt: "hi",
            stream: false,
            images: None,
            options: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "model": "qwen3:30b", "prompt": "hi", "stream": false })
        );
    }

    #[test]
    fn test_generate_request_with_images_and_options() {
        let images = vec!["aGVsbG8=".to_string()];
        let options = RequestOptions::default().num_predict(64);
        let request = GenerateRequest {
            model: "qwen3-vl:30b",
            prompt: "Describe this image.",
            stream: false,
            images: Some(images.as_slice()),
            options: Some(&options),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["images"][0], "aGVsbG8=");
        assert_eq!(value["options"]["num_predict"], 64);
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(matches!(decode_generate("[]"), Err(LlamaLoadError::Decode(_))));
        assert!(matches!(decode_generate("not json"), Err(LlamaLoadError::Decode(_))));
    }

    #[test]
    fn test_decode_reads_timings() {
        let raw = decode_generate(r#"{"eval_count": 7, "eval_duration": 1000000000}"#).unwrap();
        assert_eq!(raw.eval_count, 7);
        assert_eq!(raw.eval_duration, 1_000_000_000);
    }

    #[test]
    fn test_preview_is_char_safe() {
        let body = "é".repeat(600);
        assert_eq!(preview(&body).chars().count(), BODY_PREVIEW_CHARS);
    }
}
