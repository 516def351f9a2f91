use serde::{Deserialize, Serialize};

/// Sampling options forwarded verbatim as the `options` object of a generate call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
}

impl RequestOptions {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.num_predict.is_none() && self.num_ctx.is_none()
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn num_predict(mut self, num_predict: i32) -> Self {
        self.num_predict = Some(num_predict);
        self
    }

    pub fn num_ctx(mut self, num_ctx: u32) -> Self {
        self.num_ctx = Some(num_ctx);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestShape {
    /// A single `/generate` call.
    Generate,
    /// An `/embeddings` call timed as auxiliary latency, then `/generate`.
    EmbedThenGenerate { embed_prompt: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    pub prompt: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub options: RequestOptions,
    pub shape: RequestShape,
}

impl ScenarioSpec {
    pub fn generate(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            images: Vec::new(),
            options: RequestOptions::default(),
            shape: RequestShape::Generate,
        }
    }

    pub fn embed_then_generate(
        name: impl Into<String>,
        embed_prompt: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            shape: RequestShape::EmbedThenGenerate {
                embed_prompt: embed_prompt.into(),
            },
            ..Self::generate(name, prompt)
        }
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_image(mut self, image_b64: impl Into<String>) -> Self {
        self.images.push(image_b64.into());
        self
    }

    pub fn needs_embeddings(&self) -> bool {
        matches!(self.shape, RequestShape::EmbedThenGenerate { .. })
    }
}
