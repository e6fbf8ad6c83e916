mod client;
pub(crate) mod types;

use anyhow::{anyhow, Result};
use tracing::warn;

use client::GeminiClient;
use types::*;

const MAX_OUTPUT_TOKENS: u32 = 8192;

// =============================================================================
// Gemini Agent
// =============================================================================

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn client(&self) -> GeminiClient {
        let client = GeminiClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    async fn send(&self, request: GenerateRequest) -> Result<String> {
        let response = self.client().generate(&self.model, &request).await?;

        if let Some(reason) = response.block_reason() {
            return Err(anyhow!("Gemini blocked the prompt: {reason}"));
        }

        match response.text() {
            Some(text) => Ok(text),
            None => {
                warn!(
                    model = %self.model,
                    finish_reason = response.finish_reason().unwrap_or("unknown"),
                    "Gemini returned no text"
                );
                Ok(String::new())
            }
        }
    }

    // =========================================================================
    // Generation modes
    // =========================================================================

    /// Free-form generation with Google Search grounding enabled, so the model
    /// may look up facts the prompt does not contain. Output is plain text and
    /// is not guaranteed to be machine-readable.
    pub async fn generate_with_search(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        let request = GenerateRequest::new(user)
            .system(system)
            .tool(ToolWire::google_search())
            .max_output_tokens(MAX_OUTPUT_TOKENS);

        self.send(request).await
    }

    /// Generation constrained to JSON matching `schema`. No tools: the API does
    /// not allow search grounding together with a response schema.
    pub async fn generate_json(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
        schema: serde_json::Value,
    ) -> Result<String> {
        let request = GenerateRequest::new(user)
            .system(system)
            .temperature(0.0)
            .max_output_tokens(MAX_OUTPUT_TOKENS)
            .json_schema(schema);

        self.send(request).await
    }
}
