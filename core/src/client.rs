use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};

use crate::config::GatewayConfig;
use crate::errors::{GatewayError, GatewayResult};
use crate::formatter::{pending_content, PendingMessage};
use crate::prompt::{FALLBACK_REPLY, SYSTEM_INSTRUCTION, TEMPERATURE};
use crate::types::*;

/// Model used when the config does not name one
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Public Gemini API host
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Remote text generation, one call per student submission.
///
/// `history` is the already formatted replayable history; the gateway adds
/// the pending message as the final `user` entry. On success the returned
/// text is never empty.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn generate(&self, history: Vec<Content>, pending: &PendingMessage)
        -> GatewayResult<String>;
}

/// Client for the Gemini `generateContent` endpoint
#[derive(Clone)]
pub struct GeminiGateway {
    client: Client,
    config: GatewayConfig,
}

impl fmt::Debug for GeminiGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiGateway")
            .field("model_name", &self.config.model_name)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiGateway {
    /// Create a new gateway. The API key comes in through `config`; nothing
    /// is read from the environment here.
    pub fn new(config: GatewayConfig) -> Self {
        info!(model = %config.model_name, "Initialized Gemini gateway");
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.config.model_name
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model_name
        )
    }

    /// Full request body: history, pending message, fixed persona and temperature
    pub fn build_request(history: Vec<Content>, pending: &PendingMessage) -> GenerateContentRequest {
        let mut contents = history;
        contents.push(pending_content(pending));

        GenerateContentRequest {
            contents,
            system_instruction: SystemInstruction {
                parts: vec![Part::text(SYSTEM_INSTRUCTION)],
            },
            generation_config: GenerationConfig {
                temperature: Some(TEMPERATURE),
            },
        }
    }

    /// Send one `generateContent` request
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> GatewayResult<GenerateContentResponse> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::connection(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::connection(format!(
                "API request failed with status {}: {}",
                status.as_u16(),
                body
            )));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| GatewayError::connection(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    async fn generate(
        &self,
        history: Vec<Content>,
        pending: &PendingMessage,
    ) -> GatewayResult<String> {
        let request = Self::build_request(history, pending);
        debug!(entries = request.contents.len(), "Sending generateContent request");

        match self.generate_content(&request).await {
            Ok(response) => Ok(response.text().unwrap_or_else(|| {
                debug!("Model returned no text, using fallback reply");
                FALLBACK_REPLY.to_string()
            })),
            Err(e) => {
                error!(detail = e.detail(), "Gemini API error");
                Err(e)
            }
        }
    }
}
