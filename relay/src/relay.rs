use gemini_client::{Client, ClientConfig, ClientError, GenerateContentResponse};
use std::sync::Arc;
use tracing::{instrument, Instrument, Span};

use crate::config::RelayConfig;
use crate::error::{Outcome, RelayError};
use crate::transcribe::{AudioClip, Transcriber};

#[derive(Debug, Clone)]
pub enum Incoming {
    Text(String),
    Audio(AudioClip),
}

impl Incoming {
    fn kind(&self) -> &'static str {
        match self {
            Incoming::Text(_) => "text",
            Incoming::Audio(_) => "audio",
        }
    }
}

/// What the caller gets back: the model's text or a fixed fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub outcome: Outcome,
}

impl Reply {
    pub fn answered(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: Outcome::Answered,
        }
    }

    pub fn from_error(error: &RelayError) -> Self {
        Self {
            text: error.fallback().to_owned(),
            outcome: error.outcome(),
        }
    }
}

struct Shared {
    config: RelayConfig,
    client: Client,
    transcriber: Arc<dyn Transcriber>,
}

/// Forwards one message per call to the configured model and hands back its
/// reply. Holds no per-request state, clones share the same HTTP pool.
#[derive(Clone)]
pub struct Relay {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("config", &self.shared.config)
            .finish()
    }
}

impl Relay {
    pub fn new(
        config: RelayConfig,
        transcriber: Arc<dyn Transcriber>,
    ) -> Result<Self, ClientError> {
        let client = Client::new(ClientConfig {
            base_url: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
        })?;

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                client,
                transcriber,
            }),
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.shared.config
    }

    /// Never fails: every error kind collapses into its fallback reply.
    ///
    /// The pipeline runs on its own task so a panic anywhere in it surfaces
    /// as `UnexpectedFailure` rather than a dropped connection.
    #[instrument(skip_all, fields(kind = incoming.kind(), outcome))]
    pub async fn handle(&self, incoming: Incoming) -> Reply {
        let relay = self.clone();
        let result = tokio::spawn(
            async move { relay.try_handle(incoming).await }.instrument(Span::current()),
        )
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Relay task failed: {:?}", e);
            Err(RelayError::Unexpected(e.to_string()))
        });

        let reply = match result {
            Ok(text) => Reply::answered(text),
            Err(error) => Reply::from_error(&error),
        };

        Span::current().record("outcome", reply.outcome.as_str());
        tracing::info!("Bot response: {}", reply.text);
        reply
    }

    pub async fn try_handle(&self, incoming: Incoming) -> Result<String, RelayError> {
        let text = match incoming {
            Incoming::Text(text) => text,
            Incoming::Audio(clip) => self.transcribe(clip).await?,
        };

        let message = validate(&text)?;
        tracing::info!("Received message: {}", message);

        let response = self.forward(message).await?;
        extract_reply(&response)
    }

    async fn transcribe(&self, clip: AudioClip) -> Result<String, RelayError> {
        tracing::info!(
            "Audio received: {} bytes ({})",
            clip.bytes.len(),
            clip.file_name
        );
        match self.shared.transcriber.transcribe(clip).await {
            Ok(Some(text)) => {
                tracing::info!("Speech-to-text successful: {}", text);
                Ok(text)
            }
            Ok(None) => {
                tracing::warn!("Speech recognition could not understand audio");
                Err(RelayError::Untranscribable)
            }
            Err(e) => {
                tracing::error!("Speech-to-text error: {}", e);
                Err(e.into())
            }
        }
    }

    async fn forward(&self, message: &str) -> Result<GenerateContentResponse, RelayError> {
        let config = &self.shared.config;
        self.shared
            .client
            .generate_content(&config.model, message)
            .await
            .map_err(|error| {
                match &error {
                    ClientError::Status { status, body } => {
                        tracing::error!("API Error: {} - {}", status, body)
                    }
                    ClientError::Decode(e) => tracing::error!("Response parsing error: {}", e),
                    e if e.is_network() => tracing::error!("Request error: {}", e),
                    e => tracing::error!("Unexpected error: {:?}", e),
                }
                RelayError::from(error)
            })
    }
}

fn validate(text: &str) -> Result<&str, RelayError> {
    let message = text.trim();
    if message.is_empty() {
        tracing::info!("Rejected empty message");
        return Err(RelayError::EmptyInput);
    }
    Ok(message)
}

fn extract_reply(response: &GenerateContentResponse) -> Result<String, RelayError> {
    match response.reply_text() {
        Some(text) => Ok(text.to_owned()),
        None => {
            let step = response.missing_step().unwrap_or("reply");
            let reason = match response.block_reason() {
                Some(block) => format!("missing {step} (prompt blocked: {block})"),
                None => format!("missing {step}"),
            };
            tracing::error!("Response parsing error: {}", reason);
            Err(RelayError::Parse(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validation_trims_and_rejects_blank() {
        assert_eq!(validate("  hello \n").unwrap(), "hello");
        for blank in ["", "   ", "\t\n"] {
            assert!(matches!(validate(blank), Err(RelayError::EmptyInput)));
        }
    }

    #[test]
    fn extraction_reports_blocked_prompts() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        match extract_reply(&response) {
            Err(RelayError::Parse(reason)) => {
                assert!(reason.contains("candidates"));
                assert!(reason.contains("SAFETY"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
