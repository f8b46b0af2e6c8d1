mod types;

pub use types::{
    Candidate, Content, CreateTunedModelRequest, GenerateContentRequest, GenerateContentResponse,
    Hyperparameters, Operation, OperationError, Part, PromptFeedback, TrainingData, TuningExample,
    TuningExamples, TuningProgress, TuningTask,
};

use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::time::Duration;
use tracing::instrument;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("endpoint responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Timeouts, refused connections, name resolution failures and
    /// connections dropped while the body is being read.
    pub fn is_network(&self) -> bool {
        match self {
            ClientError::Transport(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() || e.is_decode()
            }
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Client for the Generative Language REST API.
///
/// The key travels as a bearer credential on every call. Each call is bounded
/// by the configured timeout, which covers reading the body as well.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(ClientError::InvalidConfig("base url is empty".to_owned()));
        }
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key,
        })
    }

    fn url(&self, resource: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            API_VERSION,
            resource.trim_start_matches('/')
        )
    }

    #[instrument(skip_all, fields(model))]
    pub async fn generate_content(
        &self,
        model: &str,
        text: &str,
    ) -> Result<GenerateContentResponse, ClientError> {
        tracing::Span::current().record("model", model);
        let request = GenerateContentRequest::from_text(text);
        let response = self
            .http
            .post(self.url(&format!("{model}:generateContent")))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        read_json(response).await
    }

    #[instrument(skip_all, fields(display_name = %request.display_name))]
    pub async fn create_tuned_model(
        &self,
        request: &CreateTunedModelRequest,
    ) -> Result<Operation, ClientError> {
        let response = self
            .http
            .post(self.url("tunedModels"))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        read_json(response).await
    }

    #[instrument(skip(self))]
    pub async fn get_operation(&self, name: &str) -> Result<Operation, ClientError> {
        let response = self
            .http
            .get(self.url(name))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}
