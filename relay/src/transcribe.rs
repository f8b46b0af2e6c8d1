//! Speech-to-text collaborator.
//!
//! The relay never decodes audio itself. Clips are forwarded as received to an
//! OpenAI-compatible `/v1/audio/transcriptions` endpoint, which is expected to
//! handle container conversion.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart;
use serde::Deserialize;
use std::fmt::Debug;
use std::time::Duration;

use crate::config::SttConfig;

#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Bytes,
    pub file_name: String,
    pub content_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    #[error("speech recognition is not configured")]
    NotConfigured,
    #[error("speech recognition responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("speech recognition request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed transcription: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// `Ok(None)` means the service answered but heard no speech.
    async fn transcribe(&self, clip: AudioClip) -> Result<Option<String>, TranscribeError>;
}

/// Stand-in used when no STT endpoint is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unconfigured;

#[async_trait]
impl Transcriber for Unconfigured {
    async fn transcribe(&self, _clip: AudioClip) -> Result<Option<String>, TranscribeError> {
        Err(TranscribeError::NotConfigured)
    }
}

#[derive(Deserialize, Debug)]
struct TranscriptionResponse {
    #[serde(default)]
    text: Option<String>,
}

pub struct HttpTranscriber {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl Debug for HttpTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTranscriber")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish()
    }
}

impl HttpTranscriber {
    pub fn new(config: &SttConfig, timeout: Duration) -> Result<Self, TranscribeError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, clip: AudioClip) -> Result<Option<String>, TranscribeError> {
        let mut part = multipart::Part::bytes(clip.bytes.to_vec()).file_name(clip.file_name);
        if let Some(content_type) = clip.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let mut request = self.http.post(&self.url).multipart(form);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TranscribeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let transcription: TranscriptionResponse = serde_json::from_str(&body)?;
        Ok(transcription
            .text
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty()))
    }
}
