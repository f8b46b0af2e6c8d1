pub mod api;
pub mod config;
pub mod error;
pub mod relay;
pub mod transcribe;

pub use config::{RelayConfig, SttConfig};
pub use error::{Outcome, RelayError};
pub use relay::{Incoming, Relay, Reply};
pub use transcribe::{AudioClip, HttpTranscriber, TranscribeError, Transcriber, Unconfigured};

#[derive(serde::Deserialize, Debug, Clone, Default)]
pub struct TextReplyRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct TextReplyResponse {
    pub response: String,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}
