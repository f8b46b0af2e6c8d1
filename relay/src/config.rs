use std::fmt::Debug;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "tunedModels/chatbottunedmodel-j9mu1tyhdkbn";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_STT_MODEL: &str = "whisper-1";

/// Process-wide settings, built once at startup and never mutated.
#[derive(Clone)]
pub struct RelayConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub stt: Option<SttConfig>,
}

impl RelayConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: gemini_client::DEFAULT_BASE_URL.to_owned(),
            api_key: api_key.into(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
            stt: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_stt(mut self, stt: SttConfig) -> Self {
        self.stt = Some(stt);
        self
    }
}

impl Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key_set", &!self.api_key.is_empty())
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("stt", &self.stt)
            .finish()
    }
}

/// OpenAI-compatible speech-to-text endpoint.
#[derive(Clone)]
pub struct SttConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Debug for SttConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SttConfig")
            .field("url", &self.url)
            .field("api_key_set", &self.api_key.is_some())
            .field("model", &self.model)
            .finish()
    }
}
