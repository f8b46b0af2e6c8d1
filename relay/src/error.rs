use axum::http::StatusCode;
use gemini_client::ClientError;

use crate::transcribe::TranscribeError;

pub const EMPTY_INPUT: &str = "Please enter a valid message.";
pub const MISSING_AUDIO: &str = "No audio file provided";
pub const AUDIO_TOO_LARGE: &str = "Audio file too large";
pub const MALFORMED_REQUEST: &str = "An error occurred processing your request.";
pub const UNTRANSCRIBABLE: &str = "Unable to transcribe speech";
pub const TRANSCRIBER_FAULT: &str = "Speech recognition service is unavailable";
pub const ENDPOINT_NON_SUCCESS: &str =
    "Sorry, I couldn't process your request. Please try again later.";
pub const PARSE_FAILURE: &str = "Sorry, I couldn't parse the response correctly.";
pub const NETWORK_FAILURE: &str = "Network error occurred. Please check your connection.";
pub const UNEXPECTED_FAILURE: &str = "An unexpected error occurred. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("message is empty")]
    EmptyInput,
    #[error("no audio file provided")]
    MissingAudio,
    #[error("audio upload exceeds the size limit")]
    AudioTooLarge,
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("audio could not be transcribed")]
    Untranscribable,
    #[error("transcription failed: {0}")]
    Transcriber(#[from] TranscribeError),
    #[error("model endpoint responded with status {status}")]
    EndpointStatus { status: u16, body: String },
    #[error("could not parse model response: {0}")]
    Parse(String),
    #[error("network error: {0}")]
    Network(#[source] ClientError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl From<ClientError> for RelayError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Status { status, body } => RelayError::EndpointStatus { status, body },
            ClientError::Decode(e) => RelayError::Parse(e.to_string()),
            e if e.is_network() => RelayError::Network(e),
            e => RelayError::Unexpected(e.to_string()),
        }
    }
}

impl RelayError {
    pub fn outcome(&self) -> Outcome {
        match self {
            RelayError::EmptyInput => Outcome::EmptyInput,
            RelayError::MissingAudio => Outcome::MissingAudio,
            RelayError::AudioTooLarge => Outcome::AudioTooLarge,
            RelayError::MalformedRequest(_) => Outcome::MalformedRequest,
            RelayError::Untranscribable => Outcome::TranscriptionFailure,
            RelayError::Transcriber(_) => Outcome::TranscriberFault,
            RelayError::EndpointStatus { .. } => Outcome::EndpointNonSuccess,
            RelayError::Parse(_) => Outcome::ParseFailure,
            RelayError::Network(_) => Outcome::NetworkFailure,
            RelayError::Unexpected(_) => Outcome::UnexpectedFailure,
        }
    }

    pub fn fallback(&self) -> &'static str {
        match self.outcome() {
            Outcome::EmptyInput => EMPTY_INPUT,
            Outcome::MissingAudio => MISSING_AUDIO,
            Outcome::AudioTooLarge => AUDIO_TOO_LARGE,
            Outcome::MalformedRequest => MALFORMED_REQUEST,
            Outcome::TranscriptionFailure => UNTRANSCRIBABLE,
            Outcome::TranscriberFault => TRANSCRIBER_FAULT,
            Outcome::EndpointNonSuccess => ENDPOINT_NON_SUCCESS,
            Outcome::ParseFailure => PARSE_FAILURE,
            Outcome::NetworkFailure => NETWORK_FAILURE,
            Outcome::Answered | Outcome::UnexpectedFailure => UNEXPECTED_FAILURE,
        }
    }
}

/// How a relay call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Answered,
    EmptyInput,
    MissingAudio,
    AudioTooLarge,
    MalformedRequest,
    TranscriptionFailure,
    TranscriberFault,
    EndpointNonSuccess,
    ParseFailure,
    NetworkFailure,
    UnexpectedFailure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Answered => "answered",
            Outcome::EmptyInput => "empty_input",
            Outcome::MissingAudio => "missing_audio",
            Outcome::AudioTooLarge => "audio_too_large",
            Outcome::MalformedRequest => "malformed_request",
            Outcome::TranscriptionFailure => "transcription_failure",
            Outcome::TranscriberFault => "transcriber_fault",
            Outcome::EndpointNonSuccess => "endpoint_non_success",
            Outcome::ParseFailure => "parse_failure",
            Outcome::NetworkFailure => "network_failure",
            Outcome::UnexpectedFailure => "unexpected_failure",
        }
    }

    /// Status used by routes that report failures as `{"error": ...}`.
    pub fn status(&self) -> StatusCode {
        match self {
            Outcome::Answered => StatusCode::OK,
            Outcome::EmptyInput
            | Outcome::MissingAudio
            | Outcome::MalformedRequest
            | Outcome::TranscriptionFailure => StatusCode::BAD_REQUEST,
            Outcome::AudioTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Outcome::TranscriberFault
            | Outcome::EndpointNonSuccess
            | Outcome::ParseFailure
            | Outcome::NetworkFailure
            | Outcome::UnexpectedFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_relay_kinds() {
        let status = RelayError::from(ClientError::Status {
            status: 500,
            body: "boom".into(),
        });
        assert_eq!(status.outcome(), Outcome::EndpointNonSuccess);
        assert_eq!(status.fallback(), ENDPOINT_NON_SUCCESS);

        let decode = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let parse = RelayError::from(ClientError::Decode(decode));
        assert_eq!(parse.outcome(), Outcome::ParseFailure);

        let config = RelayError::from(ClientError::InvalidConfig("empty".into()));
        assert_eq!(config.outcome(), Outcome::UnexpectedFailure);
        assert_eq!(config.fallback(), UNEXPECTED_FAILURE);
    }

    #[test]
    fn status_mapping_separates_caller_and_server_faults() {
        assert_eq!(Outcome::Answered.status(), StatusCode::OK);
        assert_eq!(Outcome::EmptyInput.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Outcome::MissingAudio.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Outcome::TranscriptionFailure.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Outcome::MalformedRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Outcome::AudioTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            Outcome::TranscriberFault.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Outcome::NetworkFailure.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rejected_uploads_do_not_claim_missing_audio() {
        assert_eq!(RelayError::AudioTooLarge.fallback(), AUDIO_TOO_LARGE);
        let malformed = RelayError::MalformedRequest("invalid boundary".into());
        assert_eq!(malformed.outcome(), Outcome::MalformedRequest);
        assert_eq!(malformed.fallback(), MALFORMED_REQUEST);
    }

    #[test]
    fn transcriber_fault_has_its_own_fallback() {
        let error = RelayError::from(TranscribeError::NotConfigured);
        assert_eq!(error.outcome(), Outcome::TranscriberFault);
        assert_eq!(error.fallback(), TRANSCRIBER_FAULT);
    }
}
