use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get_service, post},
    Json, Router,
};
use std::path::Path;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{instrument, Span};

use crate::error::{Outcome, RelayError};
use crate::relay::{Incoming, Relay, Reply};
use crate::transcribe::AudioClip;
use crate::{ErrorResponse, TextReplyRequest, TextReplyResponse};

const AUDIO_UPLOAD_LIMIT_BYTES: usize = 25 * 1024 * 1024;
const AUDIO_FIELD: &str = "audio";

/// `/get_response` answers text, `/chat` answers audio uploads; everything
/// else is served from `static_dir`.
pub fn router(relay: Relay, static_dir: impl AsRef<Path>) -> Router {
    let static_dir = static_dir.as_ref();
    let text_relay = relay.clone();
    let audio_relay = relay;

    Router::new()
        .route(
            "/get_response",
            post(move |request: Result<Json<TextReplyRequest>, JsonRejection>| {
                get_response(request, text_relay.clone())
            }),
        )
        .route(
            "/chat",
            get_service(ServeFile::new(static_dir.join("chatbot.html")))
                .post(move |multipart: Result<Multipart, MultipartRejection>| {
                    chat(multipart, audio_relay.clone())
                }),
        )
        .fallback_service(ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(AUDIO_UPLOAD_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[instrument(skip_all, fields(outcome))]
async fn get_response(
    request: Result<Json<TextReplyRequest>, JsonRejection>,
    relay: Relay,
) -> Json<TextReplyResponse> {
    let reply = match request {
        Ok(Json(request)) => {
            let message = request.message.unwrap_or_default();
            relay.handle(Incoming::Text(message)).await
        }
        Err(rejection) => {
            let error = RelayError::MalformedRequest(rejection.body_text());
            tracing::warn!("Rejected text request: {}", error);
            Reply::from_error(&error)
        }
    };

    Span::current().record("outcome", reply.outcome.as_str());
    Json(TextReplyResponse {
        response: reply.text,
    })
}

#[instrument(skip_all, fields(outcome))]
async fn chat(multipart: Result<Multipart, MultipartRejection>, relay: Relay) -> AudioReply {
    let clip = match multipart {
        Ok(multipart) => read_audio(multipart).await,
        Err(rejection) => Err(rejected(rejection.status(), rejection.body_text())),
    };
    let reply = match clip {
        Ok(clip) => relay.handle(Incoming::Audio(clip)).await,
        Err(error) => {
            tracing::warn!("Rejected audio request: {}", error);
            Reply::from_error(&error)
        }
    };

    Span::current().record("outcome", reply.outcome.as_str());
    AudioReply(reply)
}

async fn read_audio(mut multipart: Multipart) -> Result<AudioClip, RelayError> {
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("user_audio").to_owned();
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.map_err(malformed)?;
        if bytes.is_empty() {
            return Err(RelayError::MissingAudio);
        }
        return Ok(AudioClip {
            bytes,
            file_name,
            content_type,
        });
    }
    Err(RelayError::MissingAudio)
}

fn malformed(error: MultipartError) -> RelayError {
    rejected(error.status(), error.body_text())
}

/// Upload failures keep the framework's size verdict; anything else is a
/// malformed request rather than missing audio.
fn rejected(status: StatusCode, detail: String) -> RelayError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        RelayError::AudioTooLarge
    } else {
        RelayError::MalformedRequest(detail)
    }
}

/// Audio route wire shape: `{"response"}` on success, `{"error"}` with the
/// outcome's status otherwise.
pub struct AudioReply(pub Reply);

impl IntoResponse for AudioReply {
    fn into_response(self) -> Response {
        let Reply { text, outcome } = self.0;
        match outcome {
            Outcome::Answered => {
                (StatusCode::OK, Json(TextReplyResponse { response: text })).into_response()
            }
            outcome => (outcome.status(), Json(ErrorResponse { error: text })).into_response(),
        }
    }
}
