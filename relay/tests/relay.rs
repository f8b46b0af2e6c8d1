use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use relay::error::{
    EMPTY_INPUT, ENDPOINT_NON_SUCCESS, NETWORK_FAILURE, PARSE_FAILURE, TRANSCRIBER_FAULT,
    UNEXPECTED_FAILURE, UNTRANSCRIBABLE,
};
use relay::{
    AudioClip, Incoming, Outcome, Relay, RelayConfig, TranscribeError, Transcriber, Unconfigured,
};
use serde_json::json;
use wiremock::matchers::{any, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "tunedModels/test-model";
const GENERATE_PATH: &str = "/v1beta/tunedModels/test-model:generateContent";

fn config_for(endpoint: String, timeout: Duration) -> RelayConfig {
    RelayConfig::new("test-key", MODEL)
        .with_endpoint(endpoint)
        .with_timeout(timeout)
}

fn relay_for(server: &MockServer) -> Relay {
    Relay::new(
        config_for(server.uri(), Duration::from_secs(5)),
        Arc::new(Unconfigured),
    )
    .unwrap()
}

fn relay_with(server: &MockServer, transcriber: impl Transcriber + 'static) -> Relay {
    Relay::new(
        config_for(server.uri(), Duration::from_secs(5)),
        Arc::new(transcriber),
    )
    .unwrap()
}

fn reply_body(text: &str) -> serde_json::Value {
    json!({"candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]})
}

fn clip() -> AudioClip {
    AudioClip {
        bytes: Bytes::from_static(b"fake-audio"),
        file_name: "user_audio.webm".to_string(),
        content_type: Some("audio/webm".to_string()),
    }
}

struct FixedTranscriber(Option<&'static str>);

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _clip: AudioClip) -> Result<Option<String>, TranscribeError> {
        Ok(self.0.map(str::to_owned))
    }
}

/// Shared buffer the fmt subscriber writes into.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

struct PanickingTranscriber;

#[async_trait]
impl Transcriber for PanickingTranscriber {
    async fn transcribe(&self, _clip: AudioClip) -> Result<Option<String>, TranscribeError> {
        panic!("decoder blew up");
    }
}

#[tokio::test]
async fn blank_messages_never_reach_the_model() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let relay = relay_for(&server);
    for input in ["", "   ", "\n\t  "] {
        let reply = relay.handle(Incoming::Text(input.to_string())).await;
        assert_eq!(reply.outcome, Outcome::EmptyInput);
        assert_eq!(reply.text, EMPTY_INPUT);
    }
}

#[tokio::test]
async fn reply_is_first_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({"contents": [{"parts": [{"text": "hello"}]}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                {"content": {"parts": [{"text": "X"}]}},
                {"content": {"parts": [{"text": "Y"}]}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = relay_for(&server)
        .handle(Incoming::Text("  hello  ".to_string()))
        .await;

    assert_eq!(reply.outcome, Outcome::Answered);
    assert_eq!(reply.text, "X");
}

#[tokio::test]
async fn missing_candidates_is_a_parse_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"promptFeedback": {"blockReason": "SAFETY"}})),
        )
        .mount(&server)
        .await;

    let reply = relay_for(&server)
        .handle(Incoming::Text("hello".to_string()))
        .await;

    assert_eq!(reply.outcome, Outcome::ParseFailure);
    assert_eq!(reply.text, PARSE_FAILURE);
}

#[tokio::test]
async fn body_that_is_not_json_is_a_parse_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let reply = relay_for(&server)
        .handle(Incoming::Text("hello".to_string()))
        .await;

    assert_eq!(reply.outcome, Outcome::ParseFailure);
}

#[tokio::test]
async fn server_error_yields_endpoint_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(1)
        .mount(&server)
        .await;

    let reply = relay_for(&server)
        .handle(Incoming::Text("hello".to_string()))
        .await;

    assert_eq!(reply.outcome, Outcome::EndpointNonSuccess);
    assert_eq!(reply.text, ENDPOINT_NON_SUCCESS);
}

// The pipeline runs in a spawned task; a current-thread runtime keeps it on the
// thread that owns the default subscriber.
#[tokio::test(flavor = "current_thread")]
async fn failed_call_still_logs_the_original_message() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(1)
        .mount(&server)
        .await;

    let reply = relay_for(&server)
        .handle(Incoming::Text("hello".to_string()))
        .await;

    assert_eq!(reply.outcome, Outcome::EndpointNonSuccess);
    let output = logs.contents();
    assert!(output.contains("Received message: hello"), "{output}");
    assert!(output.contains("API Error: 500 - internal"), "{output}");
    assert!(!output.contains("test-key"), "{output}");
}

#[tokio::test]
async fn slow_endpoint_yields_network_fallback_within_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(reply_body("too late"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let relay = Relay::new(
        config_for(server.uri(), Duration::from_millis(200)),
        Arc::new(Unconfigured),
    )
    .unwrap();

    let started = Instant::now();
    let reply = relay.handle(Incoming::Text("hello".to_string())).await;

    assert_eq!(reply.outcome, Outcome::NetworkFailure);
    assert_eq!(reply.text, NETWORK_FAILURE);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn refused_connection_yields_network_fallback() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let relay = Relay::new(
        config_for(format!("http://127.0.0.1:{port}"), Duration::from_secs(2)),
        Arc::new(Unconfigured),
    )
    .unwrap();

    let reply = relay.handle(Incoming::Text("hello".to_string())).await;
    assert_eq!(reply.outcome, Outcome::NetworkFailure);
}

#[tokio::test]
async fn transcribed_audio_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_json(
            json!({"contents": [{"parts": [{"text": "my laptop keeps freezing"}]}]}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("When did it start?")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = relay_with(&server, FixedTranscriber(Some("my laptop keeps freezing")))
        .handle(Incoming::Audio(clip()))
        .await;

    assert_eq!(reply.outcome, Outcome::Answered);
    assert_eq!(reply.text, "When did it start?");
}

#[tokio::test]
async fn untranscribable_audio_skips_the_model() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let reply = relay_with(&server, FixedTranscriber(None))
        .handle(Incoming::Audio(clip()))
        .await;
    assert_eq!(reply.outcome, Outcome::TranscriptionFailure);
    assert_eq!(reply.text, UNTRANSCRIBABLE);

    let reply = relay_with(&server, FixedTranscriber(Some("   ")))
        .handle(Incoming::Audio(clip()))
        .await;
    assert_eq!(reply.outcome, Outcome::EmptyInput);
}

#[tokio::test]
async fn transcriber_fault_is_distinct() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let reply = relay_for(&server).handle(Incoming::Audio(clip())).await;
    assert_eq!(reply.outcome, Outcome::TranscriberFault);
    assert_eq!(reply.text, TRANSCRIBER_FAULT);
}

#[tokio::test]
async fn panic_inside_pipeline_becomes_unexpected_failure() {
    let server = MockServer::start().await;

    let reply = relay_with(&server, PanickingTranscriber)
        .handle(Incoming::Audio(clip()))
        .await;

    assert_eq!(reply.outcome, Outcome::UnexpectedFailure);
    assert_eq!(reply.text, UNEXPECTED_FAILURE);
}
