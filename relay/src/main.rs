use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use relay::config::{DEFAULT_MODEL, DEFAULT_STT_MODEL};
use relay::{api, HttpTranscriber, Relay, RelayConfig, SttConfig, Transcriber, Unconfigured};

#[derive(Parser, Debug)]
struct Args {
    #[clap(short, long, env = "RELAY_ADDRESS", default_value = "127.0.0.1:5000")]
    address: String,
    #[clap(long, env = "GEMINI_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,
    #[clap(short, long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,
    #[clap(long, env = "GEMINI_ENDPOINT", default_value = gemini_client::DEFAULT_BASE_URL)]
    endpoint: String,
    #[clap(long, env = "RELAY_TIMEOUT_SECS", default_value = "10")]
    timeout_secs: u64,
    #[clap(long, env = "RELAY_STATIC_DIR", default_value = "static")]
    static_dir: PathBuf,
    #[clap(long, env = "STT_URL")]
    stt_url: Option<String>,
    #[clap(long, env = "STT_API_KEY", hide_env_values = true)]
    stt_api_key: Option<String>,
    #[clap(long, env = "STT_MODEL", default_value = DEFAULT_STT_MODEL)]
    stt_model: String,
}

impl Args {
    fn relay_config(&self) -> RelayConfig {
        let mut config = RelayConfig::new(self.api_key.clone(), self.model.clone())
            .with_endpoint(self.endpoint.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(url) = &self.stt_url {
            config = config.with_stt(SttConfig {
                url: url.clone(),
                api_key: self.stt_api_key.clone(),
                model: self.stt_model.clone(),
            });
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let config = args.relay_config();
    tracing::info!("config: {:?}", &config);

    if config.api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY is not set, model calls will be rejected upstream");
    }

    let transcriber: Arc<dyn Transcriber> = match &config.stt {
        Some(stt) => Arc::new(HttpTranscriber::new(stt, config.timeout)?),
        None => {
            tracing::warn!("STT_URL is not set, audio requests will be refused");
            Arc::new(Unconfigured)
        }
    };

    let relay = Relay::new(config, transcriber)?;
    let app = api::router(relay, &args.static_dir);

    tracing::info!("Listening on {}", &args.address);
    let listener = TcpListener::bind(&args.address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server shutdown");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
