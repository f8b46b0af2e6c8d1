use anyhow::Result;
use clap::Parser;
use std::fmt::Debug;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::instrument;

#[derive(Parser, Debug)]
#[clap(version = "0.1.0", about = "Chat with the relay from a terminal")]
struct Args {
    #[clap(short, long, default_value = "127.0.0.1:5000")]
    relay_address: String,
    /// Send a single message and exit instead of reading stdin.
    #[clap(short, long)]
    message: Option<String>,
}

#[derive(serde::Deserialize, Debug)]
struct HttpResponse {
    response: String,
}

struct HttpClient {
    client: reqwest::Client,
    url: String,
}
impl Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("url", &self.url)
            .finish()
    }
}

impl HttpClient {
    fn new(address: &str) -> Self {
        let base = if address.starts_with("http://") || address.starts_with("https://") {
            address.trim_end_matches('/').to_owned()
        } else {
            format!("http://{}", address)
        };
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/get_response", base),
        }
    }

    async fn send_request(&self, json_data: serde_json::Value) -> Result<HttpResponse> {
        let text_response = self
            .client
            .post(&self.url)
            .json(&json_data)
            .send()
            .await?
            .error_for_status()?;

        let response = text_response.json().await?;
        Ok(response)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let client = HttpClient::new(&args.relay_address);
    tracing::info!("Chatting with relay at {:?}", client);

    if let Some(message) = args.message {
        let reply = ask(&client, &message).await?;
        println!("{reply}");
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match ask(&client, &line).await {
            Ok(reply) => println!("{reply}"),
            Err(e) => tracing::error!("Error sending message: {:?}", e),
        }
    }
    Ok(())
}

#[instrument(skip_all, fields(user_text, reply_text))]
async fn ask(client: &HttpClient, text: &str) -> Result<String> {
    let span = tracing::Span::current();
    span.record("user_text", text);

    let response = client
        .send_request(serde_json::json!({"message": text}))
        .await?;

    span.record("reply_text", response.response.as_str());
    tracing::info!("SUCCESS");
    Ok(response.response)
}
