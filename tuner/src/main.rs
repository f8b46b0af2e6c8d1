mod dataset;
mod job;

use anyhow::{Context, Result};
use clap::Parser;
use gemini_client::{Client, ClientConfig, CreateTunedModelRequest, Hyperparameters};
use std::path::PathBuf;
use std::time::Duration;

use job::PollSettings;

#[derive(Parser)]
#[clap(about = "Submit a fine-tuning job and wait for the tuned model")]
struct Args {
    #[clap(long, short, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,
    #[clap(long, env = "GEMINI_ENDPOINT", default_value = gemini_client::DEFAULT_BASE_URL)]
    endpoint: String,
    #[clap(long, short, default_value = "data/support_dialogue.json")]
    dataset: PathBuf,
    #[clap(long, default_value = "chatbot-tuned-model")]
    display_name: String,
    #[clap(long, default_value = "models/gemini-1.5-flash-001-tuning")]
    base_model: String,
    #[clap(long, default_value = "10")]
    epochs: u32,
    #[clap(long, default_value = "4")]
    batch_size: u32,
    #[clap(long, default_value = "0.001")]
    learning_rate: f64,
    #[clap(long, default_value = "10")]
    poll_secs: u64,
    #[clap(long, default_value = "7200")]
    max_wait_secs: u64,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("endpoint", &self.endpoint)
            .field("dataset", &self.dataset)
            .field("display_name", &self.display_name)
            .field("base_model", &self.base_model)
            .field("epochs", &self.epochs)
            .field("batch_size", &self.batch_size)
            .field("learning_rate", &self.learning_rate)
            .finish()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    tracing::info!("Tuner started with {:?}", args);

    let examples = dataset::load(&args.dataset)?;
    tracing::info!("Loaded {} training examples", examples.len());

    let client = Client::new(ClientConfig {
        base_url: args.endpoint.clone(),
        api_key: args.api_key.clone(),
        timeout: Duration::from_secs(60),
    })?;

    let request = CreateTunedModelRequest::new(
        args.display_name.clone(),
        args.base_model.clone(),
        Hyperparameters {
            epoch_count: args.epochs,
            batch_size: args.batch_size,
            learning_rate: args.learning_rate,
        },
        examples,
    );
    let settings = PollSettings {
        interval: Duration::from_secs(args.poll_secs),
        max_wait: Duration::from_secs(args.max_wait_secs),
    };

    let operation = job::submit_and_wait(&client, &request, settings)
        .await
        .context("fine-tuning did not complete")?;

    let tuned_model = operation.tuned_model().unwrap_or(operation.name.as_str());
    println!("Fine-tuned model created: {tuned_model}");
    Ok(())
}
