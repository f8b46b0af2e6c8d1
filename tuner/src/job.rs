use gemini_client::{Client, ClientError, CreateTunedModelRequest, Operation};
use std::time::{Duration, Instant};
use tracing::instrument;

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_wait: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("tuning operation {name} failed with code {code}: {message}")]
    Failed {
        name: String,
        code: i32,
        message: String,
    },
    #[error("tuning operation {name} still running after {waited:?}")]
    TimedOut { name: String, waited: Duration },
}

/// Submits the job and blocks until the operation reports `done`.
#[instrument(skip_all, fields(operation))]
pub async fn submit_and_wait(
    client: &Client,
    request: &CreateTunedModelRequest,
    settings: PollSettings,
) -> Result<Operation, JobError> {
    let span = tracing::Span::current();
    let started = Instant::now();

    let mut operation = client.create_tuned_model(request).await?;
    span.record("operation", operation.name.as_str());
    tracing::info!(
        "Tuning job submitted, tuned model will be {}",
        operation.tuned_model().unwrap_or("<unknown>")
    );

    while !operation.done {
        let waited = started.elapsed();
        if waited >= settings.max_wait {
            return Err(JobError::TimedOut {
                name: operation.name,
                waited,
            });
        }
        log_progress(&operation);
        tokio::time::sleep(settings.interval).await;
        operation = client.get_operation(&operation.name).await?;
    }

    if let Some(error) = operation.error.take() {
        return Err(JobError::Failed {
            name: operation.name,
            code: error.code,
            message: error.message,
        });
    }

    tracing::info!("Tuning finished in {:?}", started.elapsed());
    Ok(operation)
}

fn log_progress(operation: &Operation) {
    match &operation.metadata {
        Some(progress) => tracing::info!(
            "Tuning in progress: {}/{} steps ({:.1}%)",
            progress.completed_steps.unwrap_or(0),
            progress
                .total_steps
                .map_or_else(|| "?".to_string(), |total| total.to_string()),
            progress.completed_percent.unwrap_or(0.0)
        ),
        None => tracing::info!("Tuning in progress"),
    }
}
