use gemini_client::TuningExample;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("dataset {path} is not a JSON list of {{text_input, output}} pairs: {source}")]
    Format {
        path: String,
        source: serde_json::Error,
    },
    #[error("dataset {0} has no examples")]
    Empty(String),
    #[error("example {index} in {path} has an empty {field}")]
    BlankField {
        path: String,
        index: usize,
        field: &'static str,
    },
}

pub fn load(path: &Path) -> Result<Vec<TuningExample>, DatasetError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: display.clone(),
        source,
    })?;
    let examples: Vec<TuningExample> =
        serde_json::from_str(&raw).map_err(|source| DatasetError::Format {
            path: display.clone(),
            source,
        })?;

    if examples.is_empty() {
        return Err(DatasetError::Empty(display));
    }
    for (index, example) in examples.iter().enumerate() {
        let field = if example.text_input.trim().is_empty() {
            "text_input"
        } else if example.output.trim().is_empty() {
            "output"
        } else {
            continue;
        };
        return Err(DatasetError::BlankField {
            path: display,
            index,
            field,
        });
    }

    Ok(examples)
}
