use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Body of a `:generateContent` call.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// Single user turn holding one text part.
    pub fn from_text(text: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: Some(vec![Part {
                    text: Some(text.to_owned()),
                }]),
                role: None,
            }],
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Every level is optional on the wire, a blocked prompt for example comes
/// back with `promptFeedback` and no `candidates` at all.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, if every step is present.
    pub fn reply_text(&self) -> Option<&str> {
        self.candidates
            .as_deref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_deref()?
            .first()?
            .text
            .as_deref()
    }

    /// Names the first missing step of the reply path.
    pub fn missing_step(&self) -> Option<&'static str> {
        let Some(candidates) = self.candidates.as_deref() else {
            return Some("candidates");
        };
        let Some(candidate) = candidates.first() else {
            return Some("candidates[0]");
        };
        let Some(content) = candidate.content.as_ref() else {
            return Some("candidates[0].content");
        };
        let Some(parts) = content.parts.as_deref() else {
            return Some("candidates[0].content.parts");
        };
        let Some(part) = parts.first() else {
            return Some("candidates[0].content.parts[0]");
        };
        match part.text {
            Some(_) => None,
            None => Some("candidates[0].content.parts[0].text"),
        }
    }

    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback.as_ref()?.block_reason.as_deref()
    }
}

/// One supervised pair of a tuning dataset.
///
/// Dataset files use `text_input`, the wire uses `textInput`; both are
/// accepted when reading.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TuningExample {
    #[serde(rename = "textInput", alias = "text_input")]
    pub text_input: String,
    pub output: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hyperparameters {
    pub epoch_count: u32,
    pub batch_size: u32,
    pub learning_rate: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TuningExamples {
    pub examples: Vec<TuningExample>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TrainingData {
    pub examples: TuningExamples,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TuningTask {
    pub hyperparameters: Hyperparameters,
    pub training_data: TrainingData,
}

/// Body of `POST /v1beta/tunedModels`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateTunedModelRequest {
    pub display_name: String,
    pub base_model: String,
    pub tuning_task: TuningTask,
}

impl CreateTunedModelRequest {
    pub fn new(
        display_name: impl Into<String>,
        base_model: impl Into<String>,
        hyperparameters: Hyperparameters,
        examples: Vec<TuningExample>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            base_model: base_model.into(),
            tuning_task: TuningTask {
                hyperparameters,
                training_data: TrainingData {
                    examples: TuningExamples { examples },
                },
            },
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TuningProgress {
    #[serde(default)]
    pub tuned_model: Option<String>,
    #[serde(default)]
    pub total_steps: Option<u64>,
    #[serde(default)]
    pub completed_steps: Option<u64>,
    #[serde(default)]
    pub completed_percent: Option<f32>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// Long-running operation as returned by the tuning API.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub metadata: Option<TuningProgress>,
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub response: Option<serde_json::Value>,
}

impl Operation {
    /// Resource name of the model being tuned, from the response once done
    /// and from the progress metadata before that.
    pub fn tuned_model(&self) -> Option<&str> {
        self.response
            .as_ref()
            .and_then(|response| response.get("name"))
            .and_then(|name| name.as_str())
            .or_else(|| self.metadata.as_ref()?.tuned_model.as_deref())
    }
}
