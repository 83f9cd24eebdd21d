use serde::{Deserialize, Serialize};

use super::params::{GenerationParams, ModelParameters};
use crate::error::BackendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub index: usize,
    pub message: Option<ChatMessage>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
}

impl ChatCompletion {
    /// A single assistant choice holding `text`.
    pub fn from_text(text: impl Into<String>, finish_reason: Option<&str>) -> Self {
        Self {
            choices: vec![Choice {
                index: 0,
                message: Some(ChatMessage::assistant(text)),
                finish_reason: finish_reason.map(str::to_string),
            }],
        }
    }

    /// Content of the first choice, if it has any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }
}

/// Constructs model instances from a session's parameters.
///
/// Backends consume `params.load` and any `params.extra` keys they understand,
/// and log the ones they cannot apply.
pub trait ModelBackend {
    fn name(&self) -> &'static str;

    fn load(&self, params: &ModelParameters) -> Result<Box<dyn LoadedModel>, BackendError>;
}

/// A model held in memory. Dropping it frees the backend's resources.
pub trait LoadedModel {
    fn chat_completion(
        &mut self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<ChatCompletion, BackendError>;
}

/// Stand-in used when no inference backend was compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBackend;

impl ModelBackend for UnavailableBackend {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn load(&self, _params: &ModelParameters) -> Result<Box<dyn LoadedModel>, BackendError> {
        Err(BackendError::Unsupported)
    }
}

pub const CHATML_END: &str = "<|im_end|>";

/// Renders a conversation with the ChatML template and opens the assistant turn.
pub fn format_chatml(messages: &[ChatMessage]) -> String {
    let mut prompt = String::new();
    for message in messages {
        prompt.push_str("<|im_start|>");
        prompt.push_str(message.role.as_str());
        prompt.push('\n');
        prompt.push_str(message.content.as_deref().unwrap_or_default());
        prompt.push_str(CHATML_END);
        prompt.push('\n');
    }
    prompt.push_str("<|im_start|>assistant\n");
    prompt
}

/// Set options with no llama.cpp session equivalent: tensor split, LoRA
/// adapters and every `extra` key.
pub fn ignored_options(params: &ModelParameters) -> Vec<String> {
    let mut ignored = Vec::new();
    if params.load.tensor_split.is_some() {
        ignored.push("tensor_split".to_string());
    }
    if params.load.lora_path.is_some() {
        ignored.push("lora_path".to_string());
    }
    ignored.extend(params.extra.keys().cloned());
    ignored
}

/// Byte offset of the earliest stop sequence found in `text`.
pub fn find_stop(text: &str, stops: &[String]) -> Option<usize> {
    stops
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min()
}
