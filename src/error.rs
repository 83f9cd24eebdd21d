use std::path::PathBuf;
use thiserror::Error;

/// Literal returned by every `generate_*` call when no usable text was produced.
pub const FALLBACK_RESPONSE: &str = "There is no response";

/// Failures reported by a model backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("model file not found: {}", .0.display())]
    MissingModel(PathBuf),

    #[error("this build has no model backend (enable the `llama` feature)")]
    Unsupported,

    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("invalid value for parameter '{key}': {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("load option '{0}' cannot change while a model is loaded")]
    LoadOptionLocked(String),
}

/// Why a generation task produced no text.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed loading model '{}': {source}", .path.display())]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: BackendError,
    },

    #[error("no model loaded")]
    NotLoaded,

    #[error("failed creating chat completion: {0}")]
    Completion(#[source] BackendError),

    #[error("model returned no usable response")]
    NoResponse,

    #[error(transparent)]
    Parameter(#[from] ParamError),
}

pub type Artifact = Result<String, GenerationError>;

/// Collapses a failed artifact to [`FALLBACK_RESPONSE`].
pub fn or_fallback(artifact: Artifact) -> String {
    artifact.unwrap_or_else(|_| FALLBACK_RESPONSE.to_string())
}
