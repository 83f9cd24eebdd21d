use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::backend::{ChatMessage, LoadedModel, ModelBackend};
use super::params::{ModelParameters, is_load_key};
use crate::error::{GenerationError, ParamError};

/// One model instance plus the parameters it was (or will be) loaded with.
///
/// The instance is released by [`ModelSession::release`] or when the session
/// is dropped, whichever comes first.
pub struct ModelSession {
    backend: Arc<dyn ModelBackend>,
    params: ModelParameters,
    instance: Option<Box<dyn LoadedModel>>,
}

impl ModelSession {
    pub fn new(backend: Arc<dyn ModelBackend>, params: ModelParameters) -> Self {
        Self {
            backend,
            params,
            instance: None,
        }
    }

    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    pub fn is_loaded(&self) -> bool {
        self.instance.is_some()
    }

    pub fn set_param(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ParamError> {
        if self.is_loaded() && is_load_key(key) {
            warn!("Ignoring '{}': model is already loaded", key);
            return Err(ParamError::LoadOptionLocked(key.to_string()));
        }
        self.params.set(key, value)
    }

    /// Loads the model unless an instance already exists.
    pub fn load(&mut self) -> Result<&mut Self, GenerationError> {
        info!("Loading model");
        if self.instance.is_some() {
            info!("Model already loaded");
            return Ok(self);
        }
        let path = self.params.load.model_path.clone();
        match self.backend.load(&self.params) {
            Ok(instance) => {
                info!("Loaded model '{}' via {}", path.display(), self.backend.name());
                self.instance = Some(instance);
                Ok(self)
            }
            Err(source) => {
                error!("Failed loading model '{}': {}", path.display(), source);
                Err(GenerationError::ModelLoad { path, source })
            }
        }
    }

    /// Runs one chat completion and returns the first choice's text.
    pub fn complete(&mut self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        let Some(instance) = self.instance.as_mut() else {
            return Err(GenerationError::NotLoaded);
        };
        info!("Creating chat completion");
        let completion = instance
            .chat_completion(messages, &self.params.generation)
            .map_err(|e| {
                error!("Failed creating chat completion: {}", e);
                GenerationError::Completion(e)
            })?;

        match completion.first_content().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => {
                warn!(
                    "Completion had no usable content ({} choices)",
                    completion.choices.len()
                );
                Err(GenerationError::NoResponse)
            }
        }
    }

    pub fn release(&mut self) {
        if self.instance.take().is_some() {
            debug!("Released model instance");
        }
    }
}

impl Drop for ModelSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::llm::backend::{ChatCompletion, Choice, Role};
    use crate::llm::testing::ScriptedBackend;

    fn session(backend: &Arc<ScriptedBackend>) -> ModelSession {
        ModelSession::new(backend.clone(), ModelParameters::default())
    }

    #[test]
    fn load_twice_constructs_once() {
        let backend = ScriptedBackend::new();
        let mut session = session(&backend);
        session.load().unwrap();
        session.load().unwrap();
        assert!(session.is_loaded());
        assert_eq!(backend.loads(), 1);
    }

    #[test]
    fn bad_model_path_yields_load_error() {
        let backend = ScriptedBackend::failing_load();
        let mut session = session(&backend);
        session
            .set_param("model_path", "/definitely/not/here.gguf")
            .unwrap();

        let err = session.load().err().unwrap();
        match err {
            GenerationError::ModelLoad { path, source } => {
                assert_eq!(path.to_str(), Some("/definitely/not/here.gguf"));
                assert!(matches!(source, BackendError::MissingModel(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!session.is_loaded());
    }

    #[test]
    fn complete_without_load_is_not_loaded() {
        let backend = ScriptedBackend::new();
        backend.push_text("never used");
        let mut session = session(&backend);
        let err = session.complete(&[ChatMessage::user("hi")]).unwrap_err();
        assert!(matches!(err, GenerationError::NotLoaded));
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn empty_or_null_responses_are_rejected() {
        let backend = ScriptedBackend::new();
        backend.push(Ok(ChatCompletion::default()));
        backend.push(Ok(ChatCompletion {
            choices: vec![Choice {
                index: 0,
                message: None,
                finish_reason: None,
            }],
        }));
        backend.push(Ok(ChatCompletion {
            choices: vec![Choice {
                index: 0,
                message: Some(ChatMessage {
                    role: Role::Assistant,
                    content: None,
                }),
                finish_reason: None,
            }],
        }));
        backend.push_text("   \n");

        let mut session = session(&backend);
        session.load().unwrap();
        for _ in 0..4 {
            let err = session.complete(&[ChatMessage::user("hi")]).unwrap_err();
            assert!(matches!(err, GenerationError::NoResponse));
        }
    }

    #[test]
    fn backend_errors_are_caught() {
        let backend = ScriptedBackend::new();
        backend.push(Err(BackendError::Backend("decode failed".into())));
        let mut session = session(&backend);
        session.load().unwrap();
        let err = session.complete(&[ChatMessage::user("hi")]).unwrap_err();
        assert!(matches!(err, GenerationError::Completion(_)));
    }

    #[test]
    fn completion_text_is_trimmed() {
        let backend = ScriptedBackend::new();
        backend.push_text("  A title\n");
        let mut session = session(&backend);
        session.load().unwrap();
        assert_eq!(
            session.complete(&[ChatMessage::user("hi")]).unwrap(),
            "A title"
        );
    }

    #[test]
    fn load_options_lock_after_load() {
        let backend = ScriptedBackend::new();
        let mut session = session(&backend);
        session.set_param("ctx_size", 4000).unwrap();
        session.load().unwrap();

        assert!(matches!(
            session.set_param("ctx_size", 8000),
            Err(ParamError::LoadOptionLocked(_))
        ));
        session.set_param("temperature", 0.3).unwrap();
        assert_eq!(session.params().load.ctx_size, 4000);
        assert_eq!(backend.last_load().unwrap().ctx_size, 4000);
    }

    #[test]
    fn extra_options_reach_the_backend() {
        let backend = ScriptedBackend::new();
        let mut session = session(&backend);
        session.set_param("flash_attn", true).unwrap();
        session.set_param("split_mode", "row").unwrap();
        session.load().unwrap();

        let loaded = backend.last_params().unwrap();
        assert_eq!(loaded.extra.get("flash_attn"), Some(&Value::Bool(true)));
        assert_eq!(loaded.load.split_mode, crate::llm::params::SplitMode::Row);
    }

    #[test]
    fn release_and_drop_free_the_instance() {
        let backend = ScriptedBackend::new();
        {
            let mut session = session(&backend);
            session.load().unwrap();
            session.release();
            assert!(!session.is_loaded());
            assert_eq!(backend.releases(), 1);
            session.load().unwrap();
        }
        assert_eq!(backend.loads(), 2);
        assert_eq!(backend.releases(), 2);
    }
}
