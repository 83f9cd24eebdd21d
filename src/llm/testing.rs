//! In-memory backend that replays queued completions and records what it saw.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::backend::{ChatCompletion, ChatMessage, LoadedModel, ModelBackend};
use super::params::{GenerationParams, LoadParams, ModelParameters};
use crate::error::BackendError;

#[derive(Default)]
struct State {
    fail_load: bool,
    responses: VecDeque<Result<ChatCompletion, BackendError>>,
    loads: Vec<ModelParameters>,
    prompts: Vec<Vec<ChatMessage>>,
    releases: usize,
}

#[derive(Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<State>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_load() -> Arc<Self> {
        let backend = Self::default();
        backend.state.lock().unwrap().fail_load = true;
        Arc::new(backend)
    }

    pub fn push(&self, response: Result<ChatCompletion, BackendError>) {
        self.state.lock().unwrap().responses.push_back(response);
    }

    pub fn push_text(&self, text: &str) {
        self.push(Ok(ChatCompletion::from_text(text, Some("stop"))));
    }

    pub fn loads(&self) -> usize {
        self.state.lock().unwrap().loads.len()
    }

    pub fn last_load(&self) -> Option<LoadParams> {
        self.last_params().map(|p| p.load)
    }

    pub fn last_params(&self) -> Option<ModelParameters> {
        self.state.lock().unwrap().loads.last().cloned()
    }

    pub fn load_seeds(&self) -> Vec<u32> {
        let state = self.state.lock().unwrap();
        state.loads.iter().map(|p| p.load.seed).collect()
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().prompts.len()
    }

    pub fn prompts(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .prompts
            .iter()
            .filter_map(|m| m.first().and_then(|m| m.content.clone()))
            .collect()
    }

    pub fn releases(&self) -> usize {
        self.state.lock().unwrap().releases
    }
}

impl ModelBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn load(&self, params: &ModelParameters) -> Result<Box<dyn LoadedModel>, BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_load {
            return Err(BackendError::MissingModel(params.load.model_path.clone()));
        }
        state.loads.push(params.clone());
        Ok(Box::new(ScriptedModel {
            state: Arc::clone(&self.state),
        }))
    }
}

struct ScriptedModel {
    state: Arc<Mutex<State>>,
}

impl LoadedModel for ScriptedModel {
    fn chat_completion(
        &mut self,
        messages: &[ChatMessage],
        _params: &GenerationParams,
    ) -> Result<ChatCompletion, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.prompts.push(messages.to_vec());
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Backend("script exhausted".into())))
    }
}

impl Drop for ScriptedModel {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.releases += 1;
        }
    }
}
