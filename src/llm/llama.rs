use std::sync::Once;

use llama_cpp::standard_sampler::{SamplerStage, StandardSampler};
use llama_cpp::{LlamaModel, LlamaParams, SessionParams, SplitMode as LlamaSplitMode};
use tracing::{debug, info, warn};

use super::backend::{
    CHATML_END, ChatCompletion, ChatMessage, LoadedModel, ModelBackend, find_stop, format_chatml,
    ignored_options,
};
use super::params::{GenerationParams, LoadParams, ModelParameters, SplitMode};
use crate::error::BackendError;

/// Local GGUF inference through `llama_cpp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LlamaCppBackend;

impl ModelBackend for LlamaCppBackend {
    fn name(&self) -> &'static str {
        "llama.cpp"
    }

    fn load(&self, all: &ModelParameters) -> Result<Box<dyn LoadedModel>, BackendError> {
        let params = &all.load;
        if !params.model_path.is_file() {
            return Err(BackendError::MissingModel(params.model_path.clone()));
        }
        if params.chat_format != "chatml" {
            warn!(
                "Chat format '{}' is not supported, using chatml",
                params.chat_format
            );
        }

        for option in ignored_options(all) {
            warn!("Option '{}' is not supported by llama_cpp, ignoring it", option);
        }

        let llama_params = LlamaParams {
            n_gpu_layers: params.n_gpu_layers,
            split_mode: match params.split_mode {
                SplitMode::None => LlamaSplitMode::None,
                SplitMode::Layer => LlamaSplitMode::Layer,
                SplitMode::Row => LlamaSplitMode::Row,
            },
            main_gpu: params.main_gpu,
            vocab_only: params.vocab_only,
            use_mmap: params.use_mmap,
            use_mlock: params.use_mlock,
            ..Default::default()
        };
        info!(
            n_gpu_layers = params.n_gpu_layers,
            use_mmap = params.use_mmap,
            use_mlock = params.use_mlock,
            "Loading model via llama_cpp: {}",
            params.model_path.display()
        );
        let model = LlamaModel::load_from_file(&params.model_path, llama_params)
            .map_err(|e| BackendError::Backend(format!("llama_cpp load failed: {}", e)))?;

        Ok(Box::new(LlamaInstance {
            model,
            load: params.clone(),
        }))
    }
}

struct LlamaInstance {
    model: LlamaModel,
    load: LoadParams,
}

static MIROSTAT_WARNING: Once = Once::new();

fn sampler_for(params: &GenerationParams, last_n: u32) -> StandardSampler {
    if params.mirostat_mode != 0 {
        MIROSTAT_WARNING.call_once(|| {
            warn!("Mirostat sampling is not supported by this backend, using softmax stages");
        });
    }
    let stages = vec![
        SamplerStage::RepetitionPenalty {
            repetition_penalty: params.repeat_penalty,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
            last_n: last_n as i32,
        },
        SamplerStage::TopK(params.top_k),
        SamplerStage::TailFree(params.tfs_z),
        SamplerStage::Typical(params.typical_p),
        SamplerStage::TopP(params.top_p),
        SamplerStage::MinP(params.min_p),
        SamplerStage::Temperature(params.temperature),
    ];
    StandardSampler::new_softmax(stages, 1)
}

impl LoadedModel for LlamaInstance {
    fn chat_completion(
        &mut self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<ChatCompletion, BackendError> {
        let session_params = SessionParams {
            seed: params.seed.unwrap_or(self.load.seed),
            n_ctx: self.load.ctx_size,
            n_batch: self.load.batch_size,
            n_threads: self.load.threads,
            n_threads_batch: self.load.threads_batch.unwrap_or(self.load.threads),
            rope_freq_base: self.load.rope_freq_base,
            rope_freq_scale: self.load.rope_freq_scale,
            yarn_ext_factor: self.load.yarn_ext_factor,
            yarn_attn_factor: self.load.yarn_attn_factor,
            yarn_beta_fast: self.load.yarn_beta_fast,
            yarn_beta_slow: self.load.yarn_beta_slow,
            yarn_orig_ctx: self.load.yarn_orig_ctx,
            offload_kqv: self.load.offload_kqv,
            ..Default::default()
        };
        let mut session = self
            .model
            .create_session(session_params)
            .map_err(|e| BackendError::Backend(format!("failed to create session: {}", e)))?;

        let prompt = format_chatml(messages);
        session
            .advance_context(&prompt)
            .map_err(|e| BackendError::Backend(format!("failed to advance context: {}", e)))?;

        let max_tokens = params.max_tokens.unwrap_or(self.load.ctx_size) as usize;
        let sampler = sampler_for(params, self.load.last_n_tokens_size);
        let handle = session
            .start_completing_with(sampler, max_tokens)
            .map_err(|e| BackendError::Backend(format!("failed to start completion: {}", e)))?;

        let mut stops = params.stop.clone();
        stops.push(CHATML_END.to_string());

        let mut text = String::new();
        let mut generated = 0usize;
        let mut finish_reason = "stop";
        for token in handle {
            generated += 1;
            text.push_str(&self.model.token_to_piece(token));
            if let Some(cut) = find_stop(&text, &stops) {
                text.truncate(cut);
                break;
            }
            if generated >= max_tokens {
                finish_reason = "length";
                break;
            }
        }
        debug!("Completion finished ({}), {} chars", finish_reason, text.len());

        Ok(ChatCompletion::from_text(text, Some(finish_reason)))
    }
}
