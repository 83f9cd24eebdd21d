use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParamError;

/// llama.cpp's "pick a random seed" value.
pub const DEFAULT_SEED: u32 = 0xFFFF_FFFF;
pub const DEFAULT_CTX_SIZE: u32 = 2096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    None,
    Layer,
    Row,
}

/// Options consumed when the model instance is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadParams {
    pub model_path: PathBuf,
    pub n_gpu_layers: u32,
    pub split_mode: SplitMode,
    pub main_gpu: u32,
    pub tensor_split: Option<Vec<f32>>,
    pub vocab_only: bool,
    pub use_mmap: bool,
    pub use_mlock: bool,
    pub seed: u32,
    pub ctx_size: u32,
    pub batch_size: u32,
    pub threads: u32,
    /// Falls back to `threads` when unset.
    pub threads_batch: Option<u32>,
    pub rope_freq_base: f32,
    pub rope_freq_scale: f32,
    pub yarn_ext_factor: f32,
    pub yarn_attn_factor: f32,
    pub yarn_beta_fast: f32,
    pub yarn_beta_slow: f32,
    pub yarn_orig_ctx: u32,
    pub offload_kqv: bool,
    pub last_n_tokens_size: u32,
    pub lora_path: Option<PathBuf>,
    pub chat_format: String,
}

impl Default for LoadParams {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(crate::config::DEFAULT_LLM_PATH),
            n_gpu_layers: 8,
            split_mode: SplitMode::Layer,
            main_gpu: 0,
            tensor_split: None,
            vocab_only: false,
            use_mmap: true,
            use_mlock: false,
            seed: DEFAULT_SEED,
            ctx_size: DEFAULT_CTX_SIZE,
            batch_size: 512,
            threads: crate::config::available_cpus(),
            threads_batch: None,
            rope_freq_base: 0.0,
            rope_freq_scale: 0.0,
            yarn_ext_factor: -1.0,
            yarn_attn_factor: 1.0,
            yarn_beta_fast: 32.0,
            yarn_beta_slow: 1.0,
            yarn_orig_ctx: 0,
            offload_kqv: true,
            last_n_tokens_size: 64,
            lora_path: None,
            chat_format: "chatml".to_string(),
        }
    }
}

/// Sampling options applied to each completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: i32,
    pub min_p: f32,
    pub typical_p: f32,
    pub tfs_z: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub repeat_penalty: f32,
    pub mirostat_mode: u8,
    pub mirostat_tau: f32,
    pub mirostat_eta: f32,
    pub stop: Vec<String>,
    pub max_tokens: Option<u32>,
    /// Overrides the load seed for a single call.
    pub seed: Option<u32>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.7,
            top_k: 10,
            min_p: 0.05,
            typical_p: 1.0,
            tfs_z: 1.0,
            presence_penalty: 0.6,
            frequency_penalty: 0.5,
            repeat_penalty: 1.3,
            mirostat_mode: 0,
            mirostat_tau: 5.0,
            mirostat_eta: 0.1,
            stop: Vec::new(),
            max_tokens: None,
            seed: None,
        }
    }
}

/// Full parameter set for one session.
///
/// Values are never range checked: whatever is set is handed to the backend.
/// Keys that do not name a typed field land in `extra` so backend specific
/// flags can still be passed through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub load: LoadParams,
    pub generation: GenerationParams,
    pub extra: BTreeMap<String, Value>,
}

const LOAD_KEYS: &[&str] = &[
    "model_path",
    "n_gpu_layers",
    "split_mode",
    "main_gpu",
    "tensor_split",
    "vocab_only",
    "use_mmap",
    "use_mlock",
    "seed",
    "ctx_size",
    "batch_size",
    "threads",
    "threads_batch",
    "rope_freq_base",
    "rope_freq_scale",
    "yarn_ext_factor",
    "yarn_attn_factor",
    "yarn_beta_fast",
    "yarn_beta_slow",
    "yarn_orig_ctx",
    "offload_kqv",
    "last_n_tokens_size",
    "lora_path",
    "chat_format",
];

/// True when `key` names an option that is consumed at load time.
pub fn is_load_key(key: &str) -> bool {
    LOAD_KEYS.contains(&key)
}

fn assign<T: DeserializeOwned>(slot: &mut T, key: &str, value: Value) -> Result<(), ParamError> {
    *slot = serde_json::from_value(value).map_err(|source| ParamError::InvalidValue {
        key: key.to_string(),
        source,
    })?;
    Ok(())
}

impl ModelParameters {
    /// Stores `value` under `key`.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ParamError> {
        let value = value.into();
        let load = &mut self.load;
        let generation = &mut self.generation;
        match key {
            "model_path" => assign(&mut load.model_path, key, value),
            "n_gpu_layers" => assign(&mut load.n_gpu_layers, key, value),
            "split_mode" => assign(&mut load.split_mode, key, value),
            "main_gpu" => assign(&mut load.main_gpu, key, value),
            "tensor_split" => assign(&mut load.tensor_split, key, value),
            "vocab_only" => assign(&mut load.vocab_only, key, value),
            "use_mmap" => assign(&mut load.use_mmap, key, value),
            "use_mlock" => assign(&mut load.use_mlock, key, value),
            "seed" => assign(&mut load.seed, key, value),
            "ctx_size" => assign(&mut load.ctx_size, key, value),
            "batch_size" => assign(&mut load.batch_size, key, value),
            "threads" => assign(&mut load.threads, key, value),
            "threads_batch" => assign(&mut load.threads_batch, key, value),
            "rope_freq_base" => assign(&mut load.rope_freq_base, key, value),
            "rope_freq_scale" => assign(&mut load.rope_freq_scale, key, value),
            "yarn_ext_factor" => assign(&mut load.yarn_ext_factor, key, value),
            "yarn_attn_factor" => assign(&mut load.yarn_attn_factor, key, value),
            "yarn_beta_fast" => assign(&mut load.yarn_beta_fast, key, value),
            "yarn_beta_slow" => assign(&mut load.yarn_beta_slow, key, value),
            "yarn_orig_ctx" => assign(&mut load.yarn_orig_ctx, key, value),
            "offload_kqv" => assign(&mut load.offload_kqv, key, value),
            "last_n_tokens_size" => assign(&mut load.last_n_tokens_size, key, value),
            "lora_path" => assign(&mut load.lora_path, key, value),
            "chat_format" => assign(&mut load.chat_format, key, value),

            "temperature" => assign(&mut generation.temperature, key, value),
            "top_p" => assign(&mut generation.top_p, key, value),
            "top_k" => assign(&mut generation.top_k, key, value),
            "min_p" => assign(&mut generation.min_p, key, value),
            "typical_p" => assign(&mut generation.typical_p, key, value),
            "tfs_z" => assign(&mut generation.tfs_z, key, value),
            "presence_penalty" => assign(&mut generation.presence_penalty, key, value),
            "frequency_penalty" => assign(&mut generation.frequency_penalty, key, value),
            "repeat_penalty" => assign(&mut generation.repeat_penalty, key, value),
            "mirostat_mode" => assign(&mut generation.mirostat_mode, key, value),
            "mirostat_tau" => assign(&mut generation.mirostat_tau, key, value),
            "mirostat_eta" => assign(&mut generation.mirostat_eta, key, value),
            "stop" => assign(&mut generation.stop, key, value),
            "max_tokens" => assign(&mut generation.max_tokens, key, value),
            "msg_seed" => assign(&mut generation.seed, key, value),

            _ => {
                self.extra.insert(key.to_string(), value);
                Ok(())
            }
        }
    }
}
