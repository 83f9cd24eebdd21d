use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::content::DEFAULT_TITLE_ATTEMPTS;
use crate::llm::params::ModelParameters;
use crate::tags::DEFAULT_MAX_TAGS;

pub const LLM_PATH_VAR: &str = "LLM_PATH";
pub const OUTPUT_DIR_VAR: &str = "OUTPUT_DIR";
pub const DEFAULT_LLM_PATH: &str = "./media/llm/model.gguf";
pub const DEFAULT_OUTPUT_DIR: &str = "./";

pub fn available_cpus() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

fn default_video_tags() -> Vec<String> {
    ["reddit", "redditstories", "reddit stories", "storytime", "shorts"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Settings read from `config/config.json`. Every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub num_cpu: u32,
    /// Appended to the tags of every loaded metadata record.
    pub video_tags: Vec<String>,
    pub title_max_attempts: usize,
    pub max_tags: usize,
    /// Model parameter overrides, applied by key.
    pub model: BTreeMap<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_cpu: available_cpus(),
            video_tags: default_video_tags(),
            title_max_attempts: DEFAULT_TITLE_ATTEMPTS,
            max_tags: DEFAULT_MAX_TAGS,
            model: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&data)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Default model parameters for this configuration.
    pub fn model_parameters(&self, model_path: PathBuf) -> anyhow::Result<ModelParameters> {
        let mut params = ModelParameters::default();
        params.load.model_path = model_path;
        params.load.threads = self.num_cpu;
        for (key, value) in &self.model {
            params.set(key, value.clone())?;
        }
        Ok(params)
    }
}

/// `value` unless it is missing or empty, in which case `default`.
pub fn or_default(name: &str, value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        Some(_) => {
            warn!("{} is set but empty, using {}", name, default);
            default.to_string()
        }
        None => default.to_string(),
    }
}

pub fn env_or_default(name: &str, default: &str) -> String {
    or_default(name, std::env::var(name).ok(), default)
}

pub fn llm_path() -> PathBuf {
    PathBuf::from(env_or_default(LLM_PATH_VAR, DEFAULT_LLM_PATH))
}

pub fn output_dir() -> PathBuf {
    PathBuf::from(env_or_default(OUTPUT_DIR_VAR, DEFAULT_OUTPUT_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn empty_and_missing_values_fall_back() {
        assert_eq!(or_default("X", None, "d"), "d");
        assert_eq!(or_default("X", Some(String::new()), "d"), "d");
        assert_eq!(or_default("X", Some("set".into()), "d"), "set");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.max_tags, DEFAULT_MAX_TAGS);
        assert_eq!(config.video_tags, default_video_tags());
        assert!(config.num_cpu >= 1);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"num_cpu": 6, "video_tags": ["aita"], "model": {"temperature": 0.4, "n_gpu_layers": 0}}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.num_cpu, 6);
        assert_eq!(config.video_tags, vec!["aita".to_string()]);
        assert_eq!(config.title_max_attempts, DEFAULT_TITLE_ATTEMPTS);

        let params = config.model_parameters(PathBuf::from("/models/m.gguf")).unwrap();
        assert_eq!(params.load.threads, 6);
        assert_eq!(params.load.n_gpu_layers, 0);
        assert_eq!(params.load.model_path, PathBuf::from("/models/m.gguf"));
        assert!((params.generation.temperature - 0.4).abs() < 1e-6);
    }

    #[test]
    fn bad_override_is_an_error() {
        let config = Config {
            model: BTreeMap::from([("ctx_size".to_string(), json!("huge"))]),
            ..Config::default()
        };
        assert!(config.model_parameters(PathBuf::from("m.gguf")).is_err());
    }
}
