pub mod args;
pub mod config;
pub mod content;
pub mod error;
pub mod llm;
pub mod meta;
pub mod pos;
pub mod prompts;
pub mod tags;

pub use content::ContentGenerator;
pub use error::{Artifact, FALLBACK_RESPONSE, GenerationError};
