pub mod backend;
#[cfg(feature = "llama")]
pub mod llama;
pub mod params;
pub mod seed;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use backend::ModelBackend;

/// The inference backend compiled into this build.
pub fn default_backend() -> Arc<dyn ModelBackend> {
    #[cfg(feature = "llama")]
    {
        Arc::new(llama::LlamaCppBackend)
    }
    #[cfg(not(feature = "llama"))]
    {
        tracing::warn!("Built without the `llama` feature, generation will fall back");
        Arc::new(backend::UnavailableBackend)
    }
}
