//! Local models served by Ollama.
//!
//! Chat goes through the OpenAI-compatible `/v1` surface; model management uses the
//! native `/api` endpoints.

mod models;
mod provider;

pub use models::OllamaModelRegistry;
pub use provider::OllamaProvider;

pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
pub const OLLAMA_HOST_URL: &str = "http://localhost:11434";
