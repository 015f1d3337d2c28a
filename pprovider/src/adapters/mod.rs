#[cfg(feature = "completions")]
pub mod completions;

#[cfg(feature = "provider-openai")]
pub mod openai;

#[cfg(feature = "provider-ollama")]
pub mod ollama;
