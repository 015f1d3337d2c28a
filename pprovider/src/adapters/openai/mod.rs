//! Remote models served by the OpenAI API.

mod provider;

pub use provider::OpenAiProvider;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
