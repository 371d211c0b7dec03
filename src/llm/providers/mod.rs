//! LLM provider implementations.
//!
//! `build_*` are the factories, called once at startup. Each returns `None`
//! when its API key is not configured. Keys come from the environment only.

pub mod deepseek;
pub mod gemini;

use crate::config::Config;
use crate::llm::{Classifier, ProviderError};

pub fn build_gemini(config: &Config) -> Result<Option<Box<dyn Classifier>>, ProviderError> {
    let Some(key) = config.gemini_api_key.clone() else {
        return Ok(None);
    };
    let p = gemini::GeminiProvider::new(&config.gemini, key)?;
    Ok(Some(Box::new(p)))
}

pub fn build_deepseek(config: &Config) -> Result<Option<Box<dyn Classifier>>, ProviderError> {
    let Some(key) = config.deepseek_api_key.clone() else {
        return Ok(None);
    };
    let p = deepseek::DeepSeekProvider::new(&config.deepseek, key)?;
    Ok(Some(Box::new(p)))
}
