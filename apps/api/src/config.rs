use std::str::FromStr;

use anyhow::{Context, Result};
use crate::llm_client::{LlmConfig, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// A missing `ANTHROPIC_API_KEY` does not stop startup; gateway calls fail instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub llm_timeout_secs: u64,
    pub llm_max_retries: u32,
    /// Ceiling on HandleError passes before a resume run is declared failed.
    pub resume_max_repair_attempts: u32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let anthropic_api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        Ok(Config {
            anthropic_api_key,
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            llm_max_tokens: parse_env("LLM_MAX_TOKENS", 4096)?,
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 120)?,
            llm_max_retries: parse_env("LLM_MAX_RETRIES", 2)?,
            resume_max_repair_attempts: parse_env("RESUME_MAX_REPAIR_ATTEMPTS", 3)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.anthropic_api_key.is_some()
    }

    /// Gateway settings handed to `LlmClient::new`.
    pub fn llm(&self) -> LlmConfig {
        LlmConfig {
            api_key: self.anthropic_api_key.clone(),
            model: self.llm_model.clone(),
            max_tokens: self.llm_max_tokens,
            timeout_secs: self.llm_timeout_secs,
            max_retries: self.llm_max_retries.max(1),
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
