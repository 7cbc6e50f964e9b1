use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::analysis::pipeline::AnalysisSettings;
use crate::llm_client::DEFAULT_API_URL;

/// Application configuration loaded from environment variables.
/// Nothing is required; a missing credential disables the text-generation stages.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub llm_api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_timeout_secs: u64,
    pub enable_enhanced_matching: bool,
    pub skill_taxonomy_path: Option<PathBuf>,
    pub debug_diagnostics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            llm_api_key: None,
            llm_api_url: DEFAULT_API_URL.to_string(),
            llm_timeout_secs: 30,
            enable_enhanced_matching: true,
            skill_taxonomy_path: None,
            debug_diagnostics: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key → value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            port: match get("PORT") {
                Some(v) => v
                    .trim()
                    .parse::<u16>()
                    .context("PORT must be a valid port number")?,
                None => defaults.port,
            },
            rust_log: get("RUST_LOG").unwrap_or(defaults.rust_log),
            llm_api_key: get("GROQ_API_KEY").or_else(|| get("LLAMA_API_KEY")),
            llm_api_url: get("LLM_API_URL").unwrap_or(defaults.llm_api_url),
            llm_timeout_secs: match get("LLM_TIMEOUT_SECS") {
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .context("LLM_TIMEOUT_SECS must be a positive number of seconds")?,
                None => defaults.llm_timeout_secs,
            },
            enable_enhanced_matching: match get("ENABLE_ENHANCED_MATCHING") {
                Some(v) => parse_bool(&v).with_context(|| {
                    format!("ENABLE_ENHANCED_MATCHING must be true or false, got '{v}'")
                })?,
                None => defaults.enable_enhanced_matching,
            },
            skill_taxonomy_path: get("SKILL_TAXONOMY_PATH").map(PathBuf::from),
            debug_diagnostics: get("APP_ENV")
                .map(|env| !env.trim().eq_ignore_ascii_case("production"))
                .unwrap_or(defaults.debug_diagnostics),
        })
    }

    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            enhanced_matching: self.enable_enhanced_matching,
            debug_diagnostics: self.debug_diagnostics,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
