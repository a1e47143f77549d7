//! Configuration module for the CSR backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

/// Where events, tasks, volunteers and impact metrics live.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    /// Managed backend reached through its PostgREST table API.
    Rest { url: String, service_key: String },
    /// Embedded SQLite database (local development and tests).
    Sqlite { db_path: PathBuf },
}

/// Completion API settings.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Base URL, `/chat/completions` is appended
    pub base_url: String,
    /// Bearer token, omitted from requests when unset
    pub api_key: Option<String>,
    pub model: String,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional pre-shared key guarding `/api`
    pub api_psk: Option<String>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of the human readable format
    pub log_json: bool,
    pub store: StoreConfig,
    pub completion: CompletionConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("CSR_API_PSK").ok().filter(|s| !s.is_empty());

        let bind_addr = env::var("CSR_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:5000".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid CSR_BIND_ADDR format: {}", e)))?;

        let log_level = env::var("CSR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_json = env::var("CSR_LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let store = match env::var("SUPABASE_URL").ok().filter(|s| !s.is_empty()) {
            Some(url) => StoreConfig::Rest {
                url,
                service_key: env::var("SUPABASE_SERVICE_ROLE_KEY").map_err(|_| {
                    AppError::Config(
                        "SUPABASE_SERVICE_ROLE_KEY is required when SUPABASE_URL is set"
                            .to_string(),
                    )
                })?,
            },
            None => StoreConfig::Sqlite {
                db_path: env::var("CSR_DB_PATH")
                    .unwrap_or_else(|_| "./data/csr.sqlite".to_string())
                    .into(),
            },
        };

        let completion = CompletionConfig {
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty()),
            model: env::var("CSR_AI_MODEL").unwrap_or_else(|_| "gpt-4".to_string()),
            max_tokens: parse_var("CSR_AI_MAX_TOKENS", 500)?,
            timeout: Duration::from_secs(parse_var("CSR_AI_TIMEOUT_SECS", 60)?),
        };

        Ok(Self {
            api_psk,
            bind_addr,
            log_level,
            log_json,
            store,
            completion,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
