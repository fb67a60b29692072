use std::time::Duration;

use lostfound_core::filter::{DEFAULT_RESULT_LIMIT, clamp_limit};

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL_TIMEOUT_MS: u64 = 8_000;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}': expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub port: u16,
    /// `None` when no API key is configured; search then always uses the fallback
    pub gemini: Option<GeminiConfig>,
    pub model_timeout: Duration,
    pub search_limit: usize,
    pub cors_origins: Vec<String>,
    pub skip_migrations: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let gemini = var("GEMINI_API_KEY").map(|api_key| GeminiConfig {
            api_key,
            model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url: var("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        });

        let cors_origins = var("LOSTFOUND_CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url,
            max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                var("DATABASE_MAX_CONNECTIONS"),
                DEFAULT_MAX_CONNECTIONS,
                "a positive integer",
            )?,
            port: parse_or("PORT", var("PORT"), DEFAULT_PORT, "a port number")?,
            gemini,
            model_timeout: Duration::from_millis(parse_or(
                "GEMINI_TIMEOUT_MS",
                var("GEMINI_TIMEOUT_MS"),
                DEFAULT_MODEL_TIMEOUT_MS,
                "milliseconds",
            )?),
            search_limit: clamp_limit(parse_or(
                "SEARCH_RESULT_LIMIT",
                var("SEARCH_RESULT_LIMIT"),
                DEFAULT_RESULT_LIMIT,
                "a positive integer",
            )?),
            cors_origins,
            skip_migrations: var("LOSTFOUND_SKIP_MIGRATIONS")
                .is_some_and(|value| value.eq_ignore_ascii_case("true")),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
            expected,
        }),
    }
}
