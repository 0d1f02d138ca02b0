//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables (nested keys
//! use a `__` separator, e.g. `LLM__MODEL`). A `.env` file is read first
//! when present.

use crate::error::StartupError;
use foodiespot_core::Result;
use serde::Deserialize;

/// Legacy variable names read when the nested key is not set.
const FALLBACK_KEYS: [(&str, &str); 2] = [
    ("OPENAI_API_KEY", "llm.api_key"),
    ("LLM_MODEL_NAME", "llm.model"),
];

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// SQLite database connection URL.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Address the web shell listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Remote model configuration.
    #[serde(default)]
    pub llm: LlmSettings,

    /// Sample data configuration.
    #[serde(default)]
    pub seed: SeedConfig,

    /// Conversation session configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Remote model configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Bearer token, if the provider needs one.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Request timeout in seconds. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Sample data configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Whether to seed an empty database on startup.
    #[serde(default)]
    pub enabled: bool,

    /// Number of restaurants to generate.
    #[serde(default = "default_seed_restaurants")]
    pub restaurants: u32,
}

/// Conversation session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Sessions idle for longer than this are dropped, in seconds.
    #[serde(default = "default_idle_timeout_seconds")]
    pub idle_timeout_seconds: u64,

    /// Interval between idle session sweeps, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

fn default_database_url() -> String {
    "sqlite://data.db?mode=rwc".to_string()
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_llm_model() -> String {
    "llama-3.1-8b".to_string()
}

fn default_seed_restaurants() -> u32 {
    50
}

fn default_idle_timeout_seconds() -> u64 {
    1800
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: None,
            model: default_llm_model(),
            timeout_secs: None,
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            restaurants: default_seed_restaurants(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: default_idle_timeout_seconds(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from `.env` and the process environment.
    ///
    /// # Errors
    ///
    /// Returns `StartupError::Config` if a value is present but invalid.
    pub fn from_env() -> Result<Self, StartupError> {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();
        let config = Self::load(config::Environment::default(), |key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Loads configuration from `env`, using `lookup` for the legacy fallbacks.
    fn load(
        env: config::Environment,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::result::Result<Self, StartupError> {
        let invalid = |e: config::ConfigError| StartupError::Config {
            details: e.to_string(),
        };

        let mut builder = config::Config::builder();
        for (variable, key) in FALLBACK_KEYS {
            if let Some(value) = lookup(variable) {
                builder = builder.set_default(key, value).map_err(invalid)?;
            }
        }

        builder
            .add_source(env.separator("__").try_parsing(true))
            .build()
            .map_err(invalid)?
            .try_deserialize()
            .map_err(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn try_load(vars: &[(&str, &str)]) -> std::result::Result<ServerConfig, StartupError> {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let lookup = map.clone();
        let env = config::Environment::default().source(Some(map));
        ServerConfig::load(env, move |key| lookup.get(key).cloned())
    }

    fn load(vars: &[(&str, &str)]) -> ServerConfig {
        try_load(vars).expect("config loads")
    }

    #[test]
    fn defaults_apply_to_empty_environment() {
        let config = load(&[]);
        assert_eq!(config.database_url, "sqlite://data.db?mode=rwc");
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.llm.base_url, "https://api.openai.com");
        assert_eq!(config.llm.model, "llama-3.1-8b");
        assert_eq!(config.llm.api_key, None);
        assert!(!config.seed.enabled);
        assert_eq!(config.seed.restaurants, 50);
        assert_eq!(config.session.idle_timeout_seconds, 1800);
        assert_eq!(config.session.cleanup_interval_seconds, 300);
    }

    #[test]
    fn session_timeouts_are_configurable() {
        let config = load(&[
            ("SESSION__IDLE_TIMEOUT_SECONDS", "60"),
            ("SESSION__CLEANUP_INTERVAL_SECONDS", "10"),
        ]);
        assert_eq!(config.session.idle_timeout_seconds, 60);
        assert_eq!(config.session.cleanup_interval_seconds, 10);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let err = try_load(&[("SEED__RESTAURANTS", "plenty")]).unwrap_err();
        assert!(matches!(err, StartupError::Config { .. }));
        assert!(err.to_string().starts_with("invalid configuration"));
    }

    #[test]
    fn nested_keys_are_read() {
        let config = load(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("LLM__MODEL", "gpt-4o-mini"),
            ("LLM__API_KEY", "sk-nested"),
            ("SEED__ENABLED", "true"),
            ("SEED__RESTAURANTS", "5"),
        ]);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-nested"));
        assert!(config.seed.enabled);
        assert_eq!(config.seed.restaurants, 5);
    }

    #[test]
    fn legacy_names_are_fallbacks() {
        let config = load(&[("OPENAI_API_KEY", "sk-legacy"), ("LLM_MODEL_NAME", "llama-3")]);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-legacy"));
        assert_eq!(config.llm.model, "llama-3");

        let config = load(&[("OPENAI_API_KEY", "sk-legacy"), ("LLM__API_KEY", "sk-nested")]);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-nested"));
    }
}
