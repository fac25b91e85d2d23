//! # Application Configuration
//!
//! Configuration loaded from environment variables and validated on startup
//! to fail fast if misconfigured.
//!
//! Use [`core_config()`] to access the global instance after a single
//! [`init_config()`] call at application startup.

use lib_utils::envs::{self, get_env, get_env_parse};
use std::str::FromStr;
use std::sync::OnceLock;

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// SQLite database connection URL
    pub database_url: String,

    /// Secret key for JWT token signing and verification
    ///
    /// **Must be at least 32 characters long** for security.
    pub jwt_secret: String,

    /// JWT token validity period in hours (1-720)
    pub jwt_expiration_hours: i64,

    /// Directory where promoted processed assets are written
    pub asset_store_dir: String,

    /// Base URL of the market data API (Binance-style REST)
    pub market_api_base: String,

    /// Quote currency suffix appended to bare symbols (e.g. "USDT")
    pub quote_suffix: String,

    /// Primary news API base URL
    pub news_api_base: String,

    /// API key for the primary news API (empty forces the fallback)
    pub news_api_key: String,

    /// Fallback news API base URL
    pub news_fallback_base: String,

    /// LLM chat-completions endpoint
    pub llm_api_base: String,

    /// API key for the LLM endpoint (empty disables analysis)
    pub llm_api_key: String,

    /// Model name sent to the LLM endpoint
    pub llm_model: String,

    /// Coins granted to every new account
    pub signup_grant: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_or("DATABASE_URL", "sqlite:data/coinforge.db");

        let jwt_secret =
            get_env("JWT_SECRET").map_err(|_| "JWT_SECRET must be set in environment")?;

        let jwt_expiration_hours = env_parse_or("JWT_EXPIRATION_HOURS", 24)?;

        let asset_store_dir = env_or("ASSET_STORE_DIR", "data/assets");

        let market_api_base = env_or("MARKET_API_BASE", "https://api.binance.com/api/v3");

        let quote_suffix = env_or("QUOTE_SUFFIX", "USDT");

        let news_api_base = env_or("NEWS_API_BASE", "https://newsapi.org/v2");

        let news_api_key = get_env("NEWS_API_KEY").unwrap_or_default();

        let news_fallback_base = env_or(
            "NEWS_FALLBACK_BASE",
            "https://min-api.cryptocompare.com/data/v2",
        );

        let llm_api_base = env_or("LLM_API_BASE", "https://api.together.xyz/v1");

        let llm_api_key = get_env("LLM_API_KEY").unwrap_or_default();

        let llm_model = env_or("LLM_MODEL", "meta-llama/Llama-3.3-70B-Instruct-Turbo");

        let signup_grant = env_parse_or("SIGNUP_GRANT", 25)?;

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration_hours,
            asset_store_dir,
            market_api_base,
            quote_suffix,
            news_api_base,
            news_api_key,
            news_fallback_base,
            llm_api_base,
            llm_api_key,
            llm_model,
            signup_grant,
        })
    }

    /// Validate configuration values against security and business rules.
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 characters long".to_string());
        }

        if self.jwt_expiration_hours < 1 || self.jwt_expiration_hours > 720 {
            return Err("JWT_EXPIRATION_HOURS must be between 1 and 720 (30 days)".to_string());
        }

        if self.signup_grant < 0 {
            return Err("SIGNUP_GRANT cannot be negative".to_string());
        }

        if self.quote_suffix.is_empty() {
            return Err("QUOTE_SUFFIX cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Read an environment variable, falling back to a default when unset.
fn env_or(name: &'static str, default: &str) -> String {
    get_env(name).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default when unset.
/// A set-but-unparseable value is an error, not a silent default.
fn env_parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, String> {
    match get_env_parse(name) {
        Ok(value) => Ok(value),
        Err(envs::Error::MissingEnv(_)) => Ok(default),
        Err(e) => Err(format!("{}: {}", name, e)),
    }
}

/// Global configuration instance (initialized once at startup).
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Initialize the global configuration.
///
/// Must be called once at application startup, before any handlers or
/// services that need configuration run.
pub fn init_config() -> Result<(), String> {
    let config = Config::from_env()?;
    config.validate()?;

    CONFIG
        .set(config)
        .map_err(|_| "Config has already been initialized".to_string())
}

/// Get a reference to the global configuration.
///
/// # Panics
///
/// Panics if [`init_config()`] has not been called yet.
pub fn core_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Config must be initialized with init_config() before use")
}
