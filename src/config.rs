//! Runtime configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub payment_api_url: String,
    pub payment_secret_key: String,
    pub payment_currency: String,
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
    pub http_timeout_secs: u64,
}

/// Loads `.env` if present, then reads the process environment.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

/// Parses configuration from `lookup`, so tests can pass a map instead of touching the environment.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };
    let or_default = |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    Ok(AppConfig {
        database_url: require("DATABASE_URL")?,
        bind_addr: parse(&or_default, "BIND_ADDR", "0.0.0.0:8083")?,
        log_level: or_default("LOG_LEVEL", "info"),
        db_max_connections: parse(&or_default, "DB_MAX_CONNECTIONS", "10")?,
        payment_api_url: or_default("PAYMENT_API_URL", "https://api.stripe.com"),
        payment_secret_key: require("PAYMENT_SECRET_KEY")?,
        payment_currency: or_default("PAYMENT_CURRENCY", "eur").to_lowercase(),
        email_api_url: or_default("EMAIL_API_URL", "https://api.resend.com"),
        email_api_key: require("EMAIL_API_KEY")?,
        email_from: or_default("EMAIL_FROM", "Bestellungen <bestellung@example.com>"),
        http_timeout_secs: parse(&or_default, "HTTP_TIMEOUT_SECS", "30")?,
    })
}

fn parse<T>(or_default: &dyn Fn(&str, &str) -> String, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    or_default(var, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar { var: var.to_string(), reason: e.to_string() })
}
