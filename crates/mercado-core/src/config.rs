use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_VECTOR_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_cap = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        match raw.parse::<usize>() {
            Ok(0) => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "worker cap must be at least 1".to_string(),
            }),
            Ok(n) => Ok(n),
            Err(e) => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            }),
        }
    };

    let search_url = require("MERCADO_SEARCH_URL")?;
    let search_auth_token = require("MERCADO_SEARCH_AUTH")?;
    let price_base_url = require("MERCADO_PRICE_BASE_URL")?;

    let env = parse_environment(&or_default("MERCADO_ENV", "development"))?;
    let log_level = or_default("MERCADO_LOG_LEVEL", "info");
    let user_agent = or_default("MERCADO_USER_AGENT", "mercado/0.1 (catalog-resolver)");

    let search_apikey = optional("MERCADO_SEARCH_APIKEY");
    let vector_url = or_default("MERCADO_VECTOR_URL", DEFAULT_VECTOR_URL);
    let vector_api_key = optional("MERCADO_VECTOR_API_KEY").or_else(|| optional("GOOGLE_API_KEY"));
    let vector_store_name = optional("MERCADO_VECTOR_STORE");

    let search_timeout_secs = parse_u64("MERCADO_SEARCH_TIMEOUT_SECS", "15")?;
    let price_timeout_secs = parse_u64("MERCADO_PRICE_TIMEOUT_SECS", "10")?;
    let vector_timeout_secs = parse_u64("MERCADO_VECTOR_TIMEOUT_SECS", "30")?;

    let catalog_max_concurrent = parse_cap("MERCADO_CATALOG_MAX_CONCURRENT", "5")?;
    let vector_max_concurrent = parse_cap("MERCADO_VECTOR_MAX_CONCURRENT", "3")?;

    Ok(AppConfig {
        env,
        log_level,
        user_agent,
        search_url,
        search_auth_token,
        search_apikey,
        search_timeout_secs,
        price_base_url,
        price_timeout_secs,
        vector_url,
        vector_api_key,
        vector_store_name,
        vector_timeout_secs,
        catalog_max_concurrent,
        vector_max_concurrent,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MERCADO_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
