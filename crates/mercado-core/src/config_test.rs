use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("MERCADO_SEARCH_URL", "https://search.example.com/functions/v1/smart-responder");
    m.insert("MERCADO_SEARCH_AUTH", "Bearer test-token");
    m.insert("MERCADO_PRICE_BASE_URL", "https://erp.example.com/api/estoque");
    m
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "MERCADO_ENV"));
}

#[test]
fn build_app_config_fails_without_search_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "MERCADO_SEARCH_URL"),
        "expected MissingEnvVar(MERCADO_SEARCH_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_required_var_as_missing() {
    let mut map = full_env();
    map.insert("MERCADO_PRICE_BASE_URL", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "MERCADO_PRICE_BASE_URL"),
        "expected MissingEnvVar(MERCADO_PRICE_BASE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_all_required_vars() {
    let map = full_env();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.user_agent, "mercado/0.1 (catalog-resolver)");
    assert_eq!(cfg.search_auth_token, "Bearer test-token");
    assert!(cfg.search_apikey.is_none());
    assert_eq!(cfg.search_timeout_secs, 15);
    assert_eq!(cfg.price_timeout_secs, 10);
    assert_eq!(cfg.vector_timeout_secs, 30);
    assert_eq!(cfg.catalog_max_concurrent, 5);
    assert_eq!(cfg.vector_max_concurrent, 3);
    assert!(cfg.vector_url.ends_with(":generateContent"));
    assert!(cfg.vector_api_key.is_none());
    assert!(cfg.vector_store_name.is_none());
}

#[test]
fn vector_api_key_falls_back_to_google_api_key() {
    let mut map = full_env();
    map.insert("GOOGLE_API_KEY", "google-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.vector_api_key.as_deref(), Some("google-key"));

    map.insert("MERCADO_VECTOR_API_KEY", "mercado-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.vector_api_key.as_deref(), Some("mercado-key"));
}

#[test]
fn price_timeout_override() {
    let mut map = full_env();
    map.insert("MERCADO_PRICE_TIMEOUT_SECS", "4");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.price_timeout_secs, 4);
}

#[test]
fn search_timeout_invalid() {
    let mut map = full_env();
    map.insert("MERCADO_SEARCH_TIMEOUT_SECS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MERCADO_SEARCH_TIMEOUT_SECS"),
        "expected InvalidEnvVar(MERCADO_SEARCH_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn catalog_max_concurrent_override() {
    let mut map = full_env();
    map.insert("MERCADO_CATALOG_MAX_CONCURRENT", "8");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.catalog_max_concurrent, 8);
}

#[test]
fn zero_worker_cap_is_rejected() {
    let mut map = full_env();
    map.insert("MERCADO_VECTOR_MAX_CONCURRENT", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MERCADO_VECTOR_MAX_CONCURRENT"),
        "expected InvalidEnvVar(MERCADO_VECTOR_MAX_CONCURRENT), got: {result:?}"
    );
}

#[test]
fn debug_output_redacts_credentials() {
    let mut map = full_env();
    map.insert("MERCADO_SEARCH_APIKEY", "super-secret-apikey");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("test-token"));
    assert!(!rendered.contains("super-secret-apikey"));
    assert!(rendered.contains("[redacted]"));
}
