#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Runtime configuration for the resolution pipeline.
///
/// Upstream URLs, credentials, timeouts and worker caps all live here and are
/// handed to the clients at construction time.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub user_agent: String,
    /// Free-text catalog search endpoint (`POST {"query": ...}`).
    pub search_url: String,
    pub search_auth_token: String,
    /// Sent as the `apikey` header only when configured.
    pub search_apikey: Option<String>,
    pub search_timeout_secs: u64,
    /// Price/availability base URL; the identifier is appended as a path segment.
    pub price_base_url: String,
    pub price_timeout_secs: u64,
    pub vector_url: String,
    pub vector_api_key: Option<String>,
    /// File-search store name used by the vector path, e.g. `fileSearchStores/produtos-abc123`.
    pub vector_store_name: Option<String>,
    pub vector_timeout_secs: u64,
    pub catalog_max_concurrent: usize,
    pub vector_max_concurrent: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("user_agent", &self.user_agent)
            .field("search_url", &self.search_url)
            .field("search_auth_token", &"[redacted]")
            .field(
                "search_apikey",
                &self.search_apikey.as_ref().map(|_| "[redacted]"),
            )
            .field("search_timeout_secs", &self.search_timeout_secs)
            .field("price_base_url", &self.price_base_url)
            .field("price_timeout_secs", &self.price_timeout_secs)
            .field("vector_url", &self.vector_url)
            .field(
                "vector_api_key",
                &self.vector_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("vector_store_name", &self.vector_store_name)
            .field("vector_timeout_secs", &self.vector_timeout_secs)
            .field("catalog_max_concurrent", &self.catalog_max_concurrent)
            .field("vector_max_concurrent", &self.vector_max_concurrent)
            .finish()
    }
}
