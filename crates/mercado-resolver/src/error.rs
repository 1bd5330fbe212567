use thiserror::Error;

use mercado_core::FailureKind;

/// Maximum number of characters of an upstream body kept in errors and logs.
pub const BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("unexpected HTTP status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid identifier \"{input}\": no digits")]
    InvalidIdentifier { input: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("missing setting: {0}")]
    MissingSetting(&'static str),

    #[error("no queries provided")]
    NoQueriesProvided,
}

impl ResolverError {
    /// Classifies a `reqwest` failure, splitting timeouts out of the generic
    /// HTTP bucket.
    pub(crate) fn from_request(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            ResolverError::Timeout {
                url: url.to_owned(),
            }
        } else {
            ResolverError::Http(err)
        }
    }

    pub(crate) fn upstream(status: reqwest::StatusCode, body: &str) -> Self {
        ResolverError::UpstreamStatus {
            status: status.as_u16(),
            body: preview(body),
        }
    }
}

impl From<&ResolverError> for FailureKind {
    fn from(err: &ResolverError) -> Self {
        match err {
            ResolverError::Timeout { .. } => FailureKind::Timeout,
            ResolverError::UpstreamStatus { status, body } => FailureKind::UpstreamError {
                status: *status,
                body: body.clone(),
            },
            ResolverError::InvalidIdentifier { .. } => FailureKind::InvalidIdentifier,
            other => FailureKind::InternalError {
                detail: other.to_string(),
            },
        }
    }
}

/// Truncates `text` to [`BODY_PREVIEW_CHARS`] characters on a char boundary.
#[must_use]
pub fn preview(text: &str) -> String {
    text.chars().take(BODY_PREVIEW_CHARS).collect()
}
