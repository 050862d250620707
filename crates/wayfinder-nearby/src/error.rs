use thiserror::Error;
use wayfinder_core::CoreError;

/// Errors returned by the backend client and surfaced by the fetchers.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("backend returned HTTP {status} for {url}: {detail}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        detail: String,
    },

    /// The response body was not valid JSON or did not match the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Valid JSON, but not a shape that normalization understands.
    #[error("malformed response for {context}: {reason}")]
    Malformed { context: String, reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] CoreError),

    #[error("invalid backend URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("request timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
}
