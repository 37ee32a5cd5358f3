use thiserror::Error;

/// Errors returned by the scoring oracle client.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Network, TLS or non-2xx status from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The oracle is not configured or refused the request.
    #[error("scoring oracle unavailable: {0}")]
    Unavailable(String),

    /// The response body did not have the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
