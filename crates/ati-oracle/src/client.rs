//! HTTP client for the scoring oracle.
//!
//! One endpoint: `POST {base}/score` with a [`ContentRequest`] body, answered
//! by an [`OracleScore`]. Failures are not retried.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::OracleError;
use crate::types::{ContentRequest, OracleScore};

/// Client for the scoring oracle.
#[derive(Debug, Clone)]
pub struct OracleClient {
    client: Client,
    score_url: Url,
}

impl OracleClient {
    /// Creates a client for the oracle rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`OracleError::Unavailable`] if `base_url`
    /// is not a valid URL.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("ati/0.1 (content-scoring)")
            .build()?;

        let normalised = format!("{}/", base_url.trim().trim_end_matches('/'));
        let score_url = Url::parse(&normalised)
            .and_then(|base| base.join("score"))
            .map_err(|e| OracleError::Unavailable(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self { client, score_url })
    }

    #[must_use]
    pub fn score_url(&self) -> &Url {
        &self.score_url
    }

    /// Scores one piece of content.
    ///
    /// # Errors
    ///
    /// - [`OracleError::Unavailable`] if the request carries no content.
    /// - [`OracleError::Http`] on network failure or non-2xx HTTP status.
    /// - [`OracleError::Deserialize`] if the response does not match
    ///   [`OracleScore`].
    pub async fn score(&self, request: &ContentRequest) -> Result<OracleScore, OracleError> {
        if request.is_empty() {
            return Err(OracleError::Unavailable(
                "request has neither text nor image".to_string(),
            ));
        }

        let response = self
            .client
            .post(self.score_url.clone())
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;

        let score: OracleScore =
            serde_json::from_str(&body).map_err(|e| OracleError::Deserialize {
                context: self.score_url.to_string(),
                source: e,
            })?;

        tracing::debug!(ati = score.ati, "oracle scored content");
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_url_appends_single_segment() {
        let client = OracleClient::new("http://oracle.local/v2/", 5).expect("client");
        assert_eq!(client.score_url().as_str(), "http://oracle.local/v2/score");

        let client = OracleClient::new("http://oracle.local", 5).expect("client");
        assert_eq!(client.score_url().as_str(), "http://oracle.local/score");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = OracleClient::new("not a url", 5).unwrap_err();
        assert!(matches!(err, OracleError::Unavailable(_)));
    }
}
