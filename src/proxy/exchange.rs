//! 上游令牌交换客户端

use std::sync::Arc;
use std::time::Instant;

use reqwest::StatusCode;
use url::Url;

use super::error_classifier::classify_upstream_error;
use crate::core::error::ExchangeError;
use crate::core::models::{Credential, TokenRequest, TokenResponse};
use crate::metrics::{Metrics, UPSTREAM_ERROR_LABEL};

/// Exchanges the API key for a short-lived token, one upstream call per invocation.
pub struct TokenExchanger {
    client: reqwest::Client,
    url: Url,
    metrics: Arc<Metrics>,
}

impl TokenExchanger {
    /// `client` should carry the upstream timeout; the exchanger adds none of its own.
    pub fn new(client: reqwest::Client, url: Url, metrics: Arc<Metrics>) -> Self {
        Self {
            client,
            url,
            metrics,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn exchange(&self, credential: &Credential) -> Result<String, ExchangeError> {
        let start = Instant::now();
        let result = self
            .client
            .post(self.url.clone())
            .json(&TokenRequest::new(credential))
            .send()
            .await;
        self.metrics.observe_upstream_latency(start.elapsed());

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                self.metrics.count_upstream_request(UPSTREAM_ERROR_LABEL);
                let (kind, hint) = classify_upstream_error(&e);
                tracing::warn!(kind, hint, "Upstream token exchange did not complete");
                return Err(ExchangeError::Request(e));
            }
        };

        let status = resp.status();
        self.metrics.count_upstream_request(status.as_str());

        if status != StatusCode::OK {
            // Best effort: an unreadable body still yields the status error.
            let body = resp.text().await.unwrap_or_default();
            return Err(ExchangeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = resp.json().await.map_err(ExchangeError::Decode)?;
        Ok(token.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn exchanger_for(server: &MockServer, metrics: Arc<Metrics>) -> TokenExchanger {
        let url = Url::parse(&server.url("/v0/token/integration")).unwrap();
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        TokenExchanger::new(client, url, metrics)
    }

    #[tokio::test]
    async fn test_exchange_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v0/token/integration")
                    .header("content-type", "application/json")
                    .json_body(json!({ "api_key": "abc" }));
                then.status(200).json_body(json!({ "token": "xyz" }));
            })
            .await;
        let metrics = Arc::new(Metrics::new().unwrap());

        let token = exchanger_for(&server, metrics.clone())
            .exchange(&Credential::new("abc"))
            .await
            .unwrap();

        assert_eq!(token, "xyz");
        mock.assert_async().await;
        assert_eq!(metrics.upstream_requests("200"), 1);
        assert_eq!(metrics.upstream_latency_samples(), 1);
    }

    #[tokio::test]
    async fn test_non_ok_status_embeds_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v0/token/integration");
                then.status(500).body("database exploded");
            })
            .await;
        let metrics = Arc::new(Metrics::new().unwrap());

        let err = exchanger_for(&server, metrics.clone())
            .exchange(&Credential::new("abc"))
            .await
            .unwrap_err();

        match err {
            ExchangeError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "database exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(metrics.upstream_requests("500"), 1);
    }

    #[tokio::test]
    async fn test_created_is_not_success() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v0/token/integration");
                then.status(201).json_body(json!({ "token": "xyz" }));
            })
            .await;
        let metrics = Arc::new(Metrics::new().unwrap());

        let err = exchanger_for(&server, metrics)
            .exchange(&Credential::new("abc"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeError::Status { status: 201, .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v0/token/integration");
                then.status(200).body("<html>not json</html>");
            })
            .await;
        let metrics = Arc::new(Metrics::new().unwrap());

        let err = exchanger_for(&server, metrics.clone())
            .exchange(&Credential::new("abc"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeError::Decode(_)));
        assert_eq!(metrics.upstream_requests("200"), 1);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v0/token/integration");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!({ "token": "late" }));
            })
            .await;
        let metrics = Arc::new(Metrics::new().unwrap());
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let url = Url::parse(&server.url("/v0/token/integration")).unwrap();
        let exchanger = TokenExchanger::new(client, url, metrics.clone());

        let err = exchanger
            .exchange(&Credential::new("abc"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeError::Request(_)));
        assert_eq!(metrics.upstream_requests(UPSTREAM_ERROR_LABEL), 1);
        assert_eq!(metrics.upstream_latency_samples(), 1);
    }
}
