use crate::api::cors::CorsPolicy;
use crate::config::Config;
use crate::core::services::credential_source;
use crate::core::traits::CredentialSource;
use crate::metrics::Metrics;
use crate::proxy::TokenExchanger;
use std::sync::Arc;
use std::time::Duration;

/// Web 应用状态
/// 所有请求共享，只读
pub struct AppState {
    pub credentials: Arc<dyn CredentialSource>,
    pub exchanger: TokenExchanger,
    pub cors: CorsPolicy,
    pub metrics: Arc<Metrics>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        credentials: Arc<dyn CredentialSource>,
        exchanger: TokenExchanger,
        cors: CorsPolicy,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            credentials,
            exchanger,
            cors,
            metrics,
            request_timeout: Duration::from_secs(crate::config::DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &Config, metrics: Arc<Metrics>) -> Result<Self, reqwest::Error> {
        // One client for the secret store and the token exchange; both get the same timeout.
        let client = build_http_client(config.upstream_timeout)?;

        let credentials = credential_source(&config.credentials, client.clone());
        let exchanger =
            TokenExchanger::new(client, config.token_exchange_url.clone(), metrics.clone());

        Ok(Self {
            request_timeout: config.request_timeout,
            ..Self::new(
                credentials,
                exchanger,
                CorsPolicy::new(config.allowed_origin.clone()),
                metrics,
            )
        })
    }
}

pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}
