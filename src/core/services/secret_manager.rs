//! Secret Manager 凭据来源
//! 每次请求都从远端读取最新版本，不做本地缓存

use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::core::error::CredentialError;
use crate::core::models::{Credential, SecretStoreConfig};
use crate::core::traits::CredentialSource;

const METADATA_TOKEN_PATH: &str = "computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: Option<SecretPayload>,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    #[serde(default)]
    data: String,
}

/// Reads the API key from Secret Manager on every call.
pub struct SecretManagerCredential {
    client: reqwest::Client,
    config: SecretStoreConfig,
}

impl SecretManagerCredential {
    pub fn new(client: reqwest::Client, config: SecretStoreConfig) -> Self {
        Self { client, config }
    }

    /// 从 metadata server 获取服务账号 access token
    async fn access_token(&self) -> Result<String, CredentialError> {
        let url = format!(
            "{}/{}",
            self.config.metadata_url.as_str().trim_end_matches('/'),
            METADATA_TOKEN_PATH
        );

        let resp = self
            .client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CredentialError::Status {
                what: "metadata server",
                status: status.as_u16(),
                body,
            });
        }

        let token: MetadataToken = resp
            .json()
            .await
            .map_err(|e| CredentialError::decode("metadata token", e))?;
        Ok(token.access_token)
    }

    /// 读取 secret 的 latest 版本
    async fn access_latest(&self, access_token: &str) -> Result<Credential, CredentialError> {
        let secret = &self.config.secret;
        let url = format!(
            "{}/v1/{}:access",
            self.config.api_url.as_str().trim_end_matches('/'),
            secret.latest_version()
        );

        let resp = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        match status {
            StatusCode::NOT_FOUND => return Err(CredentialError::NotFound(secret.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(CredentialError::PermissionDenied {
                    resource: secret.to_string(),
                    status: status.as_u16(),
                })
            }
            s if !s.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                return Err(CredentialError::Status {
                    what: "secret manager",
                    status: s.as_u16(),
                    body,
                });
            }
            _ => {}
        }

        let version: AccessSecretVersionResponse = resp
            .json()
            .await
            .map_err(|e| CredentialError::decode("secret version", e))?;

        let data = version.payload.map(|p| p.data).unwrap_or_default();
        if data.is_empty() {
            return Err(CredentialError::EmptyPayload(secret.to_string()));
        }

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data.as_bytes())
            .map_err(|e| CredentialError::decode("secret payload", e))?;
        let value =
            String::from_utf8(bytes).map_err(|e| CredentialError::decode("secret payload", e))?;

        Ok(Credential::new(value))
    }
}

#[async_trait]
impl CredentialSource for SecretManagerCredential {
    async fn credential(&self) -> Result<Credential, CredentialError> {
        let access_token = self.access_token().await?;
        let credential = self.access_latest(&access_token).await?;
        tracing::debug!(secret = %self.config.secret, "Fetched latest secret version");
        Ok(credential)
    }

    fn kind(&self) -> &'static str {
        "secret-store"
    }
}
