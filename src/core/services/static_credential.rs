//! 静态凭据来源

use async_trait::async_trait;

use crate::core::error::CredentialError;
use crate::core::models::Credential;
use crate::core::traits::CredentialSource;

/// API key fixed at process start.
pub struct StaticCredential {
    credential: Credential,
}

impl StaticCredential {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl CredentialSource for StaticCredential {
    async fn credential(&self) -> Result<Credential, CredentialError> {
        Ok(self.credential.clone())
    }

    fn kind(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_configured_key() {
        let source = StaticCredential::new(Credential::new("abc"));
        assert_eq!(source.credential().await.unwrap().expose(), "abc");
        assert_eq!(source.kind(), "static");
    }
}
