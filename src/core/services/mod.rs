//! 核心服务层
//! 凭据来源的具体实现

mod secret_manager;
mod static_credential;

pub use secret_manager::SecretManagerCredential;
pub use static_credential::StaticCredential;

use std::sync::Arc;

use crate::core::models::CredentialSourceConfig;
use crate::core::traits::CredentialSource;

/// Build the credential source selected at startup.
pub fn credential_source(
    config: &CredentialSourceConfig,
    client: reqwest::Client,
) -> Arc<dyn CredentialSource> {
    match config {
        CredentialSourceConfig::Static(credential) => {
            Arc::new(StaticCredential::new(credential.clone()))
        }
        CredentialSourceConfig::SecretStore(store) => {
            Arc::new(SecretManagerCredential::new(client, store.clone()))
        }
    }
}
