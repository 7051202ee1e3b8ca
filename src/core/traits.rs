//! 核心 trait 定义
//! 请求处理只依赖这里的抽象，不关心凭据具体来自哪里

use async_trait::async_trait;

use super::error::CredentialError;
use super::models::Credential;

/// Supplies the API key for each token exchange.
///
/// Shared across request tasks as `Arc<dyn CredentialSource>`. Implementations
/// must not cache: every call reflects the current value at the source.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetch the credential for one token request.
    async fn credential(&self) -> Result<Credential, CredentialError>;

    /// Short label for logs, never the credential itself.
    fn kind(&self) -> &'static str;
}
