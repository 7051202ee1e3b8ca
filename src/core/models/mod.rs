//! 核心数据模型

mod config;
mod token;

pub use config::{CredentialSourceConfig, SecretRef, SecretStoreConfig};
pub use token::{Credential, TokenRequest, TokenResponse};
