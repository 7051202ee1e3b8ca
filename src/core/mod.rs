//! 核心模块
//! 凭据来源、数据模型与错误类型

pub mod error;
pub mod models;
pub mod services;
pub mod traits;

// 重导出常用类型
pub use error::{ConfigError, CredentialError, ExchangeError, TokenError};
pub use traits::CredentialSource;
