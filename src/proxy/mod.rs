// proxy 模块 - 上游令牌交换

pub mod error_classifier;
pub mod exchange;

pub use exchange::TokenExchanger;
