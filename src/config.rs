//! 启动配置
//! 每个参数都可以用命令行或同名环境变量提供

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use axum::http::HeaderValue;
use clap::Parser;
use url::Url;

use crate::core::error::ConfigError;
use crate::core::models::{Credential, CredentialSourceConfig, SecretRef, SecretStoreConfig};

pub const DEFAULT_LISTEN_ADDR: &str = ":8080";
pub const DEFAULT_TOKEN_EXCHANGE_URL: &str =
    "https://auth.mlab-sandbox.measurementlab.net/v0/token/integration";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://speed.measurementlab.net";
pub const DEFAULT_SECRET_MANAGER_URL: &str = "https://secretmanager.googleapis.com";
pub const DEFAULT_METADATA_URL: &str = "http://metadata.google.internal";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Exchanges a server-held API key for short-lived tokens", long_about = None)]
pub struct Args {
    /// Address to listen on; `:port` binds every interface
    #[arg(long, env = "LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: String,

    /// API key for token exchange
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Project holding the API key secret
    #[arg(long, env = "PROJECT_ID")]
    pub project_id: Option<String>,

    /// Name of the API key secret; its latest version is read per request
    #[arg(long, env = "SECRET_NAME")]
    pub secret_name: Option<String>,

    /// URL of the token exchange service
    #[arg(long, env = "TOKEN_EXCHANGE_URL", default_value = DEFAULT_TOKEN_EXCHANGE_URL)]
    pub token_exchange_url: String,

    /// Allowed CORS origin
    #[arg(long, env = "ALLOWED_ORIGIN", default_value = DEFAULT_ALLOWED_ORIGIN)]
    pub allowed_origin: String,

    #[arg(long, env = "SECRET_MANAGER_URL", default_value = DEFAULT_SECRET_MANAGER_URL)]
    pub secret_manager_url: String,

    #[arg(long, env = "METADATA_URL", default_value = DEFAULT_METADATA_URL)]
    pub metadata_url: String,

    /// Timeout for each outbound call, in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = DEFAULT_UPSTREAM_TIMEOUT_SECS)]
    pub upstream_timeout_secs: u64,

    /// Upper bound on a whole inbound request, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
}

/// Validated configuration, shared read-only by every request.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub credentials: CredentialSourceConfig,
    pub token_exchange_url: Url,
    pub allowed_origin: HeaderValue,
    pub upstream_timeout: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let credentials = credential_source(&args)?;

        let allowed_origin = HeaderValue::from_str(&args.allowed_origin)
            .map_err(|_| ConfigError::InvalidOrigin(args.allowed_origin.clone()))?;

        check_timeouts(&args, &credentials)?;

        Ok(Self {
            listen_addr: parse_listen_addr(&args.listen_addr)?,
            credentials,
            token_exchange_url: parse_url("token exchange URL", &args.token_exchange_url)?,
            allowed_origin,
            upstream_timeout: Duration::from_secs(args.upstream_timeout_secs),
            request_timeout: Duration::from_secs(args.request_timeout_secs),
        })
    }
}

/// Outbound calls one token request makes, each bounded by the upstream timeout.
fn outbound_calls(credentials: &CredentialSourceConfig) -> u64 {
    match credentials {
        CredentialSourceConfig::Static(_) => 1,
        // metadata token, secret version, exchange
        CredentialSourceConfig::SecretStore(_) => 3,
    }
}

fn check_timeouts(args: &Args, credentials: &CredentialSourceConfig) -> Result<(), ConfigError> {
    if args.upstream_timeout_secs == 0 {
        return Err(ConfigError::ZeroTimeout("--upstream-timeout-secs"));
    }
    if args.request_timeout_secs == 0 {
        return Err(ConfigError::ZeroTimeout("--request-timeout-secs"));
    }

    let calls = outbound_calls(credentials);
    if args.request_timeout_secs < args.upstream_timeout_secs.saturating_mul(calls) {
        return Err(ConfigError::RequestTimeoutTooShort {
            request_secs: args.request_timeout_secs,
            upstream_secs: args.upstream_timeout_secs,
            calls,
        });
    }
    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn credential_source(args: &Args) -> Result<CredentialSourceConfig, ConfigError> {
    let api_key = non_empty(&args.api_key);
    let project_id = non_empty(&args.project_id);
    let secret_name = non_empty(&args.secret_name);

    match (api_key, project_id, secret_name) {
        (Some(key), None, None) => Ok(CredentialSourceConfig::Static(Credential::new(key))),
        (Some(_), _, _) => Err(ConfigError::ConflictingCredentialSources),
        (None, Some(project_id), Some(secret_name)) => {
            Ok(CredentialSourceConfig::SecretStore(SecretStoreConfig {
                secret: SecretRef::new(project_id, secret_name),
                api_url: parse_url("secret manager URL", &args.secret_manager_url)?,
                metadata_url: parse_url("metadata URL", &args.metadata_url)?,
            }))
        }
        (None, None, None) => Err(ConfigError::MissingCredentialSource),
        (None, _, _) => Err(ConfigError::IncompleteSecretRef),
    }
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
        source,
    })
}

/// Accepts `host:port`, `ip:port`, or the `:port` shorthand for all interfaces.
pub fn parse_listen_addr(addr: &str) -> Result<SocketAddr, ConfigError> {
    let normalized = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };

    if let Ok(socket) = normalized.parse::<SocketAddr>() {
        return Ok(socket);
    }

    normalized
        .to_socket_addrs()
        .map_err(|e| ConfigError::InvalidListenAddr {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?
        .next()
        .ok_or_else(|| ConfigError::InvalidListenAddr {
            addr: addr.to_string(),
            reason: "resolved to no addresses".to_string(),
        })
}
