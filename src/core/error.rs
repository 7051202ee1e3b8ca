//! 错误类型定义

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Startup configuration errors. Any of these is fatal before the listener is bound.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("one of --api-key or --project-id/--secret-name is required")]
    MissingCredentialSource,

    #[error("--project-id and --secret-name must be given together")]
    IncompleteSecretRef,

    #[error("--api-key cannot be combined with --project-id/--secret-name")]
    ConflictingCredentialSources,

    #[error("invalid listen address {addr:?}: {reason}")]
    InvalidListenAddr { addr: String, reason: String },

    #[error("invalid {name} {value:?}: {source}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid allowed origin {0:?}")]
    InvalidOrigin(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error(
        "--request-timeout-secs {request_secs} cannot cover {calls} outbound call(s) \
         of --upstream-timeout-secs {upstream_secs}"
    )]
    RequestTimeoutTooShort {
        request_secs: u64,
        upstream_secs: u64,
        calls: u64,
    },
}

/// Failures while obtaining the API key.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("secret store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("secret {0} not found")]
    NotFound(String),

    #[error("permission denied reading {resource} (status {status})")]
    PermissionDenied { resource: String, status: u16 },

    #[error("{what} returned status {status}: {body}")]
    Status {
        what: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    #[error("secret {0} has an empty payload")]
    EmptyPayload(String),
}

impl CredentialError {
    pub(crate) fn decode(what: &'static str, reason: impl ToString) -> Self {
        Self::Decode {
            what,
            reason: reason.to_string(),
        }
    }
}

/// Failures during the upstream token exchange.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("failed to send request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("token exchange failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Anything that stops `/v0/token` from producing a token.
///
/// The detail is for server logs only; the client always sees a bare 500.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("credential lookup failed: {0}")]
    Credential(#[from] CredentialError),

    #[error("token exchange failed: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("request deadline of {0:?} exceeded")]
    Timeout(Duration),
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_hides_detail() {
        let err = TokenError::Exchange(ExchangeError::Status {
            status: 500,
            body: "upstream stack trace".to_string(),
        });
        assert!(err.to_string().contains("upstream stack trace"));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_timeout_is_a_plain_500() {
        let err = TokenError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "request deadline of 30s exceeded");
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_exchange_status_message_embeds_code_and_body() {
        let err = ExchangeError::Status {
            status: 403,
            body: "invalid key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "token exchange failed with status 403: invalid key"
        );
    }
}
