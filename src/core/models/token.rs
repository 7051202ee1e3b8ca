//! 令牌交换相关模型

use serde::{Deserialize, Serialize};
use std::fmt;

/// The API key presented to the token exchange service.
///
/// `Debug` is redacted so the value can't end up in logs by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Body sent to the token exchange service.
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub api_key: &'a str,
}

impl<'a> TokenRequest<'a> {
    pub fn new(credential: &'a Credential) -> Self {
        Self {
            api_key: credential.expose(),
        }
    }
}

/// Body returned by the token exchange service, and relayed as-is to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("super-secret");
        let printed = format!("{:?}", credential);
        assert!(!printed.contains("super-secret"));
    }

    #[test]
    fn test_token_request_wire_format() {
        let credential = Credential::new("abc");
        let body = serde_json::to_string(&TokenRequest::new(&credential)).unwrap();
        assert_eq!(body, r#"{"api_key":"abc"}"#);
    }

    #[test]
    fn test_token_response_ignores_extra_fields() {
        let resp: TokenResponse =
            serde_json::from_str(r#"{"token":"xyz","expires_in":3600}"#).unwrap();
        assert_eq!(resp.token, "xyz");
    }
}
