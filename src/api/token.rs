use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::core::error::TokenError;
use crate::core::models::TokenResponse;
use crate::state::AppState;

/// `/v0/token`: OPTIONS is the CORS preflight, GET issues a token, anything else is 405.
pub async fn issue_token(State(state): State<Arc<AppState>>, method: Method) -> Response {
    if method == Method::OPTIONS {
        return (StatusCode::NO_CONTENT, state.cors.headers()).into_response();
    }

    if method != Method::GET {
        return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
    }

    // CORS headers apply to the 500 as well as the token.
    let cors = state.cors.headers();

    // The deadline covers credential lookup and exchange; overrunning it is a plain 500.
    let result = match tokio::time::timeout(state.request_timeout, fetch_token(&state)).await {
        Ok(result) => result,
        Err(_) => Err(TokenError::Timeout(state.request_timeout)),
    };

    match result {
        Ok(token) => (cors, Json(TokenResponse { token })).into_response(),
        Err(e) => {
            tracing::error!(
                error = %e,
                source = state.credentials.kind(),
                "Failed to issue token"
            );
            (cors, e).into_response()
        }
    }
}

async fn fetch_token(state: &AppState) -> Result<String, TokenError> {
    let credential = state.credentials.credential().await?;
    let token = state.exchanger.exchange(&credential).await?;
    Ok(token)
}
