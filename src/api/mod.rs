use crate::state::AppState;
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod common;
pub mod cors;
mod token;

pub use token::issue_token;

pub fn build_routes(state: Arc<AppState>) -> Router {
    // Inbound metrics cover the token route only.
    let token_routes = Router::new()
        .route("/v0/token", any(token::issue_token))
        .route_layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            common::track_token_requests,
        ));

    Router::new()
        .merge(token_routes)
        // Health
        .route("/health", any(health_check))
        // Metrics
        .route("/metrics", get(render_metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(common::request_logger)),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

async fn render_metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => ([(CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
