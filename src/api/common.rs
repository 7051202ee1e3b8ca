use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::Metrics;

pub async fn request_logger(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed();
    tracing::info!(
        "{} {} - status: {}, latency: {}ms",
        method,
        uri,
        response.status(),
        duration.as_millis()
    );
    response
}

/// 记录 `/v0/token` 的请求数与耗时（按状态码与方法）
pub async fn track_token_requests(
    State(metrics): State<Arc<Metrics>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let start = Instant::now();
    let response = next.run(req).await;
    metrics.observe_token_request(
        response.status().as_u16(),
        method.as_str(),
        start.elapsed(),
    );
    response
}
