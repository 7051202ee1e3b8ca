// 错误分类模块 - 把上游传输错误归类成简短的日志标签
use reqwest::Error;

/// 分类上游请求错误
///
/// 返回值: (错误类型, 英文说明)
/// - 错误类型: 用于日志字段
/// - 英文说明: 便于排查的提示
pub fn classify_upstream_error(error: &Error) -> (&'static str, &'static str) {
    if error.is_timeout() {
        ("timeout_error", "Upstream did not answer within the client timeout")
    } else if error.is_connect() {
        ("connection_error", "Could not connect to the upstream service")
    } else if error.is_decode() {
        ("decode_error", "Upstream response body was not the expected JSON")
    } else if error.is_body() {
        ("body_error", "Upstream response body could not be read")
    } else if error.is_builder() {
        ("builder_error", "Upstream request could not be built")
    } else {
        ("unknown_error", "Unknown error occurred")
    }
}
