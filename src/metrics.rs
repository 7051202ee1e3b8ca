//! Prometheus 指标
//! 注册表随 `Metrics` 一起创建并注入，不使用全局注册表

use std::time::Duration;

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Label used when the upstream call never produced a status code.
pub const UPSTREAM_ERROR_LABEL: &str = "error";

pub struct Metrics {
    registry: Registry,
    token_requests_total: IntCounterVec,
    token_request_duration: HistogramVec,
    upstream_requests_total: IntCounterVec,
    upstream_request_duration: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let token_requests_total = IntCounterVec::new(
            Opts::new(
                "speedproxy_token_requests_total",
                "Total number of token requests.",
            ),
            &["code", "method"],
        )?;
        let token_request_duration = HistogramVec::new(
            HistogramOpts::new(
                "speedproxy_token_request_duration_seconds",
                "Duration of token requests.",
            ),
            &["code", "method"],
        )?;
        let upstream_requests_total = IntCounterVec::new(
            Opts::new(
                "speedproxy_upstream_requests_total",
                "Total number of upstream token exchange requests.",
            ),
            &["code"],
        )?;
        let upstream_request_duration = Histogram::with_opts(HistogramOpts::new(
            "speedproxy_upstream_request_duration_seconds",
            "Duration of upstream token exchange requests.",
        ))?;

        registry.register(Box::new(token_requests_total.clone()))?;
        registry.register(Box::new(token_request_duration.clone()))?;
        registry.register(Box::new(upstream_requests_total.clone()))?;
        registry.register(Box::new(upstream_request_duration.clone()))?;

        Ok(Self {
            registry,
            token_requests_total,
            token_request_duration,
            upstream_requests_total,
            upstream_request_duration,
        })
    }

    /// Inbound `/v0/token` request, labelled by response code and lowercased method.
    pub fn observe_token_request(&self, code: u16, method: &str, elapsed: Duration) {
        let code = code.to_string();
        let method = method.to_ascii_lowercase();
        let labels = [code.as_str(), method.as_str()];
        self.token_requests_total.with_label_values(&labels).inc();
        self.token_request_duration
            .with_label_values(&labels)
            .observe(elapsed.as_secs_f64());
    }

    pub fn observe_upstream_latency(&self, elapsed: Duration) {
        self.upstream_request_duration
            .observe(elapsed.as_secs_f64());
    }

    /// `code` is the upstream status, or [`UPSTREAM_ERROR_LABEL`] on transport failure.
    pub fn count_upstream_request(&self, code: &str) {
        self.upstream_requests_total.with_label_values(&[code]).inc();
    }

    pub fn token_requests(&self, code: u16, method: &str) -> u64 {
        self.token_requests_total
            .with_label_values(&[&code.to_string(), &method.to_ascii_lowercase()])
            .get()
    }

    pub fn upstream_requests(&self, code: &str) -> u64 {
        self.upstream_requests_total.with_label_values(&[code]).get()
    }

    pub fn upstream_latency_samples(&self) -> u64 {
        self.upstream_request_duration.get_sample_count()
    }

    /// Prometheus text exposition of everything in the registry.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_request_labels() {
        let metrics = Metrics::new().unwrap();
        metrics.observe_token_request(200, "GET", Duration::from_millis(12));
        metrics.observe_token_request(200, "GET", Duration::from_millis(8));
        metrics.observe_token_request(405, "POST", Duration::from_millis(1));

        assert_eq!(metrics.token_requests(200, "get"), 2);
        assert_eq!(metrics.token_requests(405, "post"), 1);
        assert_eq!(metrics.token_requests(500, "get"), 0);
    }

    #[test]
    fn test_upstream_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.count_upstream_request("500");
        metrics.count_upstream_request(UPSTREAM_ERROR_LABEL);
        metrics.observe_upstream_latency(Duration::from_millis(40));

        assert_eq!(metrics.upstream_requests("500"), 1);
        assert_eq!(metrics.upstream_requests("error"), 1);
        assert_eq!(metrics.upstream_latency_samples(), 1);
    }

    #[test]
    fn test_registries_are_independent() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.count_upstream_request("200");

        assert_eq!(a.upstream_requests("200"), 1);
        assert_eq!(b.upstream_requests("200"), 0);
    }

    #[test]
    fn test_render_exposition() {
        let metrics = Metrics::new().unwrap();
        metrics.observe_token_request(200, "GET", Duration::from_millis(5));
        metrics.count_upstream_request("200");

        let text = metrics.render().unwrap();
        assert!(text.contains(r#"speedproxy_token_requests_total{code="200",method="get"} 1"#));
        assert!(text.contains(r#"speedproxy_upstream_requests_total{code="200"} 1"#));
        assert!(text.contains("speedproxy_token_request_duration_seconds_bucket"));
    }
}
