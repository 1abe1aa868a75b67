// Prometheus metrics definitions for the siege-guide backend.

use std::sync::Once;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Counters ─────────────────────────────────────────────────────

    /// Total API requests, by method/endpoint/status.
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("siege_api_requests_total", "Total API requests"),
        &["method", "endpoint", "status"],
    )
    .unwrap();

    /// Calls to the generative-text service, by outcome.
    pub static ref LLM_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("siege_llm_requests_total", "Calls to the generative-text service"),
        &["outcome"],
    )
    .unwrap();

    /// Lineup suggestion requests, by result.
    pub static ref LINEUP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("siege_lineup_requests_total", "Lineup suggestion requests"),
        &["result"],
    )
    .unwrap();

    /// Names from model replies that did not match a catalog operator.
    pub static ref SUGGESTED_NAMES_DROPPED_TOTAL: IntCounter = IntCounter::new(
        "siege_suggested_names_dropped_total",
        "Suggested names that did not resolve to a catalog operator",
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// API request duration in seconds, by endpoint.
    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "siege_api_request_duration_seconds",
            "API request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0, 30.0]),
        &["endpoint"],
    )
    .unwrap();

    /// Latency of calls to the generative-text service.
    pub static ref LLM_REQUEST_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "siege_llm_request_duration_seconds",
            "Generative-text service latency in seconds",
        )
        .buckets(vec![0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0]),
    )
    .unwrap();

    /// Operators returned per successful lineup request.
    pub static ref SUGGESTIONS_RETURNED: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "siege_suggestions_returned",
            "Resolved operators returned per lineup request",
        )
        .buckets(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]),
    )
    .unwrap();
}

static REGISTER: Once = Once::new();

/// Register all metrics with the custom registry. Safe to call more than once.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(API_REQUESTS_TOTAL.clone()),
            Box::new(LLM_REQUESTS_TOTAL.clone()),
            Box::new(LINEUP_REQUESTS_TOTAL.clone()),
            Box::new(SUGGESTED_NAMES_DROPPED_TOTAL.clone()),
            Box::new(API_REQUEST_DURATION_SECONDS.clone()),
            Box::new(LLM_REQUEST_DURATION_SECONDS.clone()),
            Box::new(SUGGESTIONS_RETURNED.clone()),
        ];

        for c in collectors {
            if let Err(e) = REGISTRY.register(c) {
                tracing::warn!("Failed to register metric: {e}");
            }
        }
    });
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Middleware recording request counts and latency, labelled by route template
/// so slugs do not blow up label cardinality.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = req.method().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    API_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), endpoint.as_str(), response.status().as_str()])
        .inc();
    API_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint.as_str()])
        .observe(start.elapsed().as_secs_f64());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_twice_does_not_panic() {
        register_metrics();
        register_metrics();
    }

    #[test]
    fn test_gather_metrics_contains_prefix() {
        register_metrics();
        LINEUP_REQUESTS_TOTAL.with_label_values(&["suggested"]).inc();
        let output = gather_metrics();
        assert!(output.contains("siege_lineup_requests_total"));
    }

    #[test]
    fn test_metric_increments() {
        let before = SUGGESTED_NAMES_DROPPED_TOTAL.get();
        SUGGESTED_NAMES_DROPPED_TOTAL.inc();
        assert!(SUGGESTED_NAMES_DROPPED_TOTAL.get() > before);

        LLM_REQUESTS_TOTAL.with_label_values(&["ok"]).inc();
        LLM_REQUEST_DURATION_SECONDS.observe(1.2);
        SUGGESTIONS_RETURNED.observe(3.0);
        API_REQUEST_DURATION_SECONDS
            .with_label_values(&["/api/operators"])
            .observe(0.01);
        API_REQUESTS_TOTAL
            .with_label_values(&["GET", "/api/operators", "200"])
            .inc();
    }
}
