// Prometheus metrics definitions for the Boardsmith backend.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Counters ─────────────────────────────────────────────────────

    /// Total API requests, by method/endpoint/status.
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("boardsmith_api_requests_total", "Total API requests"),
        &["method", "endpoint", "status"],
    )
    .unwrap();

    /// Total chat-completion calls, by task and outcome.
    pub static ref LLM_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("boardsmith_llm_requests_total", "Total LLM chat calls"),
        &["task", "status"],
    )
    .unwrap();

    /// Total similarity lookups performed for concept prompts.
    pub static ref RETRIEVER_QUERIES_TOTAL: IntCounter = IntCounter::new(
        "boardsmith_retriever_queries_total",
        "Similarity lookups performed",
    )
    .unwrap();

    /// Total concepts stored (generated plus regenerated).
    pub static ref CONCEPTS_GENERATED_TOTAL: IntCounter = IntCounter::new(
        "boardsmith_concepts_generated_total",
        "Concepts stored",
    )
    .unwrap();

    /// Total rule sets stored (generated plus regenerated).
    pub static ref RULESETS_GENERATED_TOTAL: IntCounter = IntCounter::new(
        "boardsmith_rulesets_generated_total",
        "Rule sets stored",
    )
    .unwrap();

    /// Total simulated games produced.
    pub static ref SIMULATIONS_RUN_TOTAL: IntCounter = IntCounter::new(
        "boardsmith_simulations_run_total",
        "Simulated games produced",
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// API request duration in seconds, by endpoint.
    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "boardsmith_api_request_duration_seconds",
            "API request duration in seconds",
        )
        .buckets(vec![0.005, 0.025, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["endpoint"],
    )
    .unwrap();

    /// Chat-completion latency in seconds, by task.
    pub static ref LLM_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "boardsmith_llm_request_duration_seconds",
            "LLM chat latency in seconds",
        )
        .buckets(vec![0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 40.0, 60.0]),
        &["task"],
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(API_REQUESTS_TOTAL.clone()),
        Box::new(LLM_REQUESTS_TOTAL.clone()),
        Box::new(RETRIEVER_QUERIES_TOTAL.clone()),
        Box::new(CONCEPTS_GENERATED_TOTAL.clone()),
        Box::new(RULESETS_GENERATED_TOTAL.clone()),
        Box::new(SIMULATIONS_RUN_TOTAL.clone()),
        Box::new(API_REQUEST_DURATION_SECONDS.clone()),
        Box::new(LLM_REQUEST_DURATION_SECONDS.clone()),
    ];

    for c in collectors {
        REGISTRY.register(c).expect("failed to register metric");
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Normalize a URL path for metric labels: replace numeric path segments with
/// `:id` to prevent cardinality explosion.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.parse::<i64>().is_ok() {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
