//! Prometheus metrics for the relay subsystems.
//!
//! All metrics follow the naming convention: `vr_<subsystem>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // EPOCH CONTROLLER (vr-05)
    // =========================================================================

    /// Ticks by outcome
    pub static ref TICKS: CounterVec = CounterVec::new(
        Opts::new("vr_controller_ticks_total", "Controller ticks by outcome"),
        &["outcome"]  // outcome: idle/collecting/committed/not_signer/error/...
    ).expect("metric creation failed");

    /// Tick duration histogram
    pub static ref TICK_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "vr_controller_tick_duration_seconds",
            "Time spent in one controller tick"
        ).buckets(exponential_buckets(0.001, 2.0, 14).unwrap_or_default())
    ).expect("metric creation failed");

    /// Headers committed on a replica
    pub static ref COMMITS: Counter = Counter::new(
        "vr_controller_commits_total",
        "Validator set headers committed"
    ).expect("metric creation failed");

    /// Latest epoch observed on-chain
    pub static ref CURRENT_EPOCH: Gauge = Gauge::new(
        "vr_controller_current_epoch",
        "Latest epoch observed on-chain"
    ).expect("metric creation failed");

    // =========================================================================
    // SIGNATURE GOSSIP (vr-03)
    // =========================================================================

    /// Signatures accepted into the store
    pub static ref SIGNATURES_RECEIVED: Counter = Counter::new(
        "vr_gossip_signatures_received_total",
        "Signatures accepted from peers"
    ).expect("metric creation failed");

    /// Frames or signatures dropped, by reason
    pub static ref SIGNATURES_DROPPED: CounterVec = CounterVec::new(
        Opts::new("vr_gossip_signatures_dropped_total", "Inbound messages dropped"),
        &["reason"]  // reason: oversized/malformed/unknown_type/bad_signature
    ).expect("metric creation failed");

    /// Per-peer broadcast sends by result
    pub static ref BROADCASTS: CounterVec = CounterVec::new(
        Opts::new("vr_gossip_broadcast_sends_total", "Broadcast frame sends"),
        &["result"]  // result: delivered/failed
    ).expect("metric creation failed");

    /// Known peers
    pub static ref KNOWN_PEERS: Gauge = Gauge::new(
        "vr_gossip_known_peers",
        "Number of peers in the registry"
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Subsystem errors by type
    pub static ref SUBSYSTEM_ERRORS: CounterVec = CounterVec::new(
        Opts::new("vr_subsystem_errors_total", "Errors by subsystem and type"),
        &["subsystem", "error_type"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(TICKS.clone()),
        Box::new(TICK_DURATION.clone()),
        Box::new(COMMITS.clone()),
        Box::new(CURRENT_EPOCH.clone()),
        Box::new(SIGNATURES_RECEIVED.clone()),
        Box::new(SIGNATURES_DROPPED.clone()),
        Box::new(BROADCASTS.clone()),
        Box::new(KNOWN_PEERS.clone()),
        Box::new(SUBSYSTEM_ERRORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
