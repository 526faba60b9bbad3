//! Prometheus metrics for the validator subsystems.
//!
//! All metrics follow the naming convention: `uv_<subsystem>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g. sessions_started_total)
//! - **Gauge**: Value that can go up or down (e.g. active_sessions)
//! - **Histogram**: Distribution of values (e.g. session_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramVec,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SESSION MANAGER METRICS
    // =========================================================================

    /// Sessions started, by protocol (keygen/keyrefresh/quorum_change/sign).
    pub static ref SESSIONS_STARTED: CounterVec = CounterVec::new(
        Opts::new("uv_session_started_total", "TSS sessions started"),
        &["protocol"]
    ).expect("metric creation failed");

    /// Sessions finished, by protocol and outcome (completed/failed/timed_out).
    pub static ref SESSIONS_FINISHED: CounterVec = CounterVec::new(
        Opts::new("uv_session_finished_total", "TSS sessions finished"),
        &["protocol", "outcome"]
    ).expect("metric creation failed");

    /// Currently active sessions.
    pub static ref SESSIONS_ACTIVE: Gauge = Gauge::new(
        "uv_session_active",
        "Number of TSS sessions currently in progress"
    ).expect("metric creation failed");

    /// Session duration, by protocol.
    pub static ref SESSION_DURATION: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "uv_session_duration_seconds",
            "Time spent running a TSS session end to end"
        ).buckets(exponential_buckets(0.05, 2.0, 16).unwrap()),
        &["protocol"]
    ).expect("metric creation failed");

    // =========================================================================
    // COORDINATOR METRICS
    // =========================================================================

    /// Coordinator elections run.
    pub static ref COORDINATOR_ELECTIONS: Counter = Counter::new(
        "uv_coordinator_elections_total",
        "Total coordinator elections run"
    ).expect("metric creation failed");

    /// Elections where this node became coordinator.
    pub static ref COORDINATOR_ELECTED_SELF: Counter = Counter::new(
        "uv_coordinator_elected_self_total",
        "Elections in which this node became coordinator"
    ).expect("metric creation failed");

    // =========================================================================
    // SIGNING-REQUEST VERIFIER METRICS
    // =========================================================================

    /// Signing-request verifier decisions, by outcome (accepted/rejected).
    pub static ref VERIFIER_DECISIONS: CounterVec = CounterVec::new(
        Opts::new("uv_verifier_decisions_total", "Signing-request verifier decisions"),
        &["outcome", "reason"]
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT STORE METRICS
    // =========================================================================

    /// Event status transitions, by event type and resulting status.
    pub static ref EVENT_STATUS_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("uv_event_status_transitions_total", "Event status transitions recorded"),
        &["event_type", "status"]
    ).expect("metric creation failed");

    /// Events currently pending processing, by event type.
    pub static ref EVENTS_PENDING: GaugeVec = GaugeVec::new(
        Opts::new("uv_events_pending", "Events waiting for confirmation or processing"),
        &["event_type"]
    ).expect("metric creation failed");

    // =========================================================================
    // OUTBOUND RESOLVER METRICS
    // =========================================================================

    /// Outbound transactions resolved, by destination chain and outcome
    /// (confirmed/reverted/dropped).
    pub static ref OUTBOUND_RESOLVED: CounterVec = CounterVec::new(
        Opts::new("uv_outbound_resolved_total", "Outbound transactions resolved"),
        &["chain", "outcome"]
    ).expect("metric creation failed");

    /// Time from broadcast to resolution, by destination chain.
    pub static ref OUTBOUND_RESOLUTION_DURATION: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "uv_outbound_resolution_duration_seconds",
            "Time from broadcast to confirmation/revert"
        ).buckets(exponential_buckets(1.0, 2.0, 16).unwrap()),
        &["chain"]
    ).expect("metric creation failed");

    // =========================================================================
    // EXPIRY SWEEPER METRICS
    // =========================================================================

    /// Events reverted by the expiry sweeper, by event type.
    pub static ref SWEEPER_REVERTS: CounterVec = CounterVec::new(
        Opts::new("uv_sweeper_reverts_total", "Events reverted by the expiry sweeper"),
        &["event_type"]
    ).expect("metric creation failed");

    /// Sweep passes executed.
    pub static ref SWEEPER_PASSES: Counter = Counter::new(
        "uv_sweeper_passes_total",
        "Total expiry sweep passes executed"
    ).expect("metric creation failed");

    // =========================================================================
    // CHAIN DB / CLEANER METRICS
    // =========================================================================

    /// Rows deleted by the per-chain transaction cleaner, by chain.
    pub static ref CHAIN_DB_ROWS_DELETED: CounterVec = CounterVec::new(
        Opts::new("uv_chain_db_rows_deleted_total", "Rows deleted by the transaction cleaner"),
        &["chain"]
    ).expect("metric creation failed");

    // =========================================================================
    // PEER TRANSPORT METRICS
    // =========================================================================

    /// Peer messages sent, by message kind.
    pub static ref PEER_MESSAGES_SENT: CounterVec = CounterVec::new(
        Opts::new("uv_peer_messages_sent_total", "Peer transport messages sent"),
        &["kind"]
    ).expect("metric creation failed");

    /// Peer messages received, by message kind.
    pub static ref PEER_MESSAGES_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("uv_peer_messages_received_total", "Peer transport messages received"),
        &["kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Errors by component and error type.
    pub static ref COMPONENT_ERRORS: CounterVec = CounterVec::new(
        Opts::new("uv_component_errors_total", "Errors by component and type"),
        &["component", "error_type"]
    ).expect("metric creation failed");
}

/// Handle for the metrics registry.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Session manager
        Box::new(SESSIONS_STARTED.clone()),
        Box::new(SESSIONS_FINISHED.clone()),
        Box::new(SESSIONS_ACTIVE.clone()),
        Box::new(SESSION_DURATION.clone()),
        // Coordinator
        Box::new(COORDINATOR_ELECTIONS.clone()),
        Box::new(COORDINATOR_ELECTED_SELF.clone()),
        // Verifier
        Box::new(VERIFIER_DECISIONS.clone()),
        // Event store
        Box::new(EVENT_STATUS_TRANSITIONS.clone()),
        Box::new(EVENTS_PENDING.clone()),
        // Resolver
        Box::new(OUTBOUND_RESOLVED.clone()),
        Box::new(OUTBOUND_RESOLUTION_DURATION.clone()),
        // Sweeper
        Box::new(SWEEPER_REVERTS.clone()),
        Box::new(SWEEPER_PASSES.clone()),
        // Chain DB
        Box::new(CHAIN_DB_ROWS_DELETED.clone()),
        // Peer transport
        Box::new(PEER_MESSAGES_SENT.clone()),
        Box::new(PEER_MESSAGES_RECEIVED.clone()),
        // Errors
        Box::new(COMPONENT_ERRORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
