use std::net::SocketAddr;

use crate::model::Mutation;

// ── Interaction metrics ─────────────────────────────────────────

/// Counter: gateway requests resolved. Labels: kind, outcome.
pub const MUTATIONS_TOTAL: &str = "tapechart_mutations_total";

/// Counter: drops refused by the guard check before any request was issued.
pub const GUARD_REJECTIONS_TOTAL: &str = "tapechart_guard_rejections_total";

/// Counter: responses discarded because a newer one was already applied.
pub const STALE_RESPONSES_TOTAL: &str = "tapechart_stale_responses_total";

/// Counter: confirmed undo/redo steps. Labels: op.
pub const HISTORY_OPS_TOTAL: &str = "tapechart_history_ops_total";

// ── Render metrics ──────────────────────────────────────────────

/// Histogram: full placement + conflict pass in seconds.
pub const PLACEMENT_DURATION_SECONDS: &str = "tapechart_placement_duration_seconds";

/// Gauge: gateway requests awaiting confirmation.
pub const PENDING_REQUESTS: &str = "tapechart_pending_requests";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics"),
        Err(e) => tracing::warn!("metrics exporter not installed: {e}"),
    }
}

/// Short label for a mutation kind.
pub fn mutation_label(mutation: &Mutation) -> &'static str {
    match mutation {
        Mutation::Reassign { .. } => "reassign",
        Mutation::Reschedule { .. } => "reschedule",
    }
}
