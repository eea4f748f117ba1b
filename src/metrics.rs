// Prometheus metrics definitions for the tsume-shogi bot.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// Answers queued for puzzles that have been served.
    pub static ref PENDING_ANSWERS: IntGauge =
        IntGauge::new("tsume_pending_answers", "Answers waiting to be revealed").unwrap();

    /// Puzzles left in the catalog across all move counts.
    pub static ref REMAINING_PUZZLES: IntGauge =
        IntGauge::new("tsume_remaining_puzzles", "Puzzles left in the catalog").unwrap();

    // ── Counters ─────────────────────────────────────────────────────

    /// Incoming text commands, by classified intent.
    pub static ref COMMANDS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("tsume_commands_total", "Text commands handled"),
        &["intent"],
    )
    .unwrap();

    /// Puzzles handed out, by move count.
    pub static ref PUZZLES_SERVED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("tsume_puzzles_served_total", "Puzzles served"),
        &["moves"],
    )
    .unwrap();

    /// Requests for a move count whose stock was empty.
    pub static ref STOCK_EXHAUSTED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("tsume_stock_exhausted_total", "Requests for an empty move count"),
        &["moves"],
    )
    .unwrap();

    /// Catalog reloads, by result (ok, error).
    pub static ref CATALOG_RESETS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("tsume_catalog_resets_total", "Catalog reloads"),
        &["result"],
    )
    .unwrap();

    /// Webhook requests, by response status.
    pub static ref WEBHOOK_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("tsume_webhook_requests_total", "Webhook requests received"),
        &["status"],
    )
    .unwrap();

    /// Reply or push calls to the messaging API that failed.
    pub static ref DELIVERIES_FAILED_TOTAL: IntCounter = IntCounter::new(
        "tsume_deliveries_failed_total",
        "Failed message deliveries",
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(PENDING_ANSWERS.clone()),
        Box::new(REMAINING_PUZZLES.clone()),
        Box::new(COMMANDS_TOTAL.clone()),
        Box::new(PUZZLES_SERVED_TOTAL.clone()),
        Box::new(STOCK_EXHAUSTED_TOTAL.clone()),
        Box::new(CATALOG_RESETS_TOTAL.clone()),
        Box::new(WEBHOOK_REQUESTS_TOTAL.clone()),
        Box::new(DELIVERIES_FAILED_TOTAL.clone()),
    ];

    for c in collectors {
        if let Err(e) = REGISTRY.register(c) {
            tracing::warn!("Metric registration skipped: {e}");
        }
    }
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
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_metrics_after_register() {
        // Registering twice must not panic.
        register_metrics();
        register_metrics();

        COMMANDS_TOTAL.with_label_values(&["stock"]).inc();
        let output = gather_metrics();
        assert!(output.contains("tsume_commands_total"));
    }

    #[test]
    fn test_metric_increments() {
        PUZZLES_SERVED_TOTAL.with_label_values(&["7"]).inc();
        STOCK_EXHAUSTED_TOTAL.with_label_values(&["9"]).inc();
        CATALOG_RESETS_TOTAL.with_label_values(&["ok"]).inc();
        WEBHOOK_REQUESTS_TOTAL.with_label_values(&["200"]).inc();

        let before = DELIVERIES_FAILED_TOTAL.get();
        DELIVERIES_FAILED_TOTAL.inc();
        assert!(DELIVERIES_FAILED_TOTAL.get() > before);
    }
}
