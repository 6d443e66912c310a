//! Prometheus metrics for observability.
//!
//! HTTP request metrics are recorded by middleware on every request. Ticket
//! counts by status are gauges refreshed from the store on each scrape, and
//! the mutation counters are bumped by the handlers.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};
use tracing::warn;

use helpdesk_core::{Status, TicketStore};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// Path label for requests that matched no route.
pub const UNMATCHED_PATH: &str = "unmatched";

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "helpdesk_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
        ]),
        &["method", "path", "status"],
    )
    .expect("valid histogram definition")
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("helpdesk_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("valid counter definition")
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "helpdesk_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .expect("valid gauge definition")
});

// =============================================================================
// Ticket Metrics
// =============================================================================

/// Tickets by current status (collected on scrape).
pub static TICKETS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("helpdesk_tickets_by_status", "Current ticket count by status"),
        &["status"],
    )
    .expect("valid gauge definition")
});

pub static TICKETS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "helpdesk_tickets_created_total",
        "Total tickets created since startup",
    )
    .expect("valid counter definition")
});

pub static TICKETS_DELETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "helpdesk_tickets_deleted_total",
        "Total tickets deleted since startup",
    )
    .expect("valid counter definition")
});

pub static COMMENTS_ADDED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "helpdesk_comments_added_total",
        "Total comments added since startup",
    )
    .expect("valid counter definition")
});

pub static COMMENTS_DELETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "helpdesk_comments_deleted_total",
        "Total comments deleted since startup",
    )
    .expect("valid counter definition")
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        Box::new(TICKETS_BY_STATUS.clone()),
        Box::new(TICKETS_CREATED_TOTAL.clone()),
        Box::new(TICKETS_DELETED_TOTAL.clone()),
        Box::new(COMMENTS_ADDED_TOTAL.clone()),
        Box::new(COMMENTS_DELETED_TOTAL.clone()),
    ];

    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            warn!(error = %e, "Failed to register metric");
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Refresh the status gauges from the store.
pub fn collect_dynamic_metrics(store: &dyn TicketStore) {
    let tickets = match store.list() {
        Ok(tickets) => tickets,
        Err(e) => {
            warn!(error = %e, "Failed to collect ticket metrics");
            return;
        }
    };

    for status in Status::ALL {
        let count = tickets.iter().filter(|t| t.status == status).count();
        TICKETS_BY_STATUS
            .with_label_values(&[status.label()])
            .set(count as i64);
    }
}
