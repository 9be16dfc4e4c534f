//! Prometheus metrics endpoint and metric descriptions.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use metrics::{Unit, describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusHandle;

/// Registers help text for every metric the services emit.
pub fn describe() {
    describe_counter!(
        "marketplace_purchases_total",
        "Purchase attempts by outcome"
    );
    describe_counter!("marketplace_listings_total", "Items listed");
    describe_counter!("marketplace_sales_total", "Items put on sale");
    describe_counter!("marketplace_top_ups_total", "Balance top-ups");
    describe_histogram!(
        "marketplace_purchase_duration_seconds",
        Unit::Seconds,
        "Time spent settling one purchase"
    );
}

/// GET /metrics — returns Prometheus-formatted metrics.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}
