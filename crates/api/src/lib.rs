//! HTTP API server with observability for the marketplace.
//!
//! Provides REST endpoints for listing, selling and buying items and for
//! topping up balances, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Request};
use axum::routing::{get, post};
use common::CategoryId;
use domain::{MarketConfig, Marketplace};
use market_store::{Category, InMemoryStore, Store};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub market: Marketplace<S>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
    config: &Config,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/users", post(routes::users::register::<S>))
        .route("/users/{id}/items", get(routes::users::items::<S>))
        .route(
            "/items",
            get(routes::items::on_sale::<S>).post(routes::items::create::<S>),
        )
        .route("/items_sold", get(routes::items::sold::<S>))
        .route("/items/categories", get(routes::items::categories::<S>))
        .route("/items/{id}", get(routes::items::get::<S>))
        .route("/items/{id}/image", get(routes::items::image::<S>))
        .route("/search", get(routes::items::search::<S>))
        .route("/sell", post(routes::items::sell::<S>))
        .route("/purchase/{id}", post(routes::purchases::purchase::<S>))
        .route(
            "/balance",
            get(routes::balance::get::<S>).post(routes::balance::top_up::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(cors_layer(config.front_url.as_deref()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    request_id = %uuid::Uuid::new_v4(),
                    method = %req.method(),
                    uri = %req.uri(),
                )
            }),
        )
}

fn cors_layer(front_url: Option<&str>) -> CorsLayer {
    let origin = match front_url.map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "ignoring malformed FRONT_URL, allowing any origin");
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Creates the application state over a store.
pub fn create_default_state<S: Store>(store: S, config: MarketConfig) -> Arc<AppState<S>> {
    Arc::new(AppState {
        market: Marketplace::new(store, config),
    })
}

/// The reference categories every deployment starts with.
pub fn default_categories() -> Vec<Category> {
    ["Fashion", "Furniture", "Food", "Books", "Electronics", "Hobby"]
        .into_iter()
        .zip(1..)
        .map(|(name, id)| Category::new(CategoryId::new(id), name))
        .collect()
}

/// An in-memory store seeded with [`default_categories`].
pub fn in_memory_store() -> InMemoryStore {
    InMemoryStore::with_categories(default_categories())
}
