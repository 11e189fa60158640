//! HTTP API server with observability for the stock ledger.
//!
//! A thin adapter over [`domain::LedgerService`]: form submissions in, JSON
//! out, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::LedgerService;
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use routes::ledger::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/", get(routes::ledger::current_state::<S>))
        .route("/buy", post(routes::ledger::buy::<S>))
        .route("/sell", post(routes::ledger::sell::<S>))
        .route("/balance", post(routes::ledger::balance::<S>))
        .route("/history", get(routes::ledger::history::<S>))
        .route("/history/", get(routes::ledger::history::<S>))
        .route(
            "/history/{from}/{to}",
            get(routes::ledger::history_range::<S>),
        )
        .route(
            "/history/{from}/{to}/",
            get(routes::ledger::history_range::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around an event store.
pub fn create_state<S: EventStore + Clone + 'static>(event_store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        ledger: LedgerService::new(event_store),
    })
}
