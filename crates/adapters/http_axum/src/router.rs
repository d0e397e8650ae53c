//! Axum router assembly.

use std::time::Duration;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use ledbridge_app::ports::DeviceLink;

use crate::api::device::DeviceView;
use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/api`. Includes a [`TraceLayer`] that logs each
/// HTTP request/response at the `DEBUG` level, permissive CORS for browser
/// front-ends, and a [`TimeoutLayer`] bounding how long a request may wait
/// behind other device round-trips.
pub fn build<L: DeviceLink>(state: AppState<L>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health_check::<L>))
        .nest("/api", crate::api::routes())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    #[serde(flatten)]
    device: DeviceView,
}

/// The service answers even when the board is unplugged; the device field
/// says whether commands can currently go through.
async fn health_check<L: DeviceLink>(State(state): State<AppState<L>>) -> Json<Health> {
    let device = state.synchronizer.device_status().await;
    Json(Health {
        status: "ok",
        device: device.into(),
    })
}
