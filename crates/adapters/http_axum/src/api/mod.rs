//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod device;
#[allow(clippy::missing_errors_doc)]
pub mod leds;

use axum::Router;
use axum::routing::{get, post};

use ledbridge_app::ports::DeviceLink;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<L: DeviceLink>() -> Router<AppState<L>> {
    Router::new()
        // Outputs
        .route("/leds", get(leds::list::<L>).put(leds::set_all::<L>))
        .route("/leds/{id}", get(leds::get::<L>).put(leds::set::<L>))
        .route("/leds/{id}/on", post(leds::turn_on::<L>))
        .route("/leds/{id}/off", post(leds::turn_off::<L>))
        // Device
        .route("/device/reopen", post(device::reopen::<L>))
}
