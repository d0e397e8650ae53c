//! JSON REST handlers for the serial device itself.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use ledbridge_app::ports::DeviceLink;
use ledbridge_app::services::synchronizer::DeviceStatus;

use crate::error::ApiError;
use crate::state::AppState;

/// Connection state of the serial channel.
#[derive(Debug, Serialize)]
pub struct DeviceView {
    /// `"connected"` or `"disconnected"`.
    pub device: &'static str,
    pub port: String,
}

impl From<DeviceStatus> for DeviceView {
    fn from(status: DeviceStatus) -> Self {
        Self {
            device: if status.open {
                "connected"
            } else {
                "disconnected"
            },
            port: status.endpoint,
        }
    }
}

/// `POST /api/device/reopen`
///
/// Close the channel if it is still held, open it again and wait for the
/// board to settle. Every output falls back to its initial state.
pub async fn reopen<L: DeviceLink>(
    State(state): State<AppState<L>>,
) -> Result<Json<DeviceView>, ApiError> {
    tracing::info!("device reopen requested");
    state.synchronizer.reopen().await?;
    let status = state.synchronizer.device_status().await;
    Ok(Json(status.into()))
}
