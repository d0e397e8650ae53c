//! JSON REST handlers for outputs.

use std::str::FromStr;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use ledbridge_app::ports::DeviceLink;
use ledbridge_app::services::synchronizer::{ApplyOutcome, LineReport, OutputStatus};
use ledbridge_domain::error::ValidationError;
use ledbridge_domain::id::{OutputId, PhysicalLine};
use ledbridge_domain::output::LineState;
use ledbridge_domain::time::Timestamp;

use crate::error::{ApiError, error_kind};
use crate::state::AppState;
use crate::state_value;

/// Request body for changing one or all outputs.
#[derive(Debug, Deserialize)]
pub struct SetStateRequest {
    #[serde(alias = "состояние")]
    pub state: Value,
}

/// An output as the API shows it.
#[derive(Debug, Serialize)]
pub struct OutputView {
    pub id: OutputId,
    pub label: String,
    pub line: PhysicalLine,
    /// `null` while the state is unknown.
    pub state: Option<LineState>,
    pub confirmed_at: Option<Timestamp>,
}

impl From<OutputStatus> for OutputView {
    fn from(status: OutputStatus) -> Self {
        Self {
            id: status.output.id,
            label: status.output.label,
            line: status.output.line,
            state: status.state,
            confirmed_at: status.confirmed_at,
        }
    }
}

/// Result for one line of a batch.
#[derive(Debug, Serialize)]
pub struct LineResultView {
    pub id: OutputId,
    /// `"applied"`, `"unchanged"` or `"failed"`.
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

impl From<LineReport> for LineResultView {
    fn from(report: LineReport) -> Self {
        let (outcome, error, kind) = match report.result {
            Ok(ApplyOutcome::Applied) => ("applied", None, None),
            Ok(ApplyOutcome::Unchanged) => ("unchanged", None, None),
            Err(err) => ("failed", Some(err.to_string()), Some(error_kind(&err))),
        };
        Self {
            id: report.output_id,
            outcome,
            error,
            kind,
        }
    }
}

/// Per-line report for a request that touched every output.
#[derive(Debug, Serialize)]
pub struct BatchView {
    pub state: LineState,
    pub results: Vec<LineResultView>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<OutputView>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the single-output endpoints.
pub enum GetResponse {
    Ok(Json<OutputView>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the batch endpoint.
pub enum BatchResponse {
    Ok(Json<BatchView>),
}

impl IntoResponse for BatchResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

fn parse_id(raw: &str) -> Result<OutputId, ApiError> {
    OutputId::from_str(raw)
        .map_err(|_| ValidationError::InvalidOutputId(raw.to_string()).into())
}

async fn apply_and_show<L: DeviceLink>(
    state: &AppState<L>,
    raw_id: &str,
    desired: LineState,
) -> Result<GetResponse, ApiError> {
    let output_id = parse_id(raw_id)?;
    state.synchronizer.apply(output_id, desired).await?;
    let status = state.synchronizer.status(output_id).await?;
    Ok(GetResponse::Ok(Json(status.into())))
}

/// `GET /api/leds`
pub async fn list<L: DeviceLink>(State(state): State<AppState<L>>) -> ListResponse {
    let outputs = state
        .synchronizer
        .snapshot()
        .await
        .into_iter()
        .map(OutputView::from)
        .collect();
    ListResponse::Ok(Json(outputs))
}

/// `GET /api/leds/{id}`
pub async fn get<L: DeviceLink>(
    State(state): State<AppState<L>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError> {
    let output_id = parse_id(&id)?;
    let status = state.synchronizer.status(output_id).await?;
    Ok(GetResponse::Ok(Json(status.into())))
}

/// `PUT /api/leds/{id}`
pub async fn set<L: DeviceLink>(
    State(state): State<AppState<L>>,
    Path(id): Path<String>,
    payload: Result<Json<SetStateRequest>, JsonRejection>,
) -> Result<GetResponse, ApiError> {
    let Json(request) = payload?;
    let desired = state_value::parse(&request.state)?;
    apply_and_show(&state, &id, desired).await
}

/// `POST /api/leds/{id}/on`
pub async fn turn_on<L: DeviceLink>(
    State(state): State<AppState<L>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError> {
    apply_and_show(&state, &id, LineState::On).await
}

/// `POST /api/leds/{id}/off`
pub async fn turn_off<L: DeviceLink>(
    State(state): State<AppState<L>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError> {
    apply_and_show(&state, &id, LineState::Off).await
}

/// `PUT /api/leds`
///
/// Lines are reported one by one; a failed line does not fail the request.
pub async fn set_all<L: DeviceLink>(
    State(state): State<AppState<L>>,
    payload: Result<Json<SetStateRequest>, JsonRejection>,
) -> Result<BatchResponse, ApiError> {
    let Json(request) = payload?;
    let desired = state_value::parse(&request.state)?;
    let results = state
        .synchronizer
        .apply_all(desired)
        .await
        .into_iter()
        .map(LineResultView::from)
        .collect();
    Ok(BatchResponse::Ok(Json(BatchView {
        state: desired,
        results,
    })))
}
