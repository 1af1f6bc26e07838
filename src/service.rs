//! HTTP surface over a shared [`Pipeline`].

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::baseline::{compare, BaselineSample, ComparisonRow};
use crate::error::PredictorError;
use crate::export::{export_file_name, to_csv, to_flat_record};
use crate::pipeline::Pipeline;
use crate::stations::StationGeo;
use crate::types::{InputRecord, Pollutant};

pub type AppState = Arc<Pipeline>;

type ApiError = (StatusCode, Json<serde_json::Value>);

#[derive(Serialize, Debug)]
pub struct PredictOut {
    pub station_id: String,
    pub year: i64,
    pub pollutants: BTreeMap<Pollutant, f64>,
    /// Known station location, if any.
    pub station: Option<StationGeo>,
    pub comparison: Vec<ComparisonRow>,
}

#[derive(Serialize, Debug)]
pub struct SchemaOut {
    pub in_dim: usize,
    pub columns: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/predict/csv", post(predict_csv))
        .route("/stations/:id", get(station))
        .route("/baseline", get(baseline))
        .route("/schema", get(schema))
        .with_state(state)
}

/// Map a pipeline error to a response. Inference failures point at a broken
/// artifact or reconciliation, so they are logged loudly.
fn reject(context: &str, e: PredictorError) -> ApiError {
    let status = if e.is_client_error() {
        tracing::warn!("rejected {}: {}", context, e);
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!("prediction failed {}: {}", context, e);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(json!({ "error": e.to_string() })))
}

fn describe(record: &InputRecord) -> String {
    format!("station={:?} year={}", record.station_id, record.year)
}

/// Unwrap the request body; a body that does not parse is a 400 like any other bad input.
fn parse_body(payload: Result<Json<InputRecord>, JsonRejection>) -> Result<InputRecord, ApiError> {
    payload
        .map(|Json(record)| record)
        .map_err(|rej| reject("malformed body", PredictorError::InvalidInput(rej.body_text())))
}

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<InputRecord>, JsonRejection>,
) -> Result<Json<PredictOut>, ApiError> {
    let payload = parse_body(payload)?;
    let labeled = state
        .predict_record(&payload)
        .map_err(|e| reject(&describe(&payload), e))?;

    let station_id = payload.station_id.trim().to_string();
    let station = state.stations().get(&station_id).cloned();
    if station.is_none() {
        tracing::debug!("station {} not found in map data", station_id);
    }

    Ok(Json(PredictOut {
        comparison: compare(&labeled, state.baseline()),
        pollutants: to_flat_record(&labeled),
        station,
        station_id,
        year: payload.year,
    }))
}

pub async fn predict_csv(
    State(state): State<AppState>,
    payload: Result<Json<InputRecord>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = parse_body(payload)?;
    let labeled = state
        .predict_record(&payload)
        .map_err(|e| reject(&describe(&payload), e))?;
    let body = to_csv(&labeled).map_err(|e| {
        tracing::error!("csv export failed: {:#}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(&payload.station_id, payload.year)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

pub async fn station(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StationGeo>, ApiError> {
    state.stations().get(&id).cloned().map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("station {id} not found in map data") })),
        )
    })
}

pub async fn baseline(State(state): State<AppState>) -> Json<BaselineSample> {
    Json(state.baseline().clone())
}

pub async fn schema(State(state): State<AppState>) -> Json<SchemaOut> {
    let s = state.schema();
    Json(SchemaOut {
        in_dim: s.len(),
        columns: s.columns().to_vec(),
    })
}
