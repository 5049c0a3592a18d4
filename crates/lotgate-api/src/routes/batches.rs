//! # Batch Lifecycle API
//!
//! Scheduling, lifecycle actions, and batch reads. Every action delegates
//! to the engine; handlers only parse input and shape output.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use lotgate_core::{BatchId, VesselId};
use lotgate_state::{Batch, FinalizeOutcome};

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{batch_id_from_path, extract_json, extract_validated_json, Validate};
use crate::state::AppState;

/// Body for `POST /v1/batches`.
#[derive(Debug, Deserialize)]
pub struct ScheduleBatchRequest {
    pub batch_id: String,
}

impl Validate for ScheduleBatchRequest {
    fn validate(&self) -> Result<(), String> {
        BatchId::new(self.batch_id.as_str())
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Body for `POST /v1/batches/:batch_id/start`.
#[derive(Debug, Deserialize)]
pub struct StartBatchRequest {
    pub vessel_id: String,
}

impl Validate for StartBatchRequest {
    fn validate(&self) -> Result<(), String> {
        VesselId::new(self.vessel_id.as_str())
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Body for `POST /v1/batches/:batch_id/updates`.
#[derive(Debug, Deserialize)]
pub struct ProcessUpdateRequest {
    pub spec_good: bool,
}

/// Body for `POST /v1/batches/:batch_id/finalize`.
#[derive(Debug, Deserialize)]
pub struct FinalizeRequest {
    pub approved: bool,
}

/// Response for a quality-control decision.
#[derive(Debug, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub batch: Batch,
    pub decision: FinalizeOutcome,
}

/// Build the batches router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/batches", get(list_batches).post(schedule_batch))
        .route("/v1/batches/:batch_id", get(get_batch))
        .route("/v1/batches/:batch_id/start", post(start_batch))
        .route("/v1/batches/:batch_id/quality-check", post(request_quality_check))
        .route("/v1/batches/:batch_id/updates", post(log_process_update))
        .route("/v1/batches/:batch_id/bypass", post(manager_bypass))
        .route("/v1/batches/:batch_id/finalize", post(finalize_batch))
        .route("/v1/batches/:batch_id/ship", post(approve_for_shipping))
}

/// POST /v1/batches: Schedule a new batch.
async fn schedule_batch(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<ScheduleBatchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Batch>), AppError> {
    let req = extract_validated_json(body)?;
    let batch_id = BatchId::new(req.batch_id)?;
    let batch = state
        .run(move |engine| Ok(engine.schedule_batch(caller.principal(), &batch_id)?))
        .await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// GET /v1/batches: All batches, ordered by id.
async fn list_batches(State(state): State<AppState>) -> Result<Json<Vec<Batch>>, AppError> {
    let batches = state.run(|engine| Ok(engine.batches())).await?;
    Ok(Json(batches))
}

/// GET /v1/batches/:batch_id
async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> Result<Json<Batch>, AppError> {
    let batch_id = batch_id_from_path(batch_id)?;
    let batch = state
        .run(move |engine| {
            engine
                .batch(&batch_id)
                .ok_or_else(|| AppError::NotFound(format!("batch {batch_id} not found")))
        })
        .await?;
    Ok(Json(batch))
}

/// POST /v1/batches/:batch_id/start: Bind an operator and vessel.
async fn start_batch(
    State(state): State<AppState>,
    caller: Caller,
    Path(batch_id): Path<String>,
    body: Result<Json<StartBatchRequest>, JsonRejection>,
) -> Result<Json<Batch>, AppError> {
    let batch_id = batch_id_from_path(batch_id)?;
    let req = extract_validated_json(body)?;
    let vessel_id = VesselId::new(req.vessel_id)?;
    let batch = state
        .run(move |engine| {
            Ok(engine.start_batch(caller.principal(), &batch_id, &vessel_id)?)
        })
        .await?;
    Ok(Json(batch))
}

/// POST /v1/batches/:batch_id/quality-check
async fn request_quality_check(
    State(state): State<AppState>,
    caller: Caller,
    Path(batch_id): Path<String>,
) -> Result<Json<Batch>, AppError> {
    let batch_id = batch_id_from_path(batch_id)?;
    let batch = state
        .run(move |engine| Ok(engine.request_quality_check(caller.principal(), &batch_id)?))
        .await?;
    Ok(Json(batch))
}

/// POST /v1/batches/:batch_id/updates: Telemetry reading.
async fn log_process_update(
    State(state): State<AppState>,
    caller: Caller,
    Path(batch_id): Path<String>,
    body: Result<Json<ProcessUpdateRequest>, JsonRejection>,
) -> Result<Json<Batch>, AppError> {
    let batch_id = batch_id_from_path(batch_id)?;
    let req = extract_json(body)?;
    let batch = state
        .run(move |engine| {
            Ok(engine.log_process_update(caller.principal(), &batch_id, req.spec_good)?)
        })
        .await?;
    Ok(Json(batch))
}

/// POST /v1/batches/:batch_id/bypass: Manager physical-witness override.
async fn manager_bypass(
    State(state): State<AppState>,
    caller: Caller,
    Path(batch_id): Path<String>,
) -> Result<Json<Batch>, AppError> {
    let batch_id = batch_id_from_path(batch_id)?;
    let batch = state
        .run(move |engine| Ok(engine.manager_bypass(caller.principal(), &batch_id)?))
        .await?;
    Ok(Json(batch))
}

/// POST /v1/batches/:batch_id/finalize: Quality-control decision.
async fn finalize_batch(
    State(state): State<AppState>,
    caller: Caller,
    Path(batch_id): Path<String>,
    body: Result<Json<FinalizeRequest>, JsonRejection>,
) -> Result<Json<FinalizeResponse>, AppError> {
    let batch_id = batch_id_from_path(batch_id)?;
    let req = extract_json(body)?;
    let report = state
        .run(move |engine| {
            Ok(engine.finalize_batch(caller.principal(), &batch_id, req.approved)?)
        })
        .await?;
    Ok(Json(FinalizeResponse {
        batch: report.batch,
        decision: report.outcome,
    }))
}

/// POST /v1/batches/:batch_id/ship: Supervisor release.
async fn approve_for_shipping(
    State(state): State<AppState>,
    caller: Caller,
    Path(batch_id): Path<String>,
) -> Result<Json<Batch>, AppError> {
    let batch_id = batch_id_from_path(batch_id)?;
    let batch = state
        .run(move |engine| Ok(engine.approve_for_shipping(caller.principal(), &batch_id)?))
        .await?;
    Ok(Json(batch))
}
