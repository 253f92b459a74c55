// libs/availability-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    BlockQueryParams, BulkDeleteRequest, DisableBlockRequest, GenerateBlocksRequest, ScheduleError,
    SlotQueryParams,
};
use crate::services::blocks::BlockScheduleService;
use crate::services::slots::SlotQueryService;

fn map_schedule_error(error: ScheduleError) -> AppError {
    match error {
        ScheduleError::InvalidDateRange(msg) => AppError::ValidationError(msg),
        ScheduleError::InvalidTimeWindow(msg) => AppError::ValidationError(msg),
        ScheduleError::UnsupportedDuration(minutes) => AppError::ValidationError(format!(
            "Block duration of {} minutes is not supported",
            minutes
        )),
        ScheduleError::EmptyWeekdays => {
            AppError::ValidationError("At least one weekday must be selected".to_string())
        }
        ScheduleError::InvalidWeekday(day) => {
            AppError::ValidationError(format!("Weekday {} is out of range (0-6)", day))
        }
        ScheduleError::BlockConflict { start, end } => AppError::Conflict(format!(
            "Generation overlaps an existing block from {} to {}",
            start, end
        )),
        ScheduleError::BlockNotFound => AppError::NotFound("Block not found".to_string()),
        ScheduleError::BlockProtected => {
            AppError::ProtectedResource("Block holds an active appointment".to_string())
        }
        ScheduleError::EmptySelection => {
            AppError::ValidationError("Bulk delete selection is empty".to_string())
        }
        ScheduleError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Generate availability blocks from a recurring weekly pattern.
#[axum::debug_handler]
pub async fn generate_blocks(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<GenerateBlocksRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BlockScheduleService::new(&state);

    let response = service
        .generate_blocks(request, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "blocks_generated": response.blocks_generated,
        "range_used": response.range_used
    })))
}

/// List a doctor's blocks grouped per date, with per-date counts.
#[axum::debug_handler]
pub async fn list_blocks(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(params): Query<BlockQueryParams>,
) -> Result<Json<Value>, AppError> {
    let service = BlockScheduleService::new(&state);

    let days = service
        .query_blocks(params, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "days": days
    })))
}

#[axum::debug_handler]
pub async fn enable_block(
    State(state): State<Arc<AppConfig>>,
    Path(block_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = BlockScheduleService::new(&state);

    let block = service
        .enable_block(block_id, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "block": block
    })))
}

#[axum::debug_handler]
pub async fn disable_block(
    State(state): State<Arc<AppConfig>>,
    Path(block_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<DisableBlockRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BlockScheduleService::new(&state);

    let block = service
        .disable_block(block_id, &request.reason, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "block": block
    })))
}

/// Delete blocks by explicit ids, single date, date range, or
/// available-only-in-range. Claimed blocks are skipped and counted.
#[axum::debug_handler]
pub async fn bulk_delete_blocks(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BlockScheduleService::new(&state);

    let response = service
        .bulk_delete(request, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "deleted_count": response.deleted_count,
        "skipped_count": response.skipped_count
    })))
}

/// Bookable slots for a doctor on a date, same-day lead time applied.
#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(params): Query<SlotQueryParams>,
) -> Result<Json<Value>, AppError> {
    let service = SlotQueryService::new(&state);

    let slots = service
        .get_available_slots(params.doctor_id, params.date, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "slots": slots
    })))
}
