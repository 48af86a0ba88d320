// libs/waitlist-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{BookFromWaitlistRequest, CreateWaitlistRequest};
use crate::services::WaitlistMatcher;

#[derive(Debug, Deserialize)]
pub struct ForDateQuery {
    pub salon_id: Uuid,
}

#[axum::debug_handler]
pub async fn create_entry(
    State(matcher): State<Arc<WaitlistMatcher>>,
    Json(request): Json<CreateWaitlistRequest>,
) -> Result<Json<Value>, AppError> {
    let entry = matcher.create_entry(request, Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "entry": entry
    })))
}

#[axum::debug_handler]
pub async fn entries_for_date(
    State(matcher): State<Arc<WaitlistMatcher>>,
    Path(date): Path<NaiveDate>,
    Query(params): Query<ForDateQuery>,
) -> Result<Json<Value>, AppError> {
    let entries = matcher.entries_for_date(params.salon_id, date).await?;

    Ok(Json(json!({
        "success": true,
        "date": date,
        "entries": entries
    })))
}

#[axum::debug_handler]
pub async fn notify_entry(
    State(matcher): State<Arc<WaitlistMatcher>>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let entry = matcher.mark_notified(entry_id, Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "entry": entry
    })))
}

#[axum::debug_handler]
pub async fn book_entry(
    State(matcher): State<Arc<WaitlistMatcher>>,
    Path(entry_id): Path<Uuid>,
    Json(request): Json<BookFromWaitlistRequest>,
) -> Result<Json<Value>, AppError> {
    let entry = matcher.mark_booked(entry_id, request.appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "entry": entry
    })))
}

#[axum::debug_handler]
pub async fn cancel_entry(
    State(matcher): State<Arc<WaitlistMatcher>>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let entry = matcher.cancel_entry(entry_id).await?;

    Ok(Json(json!({
        "success": true,
        "entry": entry
    })))
}
