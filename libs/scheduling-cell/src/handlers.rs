// libs/scheduling-cell/src/handlers.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    parse_service_ids, AvailabilityQuery, BookAppointmentRequest, CancelAppointmentRequest,
    MultiStaffAvailabilityQuery, NextAvailableQuery, RescheduleRequest, UpdateStatusRequest,
};
use crate::router::SchedulingState;

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<SchedulingState>,
    Query(params): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let service_ids = parse_service_ids(&params.service_ids)?;

    let slots = state
        .availability
        .available_slots(
            params.salon_id,
            params.staff_id,
            params.date,
            &service_ids,
            Utc::now(),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "staff_id": params.staff_id,
        "date": params.date,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn get_multi_staff_availability(
    State(state): State<SchedulingState>,
    Query(params): Query<MultiStaffAvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let service_ids = parse_service_ids(&params.service_ids)?;

    let staff = state
        .availability
        .multi_staff_availability(params.salon_id, params.date, &service_ids, Utc::now())
        .await?;

    Ok(Json(json!({
        "success": true,
        "date": params.date,
        "staff": staff
    })))
}

#[axum::debug_handler]
pub async fn get_next_available(
    State(state): State<SchedulingState>,
    Query(params): Query<NextAvailableQuery>,
) -> Result<Json<Value>, AppError> {
    let service_ids = parse_service_ids(&params.service_ids)?;

    let slot = state
        .availability
        .find_next_available(params.salon_id, params.staff_id, &service_ids, Utc::now())
        .await?;

    Ok(Json(json!({
        "success": true,
        "staff_id": params.staff_id,
        "slot": slot
    })))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<SchedulingState>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = state.booking.book(request, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<SchedulingState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.lifecycle.get_appointment(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<SchedulingState>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .lifecycle
        .update_status(appointment_id, request, Utc::now())
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<SchedulingState>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .lifecycle
        .cancel(appointment_id, request, Utc::now())
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<SchedulingState>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .booking
        .reschedule(appointment_id, request, Utc::now())
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}
