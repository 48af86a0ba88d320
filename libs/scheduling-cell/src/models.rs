// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::{AppError, AppointmentStatus, BookingSource, CancelActor};
use shared_store::StoreError;

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub salon_id: Uuid,
    pub staff_id: Uuid,
    pub date: NaiveDate,
    /// Comma-separated service ids.
    pub service_ids: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultiStaffAvailabilityQuery {
    pub salon_id: Uuid,
    pub date: NaiveDate,
    pub service_ids: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextAvailableQuery {
    pub salon_id: Uuid,
    pub staff_id: Uuid,
    pub service_ids: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailableSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffAvailability {
    pub staff_id: Uuid,
    pub display_name: String,
    pub slots: Vec<AvailableSlot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub salon_id: Uuid,
    pub client_id: Uuid,
    pub staff_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub services: Vec<ServiceLineRequest>,
    pub client_notes: Option<String>,
    #[serde(default)]
    pub source: BookingSource,
}

/// One requested service. Overrides replace the catalog snapshot for this
/// line only, e.g. a quoted price after consultation.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceLineRequest {
    pub service_id: Uuid,
    pub price_override: Option<f64>,
    pub duration_override_minutes: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
    pub expected_version: i64,
    /// Checkout total for the completed transition; falls back to the
    /// estimated total when absent.
    pub final_total: Option<f64>,
    pub staff_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelAppointmentRequest {
    pub actor: CancelActor,
    pub expected_version: i64,
    pub reason: Option<String>,
    pub fee: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleRequest {
    pub actor: CancelActor,
    pub expected_version: i64,
    pub new_start_time: DateTime<Utc>,
    /// Move the appointment to a different staff member; the current one is
    /// kept when absent.
    pub new_staff_id: Option<Uuid>,
}

/// Outcome of a cancellation policy check.
#[derive(Debug, Clone, Serialize)]
pub struct CancellationAssessment {
    pub permitted: bool,
    pub deadline: DateTime<Utc>,
    pub fee: Option<f64>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Slot conflict: {0}")]
    SlotConflict(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Cancellation policy violation: {0}")]
    PolicyViolation(String),

    #[error("Appointment {0} was modified concurrently")]
    VersionConflict(Uuid),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<StoreError> for SchedulingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => SchedulingError::NotFound(what),
            StoreError::VersionConflict(id) => SchedulingError::VersionConflict(id),
            StoreError::Internal(msg) => SchedulingError::Store(msg),
        }
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::Validation(msg) => AppError::ValidationError(msg),
            SchedulingError::NotFound(msg) => AppError::NotFound(msg),
            SchedulingError::SlotConflict(msg) => AppError::Conflict(msg),
            SchedulingError::InvalidTransition { .. } => {
                AppError::InvalidTransition(err.to_string())
            }
            SchedulingError::PolicyViolation(msg) => AppError::PolicyViolation(msg),
            SchedulingError::VersionConflict(_) => AppError::Conflict(err.to_string()),
            SchedulingError::Store(msg) => AppError::Internal(msg),
        }
    }
}

pub(crate) fn parse_service_ids(raw: &str) -> Result<Vec<Uuid>, SchedulingError> {
    let ids: Result<Vec<Uuid>, _> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Uuid::parse_str)
        .collect();
    let ids = ids.map_err(|e| SchedulingError::Validation(format!("invalid service id: {}", e)))?;
    if ids.is_empty() {
        return Err(SchedulingError::Validation(
            "at least one service is required".to_string(),
        ));
    }
    Ok(ids)
}
