// libs/waitlist-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use shared_models::{AppError, WaitlistPriority};
use shared_store::StoreError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWaitlistRequest {
    pub salon_id: Uuid,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub client_email: Option<String>,
    pub service_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub preferred_date: NaiveDate,
    pub preferred_time_start: Option<NaiveTime>,
    pub preferred_time_end: Option<NaiveTime>,
    #[serde(default)]
    pub flexible_dates: bool,
    #[serde(default)]
    pub flexible_staff: bool,
    #[serde(default)]
    pub priority: WaitlistPriority,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookFromWaitlistRequest {
    pub appointment_id: Uuid,
}

#[derive(Error, Debug)]
pub enum WaitlistError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Entry is no longer active: {0}")]
    Inactive(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<StoreError> for WaitlistError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => WaitlistError::NotFound(what),
            StoreError::VersionConflict(id) => {
                WaitlistError::Store(format!("version conflict on {}", id))
            }
            StoreError::Internal(msg) => WaitlistError::Store(msg),
        }
    }
}

impl From<WaitlistError> for AppError {
    fn from(err: WaitlistError) -> Self {
        match err {
            WaitlistError::Validation(msg) => AppError::ValidationError(msg),
            WaitlistError::NotFound(msg) => AppError::NotFound(msg),
            WaitlistError::Inactive(msg) => AppError::Conflict(msg),
            WaitlistError::Store(msg) => AppError::Internal(msg),
        }
    }
}
