//! Seams to the record systems the scheduling core does not own. Handlers and
//! services only ever see these traits; the concrete backend is wired up in
//! the binary.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared_models::{
    Appointment, ClientRecord, SalonSettings, ServiceSpec, StaffProfile, WaitlistEntry,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("version conflict on {0}")]
    VersionConflict(Uuid),

    #[error("store error: {0}")]
    Internal(String),
}

/// Lookup into salon, staff, service and client records owned elsewhere.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn salon_settings(&self, salon_id: Uuid) -> Result<SalonSettings, StoreError>;

    async fn staff_profile(&self, staff_id: Uuid) -> Result<StaffProfile, StoreError>;

    async fn bookable_staff(&self, salon_id: Uuid) -> Result<Vec<StaffProfile>, StoreError>;

    async fn service_spec(&self, service_id: Uuid) -> Result<ServiceSpec, StoreError>;

    async fn client_record(&self, client_id: Uuid) -> Result<ClientRecord, StoreError>;

    /// Applies a completed visit to the client's counters: visit count,
    /// cumulative spend, loyalty tier, last visit. Called exactly once per
    /// completed appointment.
    async fn apply_completed_visit(
        &self,
        client_id: Uuid,
        amount: f64,
        visited_at: DateTime<Utc>,
    ) -> Result<ClientRecord, StoreError>;

    async fn record_cancellation(&self, client_id: Uuid) -> Result<(), StoreError>;

    async fn record_no_show(&self, client_id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Persists the appointment together with its service lines as one unit.
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, StoreError>;

    async fn fetch(&self, id: Uuid) -> Result<Appointment, StoreError>;

    /// Compare-and-swap update: succeeds only when the stored version equals
    /// `expected_version`, and bumps the version on success.
    async fn update(
        &self,
        appointment: Appointment,
        expected_version: i64,
    ) -> Result<Appointment, StoreError>;

    async fn list_for_staff_day(
        &self,
        staff_id: Uuid,
        day: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Appointments for the staff member overlapping `[start, end)`.
    async fn list_in_range(
        &self,
        staff_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Scheduled/confirmed appointments starting in `[now, until)` that have
    /// not had a reminder sent.
    async fn list_needing_reminder(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError>;
}

#[async_trait]
pub trait WaitlistStore: Send + Sync {
    async fn insert(&self, entry: WaitlistEntry) -> Result<WaitlistEntry, StoreError>;

    async fn fetch(&self, id: Uuid) -> Result<WaitlistEntry, StoreError>;

    async fn update(&self, entry: WaitlistEntry) -> Result<WaitlistEntry, StoreError>;

    /// Active entries whose preferred date is exactly `date`.
    async fn list_for_date(
        &self,
        salon_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<WaitlistEntry>, StoreError>;

    /// Active flexible-date entries whose preferred date falls in `[from, to]`.
    async fn list_flexible_between(
        &self,
        salon_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WaitlistEntry>, StoreError>;

    /// Active entries whose expiry has passed.
    async fn list_active_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<WaitlistEntry>, StoreError>;
}

/// Outbound messages. Callers fire these after the durable write and only log
/// failures; delivery is never part of a booking transaction.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_confirmation(&self, appointment: &Appointment) -> Result<(), StoreError>;

    async fn send_reminder(&self, appointment: &Appointment) -> Result<(), StoreError>;

    async fn send_cancellation_notice(&self, appointment: &Appointment)
        -> Result<(), StoreError>;

    async fn notify_waitlist_entry(
        &self,
        entry: &WaitlistEntry,
        slot_start: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
