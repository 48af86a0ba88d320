use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use shared_models::{Appointment, WaitlistEntry};

use crate::traits::{Notifier, StoreError};

/// Notifier that only writes to the log. Stands in for the messaging
/// integration in tests and local development.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_confirmation(&self, appointment: &Appointment) -> Result<(), StoreError> {
        info!(
            appointment_id = %appointment.id,
            client_id = %appointment.client_id,
            start_time = %appointment.start_time,
            "booking confirmation"
        );
        Ok(())
    }

    async fn send_reminder(&self, appointment: &Appointment) -> Result<(), StoreError> {
        info!(
            appointment_id = %appointment.id,
            client_id = %appointment.client_id,
            start_time = %appointment.start_time,
            "appointment reminder"
        );
        Ok(())
    }

    async fn send_cancellation_notice(
        &self,
        appointment: &Appointment,
    ) -> Result<(), StoreError> {
        info!(
            appointment_id = %appointment.id,
            client_id = %appointment.client_id,
            "cancellation notice"
        );
        Ok(())
    }

    async fn notify_waitlist_entry(
        &self,
        entry: &WaitlistEntry,
        slot_start: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        info!(
            entry_id = %entry.id,
            client_name = %entry.client_name,
            %slot_start,
            "waitlist slot offer"
        );
        Ok(())
    }
}
