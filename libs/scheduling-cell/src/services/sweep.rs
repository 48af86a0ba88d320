// libs/scheduling-cell/src/services/sweep.rs
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use shared_store::{AppointmentStore, Directory, Notifier};
use waitlist_cell::WaitlistMatcher;

use crate::models::SchedulingError;

/// Widest reminder window across salons; per-salon settings narrow it.
const REMINDER_HORIZON_HOURS: i64 = 48;

/// Periodic background pass: appointment reminders and waitlist expiry.
/// Runs independently of request handling; individual failures are logged
/// and the pass moves on.
pub struct SweepService {
    directory: Arc<dyn Directory>,
    appointments: Arc<dyn AppointmentStore>,
    notifier: Arc<dyn Notifier>,
    matcher: Arc<WaitlistMatcher>,
}

impl SweepService {
    pub fn new(
        directory: Arc<dyn Directory>,
        appointments: Arc<dyn AppointmentStore>,
        notifier: Arc<dyn Notifier>,
        matcher: Arc<WaitlistMatcher>,
    ) -> Self {
        Self {
            directory,
            appointments,
            notifier,
            matcher,
        }
    }

    pub async fn run_once(&self, now: DateTime<Utc>) {
        match self.send_due_reminders(now).await {
            Ok(sent) if sent > 0 => info!(sent, "Reminder pass complete"),
            Ok(_) => debug!("Reminder pass complete, nothing due"),
            Err(e) => warn!("Reminder pass failed: {}", e),
        }

        if let Err(e) = self.matcher.expire_stale(now).await {
            warn!("Waitlist expiry pass failed: {}", e);
        }
    }

    /// Sends reminders for upcoming scheduled/confirmed appointments within
    /// each salon's reminder window, marking them so no appointment is
    /// reminded twice.
    pub async fn send_due_reminders(&self, now: DateTime<Utc>) -> Result<usize, SchedulingError> {
        let horizon = now + Duration::hours(REMINDER_HORIZON_HOURS);
        let due = self.appointments.list_needing_reminder(now, horizon).await?;

        let mut sent = 0usize;
        for mut appointment in due {
            let settings = match self.directory.salon_settings(appointment.salon_id).await {
                Ok(s) => s,
                Err(e) => {
                    warn!(salon_id = %appointment.salon_id, "Skipping reminder, settings lookup failed: {}", e);
                    continue;
                }
            };

            if appointment.start_time > now + Duration::hours(settings.reminder_hours_before) {
                continue;
            }

            if let Err(e) = self.notifier.send_reminder(&appointment).await {
                warn!(appointment_id = %appointment.id, "Reminder delivery failed: {}", e);
                continue;
            }

            let version = appointment.version;
            appointment.reminder_sent = true;
            appointment.reminder_sent_at = Some(now);
            match self.appointments.update(appointment, version).await {
                Ok(_) => sent += 1,
                // Lost a race with a status change; the next pass picks it up
                // if the appointment is still live.
                Err(e) => warn!("Reminder flag update failed: {}", e),
            }
        }

        Ok(sent)
    }
}
