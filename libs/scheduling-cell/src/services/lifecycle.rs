// libs/scheduling-cell/src/services/lifecycle.rs
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::{Appointment, AppointmentStatus};
use shared_store::{AppointmentStore, Directory, Notifier};
use waitlist_cell::WaitlistMatcher;

use crate::models::{CancelAppointmentRequest, SchedulingError, UpdateStatusRequest};
use crate::services::policy::CancellationPolicyService;

/// Drives appointments through their lifecycle. All durable writes go through
/// the store's version guard; side effects (client counters, notices, waitlist
/// reconciliation) run only after the guarded write succeeds.
pub struct LifecycleService {
    directory: Arc<dyn Directory>,
    appointments: Arc<dyn AppointmentStore>,
    notifier: Arc<dyn Notifier>,
    matcher: Arc<WaitlistMatcher>,
    policy: CancellationPolicyService,
}

impl LifecycleService {
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
            policy: CancellationPolicyService::new(),
        }
    }

    /// All legal next statuses for a given current status. Terminal statuses
    /// have none; cancellation is reachable from every non-terminal status
    /// but only through the dedicated cancel operation.
    pub fn get_valid_transitions(&self, current: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current {
            AppointmentStatus::Scheduled => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::CheckedIn,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::CheckedIn,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::CheckedIn => vec![
                AppointmentStatus::InProgress,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::InProgress => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Completed
            | AppointmentStatus::Cancelled
            | AppointmentStatus::NoShow => vec![],
        }
    }

    pub fn validate_transition(
        &self,
        current: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<(), SchedulingError> {
        debug!("Validating status transition {} -> {}", current, next);

        if !self.get_valid_transitions(current).contains(&next) {
            warn!("Invalid status transition attempted: {} -> {}", current, next);
            return Err(SchedulingError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        Ok(())
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, SchedulingError> {
        Ok(self.appointments.fetch(id).await?)
    }

    /// Applies a forward transition (confirm, check in, start, complete,
    /// no-show). Cancellation has its own operation so the policy check can
    /// never be bypassed.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        request: UpdateStatusRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        if request.status == AppointmentStatus::Cancelled {
            return Err(SchedulingError::Validation(
                "use the cancel operation for cancellations".to_string(),
            ));
        }

        let mut appointment = self.appointments.fetch(appointment_id).await?;
        self.validate_transition(appointment.status, request.status)?;

        match request.status {
            AppointmentStatus::Confirmed => appointment.confirmed_at = Some(now),
            AppointmentStatus::CheckedIn => appointment.checked_in_at = Some(now),
            AppointmentStatus::InProgress => appointment.started_at = Some(now),
            AppointmentStatus::Completed => {
                appointment.completed_at = Some(now);
                appointment.final_total =
                    Some(request.final_total.unwrap_or(appointment.estimated_total));
            }
            // A no-show closes the appointment the same instant it is marked.
            AppointmentStatus::NoShow => appointment.cancelled_at = Some(now),
            // Cancelled was rejected above; Scheduled is never a valid target.
            AppointmentStatus::Scheduled | AppointmentStatus::Cancelled => {}
        }

        if let Some(notes) = request.staff_notes {
            appointment.staff_notes = Some(notes);
        }
        appointment.status = request.status;

        let updated = self
            .appointments
            .update(appointment, request.expected_version)
            .await?;

        info!(
            appointment_id = %updated.id,
            status = %updated.status,
            "Appointment status updated"
        );

        match updated.status {
            AppointmentStatus::Completed => {
                // Counters move exactly once: a retried completion fails the
                // transition check before reaching this point.
                let amount = updated.final_total.unwrap_or(updated.estimated_total);
                if let Err(e) = self
                    .directory
                    .apply_completed_visit(updated.client_id, amount, now)
                    .await
                {
                    warn!(client_id = %updated.client_id, "Visit stat update failed: {}", e);
                }
            }
            AppointmentStatus::NoShow => {
                if let Err(e) = self.directory.record_no_show(updated.client_id).await {
                    warn!(client_id = %updated.client_id, "No-show stat update failed: {}", e);
                }
                self.reconcile_freed_slot(&updated, now);
            }
            _ => {}
        }

        Ok(updated)
    }

    /// Cancels an appointment subject to the salon's cancellation window.
    /// Clients are rejected at or after the deadline; staff and system actors
    /// always pass, optionally recording a late fee.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        request: CancelAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        let mut appointment = self.appointments.fetch(appointment_id).await?;
        self.validate_transition(appointment.status, AppointmentStatus::Cancelled)?;

        let settings = self.directory.salon_settings(appointment.salon_id).await?;
        let assessment = self.policy.assess(
            appointment.start_time,
            &settings,
            request.actor,
            request.fee,
            now,
        );
        if !assessment.permitted {
            return Err(SchedulingError::PolicyViolation(format!(
                "cancellation deadline {} has passed",
                assessment.deadline
            )));
        }

        appointment.status = AppointmentStatus::Cancelled;
        appointment.cancelled_at = Some(now);
        appointment.cancelled_by = Some(request.actor);
        appointment.cancellation_reason = request.reason;
        appointment.cancellation_fee = assessment.fee;

        let updated = self
            .appointments
            .update(appointment, request.expected_version)
            .await?;

        info!(
            appointment_id = %updated.id,
            actor = %request.actor,
            "Appointment cancelled"
        );

        if let Err(e) = self.directory.record_cancellation(updated.client_id).await {
            warn!(client_id = %updated.client_id, "Cancellation stat update failed: {}", e);
        }

        let notifier = self.notifier.clone();
        let for_notify = updated.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_cancellation_notice(&for_notify).await {
                warn!(appointment_id = %for_notify.id, "Cancellation notice delivery failed: {}", e);
            }
        });

        self.reconcile_freed_slot(&updated, now);

        Ok(updated)
    }

    /// Fire-and-forget waitlist reconciliation for a slot freed by a
    /// cancellation or no-show.
    fn reconcile_freed_slot(&self, appointment: &Appointment, now: DateTime<Utc>) {
        // Slots in the past are not worth offering.
        if appointment.start_time <= now {
            return;
        }

        let matcher = self.matcher.clone();
        let salon_id = appointment.salon_id;
        let staff_id = appointment.staff_id;
        let slot_start = appointment.start_time;
        let service_ids: Vec<Uuid> = appointment
            .services
            .iter()
            .map(|line| line.service_id)
            .collect();
        tokio::spawn(async move {
            if let Err(e) = matcher
                .handle_freed_slot(salon_id, staff_id, slot_start, &service_ids, now)
                .await
            {
                warn!(%salon_id, %slot_start, "Waitlist reconciliation failed: {}", e);
            }
        });
    }
}
