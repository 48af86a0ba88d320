// libs/scheduling-cell/src/services/booking.rs
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentServiceLine, AppointmentStatus, BookingSource, CancelActor,
    SalonSettings, StaffProfile,
};
use shared_store::{AppointmentStore, Directory, Notifier};

use crate::models::{
    BookAppointmentRequest, RescheduleRequest, SchedulingError, ServiceLineRequest,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::policy::CancellationPolicyService;

/// Creates and moves appointments atomically. The critical section is an
/// in-process lock keyed by staff member and day, so bookings for unrelated
/// staff or days never serialize against each other.
pub struct BookingService {
    directory: Arc<dyn Directory>,
    appointments: Arc<dyn AppointmentStore>,
    notifier: Arc<dyn Notifier>,
    conflicts: ConflictDetectionService,
    policy: CancellationPolicyService,
    slot_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl BookingService {
    pub fn new(
        directory: Arc<dyn Directory>,
        appointments: Arc<dyn AppointmentStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            directory,
            conflicts: ConflictDetectionService::new(appointments.clone()),
            appointments,
            notifier,
            policy: CancellationPolicyService::new(),
            slot_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Books an appointment or rejects it with a conflict. Either the
    /// appointment and all its service lines become durable together, or
    /// nothing does. The confirmation message goes out after the write and
    /// never affects the outcome.
    pub async fn book(
        &self,
        request: BookAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        debug!(
            staff_id = %request.staff_id,
            client_id = %request.client_id,
            start_time = %request.start_time,
            "Booking appointment"
        );

        let settings = self.directory.salon_settings(request.salon_id).await?;
        let staff = self.directory.staff_profile(request.staff_id).await?;
        if !staff.is_bookable() {
            return Err(SchedulingError::Validation(format!(
                "staff {} is not accepting bookings",
                staff.id
            )));
        }

        // Existence check only; client counters are touched at completion.
        self.directory.client_record(request.client_id).await?;

        let (lines, total_duration, estimated_total) = self
            .resolve_lines(&staff, request.source, &request.services)
            .await?;

        self.validate_booking_window(request.start_time, &settings, now)?;

        let start_time = request.start_time;
        let end_time = start_time + Duration::minutes(total_duration);

        self.validate_working_hours(&staff, start_time, end_time)?;

        let lock = self
            .slot_lock(request.staff_id, start_time.date_naive())
            .await;
        let _guard = lock.lock().await;

        // Final conflict check under the lock.
        let conflicting = self
            .conflicts
            .find_conflicts(
                request.staff_id,
                start_time,
                end_time,
                staff.booking_buffer_minutes,
                None,
            )
            .await?;
        if !conflicting.is_empty() {
            return Err(SchedulingError::SlotConflict(format!(
                "staff {} already booked at {}",
                request.staff_id, start_time
            )));
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            salon_id: request.salon_id,
            client_id: request.client_id,
            staff_id: request.staff_id,
            start_time,
            end_time,
            duration_minutes: total_duration as i32,
            status: AppointmentStatus::Scheduled,
            services: lines,
            estimated_total,
            final_total: None,
            confirmed_at: None,
            checked_in_at: None,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            cancelled_by: None,
            cancellation_reason: None,
            cancellation_fee: None,
            reminder_sent: false,
            reminder_sent_at: None,
            client_notes: request.client_notes,
            staff_notes: None,
            source: request.source,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        let created = self.appointments.insert(appointment).await?;

        info!(
            appointment_id = %created.id,
            staff_id = %created.staff_id,
            start_time = %created.start_time,
            "Appointment booked"
        );

        let notifier = self.notifier.clone();
        let for_notify = created.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_confirmation(&for_notify).await {
                warn!(appointment_id = %for_notify.id, "Confirmation delivery failed: {}", e);
            }
        });

        Ok(created)
    }

    /// Moves an existing appointment to a new start time and, optionally, a
    /// different staff member. Client-initiated moves run the same deadline
    /// check as cancellation; the slot swap uses the booking critical section
    /// and a version-guarded update.
    pub async fn reschedule(
        &self,
        appointment_id: Uuid,
        request: RescheduleRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        let mut appointment = self.appointments.fetch(appointment_id).await?;

        if appointment.status.is_terminal() {
            return Err(SchedulingError::Validation(format!(
                "cannot reschedule a {} appointment",
                appointment.status
            )));
        }

        let settings = self.directory.salon_settings(appointment.salon_id).await?;

        if request.actor == CancelActor::Client {
            let assessment = self.policy.assess(
                appointment.start_time,
                &settings,
                CancelActor::Client,
                None,
                now,
            );
            if !assessment.permitted {
                return Err(SchedulingError::PolicyViolation(format!(
                    "reschedule deadline {} has passed",
                    assessment.deadline
                )));
            }
        }

        self.validate_booking_window(request.new_start_time, &settings, now)?;

        let target_staff_id = request.new_staff_id.unwrap_or(appointment.staff_id);
        let staff = self.directory.staff_profile(target_staff_id).await?;
        if target_staff_id != appointment.staff_id {
            if !staff.is_bookable() {
                return Err(SchedulingError::Validation(format!(
                    "staff {} is not accepting bookings",
                    staff.id
                )));
            }
            for line in &appointment.services {
                if !staff.offers_service(line.service_id) {
                    return Err(SchedulingError::Validation(format!(
                        "staff {} does not offer service {}",
                        staff.id, line.service_id
                    )));
                }
            }
        }

        let new_start = request.new_start_time;
        let new_end = new_start + Duration::minutes(appointment.duration_minutes as i64);

        self.validate_working_hours(&staff, new_start, new_end)?;

        let lock = self.slot_lock(target_staff_id, new_start.date_naive()).await;
        let _guard = lock.lock().await;

        let conflicting = self
            .conflicts
            .find_conflicts(
                target_staff_id,
                new_start,
                new_end,
                staff.booking_buffer_minutes,
                Some(appointment.id),
            )
            .await?;
        if !conflicting.is_empty() {
            return Err(SchedulingError::SlotConflict(format!(
                "staff {} already booked at {}",
                target_staff_id, new_start
            )));
        }

        appointment.staff_id = target_staff_id;
        appointment.start_time = new_start;
        appointment.end_time = new_end;

        let updated = self
            .appointments
            .update(appointment, request.expected_version)
            .await?;

        info!(
            appointment_id = %updated.id,
            new_start = %updated.start_time,
            "Appointment rescheduled"
        );

        let notifier = self.notifier.clone();
        let for_notify = updated.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_confirmation(&for_notify).await {
                warn!(appointment_id = %for_notify.id, "Confirmation delivery failed: {}", e);
            }
        });

        Ok(updated)
    }

    fn validate_booking_window(
        &self,
        start_time: DateTime<Utc>,
        settings: &SalonSettings,
        now: DateTime<Utc>,
    ) -> Result<(), SchedulingError> {
        let earliest = now + Duration::hours(settings.booking_lead_time_hours);
        if start_time < earliest {
            return Err(SchedulingError::Validation(format!(
                "start time {} is inside the {}h booking lead time",
                start_time, settings.booking_lead_time_hours
            )));
        }

        let latest = now + Duration::days(settings.booking_window_days);
        if start_time > latest {
            return Err(SchedulingError::Validation(format!(
                "start time {} is beyond the {}-day booking window",
                start_time, settings.booking_window_days
            )));
        }

        Ok(())
    }

    /// The requested interval must sit inside the staff member's working
    /// hours for that day; availability never offers slots outside them.
    fn validate_working_hours(
        &self,
        staff: &StaffProfile,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<(), SchedulingError> {
        let date = start_time.date_naive();
        let schedule = match staff.schedule_for(date.weekday()) {
            Some(s) => s,
            None => {
                return Err(SchedulingError::Validation(format!(
                    "staff {} is not working on {}",
                    staff.id, date
                )))
            }
        };

        let work_start = date.and_time(schedule.start).and_utc();
        let work_end = date.and_time(schedule.end).and_utc();
        if start_time < work_start || end_time > work_end {
            return Err(SchedulingError::Validation(format!(
                "requested time is outside working hours {} to {}",
                schedule.start, schedule.end
            )));
        }

        Ok(())
    }

    async fn resolve_lines(
        &self,
        staff: &StaffProfile,
        source: BookingSource,
        requests: &[ServiceLineRequest],
    ) -> Result<(Vec<AppointmentServiceLine>, i64, f64), SchedulingError> {
        if requests.is_empty() {
            return Err(SchedulingError::Validation(
                "at least one service is required".to_string(),
            ));
        }

        let mut lines = Vec::with_capacity(requests.len());
        let mut total_duration = 0i64;
        let mut estimated_total = 0f64;

        for (index, line) in requests.iter().enumerate() {
            let spec = self.directory.service_spec(line.service_id).await?;

            if !spec.is_active {
                return Err(SchedulingError::Validation(format!(
                    "service {} is not active",
                    spec.id
                )));
            }
            if source == BookingSource::Online && !spec.is_online_bookable {
                return Err(SchedulingError::Validation(format!(
                    "service {} is not bookable online",
                    spec.id
                )));
            }
            if !staff.offers_service(spec.id) {
                return Err(SchedulingError::Validation(format!(
                    "staff {} does not offer service {}",
                    staff.id, spec.id
                )));
            }

            let duration = match line.duration_override_minutes {
                Some(d) if d <= 0 => {
                    return Err(SchedulingError::Validation(
                        "duration override must be positive".to_string(),
                    ))
                }
                Some(d) => d,
                None => spec.total_duration_minutes(),
            };
            let price = line.price_override.unwrap_or(spec.price);
            if price < 0.0 {
                return Err(SchedulingError::Validation(
                    "price override must not be negative".to_string(),
                ));
            }

            total_duration += duration as i64;
            estimated_total += price;
            lines.push(AppointmentServiceLine {
                service_id: spec.id,
                price,
                duration_minutes: duration,
                sequence: index as i32,
            });
        }

        Ok((lines, total_duration, estimated_total))
    }

    async fn slot_lock(&self, staff_id: Uuid, date: NaiveDate) -> Arc<Mutex<()>> {
        let key = format!("slot_{}_{}", staff_id, date);
        let mut locks = self.slot_locks.lock().await;
        locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
