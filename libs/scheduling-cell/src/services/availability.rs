// libs/scheduling-cell/src/services/availability.rs
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_models::{SalonSettings, StaffProfile};
use shared_store::{AppointmentStore, Directory};

use crate::models::{AvailableSlot, SchedulingError, StaffAvailability};

/// Minimum notice before a same-day slot can be offered, applied on top of
/// the salon's lead-time setting when the latter is shorter.
const SAME_DAY_MIN_LEAD_MINUTES: i64 = 30;

pub struct AvailabilityService {
    directory: Arc<dyn Directory>,
    appointments: Arc<dyn AppointmentStore>,
}

impl AvailabilityService {
    pub fn new(directory: Arc<dyn Directory>, appointments: Arc<dyn AppointmentStore>) -> Self {
        Self {
            directory,
            appointments,
        }
    }

    /// Ordered bookable start times for one staff member on one date.
    ///
    /// Deterministic for a fixed `now` and store contents: the walk starts at
    /// the work-day opening (or, for today, the lead-time floor rounded up to
    /// the slot granularity) and advances in granularity steps, keeping every
    /// candidate whose full duration fits inside working hours and whose
    /// buffer-extended interval touches no active appointment.
    pub async fn available_slots(
        &self,
        salon_id: Uuid,
        staff_id: Uuid,
        date: NaiveDate,
        service_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<AvailableSlot>, SchedulingError> {
        let staff = self.directory.staff_profile(staff_id).await?;
        if !staff.is_bookable() {
            debug!("Staff {} not bookable, returning no slots", staff_id);
            return Ok(vec![]);
        }

        for service_id in service_ids {
            if !staff.offers_service(*service_id) {
                return Err(SchedulingError::Validation(format!(
                    "staff {} does not offer service {}",
                    staff_id, service_id
                )));
            }
        }

        let settings = self.directory.salon_settings(salon_id).await?;
        let total_duration = self.total_service_duration(service_ids).await?;

        self.slots_for_staff(&staff, &settings, date, total_duration, now)
            .await
    }

    /// Fans the slot computation out over every bookable staff member of the
    /// salon, skipping those who do not offer all requested services.
    pub async fn multi_staff_availability(
        &self,
        salon_id: Uuid,
        date: NaiveDate,
        service_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<StaffAvailability>, SchedulingError> {
        let settings = self.directory.salon_settings(salon_id).await?;
        let total_duration = self.total_service_duration(service_ids).await?;
        let members = self.directory.bookable_staff(salon_id).await?;

        let mut result = Vec::new();
        for staff in members {
            if !service_ids.iter().all(|id| staff.offers_service(*id)) {
                continue;
            }
            let slots = self
                .slots_for_staff(&staff, &settings, date, total_duration, now)
                .await?;
            result.push(StaffAvailability {
                staff_id: staff.id,
                display_name: staff.display_name,
                slots,
            });
        }

        Ok(result)
    }

    /// First open slot within the salon's booking window, scanning one day at
    /// a time starting today.
    pub async fn find_next_available(
        &self,
        salon_id: Uuid,
        staff_id: Uuid,
        service_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Option<AvailableSlot>, SchedulingError> {
        let settings = self.directory.salon_settings(salon_id).await?;

        for day_offset in 0..=settings.booking_window_days {
            let date = now.date_naive() + Duration::days(day_offset);
            let slots = self
                .available_slots(salon_id, staff_id, date, service_ids, now)
                .await?;
            if let Some(first) = slots.first() {
                return Ok(Some(*first));
            }
        }

        Ok(None)
    }

    async fn total_service_duration(&self, service_ids: &[Uuid]) -> Result<i64, SchedulingError> {
        if service_ids.is_empty() {
            return Err(SchedulingError::Validation(
                "at least one service is required".to_string(),
            ));
        }

        let mut total = 0i64;
        for service_id in service_ids {
            let spec = self.directory.service_spec(*service_id).await?;
            if !spec.is_active {
                return Err(SchedulingError::Validation(format!(
                    "service {} is not active",
                    service_id
                )));
            }
            total += spec.total_duration_minutes() as i64;
        }
        Ok(total)
    }

    async fn slots_for_staff(
        &self,
        staff: &StaffProfile,
        settings: &SalonSettings,
        date: NaiveDate,
        total_duration_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<AvailableSlot>, SchedulingError> {
        let schedule = match staff.schedule_for(date.weekday()) {
            Some(s) => s,
            None => return Ok(vec![]),
        };

        let work_start = date.and_time(schedule.start).and_utc();
        let work_end = date.and_time(schedule.end).and_utc();
        let granularity = Duration::minutes(settings.slot_granularity_minutes);
        let duration = Duration::minutes(total_duration_minutes);
        let buffer = Duration::minutes(staff.booking_buffer_minutes);

        let mut current = work_start;
        if date == now.date_naive() {
            let lead_minutes = (settings.booking_lead_time_hours * 60).max(SAME_DAY_MIN_LEAD_MINUTES);
            let earliest = round_up_to_granularity(now, granularity)
                .max(now + Duration::minutes(lead_minutes));
            current = current.max(earliest);
        } else if date < now.date_naive() {
            return Ok(vec![]);
        }

        // Existing bookings once per day, overlap checked locally per candidate.
        let existing: Vec<(DateTime<Utc>, DateTime<Utc>)> = self
            .appointments
            .list_for_staff_day(staff.id, date)
            .await?
            .into_iter()
            .filter(|a| a.blocks_slot())
            .map(|a| (a.start_time, a.end_time))
            .collect();

        let mut slots = Vec::new();
        while current + duration <= work_end {
            let candidate_end = current + duration;
            let probe_start = current - buffer;
            let probe_end = candidate_end + buffer;

            let blocked = existing
                .iter()
                .any(|(start, end)| probe_start < *end && *start < probe_end);

            if !blocked {
                slots.push(AvailableSlot {
                    start_time: current,
                    end_time: candidate_end,
                });
            }

            current += granularity;
        }

        debug!(
            staff_id = %staff.id,
            %date,
            slot_count = slots.len(),
            "Computed availability"
        );

        Ok(slots)
    }
}

/// Rounds `t` up to the next multiple of `granularity` (no-op when already on
/// a boundary).
pub(crate) fn round_up_to_granularity(t: DateTime<Utc>, granularity: Duration) -> DateTime<Utc> {
    let step = granularity.num_seconds().max(60);
    let secs = t.timestamp();
    let subsec = t.timestamp_subsec_nanos() as i64;
    let rem = secs.rem_euclid(step);
    if rem == 0 && subsec == 0 {
        t
    } else {
        t + Duration::seconds(step - rem) - Duration::nanoseconds(subsec)
    }
}
