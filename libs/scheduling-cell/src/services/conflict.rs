// libs/scheduling-cell/src/services/conflict.rs
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::Appointment;
use shared_store::AppointmentStore;

use crate::models::SchedulingError;

pub struct ConflictDetectionService {
    appointments: Arc<dyn AppointmentStore>,
}

impl ConflictDetectionService {
    pub fn new(appointments: Arc<dyn AppointmentStore>) -> Self {
        Self { appointments }
    }

    /// Active appointments for the staff member that overlap the probe range.
    /// `buffer_minutes` extends the probe on both sides; `exclude_appointment_id`
    /// lets a reschedule ignore the appointment being moved.
    pub async fn find_conflicts(
        &self,
        staff_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        buffer_minutes: i64,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        if start_time >= end_time {
            return Err(SchedulingError::Validation(
                "start time must be before end time".to_string(),
            ));
        }

        debug!(
            %staff_id, %start_time, %end_time, buffer_minutes,
            "Checking conflicts"
        );

        let buffer = Duration::minutes(buffer_minutes);
        let probe_start = start_time - buffer;
        let probe_end = end_time + buffer;

        let existing = self
            .appointments
            .list_in_range(staff_id, probe_start, probe_end)
            .await?;

        let conflicts: Vec<Appointment> = existing
            .into_iter()
            .filter(|a| {
                a.blocks_slot()
                    && exclude_appointment_id != Some(a.id)
                    && intervals_overlap(probe_start, probe_end, a.start_time, a.end_time)
            })
            .collect();

        if !conflicts.is_empty() {
            warn!(
                %staff_id,
                conflict_count = conflicts.len(),
                "Conflict detected for requested range"
            );
        }

        Ok(conflicts)
    }

    pub async fn has_conflict(
        &self,
        staff_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        buffer_minutes: i64,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<bool, SchedulingError> {
        let conflicts = self
            .find_conflicts(
                staff_id,
                start_time,
                end_time,
                buffer_minutes,
                exclude_appointment_id,
            )
            .await?;
        Ok(!conflicts.is_empty())
    }
}

/// Half-open overlap: [start1, end1) intersects [start2, end2).
fn intervals_overlap(
    start1: DateTime<Utc>,
    end1: DateTime<Utc>,
    start2: DateTime<Utc>,
    end2: DateTime<Utc>,
) -> bool {
    start1 < end2 && start2 < end1
}
