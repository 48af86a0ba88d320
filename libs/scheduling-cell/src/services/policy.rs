// libs/scheduling-cell/src/services/policy.rs
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use shared_models::{CancelActor, SalonSettings};

use crate::models::CancellationAssessment;

/// Applies the salon's cancellation window. The deadline is
/// `start_time - cancellation_policy_hours`; self-service actions are
/// permitted strictly before it (`now < deadline`), never at or after it.
pub struct CancellationPolicyService;

impl CancellationPolicyService {
    pub fn new() -> Self {
        Self
    }

    pub fn assess(
        &self,
        start_time: DateTime<Utc>,
        settings: &SalonSettings,
        actor: CancelActor,
        requested_fee: Option<f64>,
        now: DateTime<Utc>,
    ) -> CancellationAssessment {
        let deadline = start_time - Duration::hours(settings.cancellation_policy_hours);
        let before_deadline = now < deadline;

        debug!(
            %start_time, %deadline, %now, ?actor, before_deadline,
            "Assessing cancellation policy"
        );

        match actor {
            CancelActor::Client => CancellationAssessment {
                permitted: before_deadline,
                deadline,
                fee: None,
            },
            // Staff and system actions always go through; a late override may
            // carry the fee the staff member chose to apply.
            CancelActor::Staff | CancelActor::System => CancellationAssessment {
                permitted: true,
                deadline,
                fee: if before_deadline { None } else { requested_fee },
            },
        }
    }
}

impl Default for CancellationPolicyService {
    fn default() -> Self {
        Self::new()
    }
}
