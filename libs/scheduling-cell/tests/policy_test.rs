use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use scheduling_cell::services::CancellationPolicyService;
use shared_models::{CancelActor, SalonSettings};

fn settings() -> SalonSettings {
    SalonSettings {
        salon_id: Uuid::new_v4(),
        booking_lead_time_hours: 2,
        booking_window_days: 60,
        cancellation_policy_hours: 24,
        slot_granularity_minutes: 15,
        reminder_hours_before: 24,
        waitlist_flex_window_days: 3,
    }
}

#[test]
fn client_is_permitted_strictly_before_deadline() {
    let policy = CancellationPolicyService::new();
    let settings = settings();
    let start = Utc.with_ymd_and_hms(2026, 9, 5, 14, 0, 0).unwrap();
    let deadline = start - Duration::hours(24);

    let early = policy.assess(start, &settings, CancelActor::Client, None, deadline - Duration::seconds(1));
    assert!(early.permitted);
    assert_eq!(early.deadline, deadline);
    assert_eq!(early.fee, None);

    // The boundary itself is already too late.
    let at_deadline = policy.assess(start, &settings, CancelActor::Client, None, deadline);
    assert!(!at_deadline.permitted);

    let late = policy.assess(start, &settings, CancelActor::Client, None, deadline + Duration::minutes(1));
    assert!(!late.permitted);
}

#[test]
fn staff_always_passes_and_may_charge_late_fee() {
    let policy = CancellationPolicyService::new();
    let settings = settings();
    let start = Utc.with_ymd_and_hms(2026, 9, 5, 14, 0, 0).unwrap();
    let deadline = start - Duration::hours(24);

    let early = policy.assess(start, &settings, CancelActor::Staff, Some(25.0), deadline - Duration::hours(1));
    assert!(early.permitted);
    assert_eq!(early.fee, None);

    let late = policy.assess(start, &settings, CancelActor::Staff, Some(25.0), deadline);
    assert!(late.permitted);
    assert_eq!(late.fee, Some(25.0));

    let late_no_fee = policy.assess(start, &settings, CancelActor::Staff, None, deadline);
    assert!(late_no_fee.permitted);
    assert_eq!(late_no_fee.fee, None);
}

#[test]
fn system_actor_is_never_blocked() {
    let policy = CancellationPolicyService::new();
    let settings = settings();
    let start = Utc.with_ymd_and_hms(2026, 9, 5, 14, 0, 0).unwrap();

    let assessment = policy.assess(start, &settings, CancelActor::System, None, start - Duration::minutes(5));
    assert!(assessment.permitted);
}
