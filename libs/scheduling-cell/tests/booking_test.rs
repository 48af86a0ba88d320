use std::collections::HashMap;
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use scheduling_cell::services::BookingService;
use scheduling_cell::{
    BookAppointmentRequest, RescheduleRequest, SchedulingError, ServiceLineRequest,
};
use shared_models::{
    AppointmentStatus, BookingSource, CancelActor, ClientRecord, DaySchedule, LoyaltyTier,
    SalonSettings, ServiceSpec, StaffProfile,
};
use shared_store::{AppointmentStore, LogNotifier, MemoryStore};

struct TestSetup {
    store: Arc<MemoryStore>,
    booking: Arc<BookingService>,
    salon_id: Uuid,
    staff_id: Uuid,
    client_id: Uuid,
    cut_id: Uuid,
    color_id: Uuid,
}

async fn setup() -> TestSetup {
    let store = Arc::new(MemoryStore::new());
    let salon_id = Uuid::new_v4();
    let staff_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let cut_id = Uuid::new_v4();
    let color_id = Uuid::new_v4();

    let mut schedule = HashMap::new();
    for day in [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ] {
        schedule.insert(
            day.to_string(),
            DaySchedule {
                start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                working: true,
            },
        );
    }

    store
        .seed_salon(SalonSettings {
            salon_id,
            booking_lead_time_hours: 2,
            booking_window_days: 60,
            cancellation_policy_hours: 24,
            slot_granularity_minutes: 15,
            reminder_hours_before: 24,
            waitlist_flex_window_days: 3,
        })
        .await;
    store
        .seed_staff(StaffProfile {
            id: staff_id,
            salon_id,
            display_name: "Dana".to_string(),
            default_schedule: schedule,
            booking_buffer_minutes: 0,
            service_ids: vec![cut_id, color_id],
            is_active: true,
            show_on_booking: true,
        })
        .await;
    store
        .seed_service(ServiceSpec {
            id: cut_id,
            salon_id,
            name: "Cut".to_string(),
            price: 50.0,
            duration_minutes: 45,
            buffer_before_minutes: 0,
            buffer_after_minutes: 15,
            processing_time_minutes: 0,
            is_active: true,
            is_online_bookable: true,
        })
        .await;
    store
        .seed_service(ServiceSpec {
            id: color_id,
            salon_id,
            name: "Color".to_string(),
            price: 120.0,
            duration_minutes: 60,
            buffer_before_minutes: 0,
            buffer_after_minutes: 0,
            processing_time_minutes: 30,
            is_active: true,
            is_online_bookable: true,
        })
        .await;
    store
        .seed_client(ClientRecord {
            id: client_id,
            salon_id,
            display_name: "Alex".to_string(),
            visit_count: 0,
            total_spent: 0.0,
            cancellation_count: 0,
            no_show_count: 0,
            loyalty_tier: LoyaltyTier::Bronze,
            last_visit: None,
        })
        .await;

    let booking = Arc::new(BookingService::new(
        store.clone(),
        store.clone(),
        Arc::new(LogNotifier),
    ));

    TestSetup {
        store,
        booking,
        salon_id,
        staff_id,
        client_id,
        cut_id,
        color_id,
    }
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, hour, minute, 0).unwrap()
}

fn request_for(setup: &TestSetup, start: DateTime<Utc>) -> BookAppointmentRequest {
    BookAppointmentRequest {
        salon_id: setup.salon_id,
        client_id: setup.client_id,
        staff_id: setup.staff_id,
        start_time: start,
        services: vec![ServiceLineRequest {
            service_id: setup.cut_id,
            price_override: None,
            duration_override_minutes: None,
        }],
        client_notes: None,
        source: BookingSource::Online,
    }
}

#[tokio::test]
async fn booking_snapshots_service_lines() {
    let setup = setup().await;
    let now = at(9, 0);

    let request = BookAppointmentRequest {
        salon_id: setup.salon_id,
        client_id: setup.client_id,
        staff_id: setup.staff_id,
        start_time: at(12, 0),
        services: vec![
            ServiceLineRequest {
                service_id: setup.cut_id,
                price_override: None,
                duration_override_minutes: None,
            },
            ServiceLineRequest {
                service_id: setup.color_id,
                price_override: Some(100.0),
                duration_override_minutes: Some(75),
            },
        ],
        client_notes: Some("first visit".to_string()),
        source: BookingSource::Phone,
    };

    let appointment = setup.booking.book(request, now).await.unwrap();

    // Cut: 45 + 15 buffer = 60 at catalog price; color: overridden to 75/100.
    assert_eq!(appointment.duration_minutes, 135);
    assert_eq!(appointment.end_time, appointment.start_time + chrono::Duration::minutes(135));
    assert_eq!(appointment.estimated_total, 150.0);
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.version, 1);
    assert_eq!(appointment.services.len(), 2);
    assert_eq!(appointment.services[0].sequence, 0);
    assert_eq!(appointment.services[0].price, 50.0);
    assert_eq!(appointment.services[0].duration_minutes, 60);
    assert_eq!(appointment.services[1].sequence, 1);
    assert_eq!(appointment.services[1].price, 100.0);
    assert_eq!(appointment.services[1].duration_minutes, 75);

    let stored = setup.store.fetch(appointment.id).await.unwrap();
    assert_eq!(stored.services.len(), 2);
}

#[tokio::test]
async fn overlapping_booking_is_rejected() {
    let setup = setup().await;
    let now = at(9, 0);

    setup
        .booking
        .book(request_for(&setup, at(12, 0)), now)
        .await
        .unwrap();

    // 12:30 overlaps the 12:00-13:00 booking.
    let err = setup
        .booking
        .book(request_for(&setup, at(12, 30)), now)
        .await
        .unwrap_err();
    assert_matches!(err, SchedulingError::SlotConflict(_));

    let day = setup
        .store
        .list_for_staff_day(setup.staff_id, at(12, 0).date_naive())
        .await
        .unwrap();
    assert_eq!(day.len(), 1);
}

#[tokio::test]
async fn concurrent_overlapping_bookings_admit_exactly_one() {
    let setup = setup().await;
    let now = at(9, 0);

    let first = {
        let booking = setup.booking.clone();
        let request = request_for(&setup, at(14, 0));
        tokio::spawn(async move { booking.book(request, now).await })
    };
    let second = {
        let booking = setup.booking.clone();
        let request = request_for(&setup, at(14, 0));
        tokio::spawn(async move { booking.book(request, now).await })
    };

    let (first, second) = tokio::join!(first, second);
    let results = [first.unwrap(), second.unwrap()];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(SchedulingError::SlotConflict(_))))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);

    let day = setup
        .store
        .list_for_staff_day(setup.staff_id, at(14, 0).date_naive())
        .await
        .unwrap();
    assert_eq!(day.len(), 1);
}

#[tokio::test]
async fn lead_time_and_window_are_enforced() {
    let setup = setup().await;
    let now = at(9, 0);

    // Inside the 2-hour lead.
    let err = setup
        .booking
        .book(request_for(&setup, at(10, 0)), now)
        .await
        .unwrap_err();
    assert_matches!(err, SchedulingError::Validation(_));

    // Beyond the 60-day window.
    let err = setup
        .booking
        .book(request_for(&setup, now + chrono::Duration::days(61)), now)
        .await
        .unwrap_err();
    assert_matches!(err, SchedulingError::Validation(_));
}

#[tokio::test]
async fn unknown_service_persists_nothing() {
    let setup = setup().await;
    let now = at(9, 0);

    let mut request = request_for(&setup, at(12, 0));
    request.services[0].service_id = Uuid::new_v4();

    let err = setup.booking.book(request, now).await.unwrap_err();
    assert_matches!(err, SchedulingError::NotFound(_));

    let day = setup
        .store
        .list_for_staff_day(setup.staff_id, at(12, 0).date_naive())
        .await
        .unwrap();
    assert!(day.is_empty());
}

#[tokio::test]
async fn cancelled_appointment_frees_its_slot() {
    let setup = setup().await;
    let now = at(9, 0);

    let appointment = setup
        .booking
        .book(request_for(&setup, at(12, 0)), now)
        .await
        .unwrap();

    // Flip it to cancelled directly; the slot must stop blocking.
    let mut cancelled = appointment.clone();
    cancelled.status = AppointmentStatus::Cancelled;
    setup.store.update(cancelled, 1).await.unwrap();

    setup
        .booking
        .book(request_for(&setup, at(12, 0)), now)
        .await
        .unwrap();
}

#[tokio::test]
async fn reschedule_moves_slot_and_bumps_version() {
    let setup = setup().await;
    let now = at(9, 0);

    let appointment = setup
        .booking
        .book(request_for(&setup, at(12, 0)), now)
        .await
        .unwrap();

    let moved = setup
        .booking
        .reschedule(
            appointment.id,
            RescheduleRequest {
                actor: CancelActor::Staff,
                expected_version: appointment.version,
                new_start_time: at(15, 0),
                new_staff_id: None,
            },
            now,
        )
        .await
        .unwrap();

    assert_eq!(moved.start_time, at(15, 0));
    assert_eq!(moved.end_time, at(16, 0));
    assert_eq!(moved.duration_minutes, appointment.duration_minutes);
    assert_eq!(moved.version, appointment.version + 1);
}

#[tokio::test]
async fn reschedule_into_taken_slot_conflicts() {
    let setup = setup().await;
    let now = at(9, 0);

    setup
        .booking
        .book(request_for(&setup, at(15, 0)), now)
        .await
        .unwrap();
    let appointment = setup
        .booking
        .book(request_for(&setup, at(12, 0)), now)
        .await
        .unwrap();

    let err = setup
        .booking
        .reschedule(
            appointment.id,
            RescheduleRequest {
                actor: CancelActor::Staff,
                expected_version: appointment.version,
                new_start_time: at(15, 30),
                new_staff_id: None,
            },
            now,
        )
        .await
        .unwrap_err();
    assert_matches!(err, SchedulingError::SlotConflict(_));
}

#[tokio::test]
async fn booking_outside_working_hours_is_rejected() {
    let setup = setup().await;

    // Before opening.
    let err = setup
        .booking
        .book(request_for(&setup, at(8, 0)), at(5, 0))
        .await
        .unwrap_err();
    assert_matches!(err, SchedulingError::Validation(_));

    // Starts inside hours but runs past closing (cut is 60 minutes).
    let err = setup
        .booking
        .book(request_for(&setup, at(16, 30)), at(9, 0))
        .await
        .unwrap_err();
    assert_matches!(err, SchedulingError::Validation(_));

    let day = setup
        .store
        .list_for_staff_day(setup.staff_id, at(12, 0).date_naive())
        .await
        .unwrap();
    assert!(day.is_empty());
}

#[tokio::test]
async fn reschedule_can_move_to_another_staff_member() {
    let setup = setup().await;
    let now = at(9, 0);
    let other_staff = Uuid::new_v4();

    let mut schedule = HashMap::new();
    for day in [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ] {
        schedule.insert(
            day.to_string(),
            DaySchedule {
                start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                working: true,
            },
        );
    }
    setup
        .store
        .seed_staff(StaffProfile {
            id: other_staff,
            salon_id: setup.salon_id,
            display_name: "Sam".to_string(),
            default_schedule: schedule,
            booking_buffer_minutes: 0,
            service_ids: vec![setup.cut_id],
            is_active: true,
            show_on_booking: true,
        })
        .await;

    // 15:00 is taken on the original staff member but open on the other one.
    setup
        .booking
        .book(request_for(&setup, at(15, 0)), now)
        .await
        .unwrap();
    let appointment = setup
        .booking
        .book(request_for(&setup, at(12, 0)), now)
        .await
        .unwrap();

    let moved = setup
        .booking
        .reschedule(
            appointment.id,
            RescheduleRequest {
                actor: CancelActor::Staff,
                expected_version: appointment.version,
                new_start_time: at(15, 0),
                new_staff_id: Some(other_staff),
            },
            now,
        )
        .await
        .unwrap();

    assert_eq!(moved.staff_id, other_staff);
    assert_eq!(moved.start_time, at(15, 0));
    assert_eq!(moved.version, appointment.version + 1);
}

#[tokio::test]
async fn reschedule_to_staff_not_offering_the_service_is_rejected() {
    let setup = setup().await;
    let now = at(9, 0);
    let manicurist = Uuid::new_v4();

    let mut schedule = HashMap::new();
    schedule.insert(
        "tuesday".to_string(),
        DaySchedule {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            working: true,
        },
    );
    setup
        .store
        .seed_staff(StaffProfile {
            id: manicurist,
            salon_id: setup.salon_id,
            display_name: "Jo".to_string(),
            default_schedule: schedule,
            booking_buffer_minutes: 0,
            service_ids: vec![Uuid::new_v4()],
            is_active: true,
            show_on_booking: true,
        })
        .await;

    let appointment = setup
        .booking
        .book(request_for(&setup, at(12, 0)), now)
        .await
        .unwrap();

    let err = setup
        .booking
        .reschedule(
            appointment.id,
            RescheduleRequest {
                actor: CancelActor::Staff,
                expected_version: appointment.version,
                new_start_time: at(15, 0),
                new_staff_id: Some(manicurist),
            },
            now,
        )
        .await
        .unwrap_err();
    assert_matches!(err, SchedulingError::Validation(_));
}

#[tokio::test]
async fn client_reschedule_past_deadline_is_rejected() {
    let setup = setup().await;
    let now = at(9, 0);

    // Tomorrow 10:00 is inside the 24-hour cancellation window at booking+1h.
    let start = at(12, 0) + chrono::Duration::days(1);
    let appointment = setup
        .booking
        .book(request_for(&setup, start), now)
        .await
        .unwrap();

    let late_now = start - chrono::Duration::hours(3);
    let err = setup
        .booking
        .reschedule(
            appointment.id,
            RescheduleRequest {
                actor: CancelActor::Client,
                expected_version: appointment.version,
                new_start_time: start + chrono::Duration::days(1),
                new_staff_id: None,
            },
            late_now,
        )
        .await
        .unwrap_err();
    assert_matches!(err, SchedulingError::PolicyViolation(_));
}
