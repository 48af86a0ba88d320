use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use scheduling_cell::services::AvailabilityService;
use scheduling_cell::{BookAppointmentRequest, ServiceLineRequest};
use shared_models::{
    BookingSource, ClientRecord, DaySchedule, LoyaltyTier, SalonSettings, ServiceSpec,
    StaffProfile,
};
use shared_store::MemoryStore;

struct TestSetup {
    store: Arc<MemoryStore>,
    availability: AvailabilityService,
    salon_id: Uuid,
    staff_id: Uuid,
    client_id: Uuid,
    service_id: Uuid,
}

fn full_week_schedule() -> HashMap<String, DaySchedule> {
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
                working: day != "sunday",
            },
        );
    }
    schedule
}

async fn setup() -> TestSetup {
    let store = Arc::new(MemoryStore::new());
    let salon_id = Uuid::new_v4();
    let staff_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let service_id = Uuid::new_v4();

    store
        .seed_salon(SalonSettings {
            salon_id,
            // Hour-granular lead disabled so the 30-minute same-day floor is
            // the binding constraint.
            booking_lead_time_hours: 0,
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
            default_schedule: full_week_schedule(),
            booking_buffer_minutes: 0,
            service_ids: vec![service_id],
            is_active: true,
            show_on_booking: true,
        })
        .await;

    store
        .seed_service(ServiceSpec {
            id: service_id,
            salon_id,
            name: "Cut & Style".to_string(),
            price: 50.0,
            duration_minutes: 60,
            buffer_before_minutes: 0,
            buffer_after_minutes: 0,
            processing_time_minutes: 0,
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

    let availability = AvailabilityService::new(store.clone(), store.clone());

    TestSetup {
        store,
        availability,
        salon_id,
        staff_id,
        client_id,
        service_id,
    }
}

// 2026-09-01 is a Tuesday.
fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
}

fn tuesday_at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, hour, minute, 0).unwrap()
}

#[tokio::test]
async fn same_day_walk_starts_at_lead_floor_off_grid() {
    let setup = setup().await;
    let now = tuesday_at(9, 5);

    let slots = setup
        .availability
        .available_slots(
            setup.salon_id,
            setup.staff_id,
            tuesday(),
            &[setup.service_id],
            now,
        )
        .await
        .unwrap();

    // 09:05 rounded to 09:15, pushed to 09:35 by the 30-minute floor, then
    // 15-minute steps until the 60-minute service no longer fits before 17:00.
    assert_eq!(slots.first().unwrap().start_time, tuesday_at(9, 35));
    assert_eq!(slots[1].start_time, tuesday_at(9, 50));
    assert_eq!(slots[2].start_time, tuesday_at(10, 5));
    assert_eq!(slots.last().unwrap().start_time, tuesday_at(15, 50));
    assert_eq!(slots.last().unwrap().end_time, tuesday_at(16, 50));
    assert_eq!(slots.len(), 26);

    for slot in &slots {
        assert_eq!(slot.end_time - slot.start_time, chrono::Duration::minutes(60));
        assert!(slot.end_time <= tuesday_at(17, 0));
    }
}

#[tokio::test]
async fn booking_removes_overlapping_candidates_on_requery() {
    let setup = setup().await;
    let now = tuesday_at(9, 5);

    let booking = scheduling_cell::services::BookingService::new(
        setup.store.clone(),
        setup.store.clone(),
        Arc::new(shared_store::LogNotifier),
    );
    booking
        .book(
            BookAppointmentRequest {
                salon_id: setup.salon_id,
                client_id: setup.client_id,
                staff_id: setup.staff_id,
                start_time: tuesday_at(10, 0),
                services: vec![ServiceLineRequest {
                    service_id: setup.service_id,
                    price_override: None,
                    duration_override_minutes: None,
                }],
                client_notes: None,
                source: BookingSource::Online,
            },
            now,
        )
        .await
        .unwrap();

    let slots = setup
        .availability
        .available_slots(
            setup.salon_id,
            setup.staff_id,
            tuesday(),
            &[setup.service_id],
            now,
        )
        .await
        .unwrap();

    // Every candidate overlapping 10:00-11:00 is gone; the walk resumes at
    // the first step at or after 11:00.
    assert_eq!(slots.first().unwrap().start_time, tuesday_at(11, 5));
    assert_eq!(slots.len(), 20);
    for slot in &slots {
        assert!(slot.start_time >= tuesday_at(11, 0) || slot.end_time <= tuesday_at(10, 0));
    }
}

#[tokio::test]
async fn availability_is_deterministic_for_fixed_now() {
    let setup = setup().await;
    let now = tuesday_at(9, 5);

    let first = setup
        .availability
        .available_slots(
            setup.salon_id,
            setup.staff_id,
            tuesday(),
            &[setup.service_id],
            now,
        )
        .await
        .unwrap();
    let second = setup
        .availability
        .available_slots(
            setup.salon_id,
            setup.staff_id,
            tuesday(),
            &[setup.service_id],
            now,
        )
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn non_working_day_has_no_slots() {
    let setup = setup().await;
    // 2026-09-06 is a Sunday.
    let sunday = NaiveDate::from_ymd_opt(2026, 9, 6).unwrap();

    let slots = setup
        .availability
        .available_slots(
            setup.salon_id,
            setup.staff_id,
            sunday,
            &[setup.service_id],
            tuesday_at(9, 0),
        )
        .await
        .unwrap();

    assert!(slots.is_empty());
}

#[tokio::test]
async fn future_day_walk_starts_at_work_open() {
    let setup = setup().await;
    // Wednesday, queried on Tuesday: no lead-time floor applies.
    let wednesday = NaiveDate::from_ymd_opt(2026, 9, 2).unwrap();

    let slots = setup
        .availability
        .available_slots(
            setup.salon_id,
            setup.staff_id,
            wednesday,
            &[setup.service_id],
            tuesday_at(9, 5),
        )
        .await
        .unwrap();

    assert_eq!(
        slots.first().unwrap().start_time,
        Utc.with_ymd_and_hms(2026, 9, 2, 9, 0, 0).unwrap()
    );
    assert_eq!(
        slots.last().unwrap().start_time,
        Utc.with_ymd_and_hms(2026, 9, 2, 16, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn multi_staff_skips_non_offering_members() {
    let setup = setup().await;
    let other_service = Uuid::new_v4();
    let colorist_id = Uuid::new_v4();

    setup
        .store
        .seed_service(ServiceSpec {
            id: other_service,
            salon_id: setup.salon_id,
            name: "Color".to_string(),
            price: 120.0,
            duration_minutes: 45,
            buffer_before_minutes: 0,
            buffer_after_minutes: 15,
            processing_time_minutes: 0,
            is_active: true,
            is_online_bookable: true,
        })
        .await;
    setup
        .store
        .seed_staff(StaffProfile {
            id: colorist_id,
            salon_id: setup.salon_id,
            display_name: "Robin".to_string(),
            default_schedule: full_week_schedule(),
            booking_buffer_minutes: 0,
            service_ids: vec![other_service],
            is_active: true,
            show_on_booking: true,
        })
        .await;

    let staff = setup
        .availability
        .multi_staff_availability(
            setup.salon_id,
            tuesday(),
            &[other_service],
            tuesday_at(9, 5),
        )
        .await
        .unwrap();

    assert_eq!(staff.len(), 1);
    assert_eq!(staff[0].staff_id, colorist_id);
    assert!(!staff[0].slots.is_empty());
}

#[tokio::test]
async fn next_available_scans_past_full_days() {
    let setup = setup().await;
    let now = tuesday_at(16, 45);

    // Too late today for a 60-minute service (walk would start 17:15).
    let slot = setup
        .availability
        .find_next_available(
            setup.salon_id,
            setup.staff_id,
            &[setup.service_id],
            now,
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        slot.start_time,
        Utc.with_ymd_and_hms(2026, 9, 2, 9, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn staff_buffer_blocks_adjacent_slots() {
    let setup = setup().await;
    let buffered_id = Uuid::new_v4();
    setup
        .store
        .seed_staff(StaffProfile {
            id: buffered_id,
            salon_id: setup.salon_id,
            display_name: "Sam".to_string(),
            default_schedule: full_week_schedule(),
            booking_buffer_minutes: 15,
            service_ids: vec![setup.service_id],
            is_active: true,
            show_on_booking: true,
        })
        .await;

    let booking = scheduling_cell::services::BookingService::new(
        setup.store.clone(),
        setup.store.clone(),
        Arc::new(shared_store::LogNotifier),
    );
    booking
        .book(
            BookAppointmentRequest {
                salon_id: setup.salon_id,
                client_id: setup.client_id,
                staff_id: buffered_id,
                start_time: tuesday_at(12, 0),
                services: vec![ServiceLineRequest {
                    service_id: setup.service_id,
                    price_override: None,
                    duration_override_minutes: None,
                }],
                client_notes: None,
                source: BookingSource::Online,
            },
            tuesday_at(9, 0),
        )
        .await
        .unwrap();

    let slots = setup
        .availability
        .available_slots(
            setup.salon_id,
            buffered_id,
            tuesday(),
            &[setup.service_id],
            tuesday_at(9, 5),
        )
        .await
        .unwrap();

    // Booking sits 12:00-13:00; with a 15-minute buffer, a candidate ending
    // at 12:00 or starting at 13:00 is still too close.
    assert!(!slots
        .iter()
        .any(|s| s.start_time >= tuesday_at(10, 50) && s.start_time < tuesday_at(13, 15)));
    assert!(slots.iter().any(|s| s.start_time == tuesday_at(10, 35)));
    assert!(slots.iter().any(|s| s.start_time == tuesday_at(13, 20)));
}
