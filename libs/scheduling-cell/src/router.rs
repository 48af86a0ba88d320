// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_store::AppState;
use waitlist_cell::WaitlistMatcher;

use crate::handlers;
use crate::services::{AvailabilityService, BookingService, LifecycleService};

/// Services shared by every scheduling handler. Built once at router
/// construction so the booking lock registry spans all requests.
#[derive(Clone)]
pub struct SchedulingState {
    pub availability: Arc<AvailabilityService>,
    pub booking: Arc<BookingService>,
    pub lifecycle: Arc<LifecycleService>,
}

impl SchedulingState {
    pub fn new(app: &AppState, matcher: Arc<WaitlistMatcher>) -> Self {
        Self {
            availability: Arc::new(AvailabilityService::new(
                app.directory.clone(),
                app.appointments.clone(),
            )),
            booking: Arc::new(BookingService::new(
                app.directory.clone(),
                app.appointments.clone(),
                app.notifier.clone(),
            )),
            lifecycle: Arc::new(LifecycleService::new(
                app.directory.clone(),
                app.appointments.clone(),
                app.notifier.clone(),
                matcher,
            )),
        }
    }
}

pub fn scheduling_routes(app: &AppState, matcher: Arc<WaitlistMatcher>) -> Router {
    let state = SchedulingState::new(app, matcher);

    Router::new()
        .route("/availability", get(handlers::get_availability))
        .route("/availability/all", get(handlers::get_multi_staff_availability))
        .route("/availability/next", get(handlers::get_next_available))
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_status))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route(
            "/{appointment_id}/reschedule",
            patch(handlers::reschedule_appointment),
        )
        .with_state(state)
}
