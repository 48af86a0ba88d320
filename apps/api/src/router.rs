use std::sync::Arc;

use axum::{routing::get, Router};

use scheduling_cell::scheduling_routes;
use shared_store::AppState;
use waitlist_cell::{waitlist_routes, WaitlistMatcher};

pub fn create_router(state: &AppState, matcher: Arc<WaitlistMatcher>) -> Router {
    Router::new()
        .route("/", get(|| async { "SalonSync API is running!" }))
        .nest("/appointments", scheduling_routes(state, matcher.clone()))
        .nest("/waitlist", waitlist_routes(matcher))
}
