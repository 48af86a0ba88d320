// libs/waitlist-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers;
use crate::services::WaitlistMatcher;

pub fn waitlist_routes(matcher: Arc<WaitlistMatcher>) -> Router {
    Router::new()
        .route("/", post(handlers::create_entry))
        .route("/for-date/{date}", get(handlers::entries_for_date))
        .route("/{entry_id}/notify", post(handlers::notify_entry))
        .route("/{entry_id}/book", post(handlers::book_entry))
        .route("/{entry_id}", delete(handlers::cancel_entry))
        .with_state(matcher)
}
