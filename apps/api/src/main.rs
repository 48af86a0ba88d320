use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use scheduling_cell::SweepService;
use shared_config::AppConfig;
use shared_store::AppState;
use waitlist_cell::WaitlistMatcher;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SalonSync API server");

    // Load configuration
    let config = AppConfig::from_env();

    // Collaborator backends. The in-memory store serves local development;
    // production wiring swaps in real implementations behind the same traits.
    let (state, _store) = AppState::in_memory();

    let matcher = Arc::new(WaitlistMatcher::new(
        state.waitlist.clone(),
        state.directory.clone(),
        state.notifier.clone(),
    ));

    // Background sweep: reminders and waitlist expiry
    let sweep = SweepService::new(
        state.directory.clone(),
        state.appointments.clone(),
        state.notifier.clone(),
        matcher.clone(),
    );
    let sweep_interval = Duration::from_secs(config.sweep_interval_seconds);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            sweep.run_once(Utc::now()).await;
        }
    });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(&state, matcher)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    info!("Listening on {}", config.bind_address);

    let listener = TcpListener::bind(&config.bind_address).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
