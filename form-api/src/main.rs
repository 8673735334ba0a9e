//! form-api server
//!
//! In-memory form builder backend: forms and responses live for the lifetime
//! of the process.

use form_api::{app, config::Config, notifier::LogNotifier, seed_store, store::Store, AppState};
use std::{net::SocketAddr, sync::Arc};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Load environment variables first so .env RUST_LOG is available to tracing
    dotenvy::dotenv().ok();

    // Initialize tracing with RUST_LOG environment variable support
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let store = Arc::new(Store::new());
    if config.seed_forms {
        let count = seed_store(&store)
            .await
            .expect("Embedded seed forms are invalid");
        info!("Seeded {} example forms", count);
    }

    let state = AppState::new(store, Arc::new(LogNotifier), config.api_secret);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to port");

    info!("Server running on {}", addr);

    axum::serve(listener, app(state))
        .await
        .expect("Server error");
}
