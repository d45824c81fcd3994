mod db;
mod error;
mod handlers;
mod logging;
mod models;
mod routes;
mod settings;
mod state;

use settings::Settings;

use crate::db::{create_tables, init_db};
use crate::logging::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();
    let settings = Settings::load("config/services.toml").unwrap();

    tracing::info!("Initializing database connection...");
    match init_db(settings.surrealdb).await {
        Ok(()) => {
            create_tables().await.unwrap();
            tracing::info!("Database initialized successfully");
        }
        Err(e) => {
            tracing::warn!(
                "Database initialization failed: {}. Continuing without database.",
                e
            );
            tracing::warn!("Evaluation and catalog storage will not work without a database");
        }
    }

    tracing::info!("Loading vendor trust stores...");
    match state::init(&settings.trust) {
        Ok(()) => tracing::info!("Trust stores loaded"),
        Err(e) => {
            tracing::warn!(
                "Trust store loading failed: {}. Probing is unavailable until bundles are present.",
                e
            );
        }
    }

    let router = routes::create_routes();
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", settings.http.port))
        .await
        .unwrap();
    tracing::info!("Trustscan server started on port {}", settings.http.port);
    axum::serve(listener, router).await.unwrap();
}
