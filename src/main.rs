use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use siege_guide::api::{self, AppState};
use siege_guide::config::Config;
use siege_guide::db::Database;
use siege_guide::llm::SuggestionClient;
use siege_guide::metrics;
use siege_guide::rate_limit::RateLimiter;
use siege_guide::seed::CatalogSeed;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::load();

    let db = Database::new(&config.database_url)
        .await
        .expect("Failed to initialize database");

    if config.seed_on_start {
        let seed = CatalogSeed::load(&config.seed_file).expect("Failed to load catalog seed");
        db.seed(&seed).await.expect("Failed to seed catalog");
    }
    let db = Arc::new(db);

    let suggestions = match SuggestionClient::new(&config.llm) {
        Ok(client) => {
            tracing::info!("Lineup suggestor enabled via {}", client.endpoint());
            Some(client)
        }
        Err(e) => {
            tracing::warn!("Lineup suggestor disabled: {e}");
            None
        }
    };

    metrics::register_metrics();

    let state = AppState {
        db,
        suggestions,
        rate_limiter: RateLimiter::per_hour(config.suggestion_rate_limit)
            .trust_forwarded_for(config.trust_forwarded_for),
        suggestion_count: config.suggestion_count,
    };

    let mut app = api::router(state);
    if let Some(dir) = &config.static_dir {
        tracing::info!("Serving static assets from {}", dir.display());
        app = app.nest_service("/static", ServeDir::new(dir));
    }
    let app = app.layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to port {}: {e}", config.port));

    tracing::info!("Siege guide listening on port {}", config.port);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
