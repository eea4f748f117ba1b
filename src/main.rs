use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use tsume_shogi_bot::api::{self, AppState};
use tsume_shogi_bot::catalog::JsonFileSource;
use tsume_shogi_bot::config::Config;
use tsume_shogi_bot::inventory::InventoryService;
use tsume_shogi_bot::line::LineClient;
use tsume_shogi_bot::metrics;
use tsume_shogi_bot::responder::Responder;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    metrics::register_metrics();

    let source = JsonFileSource::new(config.data_path.clone());
    tracing::info!("Loading puzzles from {}", source.path().display());
    let inventory = match InventoryService::new(source) {
        Ok(i) => Arc::new(i),
        Err(e) => {
            tracing::error!("Failed to load puzzle catalog: {e}");
            std::process::exit(1);
        }
    };

    let responder = Responder::new(inventory, config.move_range());
    let sink = Arc::new(LineClient::new(
        config.api_base.clone(),
        config.channel_access_token.clone(),
    ));
    let state = AppState::new(responder, sink, config.channel_secret.as_str());

    let app = api::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!(
        "Tsume-shogi bot listening on {addr} (moves {}..={})",
        config.move_range().min(),
        config.move_range().max()
    );
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {e}");
    }
}
