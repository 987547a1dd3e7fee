mod handlers;
mod state;

use anyhow::Result;
use axum::{routing::get, Router};
use bucketview_core::StorageConfig;
use std::env;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bucketview_web=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = env::var("BUCKETVIEW_PORT").unwrap_or_else(|_| "3000".to_string());

    // Storage credentials and endpoint come from the environment; the
    // client is constructed once and shared across requests.
    let state = AppState::new(StorageConfig::from_env()).await;

    // Build router
    let app = Router::new()
        .route("/", get(handlers::index).post(handlers::show_gallery))
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Bucketview web server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
