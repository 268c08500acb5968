//! agriGo Marketplace - farm produce marketplace backend

use agrigo_marketplace::{
    api::{self, AppState},
    config::Config,
    identity::JwtIdentity,
    publisher::EventPublisher,
    store::PgStore,
};
use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store = PgStore::connect(&config).await.context("failed to connect to the database")?;
    store.migrate().await.context("failed to apply migrations")?;
    tracing::info!("connected to the database");

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, domain events will not be published");
                None
            }
        },
        None => None,
    };

    let state = AppState::new(
        Arc::new(store.clone()),
        Arc::new(JwtIdentity::new(&config.jwt_secret)),
        EventPublisher::new(nats),
    );

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<HeaderValue>().context("CORS_ORIGIN is not a valid header value")?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);
    let app = api::router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("🚀 agriGo Marketplace listening on {}", config.bind_addr());
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    store.close().await;
    tracing::info!("database pool closed, bye");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
