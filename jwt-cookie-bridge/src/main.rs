/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Token cookie bridge server entry point.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use jwt_cookie_bridge::config::Config;
use jwt_cookie_bridge::db::PgRefreshTokenStore;
use jwt_cookie_bridge::domain::DomainValidator;
use jwt_cookie_bridge::refresh::{MemoryRefreshTokenStore, RefreshTokenStore};
use jwt_cookie_bridge::routes;
use jwt_cookie_bridge::state::AppState;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().map_err(|e| anyhow!("failed to load configuration: {e}"))?;

    let refresh_tokens: Arc<dyn RefreshTokenStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(20)
                .connect(url)
                .await
                .context("failed to connect to PostgreSQL")?;
            tracing::info!("Connected to PostgreSQL");
            let store = PgRefreshTokenStore::new(pool);
            store
                .migrate()
                .await
                .context("failed to migrate refresh token table")?;
            Arc::new(store)
        }
        None => {
            tracing::info!("DATABASE_URL not set, keeping refresh token hashes in memory");
            Arc::new(MemoryRefreshTokenStore::new())
        }
    };

    let settings = &config.settings;
    let domains = DomainValidator::new(&settings.allowed_domains);
    if let Err(e) = domains.check(&settings.cookie_domain) {
        tracing::warn!("Every login will be rejected: {e}");
    }
    if settings.debug_mode {
        tracing::info!("Debug mode enabled, diagnostic routes are reachable");
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = AppState::new(settings, refresh_tokens);
    let app = routes::router().layer(cors).with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    tracing::info!(
        "Token cookie bridge listening on {} (cookie {} for {})",
        config.listen_addr,
        settings.cookie_name,
        settings.cookie_domain
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
