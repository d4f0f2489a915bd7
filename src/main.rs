use std::sync::Arc;

use anyhow::Context;
use chat_relay::{config::Config, routes, state::AppState};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,chat_relay=debug,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    let state = Arc::new(AppState::from_config(&config).context("failed to build provider")?);

    let app = routes::create_router(config.max_upload_bytes, &config.public_dir).with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %config.bind_addr,
        provider = ?config.provider,
        text_model = %config.models.text,
        vision_model = %config.models.vision,
        "chat relay listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
