// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! WeRise Verifier API Server
//!
//! Receives Telegram updates over a webhook, issues identity verification
//! links and ingests Telegram Passport data.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use werise_verifier::{
    config::Config,
    db::FirestoreDb,
    services::{sweeper::spawn_session_sweeper, PassportDecryptor, TelegramClient},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let mut config = Config::from_env()?;
    tracing::info!(port = config.port, bot_id = config.bot_id, "Starting WeRise Verifier");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    // Load the Passport key pair
    tracing::info!(path = %config.passport_private_key_path.display(), "Loading Passport private key");
    let passport = Arc::new(PassportDecryptor::load(&config.passport_private_key_path)?);

    // Telegram client: webhook, command list and our own username
    let telegram = TelegramClient::new(&config.telegram_token);
    if config.bot_username.is_empty() {
        config.bot_username = telegram.username().await?;
    }
    telegram
        .set_webhook(&config.webhook_url(), config.webhook_secret_token.as_deref())
        .await?;
    telegram.register_commands().await?;
    tracing::info!(
        username = %config.bot_username,
        webhook_path = %config.webhook_path,
        "Telegram bot configured"
    );

    let sweeper = spawn_session_sweeper(db.clone(), config.session_sweep_interval);

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        db,
        Arc::new(telegram),
        passport,
    ));

    // Build router
    let app = werise_verifier::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("werise_verifier=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
