// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Periodic purge of expired verification sessions.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::db::FirestoreDb;
use crate::error::AppError;

/// Delete sessions that have expired by now.
pub async fn sweep_once(db: &FirestoreDb) -> Result<usize, AppError> {
    db.delete_expired_sessions(Utc::now()).await
}

/// Start the background sweeper. The first sweep runs immediately.
pub fn spawn_session_sweeper(db: FirestoreDb, every: Duration) -> JoinHandle<()> {
    tracing::info!(interval_secs = every.as_secs(), "Session sweeper started");

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match sweep_once(&db).await {
                Ok(0) => {}
                Ok(count) => tracing::info!(count, "Expired sessions removed"),
                Err(e) => tracing::error!(error = %e, "Session sweep failed"),
            }
        }
    })
}
