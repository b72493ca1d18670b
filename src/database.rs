//! Store connection lifecycle

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{config::DatabaseConfig, repository::Repository, runtime::RunState};

/// Owned handle on the book and user store
pub struct Database {
    config: DatabaseConfig,
    pool: Option<PgPool>,
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config, pool: None }
    }

    /// Connect and migrate, retrying at a fixed interval while `state` is running
    pub async fn start(&mut self, state: &RunState) -> anyhow::Result<Repository> {
        if self.config.is_in_memory() {
            tracing::warn!("Using the in-memory store, data will not survive a restart");
            return Ok(Repository::in_memory());
        }

        let mut attempts = 0u32;
        let pool = loop {
            let connection = PgPoolOptions::new()
                .max_connections(self.config.max_connections)
                .min_connections(self.config.min_connections)
                .acquire_timeout(self.config.connect_timeout())
                .connect(&self.config.url)
                .await;

            match connection {
                Ok(pool) => break pool,
                Err(e) => {
                    attempts += 1;
                    tracing::error!("Failed to connect to database: {}", e);

                    let interval = self.config.reconnect_interval();
                    tracing::warn!(
                        attempts,
                        "Reconnecting to database in {} seconds",
                        interval.as_secs()
                    );

                    tokio::select! {
                        _ = tokio::time::sleep(interval) => {}
                        _ = state.stopped() => {}
                    }
                    if !state.is_running() {
                        anyhow::bail!("Stopped before the database was reachable");
                    }
                }
            }
        };

        tracing::info!("Connected to database");

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!("Database migrations completed");

        self.pool = Some(pool.clone());
        Ok(Repository::new(pool))
    }

    /// Close the connection pool, waiting for checked-out connections
    pub async fn stop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            tracing::info!("Disconnected from database");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_memory_url_starts_without_connecting() {
        let mut database = Database::new(DatabaseConfig {
            url: "memory://".to_string(),
            ..Default::default()
        });
        let repository = database.start(&RunState::new()).await.unwrap();
        assert!(repository.books.list().await.unwrap().is_empty());
        database.stop().await;
    }

    #[test]
    fn test_only_title_and_email_are_unique() {
        let schema = include_str!("../migrations/20240101000000_initial.sql");
        let unique: Vec<&str> = schema
            .lines()
            .map(str::trim)
            .filter(|line| line.contains("UNIQUE"))
            .collect();
        assert_eq!(unique.len(), 2, "{:?}", unique);
        assert!(unique.iter().all(|line| line.starts_with("email") || line.starts_with("title")));
    }

    #[tokio::test]
    async fn test_gives_up_when_stopped() {
        let mut database = Database::new(DatabaseConfig {
            url: "postgres://nobody@127.0.0.1:1/none".to_string(),
            reconnect_interval_secs: 3600,
            connect_timeout_secs: 1,
            ..Default::default()
        });
        let state = RunState::new();
        let stopper = state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            stopper.stop();
        });

        let result = tokio::time::timeout(Duration::from_secs(30), database.start(&state)).await;
        assert!(result.expect("start kept retrying after stop").is_err());
    }
}
