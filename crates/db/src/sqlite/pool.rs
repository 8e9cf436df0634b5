//! Verbindungsaufbau zur SQLite-Datenbank
//!
//! Dateibasierte Datenbanken laufen im WAL-Modus mit einem Pool nach
//! `max_verbindungen`. Eine In-Memory-Datenbank existiert nur pro Verbindung,
//! deshalb bekommt sie genau eine, die nie geschlossen wird.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::repository::{DatabaseConfig, DbResult};

/// Wartezeit auf eine gesperrte Datenbank, bevor SQLite `SQLITE_BUSY` meldet
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Plauder-Datenbank: Pool plus ausgefuehrte Migrationen
#[derive(Debug, Clone)]
pub struct SqliteDb {
    pub(crate) pool: SqlitePool,
}

impl SqliteDb {
    /// Verbindet sich mit `config.url` und bringt das Schema auf Stand
    pub async fn oeffnen(config: &DatabaseConfig) -> DbResult<Self> {
        let optionen = SqliteConnectOptions::from_str(&config.url)?
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        if ist_in_memory(&config.url) {
            return Self::verbinden(optionen, 1, &config.url).await;
        }

        let optionen = optionen
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        Self::verbinden(optionen, config.max_verbindungen.max(1), &config.url).await
    }

    /// Frische, leere In-Memory-Datenbank
    pub async fn in_memory() -> DbResult<Self> {
        Self::oeffnen(&DatabaseConfig {
            url: "sqlite::memory:".into(),
            max_verbindungen: 1,
        })
        .await
    }

    async fn verbinden(
        optionen: SqliteConnectOptions,
        max_verbindungen: u32,
        url: &str,
    ) -> DbResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_verbindungen)
            .min_connections(1)
            .idle_timeout(None)
            .connect_with(optionen)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(url, max_verbindungen, "Datenbank bereit");

        Ok(Self { pool })
    }
}

fn ist_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
