//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod pool;
pub mod rooms;
pub mod users;

pub use pool::SqliteDb;

use chrono::{DateTime, Utc};

use crate::error::DbError;

/// Parst einen als RFC 3339 gespeicherten Zeitstempel
pub(crate) fn zeit_parsen(feld: &str, wert: &str) -> Result<DateTime<Utc>, DbError> {
    chrono::DateTime::parse_from_rfc3339(wert)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltige {feld} '{wert}': {e}")))
}
