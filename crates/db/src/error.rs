//! Fehlertypen fuer das Datenbank-Crate

use thiserror::Error;

/// Datenbank-Fehlertypen
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Datensatz nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Eindeutigkeitsverletzung: {0}")]
    Eindeutigkeit(String),

    #[error("Ungueltige Daten: {0}")]
    UngueltigeDaten(String),

    #[error("SQLx-Fehler: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration-Fehler: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Interner DB-Fehler: {0}")]
    Intern(String),
}

impl DbError {
    pub fn nicht_gefunden(msg: impl Into<String>) -> Self {
        Self::NichtGefunden(msg.into())
    }

    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Uebersetzt Constraint-Verletzungen aus SQLite in fachliche Fehler
    pub(crate) fn aus_constraint(e: sqlx::Error, kontext: impl Into<String>) -> Self {
        let msg = e.to_string();
        if msg.contains("UNIQUE") || msg.contains("PRIMARY KEY") {
            Self::Eindeutigkeit(kontext.into())
        } else if msg.contains("FOREIGN KEY") {
            Self::UngueltigeDaten(format!("{}: Referenz existiert nicht", kontext.into()))
        } else if msg.contains("CHECK") {
            Self::UngueltigeDaten(kontext.into())
        } else {
            Self::Sqlx(e)
        }
    }
}
