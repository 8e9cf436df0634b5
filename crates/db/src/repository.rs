//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Geschaeftslogik von der konkreten
//! Datenbank-Implementierung. Aktuell existiert nur das SQLite-Backend.

use crate::error::DbError;
use crate::models::{
    BenutzerRecord, MitgliedschaftRecord, NeueMitgliedschaft, NeuerBenutzer, NeuerRaum,
    RaumRecord,
};

/// Result-Alias fuer Datenbankoperationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL, z.B. "sqlite://plauder.db" oder "sqlite::memory:"
    pub url: String,
    /// Obergrenze des Pools. Bei In-Memory-URLs immer 1.
    pub max_verbindungen: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://plauder.db".into(),
            max_verbindungen: 5,
        }
    }
}

/// Repository fuer Benutzer-Datenzugriffe
#[allow(async_fn_in_trait)]
pub trait UserRepository: Send + Sync {
    /// Legt einen neuen Benutzer an
    ///
    /// Eine bereits vergebene E-Mail ergibt `DbError::Eindeutigkeit`.
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord>;

    /// Laedt einen Benutzer anhand seiner E-Mail
    async fn get_by_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>>;

    /// Sucht Benutzer deren Username oder Name `query` enthaelt
    /// (Gross-/Kleinschreibung egal)
    async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<BenutzerRecord>>;
}

/// Repository fuer Raeume und Raum-Mitgliedschaften
#[allow(async_fn_in_trait)]
pub trait RoomRepository: Send + Sync {
    /// Legt einen neuen Raum an
    async fn create_room(&self, data: NeuerRaum<'_>) -> DbResult<RaumRecord>;

    /// Laedt einen Raum anhand seines Schluessels
    async fn get_room(&self, room_key: &str) -> DbResult<Option<RaumRecord>>;

    /// Fuegt einen Benutzer einem Raum hinzu
    async fn add_member(&self, data: NeueMitgliedschaft<'_>) -> DbResult<MitgliedschaftRecord>;

    /// Alle Mitgliedschaften eines Raums
    ///
    /// Gibt `DbError::NichtGefunden` zurueck wenn der Raum keine Mitglieder hat.
    async fn members(&self, room_key: &str) -> DbResult<Vec<MitgliedschaftRecord>>;
}
