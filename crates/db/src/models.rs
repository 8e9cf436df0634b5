//! Datenbankmodelle fuer Plauder
//!
//! Diese Typen repraesentieren Datensaetze aus der Datenbank.
//! Sie sind von den Domain-Typen getrennt und dienen als reine Datenuebertragungsobjekte.

use chrono::{DateTime, Utc};
use plauder_core::RoomType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Benutzer
// ---------------------------------------------------------------------------

/// Benutzer-Datensatz aus der Datenbank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenutzerRecord {
    pub email: String,
    pub username: String,
    pub name: String,
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Erstellen eines neuen Benutzers
#[derive(Debug, Clone, Default)]
pub struct NeuerBenutzer<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub name: &'a str,
    pub photo_url: &'a str,
}

// ---------------------------------------------------------------------------
// Raeume
// ---------------------------------------------------------------------------

/// Raum-Datensatz aus der Datenbank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaumRecord {
    pub room_key: String,
    pub room_type: RoomType,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Erstellen eines neuen Raums
#[derive(Debug, Clone)]
pub struct NeuerRaum<'a> {
    pub room_key: &'a str,
    pub room_type: RoomType,
    pub created_by: &'a str,
}

// ---------------------------------------------------------------------------
// Mitgliedschaften
// ---------------------------------------------------------------------------

/// Zuordnung eines Benutzers zu einem Raum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitgliedschaftRecord {
    pub uuid: Uuid,
    pub user_email: String,
    pub room_key: String,
}

/// Daten zum Anlegen einer Mitgliedschaft
///
/// Ohne `uuid` wird eine neue v4-UUID vergeben.
#[derive(Debug, Clone)]
pub struct NeueMitgliedschaft<'a> {
    pub uuid: Option<Uuid>,
    pub user_email: &'a str,
    pub room_key: &'a str,
}
