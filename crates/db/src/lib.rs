//! plauder-db – Datenbank-Abstraktion
//!
//! Stellt das Repository-Pattern fuer Benutzer, Raeume und
//! Raum-Mitgliedschaften bereit. Das Delivery-Crate konsumiert davon nur die
//! lesende Mitglieder-Abfrage.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::DbError;
pub use repository::{DatabaseConfig, DbResult, RoomRepository, UserRepository};
pub use sqlite::SqliteDb;
