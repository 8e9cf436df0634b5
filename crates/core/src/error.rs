//! Fehlertypen fuer Plauder
//!
//! Fehler der gemeinsamen Typen. Die anderen Crates definieren eigene
//! Fehler und konvertieren via `#[from]`.

use thiserror::Error;

/// Globaler Result-Alias fuer Plauder
pub type Result<T> = std::result::Result<T, PlauderError>;

/// Crate-uebergreifende Fehler im Plauder-System
#[derive(Debug, Error)]
pub enum PlauderError {
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),
}
