//! Fehlertypen fuer den Token-Service

use thiserror::Error;

/// Alle moeglichen Fehler beim Ausstellen oder Pruefen von Tokens
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token ungueltig: {0}")]
    TokenUngueltig(String),

    #[error("Token abgelaufen")]
    TokenAbgelaufen,

    #[error("Token-Ausstellung fehlgeschlagen: {0}")]
    Ausstellung(String),

    #[error("Token enthaelt keine gueltige Identitaet")]
    IdentitaetFehlt,
}

/// Result-Alias fuer den Token-Service
pub type AuthResult<T> = Result<T, AuthError>;
