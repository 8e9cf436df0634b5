//! Fehlertypen fuer die RPC-Schicht

use plauder_auth::AuthError;
use plauder_core::PlauderError;
use plauder_db::DbError;
use plauder_delivery::DeliveryError;
use thiserror::Error;
use tonic::Status;

/// Alle moeglichen Fehler im RPC-Crate
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Kein Zugriff: {0}")]
    KeinZugriff(String),

    #[error("Ressource nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error(transparent)]
    Kern(#[from] PlauderError),

    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] DbError),

    #[error("Auth-Fehler: {0}")]
    Auth(#[from] AuthError),

    #[error("Zustellungsfehler: {0}")]
    Zustellung(#[from] DeliveryError),
}

pub type RpcResult<T> = Result<T, RpcError>;

/// Uebersetzt einen RPC-Fehler in den gRPC-Status fuer den Client
pub fn rpc_error_zu_status(e: RpcError) -> Status {
    match &e {
        RpcError::KeinZugriff(_) => Status::permission_denied(e.to_string()),
        RpcError::NichtGefunden(_) => Status::not_found(e.to_string()),
        RpcError::UngueltigeEingabe(_) => Status::invalid_argument(e.to_string()),
        RpcError::Kern(PlauderError::UngueltigeEingabe(_)) => {
            Status::invalid_argument(e.to_string())
        }
        RpcError::Datenbank(db) => match db {
            DbError::NichtGefunden(_) => Status::not_found(e.to_string()),
            DbError::Eindeutigkeit(_) => Status::already_exists(e.to_string()),
            DbError::UngueltigeDaten(_) => Status::invalid_argument(e.to_string()),
            DbError::Sqlx(_) => Status::unavailable(e.to_string()),
            DbError::Migration(_) | DbError::Intern(_) => Status::internal(e.to_string()),
        },
        RpcError::Auth(auth) => match auth {
            AuthError::Ausstellung(_) => Status::internal(e.to_string()),
            _ => Status::unauthenticated(e.to_string()),
        },
        RpcError::Zustellung(_) => Status::unavailable(e.to_string()),
    }
}
