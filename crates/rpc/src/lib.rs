//! plauder-rpc – gRPC-Schnittstelle
//!
//! Bindet Datenbank, Token-Service und Echtzeit-Zustellung an den
//! `ChatService` aus `proto/plauder.proto`.

pub mod auth;
pub mod error;
pub mod membership;
pub mod server;
pub mod service;
pub mod sink;

// Generierter Code aus tonic-build
pub mod proto {
    tonic::include_proto!("plauder.v1");
}

pub use auth::{angemeldet, AuthInterceptor, AuthenticatedUser};
pub use error::{rpc_error_zu_status, RpcError, RpcResult};
pub use membership::DbMitglieder;
pub use server::RpcServer;
pub use service::{ChatServiceImpl, RpcKonfig};
pub use sink::KanalSink;
