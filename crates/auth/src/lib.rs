//! plauder-auth – Token-Vertrag fuer Plauder
//!
//! Dieses Crate implementiert nur das, was die RPC-Schicht zum
//! Authentifizieren eines Aufrufs braucht:
//! - Ausstellen eines signierten Tokens fuer eine Benutzer-Identitaet
//! - Pruefen eines Tokens und Zurueckgeben der enthaltenen Identitaet

pub mod error;
pub mod token;

// Bequeme Re-Exporte
pub use error::{AuthError, AuthResult};
pub use token::{Claims, TokenKonfig, TokenService};
