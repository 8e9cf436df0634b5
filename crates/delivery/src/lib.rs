//! plauder-delivery – Echtzeit-Zustellung
//!
//! Dieses Crate haelt fest, welche Clients gerade einen offenen Stream haben,
//! und verteilt Chat-Nachrichten und fluechtige Punkt-Events an die passenden
//! Streams. Der Ausfall eines Empfaengers beeinflusst keinen anderen.
//!
//! ## Architektur
//!
//! ```text
//! StreamHandler::oeffnen (pro Client-Stream ein Aufruf)
//!     |  erzeugt Session, registriert sie, blockiert bis zur Beendigung
//!     v
//! ConnectionRegistry  – UserIdentity -> Arc<Session> (DashMap)
//!     ^
//!     |  nachschlagen
//! BroadcastEngine::verteilen
//!     |  1. MembershipLookup: wer gehoert zum Raum?
//!     |  2. Registry: wer davon ist online?
//!     |  3. ein Task pro Empfaenger (JoinSet), warten bis alle fertig
//!     v
//! Session::zustellen  – Push ueber den OutboundSink, bei Fehler:
//!                       Zustand -> GeschlossenFehler + Beendigungs-Signal
//! ```
//!
//! ## Session-Zustaende
//! ```text
//! Offen -> Aktiv -> GeschlossenFehler   (Push fehlgeschlagen)
//!   |        |
//!   +--------+----> GeschlossenNormal   (Client getrennt / Shutdown)
//! ```

pub mod broadcast;
pub mod error;
pub mod membership;
pub mod payload;
pub mod registry;
pub mod session;
pub mod stream;

// Bequeme Re-Exporte
pub use broadcast::{BroadcastEngine, BroadcastKonfig, ZustellBericht};
pub use error::{DeliveryError, DeliveryResult, MembershipError, SinkError};
pub use membership::{MembershipLookup, StatischeMitglieder};
pub use payload::{BroadcastPayload, ChatMessage, PayloadKind, SharedPoint};
pub use registry::ConnectionRegistry;
pub use session::{
    Beendigung, BeendigungsSignal, OutboundSink, PushErgebnis, Session, SessionId, SessionZustand,
};
pub use stream::StreamHandler;
