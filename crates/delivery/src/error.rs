//! Fehlertypen fuer die Echtzeit-Zustellung

use std::time::Duration;

use plauder_core::{RoomKey, UserIdentity};
use thiserror::Error;

/// Fehler beim Push in den Stream eines einzelnen Empfaengers
///
/// Betrifft immer nur die eine Session, nie den gesamten Broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// Die Gegenseite hat den Stream geschlossen
    #[error("Stream vom Client geschlossen")]
    Geschlossen,

    /// Der Push hat das Zeitlimit ueberschritten
    #[error("Push-Zeitlimit ueberschritten ({0:?})")]
    Zeitlimit(Duration),

    /// Sonstiger Transportfehler
    #[error("Transportfehler: {0}")]
    Transport(String),
}

/// Fehler der Mitglieder-Abfrage (externer Kollaborateur)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    /// Raum hat keine eingetragenen Mitglieder – wird als leerer Raum behandelt
    #[error("Keine Mitglieder gefunden: {0}")]
    NichtGefunden(String),

    /// Die Abfrage selbst ist fehlgeschlagen (z.B. Datenbank nicht erreichbar)
    #[error("Mitglieder-Abfrage fehlgeschlagen: {0}")]
    Upstream(String),
}

/// Fehlertyp der Zustellungs-Schicht
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Die Empfaengermenge konnte nicht ermittelt werden
    #[error("Mitglieder von {room_key} nicht ermittelbar: {grund}")]
    MitgliederNichtErmittelbar { room_key: RoomKey, grund: String },

    /// Ein Stream wurde wegen eines fehlgeschlagenen Push beendet
    #[error("Zustellung an {identity} fehlgeschlagen: {quelle}")]
    Zustellung {
        identity: UserIdentity,
        #[source]
        quelle: SinkError,
    },
}

/// Result-Typ fuer die Zustellungs-Schicht
pub type DeliveryResult<T> = Result<T, DeliveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zustellungsfehler_anzeige() {
        let e = DeliveryError::Zustellung {
            identity: UserIdentity::neu("b@example.com").unwrap(),
            quelle: SinkError::Geschlossen,
        };
        assert_eq!(
            e.to_string(),
            "Zustellung an b@example.com fehlgeschlagen: Stream vom Client geschlossen"
        );
    }

    #[test]
    fn upstream_anzeige_enthaelt_raum() {
        let e = DeliveryError::MitgliederNichtErmittelbar {
            room_key: RoomKey::neu("R1").unwrap(),
            grund: "DB weg".into(),
        };
        assert!(e.to_string().contains("room:R1"));
        assert!(e.to_string().contains("DB weg"));
    }
}
