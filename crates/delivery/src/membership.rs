//! Mitglieder-Abfrage
//!
//! Die Zustellung liest Raum-Mitgliedschaften nur. Woher sie kommen
//! (Datenbank, Konfiguration) entscheidet die Implementierung.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use plauder_core::{RoomKey, UserIdentity};

use crate::error::MembershipError;

/// Liefert die Identitaeten, die aktuell einem Raum zugeordnet sind
#[async_trait]
pub trait MembershipLookup: Send + Sync {
    /// Gibt `MembershipError::NichtGefunden` zurueck wenn der Raum keine
    /// Mitglieder hat.
    async fn mitglieder(&self, room_key: &RoomKey) -> Result<Vec<UserIdentity>, MembershipError>;
}

/// Fest eingetragene Mitgliedschaften im Speicher
///
/// Fuer Tests und fuer Einbettungen ohne Datenbank.
#[derive(Debug, Default)]
pub struct StatischeMitglieder {
    raeume: RwLock<HashMap<RoomKey, Vec<UserIdentity>>>,
}

impl StatischeMitglieder {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Ersetzt die Mitglieder eines Raums
    pub fn setzen(&self, room_key: RoomKey, mitglieder: Vec<UserIdentity>) {
        self.raeume.write().insert(room_key, mitglieder);
    }

    /// Fuegt einem Raum ein Mitglied hinzu
    pub fn hinzufuegen(&self, room_key: RoomKey, identity: UserIdentity) {
        self.raeume.write().entry(room_key).or_default().push(identity);
    }
}

#[async_trait]
impl MembershipLookup for StatischeMitglieder {
    async fn mitglieder(&self, room_key: &RoomKey) -> Result<Vec<UserIdentity>, MembershipError> {
        match self.raeume.read().get(room_key) {
            Some(m) if !m.is_empty() => Ok(m.clone()),
            _ => Err(MembershipError::NichtGefunden(room_key.to_string())),
        }
    }
}
