//! Broadcast-Engine – Fan-out eines Payloads an alle verbundenen Raum-Mitglieder
//!
//! Pro Empfaenger laeuft ein eigener Push-Task. `verteilen` kehrt erst zurueck,
//! wenn jeder gestartete Push abgeschlossen ist (erfolgreich oder nicht).
//! Fehler einzelner Empfaenger werden in der Session verbucht und nie an den
//! Aufrufer weitergereicht.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use plauder_core::{RoomKey, UserIdentity};
use tokio::task::JoinSet;

use crate::error::{DeliveryError, DeliveryResult, MembershipError};
use crate::membership::MembershipLookup;
use crate::payload::BroadcastPayload;
use crate::registry::ConnectionRegistry;
use crate::session::PushErgebnis;

/// Standard-Zeitlimit fuer einen einzelnen Push
pub const STANDARD_PUSH_ZEITLIMIT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct BroadcastKonfig {
    /// `None` = kein Zeitlimit, ein haengender Empfaenger blockiert dann den Broadcast
    pub push_zeitlimit: Option<Duration>,
}

impl Default for BroadcastKonfig {
    fn default() -> Self {
        Self {
            push_zeitlimit: Some(STANDARD_PUSH_ZEITLIMIT),
        }
    }
}

/// Auswertung eines einzelnen Broadcasts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZustellBericht {
    /// Eindeutige Mitglieder laut Mitglieder-Abfrage
    pub empfaenger: usize,
    pub zugestellt: usize,
    /// Registriert, aber bereits beendet
    pub inaktiv: usize,
    /// Keine Session registriert
    pub offline: usize,
    pub fehlgeschlagen: usize,
}

impl ZustellBericht {
    /// Anzahl tatsaechlich versuchter Pushes
    pub fn push_versuche(&self) -> usize {
        self.zugestellt + self.fehlgeschlagen
    }
}

pub struct BroadcastEngine {
    registry: ConnectionRegistry,
    mitglieder: Arc<dyn MembershipLookup>,
    konfig: BroadcastKonfig,
}

impl BroadcastEngine {
    pub fn neu(
        registry: ConnectionRegistry,
        mitglieder: Arc<dyn MembershipLookup>,
        konfig: BroadcastKonfig,
    ) -> Self {
        Self {
            registry,
            mitglieder,
            konfig,
        }
    }

    /// Verteilt einen Payload an alle verbundenen Mitglieder seines Raums
    ///
    /// Ein Raum ohne Mitglieder ist kein Fehler. Nur ein Fehlschlag der
    /// Mitglieder-Abfrage selbst wird zurueckgegeben.
    pub async fn verteilen(&self, payload: BroadcastPayload) -> DeliveryResult<ZustellBericht> {
        let room_key = payload.room_key.clone();

        let mitglieder = match self.mitglieder.mitglieder(&room_key).await {
            Ok(m) => m,
            Err(MembershipError::NichtGefunden(_)) => {
                tracing::debug!(room = %room_key, "Raum ohne Mitglieder – nichts zu verteilen");
                return Ok(ZustellBericht::default());
            }
            Err(MembershipError::Upstream(grund)) => {
                tracing::error!(room = %room_key, grund = %grund, "Mitglieder-Abfrage fehlgeschlagen");
                return Err(DeliveryError::MitgliederNichtErmittelbar { room_key, grund });
            }
        };

        Ok(self.an_mitglieder_verteilen(payload, mitglieder).await)
    }

    /// Verteilt an eine bereits aufgeloeste Mitgliederliste
    ///
    /// Fuer Aufrufer, die die Mitglieder ohnehin schon geladen haben.
    /// Doppelte Eintraege erhalten trotzdem nur einen Push.
    pub async fn an_mitglieder_verteilen(
        &self,
        payload: BroadcastPayload,
        mitglieder: Vec<UserIdentity>,
    ) -> ZustellBericht {
        let room_key = payload.room_key.clone();
        let mut bericht = ZustellBericht::default();
        let payload = Arc::new(payload);
        let zeitlimit = self.konfig.push_zeitlimit;
        let mut tasks = JoinSet::new();
        let mut gesehen: HashSet<UserIdentity> = HashSet::with_capacity(mitglieder.len());

        for identity in mitglieder {
            if !gesehen.insert(identity.clone()) {
                continue;
            }
            bericht.empfaenger += 1;

            let Some(session) = self.registry.nachschlagen(&identity) else {
                bericht.offline += 1;
                continue;
            };
            if !session.ist_aktiv() {
                bericht.inaktiv += 1;
                continue;
            }

            let payload = Arc::clone(&payload);
            tasks.spawn(async move { session.zustellen(payload, zeitlimit).await });
        }

        while let Some(ergebnis) = tasks.join_next().await {
            match ergebnis {
                Ok(PushErgebnis::Zugestellt) => bericht.zugestellt += 1,
                Ok(PushErgebnis::Uebersprungen) => bericht.inaktiv += 1,
                Ok(PushErgebnis::Fehlgeschlagen) => bericht.fehlgeschlagen += 1,
                Err(e) => {
                    tracing::error!(room = %room_key, fehler = %e, "Push-Task abgebrochen");
                    bericht.fehlgeschlagen += 1;
                }
            }
        }

        tracing::debug!(
            room = %room_key,
            art = payload.art(),
            empfaenger = bericht.empfaenger,
            zugestellt = bericht.zugestellt,
            offline = bericht.offline,
            fehlgeschlagen = bericht.fehlgeschlagen,
            "Broadcast abgeschlossen"
        );
        bericht
    }

    /// Chat-Nachricht an einen Raum
    pub async fn nachricht_senden(
        &self,
        room_key: RoomKey,
        sender: UserIdentity,
        content: impl Into<String>,
    ) -> DeliveryResult<ZustellBericht> {
        self.verteilen(BroadcastPayload::nachricht(room_key, sender, content))
            .await
    }

    /// Fluechtiger Punkt an einen Raum
    pub async fn punkt_teilen(
        &self,
        room_key: RoomKey,
        sender: UserIdentity,
        x: f64,
        y: f64,
    ) -> DeliveryResult<ZustellBericht> {
        self.verteilen(BroadcastPayload::punkt(room_key, sender, x, y))
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
