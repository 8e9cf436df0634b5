//! Stream-Handler – Lebensdauer eines Client-Streams
//!
//! `oeffnen` registriert eine neue Session und blockiert, bis sie endet:
//! entweder durch einen fehlgeschlagenen Push (Fehler an den Aufrufer) oder
//! durch Abbruch von aussen (Client getrennt, Shutdown).

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use plauder_core::{RoomKey, UserIdentity};

use crate::error::{DeliveryError, DeliveryResult};
use crate::registry::ConnectionRegistry;
use crate::session::{Beendigung, OutboundSink, Session};

#[derive(Clone)]
pub struct StreamHandler {
    registry: ConnectionRegistry,
}

impl StreamHandler {
    pub fn neu(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Oeffnet einen Stream fuer `identity` und wartet auf dessen Ende
    ///
    /// `abbruch` loest aus, wenn die Gegenseite weg ist. Die Session wird dann
    /// regulaer geschlossen und `Ok(())` zurueckgegeben. Der eigene
    /// Registry-Eintrag wird beim Verlassen entfernt, ein inzwischen
    /// nachfolgender Eintrag derselben Identitaet bleibt bestehen.
    pub async fn oeffnen<F>(
        &self,
        identity: UserIdentity,
        room_key: RoomKey,
        outbound: Arc<dyn OutboundSink>,
        abbruch: F,
    ) -> DeliveryResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        let (session, mut signal) = Session::neu(identity, room_key, outbound);
        self.registry.registrieren(Arc::clone(&session));

        tracing::info!(
            identity = %session.identity(),
            room = %session.room_key(),
            session = %session.id(),
            "Stream geoeffnet"
        );

        tokio::pin!(abbruch);
        let beendigung = tokio::select! {
            b = &mut signal => b,
            _ = &mut abbruch => {
                session.schliessen();
                // Ein gleichzeitiger Push-Fehler kann das Signal vorher gesetzt haben
                (&mut signal).await
            }
        };

        self.registry.session_entfernen(&session);
        let dauer_ms = (Utc::now() - session.geoeffnet_am()).num_milliseconds();

        match beendigung {
            Beendigung::Normal => {
                tracing::info!(
                    identity = %session.identity(),
                    session = %session.id(),
                    dauer_ms,
                    "Stream regulaer beendet"
                );
                Ok(())
            }
            Beendigung::Fehler(quelle) => {
                tracing::warn!(
                    identity = %session.identity(),
                    session = %session.id(),
                    dauer_ms,
                    fehler = %quelle,
                    "Stream mit Fehler beendet"
                );
                Err(DeliveryError::Zustellung {
                    identity: session.identity().clone(),
                    quelle,
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
