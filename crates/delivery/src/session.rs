//! Session – Live-Zustand eines offenen Client-Streams
//!
//! Eine Session haelt Identitaet, Raum, den ausgehenden Sink, den
//! Aktiv-Zustand und ein einmaliges Beendigungs-Signal. Deaktivierung und
//! Signal passieren im selben exklusiven Abschnitt, ein zweites Signal wird
//! ignoriert.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use plauder_core::{RoomKey, UserIdentity};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::SinkError;
use crate::payload::BroadcastPayload;

pub type SessionId = Uuid;

// ---------------------------------------------------------------------------
// OutboundSink
// ---------------------------------------------------------------------------

/// Ausgehende Seite eines Client-Streams
///
/// Nimmt genau einen Payload pro Aufruf an. Ein Fehler beendet die Session.
#[async_trait]
pub trait OutboundSink: Send + Sync {
    async fn push(&self, payload: Arc<BroadcastPayload>) -> Result<(), SinkError>;
}

// ---------------------------------------------------------------------------
// Zustaende
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionZustand {
    /// Registriert, noch kein Push versucht
    Offen,
    /// Mindestens ein Push versucht
    Aktiv,
    /// Regulaer beendet (Client getrennt, Shutdown)
    GeschlossenNormal,
    /// Ein Push ist fehlgeschlagen
    GeschlossenFehler,
}

impl SessionZustand {
    pub fn ist_aktiv(self) -> bool {
        matches!(self, Self::Offen | Self::Aktiv)
    }
}

/// Grund, mit dem eine Session endet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Beendigung {
    Normal,
    Fehler(SinkError),
}

/// Ergebnis eines einzelnen Push-Versuchs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushErgebnis {
    Zugestellt,
    /// Session war nicht mehr aktiv, kein Push versucht
    Uebersprungen,
    /// Push fehlgeschlagen, Session ist jetzt GeschlossenFehler
    Fehlgeschlagen,
}

// ---------------------------------------------------------------------------
// Beendigungs-Signal
// ---------------------------------------------------------------------------

/// Empfangsseite des Beendigungs-Signals einer Session
///
/// Loest genau einmal aus. Geht die Session verloren ohne zu signalisieren,
/// gilt das als normale Beendigung.
#[derive(Debug)]
pub struct BeendigungsSignal {
    rx: oneshot::Receiver<Beendigung>,
}

impl Future for BeendigungsSignal {
    type Output = Beendigung;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|ergebnis| ergebnis.unwrap_or(Beendigung::Normal))
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

struct Lebenszyklus {
    zustand: SessionZustand,
    signal: Option<oneshot::Sender<Beendigung>>,
}

pub struct Session {
    id: SessionId,
    identity: UserIdentity,
    room_key: RoomKey,
    geoeffnet_am: DateTime<Utc>,
    outbound: Arc<dyn OutboundSink>,
    lebenszyklus: Mutex<Lebenszyklus>,
    /// Serialisiert Pushes gegen denselben Sink
    push_sperre: tokio::sync::Mutex<()>,
}

impl Session {
    /// Erstellt eine neue Session im Zustand `Offen`
    pub fn neu(
        identity: UserIdentity,
        room_key: RoomKey,
        outbound: Arc<dyn OutboundSink>,
    ) -> (Arc<Self>, BeendigungsSignal) {
        let (tx, rx) = oneshot::channel();
        let session = Arc::new(Self {
            id: Uuid::new_v4(),
            identity,
            room_key,
            geoeffnet_am: Utc::now(),
            outbound,
            lebenszyklus: Mutex::new(Lebenszyklus {
                zustand: SessionZustand::Offen,
                signal: Some(tx),
            }),
            push_sperre: tokio::sync::Mutex::new(()),
        });
        (session, BeendigungsSignal { rx })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    pub fn room_key(&self) -> &RoomKey {
        &self.room_key
    }

    pub fn geoeffnet_am(&self) -> DateTime<Utc> {
        self.geoeffnet_am
    }

    pub fn zustand(&self) -> SessionZustand {
        self.lebenszyklus.lock().zustand
    }

    pub fn ist_aktiv(&self) -> bool {
        self.zustand().ist_aktiv()
    }

    /// Stellt einen Payload zu
    ///
    /// Der Aktiv-Check laeuft unter der Push-Sperre: nach einem Fehlschlag
    /// wird gegen diese Session nie wieder ein Push versucht.
    pub async fn zustellen(
        &self,
        payload: Arc<BroadcastPayload>,
        zeitlimit: Option<Duration>,
    ) -> PushErgebnis {
        let _sperre = self.push_sperre.lock().await;

        {
            let mut lz = self.lebenszyklus.lock();
            match lz.zustand {
                SessionZustand::Offen => lz.zustand = SessionZustand::Aktiv,
                SessionZustand::Aktiv => {}
                SessionZustand::GeschlossenNormal | SessionZustand::GeschlossenFehler => {
                    return PushErgebnis::Uebersprungen;
                }
            }
        }

        let ergebnis = match zeitlimit {
            Some(limit) => tokio::time::timeout(limit, self.outbound.push(payload))
                .await
                .unwrap_or(Err(SinkError::Zeitlimit(limit))),
            None => self.outbound.push(payload).await,
        };

        match ergebnis {
            Ok(()) => PushErgebnis::Zugestellt,
            Err(fehler) => {
                tracing::warn!(
                    identity = %self.identity,
                    session = %self.id,
                    fehler = %fehler,
                    "Push fehlgeschlagen – Session wird beendet"
                );
                self.fehlschlagen(fehler);
                PushErgebnis::Fehlgeschlagen
            }
        }
    }

    /// Uebergang nach `GeschlossenFehler`
    ///
    /// Gibt `false` zurueck wenn die Session bereits beendet war.
    pub fn fehlschlagen(&self, fehler: SinkError) -> bool {
        self.beenden(SessionZustand::GeschlossenFehler, Beendigung::Fehler(fehler))
    }

    /// Uebergang nach `GeschlossenNormal`
    ///
    /// Gibt `false` zurueck wenn die Session bereits beendet war.
    pub fn schliessen(&self) -> bool {
        self.beenden(SessionZustand::GeschlossenNormal, Beendigung::Normal)
    }

    fn beenden(&self, ziel: SessionZustand, beendigung: Beendigung) -> bool {
        let mut lz = self.lebenszyklus.lock();
        if !lz.zustand.ist_aktiv() {
            tracing::debug!(
                identity = %self.identity,
                session = %self.id,
                zustand = ?lz.zustand,
                "Session bereits beendet – weiteres Signal ignoriert"
            );
            return false;
        }

        lz.zustand = ziel;
        if let Some(tx) = lz.signal.take() {
            // Empfaenger kann bereits weg sein (Handler beendet)
            let _ = tx.send(beendigung);
        }
        true
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("room_key", &self.room_key)
            .field("zustand", &self.zustand())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ZaehlSink {
        pushes: AtomicUsize,
        fehler: Option<SinkError>,
    }

    #[async_trait]
    impl OutboundSink for ZaehlSink {
        async fn push(&self, _payload: Arc<BroadcastPayload>) -> Result<(), SinkError> {
            self.pushes.fetch_add(1, Ordering::SeqCst);
            match &self.fehler {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }
    }

    struct HaengenderSink;

    #[async_trait]
    impl OutboundSink for HaengenderSink {
        async fn push(&self, _payload: Arc<BroadcastPayload>) -> Result<(), SinkError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn sink(fehler: Option<SinkError>) -> Arc<ZaehlSink> {
        Arc::new(ZaehlSink {
            pushes: AtomicUsize::new(0),
            fehler,
        })
    }

    fn session_mit(outbound: Arc<dyn OutboundSink>) -> (Arc<Session>, BeendigungsSignal) {
        Session::neu(
            UserIdentity::neu("a@example.com").unwrap(),
            RoomKey::neu("R1").unwrap(),
            outbound,
        )
    }

    fn payload() -> Arc<BroadcastPayload> {
        Arc::new(BroadcastPayload::nachricht(
            RoomKey::neu("R1").unwrap(),
            UserIdentity::neu("b@example.com").unwrap(),
            "hi",
        ))
    }

    #[tokio::test]
    async fn erster_push_aktiviert() {
        let s = sink(None);
        let (session, _signal) = session_mit(s.clone());
        assert_eq!(session.zustand(), SessionZustand::Offen);

        assert_eq!(session.zustellen(payload(), None).await, PushErgebnis::Zugestellt);
        assert_eq!(session.zustand(), SessionZustand::Aktiv);
        assert_eq!(s.pushes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fehlgeschlagener_push_beendet_mit_fehler() {
        let s = sink(Some(SinkError::Geschlossen));
        let (session, signal) = session_mit(s.clone());

        assert_eq!(session.zustellen(payload(), None).await, PushErgebnis::Fehlgeschlagen);
        assert_eq!(session.zustand(), SessionZustand::GeschlossenFehler);
        assert!(!session.ist_aktiv());
        assert_eq!(signal.await, Beendigung::Fehler(SinkError::Geschlossen));
    }

    #[tokio::test]
    async fn nach_fehler_kein_weiterer_push() {
        let s = sink(Some(SinkError::Transport("kaputt".into())));
        let (session, _signal) = session_mit(s.clone());

        session.zustellen(payload(), None).await;
        assert_eq!(session.zustellen(payload(), None).await, PushErgebnis::Uebersprungen);
        assert_eq!(s.pushes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zweites_signal_wird_ignoriert() {
        let (session, signal) = session_mit(sink(None));

        assert!(session.fehlschlagen(SinkError::Geschlossen));
        assert!(!session.fehlschlagen(SinkError::Transport("zweiter".into())));
        assert!(!session.schliessen());

        assert_eq!(session.zustand(), SessionZustand::GeschlossenFehler);
        assert_eq!(signal.await, Beendigung::Fehler(SinkError::Geschlossen));
    }

    #[tokio::test]
    async fn schliessen_signalisiert_normal() {
        let (session, signal) = session_mit(sink(None));
        assert!(session.schliessen());
        assert_eq!(session.zustand(), SessionZustand::GeschlossenNormal);
        assert_eq!(signal.await, Beendigung::Normal);
    }

    #[tokio::test]
    async fn signal_ohne_empfaenger_panikt_nicht() {
        let (session, signal) = session_mit(sink(None));
        drop(signal);
        assert!(session.fehlschlagen(SinkError::Geschlossen));
    }

    #[tokio::test(start_paused = true)]
    async fn zeitlimit_beendet_session() {
        let (session, signal) = session_mit(Arc::new(HaengenderSink));

        let ergebnis = session
            .zustellen(payload(), Some(Duration::from_millis(50)))
            .await;

        assert_eq!(ergebnis, PushErgebnis::Fehlgeschlagen);
        assert_eq!(
            signal.await,
            Beendigung::Fehler(SinkError::Zeitlimit(Duration::from_millis(50)))
        );
    }
}
