//! Connection-Registry – Wer hat gerade einen offenen Stream?
//!
//! Pro Identitaet ist hoechstens eine Session registriert. Eine neue
//! Registrierung ersetzt die alte (last-writer-wins), die alte Session selbst
//! bleibt unangetastet.
//!
//! Nach `alle_schliessen` nimmt die Registry nichts mehr an: spaet
//! eintreffende Sessions werden sofort regulaer geschlossen.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use plauder_core::UserIdentity;

use crate::session::Session;

/// Thread-safe Zuordnung Identitaet -> aktuelle Session
///
/// Clone teilt den inneren Zustand.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    sessions: Arc<DashMap<UserIdentity, Arc<Session>>>,
    geschlossen: Arc<AtomicBool>,
}

impl ConnectionRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert eine Session unter ihrer Identitaet
    ///
    /// Gibt die ersetzte Session zurueck, falls vorhanden. Ist die Registry
    /// bereits geschlossen, wird die Session sofort regulaer beendet und
    /// nicht eingetragen.
    pub fn registrieren(&self, session: Arc<Session>) -> Option<Arc<Session>> {
        if self.ist_geschlossen() {
            tracing::info!(
                identity = %session.identity(),
                session = %session.id(),
                "Registry geschlossen, Session abgewiesen"
            );
            session.schliessen();
            return None;
        }

        let identity = session.identity().clone();
        let neue_id = session.id();
        let alt = self.sessions.insert(identity.clone(), Arc::clone(&session));

        // alle_schliessen kann zwischen Pruefung und Eintrag gelaufen sein
        if self.ist_geschlossen() {
            self.session_entfernen(&session);
            session.schliessen();
            return alt;
        }

        match &alt {
            Some(alt) => tracing::info!(
                identity = %identity,
                alte_session = %alt.id(),
                neue_session = %neue_id,
                "Session ersetzt"
            ),
            None => tracing::debug!(identity = %identity, session = %neue_id, "Session registriert"),
        }
        alt
    }

    pub fn nachschlagen(&self, identity: &UserIdentity) -> Option<Arc<Session>> {
        self.sessions.get(identity).map(|e| Arc::clone(e.value()))
    }

    /// Entfernt den Eintrag einer Identitaet (idempotent)
    pub fn entfernen(&self, identity: &UserIdentity) -> Option<Arc<Session>> {
        let entfernt = self.sessions.remove(identity).map(|(_, s)| s);
        if entfernt.is_some() {
            tracing::debug!(identity = %identity, "Session aus Registry entfernt");
        }
        entfernt
    }

    /// Entfernt den Eintrag nur wenn er genau diese Session ist
    ///
    /// Eine inzwischen nachfolgende Session derselben Identitaet bleibt stehen.
    pub fn session_entfernen(&self, session: &Session) -> bool {
        let entfernt = self
            .sessions
            .remove_if(session.identity(), |_, s| s.id() == session.id())
            .is_some();
        if entfernt {
            tracing::debug!(
                identity = %session.identity(),
                session = %session.id(),
                "Session aus Registry entfernt"
            );
        }
        entfernt
    }

    /// Schliesst alle registrierten Sessions regulaer, leert die Registry
    /// und weist danach jede weitere Registrierung ab
    ///
    /// Gibt die Anzahl der geschlossenen Sessions zurueck.
    pub fn alle_schliessen(&self) -> usize {
        self.geschlossen.store(true, Ordering::SeqCst);
        let mut entnommen = Vec::new();
        self.sessions.retain(|_, s| {
            entnommen.push(Arc::clone(s));
            false
        });

        let geschlossen = entnommen.iter().filter(|s| s.schliessen()).count();
        tracing::info!(anzahl = geschlossen, "Alle Sessions geschlossen");
        geschlossen
    }

    pub fn ist_geschlossen(&self) -> bool {
        self.geschlossen.load(Ordering::SeqCst)
    }

    pub fn anzahl(&self) -> usize {
        self.sessions.len()
    }

    pub fn ist_leer(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ist_registriert(&self, identity: &UserIdentity) -> bool {
        self.sessions.contains_key(identity)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
