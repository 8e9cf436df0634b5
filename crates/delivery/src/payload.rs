//! Broadcast-Payloads
//!
//! Genau eine Variante pro Push. Die Variante ist fuer den Fan-out opak und
//! wird erst an der Transportgrenze in das Stream-Element uebersetzt.

use chrono::{DateTime, Utc};
use plauder_core::{RoomKey, UserIdentity};

/// Chat-Nachricht
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: UserIdentity,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

/// Fluechtiger Punkt (wird nie persistiert)
#[derive(Debug, Clone, PartialEq)]
pub struct SharedPoint {
    pub sender: UserIdentity,
    pub x: f64,
    pub y: f64,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PayloadKind {
    Message(ChatMessage),
    Point(SharedPoint),
}

/// Ein an einen Raum adressierter Payload
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastPayload {
    pub room_key: RoomKey,
    pub kind: PayloadKind,
}

impl BroadcastPayload {
    /// Chat-Nachricht mit aktuellem Zeitstempel
    pub fn nachricht(room_key: RoomKey, sender: UserIdentity, content: impl Into<String>) -> Self {
        Self {
            room_key,
            kind: PayloadKind::Message(ChatMessage {
                sender,
                content: content.into(),
                sent_at: Utc::now(),
            }),
        }
    }

    /// Punkt-Event mit aktuellem Zeitstempel
    pub fn punkt(room_key: RoomKey, sender: UserIdentity, x: f64, y: f64) -> Self {
        Self {
            room_key,
            kind: PayloadKind::Point(SharedPoint {
                sender,
                x,
                y,
                sent_at: Utc::now(),
            }),
        }
    }

    /// Kurzbezeichnung fuer Log-Felder
    pub fn art(&self) -> &'static str {
        match self.kind {
            PayloadKind::Message(_) => "message",
            PayloadKind::Point(_) => "point",
        }
    }
}
