//! Ausgehender Stream eines `OpenStream`-Aufrufs
//!
//! Ein begrenzter mpsc-Kanal, dessen Empfaenger als `ReceiverStream` an tonic
//! geht. Ist der Empfaenger weg (Client getrennt), schlaegt der Push fehl.

use std::sync::Arc;

use async_trait::async_trait;
use plauder_delivery::{BroadcastPayload, OutboundSink, PayloadKind, SinkError};
use tokio::sync::mpsc;
use tonic::Status;

use crate::proto::{ContentMessage, Point, StreamItem};

pub type StreamSender = mpsc::Sender<Result<StreamItem, Status>>;

pub struct KanalSink {
    tx: StreamSender,
}

impl KanalSink {
    pub fn neu(tx: StreamSender) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl OutboundSink for KanalSink {
    async fn push(&self, payload: Arc<BroadcastPayload>) -> Result<(), SinkError> {
        self.tx
            .send(Ok(stream_item(&payload)))
            .await
            .map_err(|_| SinkError::Geschlossen)
    }
}

/// Uebersetzt einen Payload in das Stream-Element des Protokolls
pub fn stream_item(payload: &BroadcastPayload) -> StreamItem {
    let room_key = payload.room_key.als_str().to_string();
    match &payload.kind {
        PayloadKind::Message(m) => StreamItem {
            is_message: true,
            message: Some(ContentMessage {
                room_key,
                content: m.content.clone(),
                sender: m.sender.als_str().to_string(),
                sent_at_ms: m.sent_at.timestamp_millis(),
            }),
            point: None,
        },
        PayloadKind::Point(p) => StreamItem {
            is_message: false,
            message: None,
            point: Some(Point {
                room_key,
                x: p.x,
                y: p.y,
                sender: p.sender.als_str().to_string(),
                sent_at_ms: p.sent_at.timestamp_millis(),
            }),
        },
    }
}
