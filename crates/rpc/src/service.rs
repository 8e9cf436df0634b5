//! ChatService-Implementierung
//!
//! Benutzer- und Raumverwaltung gehen direkt an die Datenbank, die
//! Echtzeit-Methoden an Stream-Handler und Broadcast-Engine.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use plauder_auth::TokenService;
use plauder_core::{RoomKey, RoomType, UserIdentity};
use plauder_db::models::{BenutzerRecord, NeueMitgliedschaft, NeuerBenutzer, NeuerRaum};
use plauder_db::{RoomRepository, SqliteDb, UserRepository};
use plauder_delivery::{
    BroadcastEngine, BroadcastKonfig, BroadcastPayload, ConnectionRegistry, DeliveryError,
    MembershipError, MembershipLookup, StreamHandler,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};
use uuid::Uuid;

use crate::auth::angemeldet;
use crate::error::{rpc_error_zu_status, RpcError, RpcResult};
use crate::membership::DbMitglieder;
use crate::proto::chat_service_server::ChatService;
use crate::proto::*;
use crate::sink::KanalSink;

/// Maximale Treffer einer Benutzersuche
const SUCH_LIMIT: i64 = 50;

/// Einstellungen der RPC-Schicht
#[derive(Debug, Clone)]
pub struct RpcKonfig {
    /// Kapazitaet des ausgehenden Kanals pro Stream
    pub sende_queue_groesse: usize,
    /// `None` = kein Zeitlimit pro Push
    pub push_zeitlimit: Option<Duration>,
}

impl Default for RpcKonfig {
    fn default() -> Self {
        Self {
            sende_queue_groesse: 64,
            push_zeitlimit: BroadcastKonfig::default().push_zeitlimit,
        }
    }
}

pub struct ChatServiceImpl {
    db: Arc<SqliteDb>,
    tokens: Arc<TokenService>,
    mitglieder: Arc<DbMitglieder>,
    engine: BroadcastEngine,
    streams: StreamHandler,
    sende_queue_groesse: usize,
}

impl ChatServiceImpl {
    pub fn neu(
        db: Arc<SqliteDb>,
        tokens: Arc<TokenService>,
        registry: ConnectionRegistry,
        konfig: RpcKonfig,
    ) -> Self {
        let mitglieder = Arc::new(DbMitglieder::neu(Arc::clone(&db)));
        let engine = BroadcastEngine::neu(
            registry.clone(),
            mitglieder.clone(),
            BroadcastKonfig {
                push_zeitlimit: konfig.push_zeitlimit,
            },
        );
        Self {
            db,
            tokens,
            mitglieder,
            engine,
            streams: StreamHandler::neu(registry),
            // mpsc::channel verlangt eine Kapazitaet > 0
            sende_queue_groesse: konfig.sende_queue_groesse.max(1),
        }
    }

    /// Laedt die Mitglieder von `room_key` und prueft dabei, ob `identity`
    /// dazugehoert. Die Liste wird fuer den anschliessenden Broadcast
    /// weiterverwendet.
    async fn mitglieder_fuer(
        &self,
        room_key: &RoomKey,
        identity: &UserIdentity,
    ) -> RpcResult<Vec<UserIdentity>> {
        match self.mitglieder.mitglieder(room_key).await {
            Ok(m) if m.contains(identity) => Ok(m),
            Ok(_) | Err(MembershipError::NichtGefunden(_)) => Err(RpcError::KeinZugriff(
                format!("{identity} ist kein Mitglied von {room_key}"),
            )),
            Err(MembershipError::Upstream(grund)) => {
                Err(DeliveryError::MitgliederNichtErmittelbar {
                    room_key: room_key.clone(),
                    grund,
                }
                .into())
            }
        }
    }
}

#[tonic::async_trait]
impl ChatService for ChatServiceImpl {
    async fn register_user(
        &self,
        request: Request<User>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let body = request.into_inner();
        let identity = UserIdentity::neu(body.email)
            .map_err(|e| rpc_error_zu_status(e.into()))?;

        let record = self
            .db
            .create(NeuerBenutzer {
                email: identity.als_str(),
                username: body.username.trim(),
                name: body.name.trim(),
                photo_url: body.photo_url.trim(),
            })
            .await
            .map_err(|e| rpc_error_zu_status(e.into()))?;

        tracing::info!(identity = %identity, "Benutzer registriert");
        Ok(Response::new(RegisterResponse {
            result: Some(benutzer_zu_proto(record)),
        }))
    }

    async fn sign_in(
        &self,
        request: Request<SignInRequest>,
    ) -> Result<Response<SignInResponse>, Status> {
        let identity = UserIdentity::neu(request.into_inner().email)
            .map_err(|e| rpc_error_zu_status(e.into()))?;

        let record = self
            .db
            .get_by_email(identity.als_str())
            .await
            .map_err(|e| rpc_error_zu_status(e.into()))?
            .ok_or_else(|| {
                rpc_error_zu_status(RpcError::NichtGefunden(format!("Benutzer {identity}")))
            })?;

        let token = self
            .tokens
            .ausstellen(&identity, &record.name)
            .map_err(|e| rpc_error_zu_status(e.into()))?;

        tracing::info!(identity = %identity, "Benutzer angemeldet");
        Ok(Response::new(SignInResponse {
            user: Some(benutzer_zu_proto(record)),
            token,
        }))
    }

    async fn search_user(
        &self,
        request: Request<SearchParams>,
    ) -> Result<Response<SearchResponse>, Status> {
        angemeldet(&request)?;
        let query = request.into_inner().query;
        let query = query.trim();
        if query.is_empty() {
            return Err(Status::invalid_argument("Suchbegriff darf nicht leer sein"));
        }

        let treffer = self
            .db
            .search(query, SUCH_LIMIT)
            .await
            .map_err(|e| rpc_error_zu_status(e.into()))?;
        if treffer.is_empty() {
            return Err(Status::not_found(format!("Kein Benutzer passt zu '{query}'")));
        }

        Ok(Response::new(SearchResponse {
            users: treffer.into_iter().map(benutzer_zu_proto).collect(),
        }))
    }

    async fn create_room(&self, request: Request<Room>) -> Result<Response<Empty>, Status> {
        let aufrufer = angemeldet(&request)?;
        let body = request.into_inner();
        let room_key = RoomKey::neu(body.room_key).map_err(|e| rpc_error_zu_status(e.into()))?;
        let room_type =
            RoomType::from_str(body.r#type.trim()).map_err(|e| rpc_error_zu_status(e.into()))?;
        let created_by = match body.created_by.trim() {
            "" => aufrufer.als_str().to_string(),
            angegeben => angegeben.to_string(),
        };

        self.db
            .create_room(NeuerRaum {
                room_key: room_key.als_str(),
                room_type,
                created_by: &created_by,
            })
            .await
            .map_err(|e| rpc_error_zu_status(e.into()))?;

        tracing::info!(room = %room_key, typ = room_type.als_str(), von = %aufrufer, "Raum erstellt");
        Ok(Response::new(Empty {}))
    }

    async fn add_user_to_room(
        &self,
        request: Request<UserRoom>,
    ) -> Result<Response<Empty>, Status> {
        let aufrufer = angemeldet(&request)?;
        let body = request.into_inner();
        let room_key = RoomKey::neu(body.room_key).map_err(|e| rpc_error_zu_status(e.into()))?;
        let mitglied =
            UserIdentity::neu(body.user_email).map_err(|e| rpc_error_zu_status(e.into()))?;
        let uuid = match body.uuid.trim() {
            "" => None,
            s => Some(Uuid::parse_str(s).map_err(|_| {
                rpc_error_zu_status(RpcError::UngueltigeEingabe(format!("Keine gueltige UUID: {s}")))
            })?),
        };

        self.db
            .add_member(NeueMitgliedschaft {
                uuid,
                user_email: mitglied.als_str(),
                room_key: room_key.als_str(),
            })
            .await
            .map_err(|e| rpc_error_zu_status(e.into()))?;

        tracing::info!(room = %room_key, mitglied = %mitglied, von = %aufrufer, "Mitglied hinzugefuegt");
        Ok(Response::new(Empty {}))
    }

    type OpenStreamStream = ReceiverStream<Result<StreamItem, Status>>;

    async fn open_stream(
        &self,
        request: Request<StreamConnect>,
    ) -> Result<Response<Self::OpenStreamStream>, Status> {
        let identity = angemeldet(&request)?;
        let room_key = RoomKey::neu(request.into_inner().room_key)
            .map_err(|e| rpc_error_zu_status(e.into()))?;
        self.mitglieder_fuer(&room_key, &identity)
            .await
            .map_err(rpc_error_zu_status)?;

        // Ein Platz mehr als die Sende-Queue, reserviert fuer den Abschluss-Status
        let (tx, rx) = mpsc::channel(self.sende_queue_groesse + 1);
        let abschluss = tx
            .clone()
            .reserve_owned()
            .await
            .map_err(|_| Status::unavailable("Stream vor dem Start geschlossen"))?;
        let sink = Arc::new(KanalSink::neu(tx.clone()));
        let streams = self.streams.clone();

        tokio::spawn(async move {
            let ergebnis = streams.oeffnen(identity, room_key, sink, tx.closed()).await;
            if let Err(e) = ergebnis {
                abschluss.send(Err(rpc_error_zu_status(e.into())));
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn send_message(
        &self,
        request: Request<ContentMessage>,
    ) -> Result<Response<Empty>, Status> {
        let identity = angemeldet(&request)?;
        let body = request.into_inner();
        let room_key = RoomKey::neu(body.room_key).map_err(|e| rpc_error_zu_status(e.into()))?;
        let mitglieder = self
            .mitglieder_fuer(&room_key, &identity)
            .await
            .map_err(rpc_error_zu_status)?;

        self.engine
            .an_mitglieder_verteilen(
                BroadcastPayload::nachricht(room_key, identity, body.content),
                mitglieder,
            )
            .await;
        Ok(Response::new(Empty {}))
    }

    async fn share_point(&self, request: Request<Point>) -> Result<Response<Empty>, Status> {
        let identity = angemeldet(&request)?;
        let body = request.into_inner();
        let room_key = RoomKey::neu(body.room_key).map_err(|e| rpc_error_zu_status(e.into()))?;
        let mitglieder = self
            .mitglieder_fuer(&room_key, &identity)
            .await
            .map_err(rpc_error_zu_status)?;

        self.engine
            .an_mitglieder_verteilen(
                BroadcastPayload::punkt(room_key, identity, body.x, body.y),
                mitglieder,
            )
            .await;
        Ok(Response::new(Empty {}))
    }
}

// ---------------------------------------------------------------------------
// Hilfsfunktionen
// ---------------------------------------------------------------------------

fn benutzer_zu_proto(b: BenutzerRecord) -> User {
    User {
        email: b.email,
        name: b.name,
        username: b.username,
        photo_url: b.photo_url,
    }
}
