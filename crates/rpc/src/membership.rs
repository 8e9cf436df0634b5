//! Mitglieder-Abfrage ueber die Datenbank

use std::sync::Arc;

use async_trait::async_trait;
use plauder_core::{RoomKey, UserIdentity};
use plauder_db::{DbError, RoomRepository, SqliteDb};
use plauder_delivery::{MembershipError, MembershipLookup};

/// Liest Raum-Mitgliedschaften aus `user_rooms`
#[derive(Debug, Clone)]
pub struct DbMitglieder {
    db: Arc<SqliteDb>,
}

impl DbMitglieder {
    pub fn neu(db: Arc<SqliteDb>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MembershipLookup for DbMitglieder {
    async fn mitglieder(&self, room_key: &RoomKey) -> Result<Vec<UserIdentity>, MembershipError> {
        let records = match self.db.members(room_key.als_str()).await {
            Ok(r) => r,
            Err(DbError::NichtGefunden(msg)) => return Err(MembershipError::NichtGefunden(msg)),
            Err(e) => return Err(MembershipError::Upstream(e.to_string())),
        };

        records
            .into_iter()
            .map(|r| UserIdentity::neu(r.user_email).map_err(|e| MembershipError::Upstream(e.to_string())))
            .collect()
    }
}
