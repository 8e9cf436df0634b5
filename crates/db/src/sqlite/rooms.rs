//! SQLite-Implementierung des RoomRepository

use chrono::Utc;
use plauder_core::RoomType;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{MitgliedschaftRecord, NeueMitgliedschaft, NeuerRaum, RaumRecord};
use crate::repository::{DbResult, RoomRepository};
use crate::sqlite::{pool::SqliteDb, zeit_parsen};

impl RoomRepository for SqliteDb {
    async fn create_room(&self, data: NeuerRaum<'_>) -> DbResult<RaumRecord> {
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO rooms (room_key, room_type, created_by, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(data.room_key)
        .bind(data.room_type.als_str())
        .bind(data.created_by)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::aus_constraint(e, format!("Raum '{}' existiert bereits", data.room_key)))?;

        tracing::debug!(room_key = data.room_key, typ = %data.room_type, "Raum angelegt");

        Ok(RaumRecord {
            room_key: data.room_key.to_string(),
            room_type: data.room_type,
            created_by: data.created_by.to_string(),
            created_at: now,
        })
    }

    async fn get_room(&self, room_key: &str) -> DbResult<Option<RaumRecord>> {
        let row = sqlx::query(
            "SELECT room_key, room_type, created_by, created_at
             FROM rooms WHERE room_key = ?",
        )
        .bind(room_key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_raum(&r)).transpose()
    }

    async fn add_member(&self, data: NeueMitgliedschaft<'_>) -> DbResult<MitgliedschaftRecord> {
        let uuid = data.uuid.unwrap_or_else(Uuid::new_v4);

        sqlx::query("INSERT INTO user_rooms (uuid, user_email, room_key) VALUES (?, ?, ?)")
            .bind(uuid.to_string())
            .bind(data.user_email)
            .bind(data.room_key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DbError::aus_constraint(
                    e,
                    format!("Mitgliedschaft {} in '{}'", data.user_email, data.room_key),
                )
            })?;

        tracing::debug!(
            room_key = data.room_key,
            user_email = data.user_email,
            "Benutzer dem Raum hinzugefuegt"
        );

        Ok(MitgliedschaftRecord {
            uuid,
            user_email: data.user_email.to_string(),
            room_key: data.room_key.to_string(),
        })
    }

    async fn members(&self, room_key: &str) -> DbResult<Vec<MitgliedschaftRecord>> {
        let rows = sqlx::query(
            "SELECT uuid, user_email, room_key FROM user_rooms
             WHERE room_key = ? ORDER BY user_email",
        )
        .bind(room_key)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(DbError::nicht_gefunden(format!("Mitglieder von Raum '{room_key}'")));
        }

        rows.iter().map(row_to_mitgliedschaft).collect()
    }
}

fn row_to_raum(row: &sqlx::sqlite::SqliteRow) -> DbResult<RaumRecord> {
    use sqlx::Row as _;

    let typ: String = row.try_get("room_type")?;
    let room_type: RoomType = typ
        .parse()
        .map_err(|e| DbError::intern(format!("Ungueltiger room_type '{typ}': {e}")))?;
    let created_at: String = row.try_get("created_at")?;

    Ok(RaumRecord {
        room_key: row.try_get("room_key")?,
        room_type,
        created_by: row.try_get("created_by")?,
        created_at: zeit_parsen("created_at", &created_at)?,
    })
}

fn row_to_mitgliedschaft(row: &sqlx::sqlite::SqliteRow) -> DbResult<MitgliedschaftRecord> {
    use sqlx::Row as _;

    let uuid_str: String = row.try_get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_str)
        .map_err(|e| DbError::intern(format!("Ungueltige UUID '{uuid_str}': {e}")))?;

    Ok(MitgliedschaftRecord {
        uuid,
        user_email: row.try_get("user_email")?,
        room_key: row.try_get("room_key")?,
    })
}
