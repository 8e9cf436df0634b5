//! SQLite-Implementierung des UserRepository

use chrono::Utc;

use crate::error::DbError;
use crate::models::{BenutzerRecord, NeuerBenutzer};
use crate::repository::{DbResult, UserRepository};
use crate::sqlite::{pool::SqliteDb, zeit_parsen};

impl UserRepository for SqliteDb {
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO users (email, username, name, photo_url, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(data.email)
        .bind(data.username)
        .bind(data.name)
        .bind(data.photo_url)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::aus_constraint(e, format!("E-Mail '{}' bereits registriert", data.email)))?;

        Ok(BenutzerRecord {
            email: data.email.to_string(),
            username: data.username.to_string(),
            name: data.name.to_string(),
            photo_url: data.photo_url.to_string(),
            created_at: now,
        })
    }

    async fn get_by_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>> {
        let row = sqlx::query(
            "SELECT email, username, name, photo_url, created_at
             FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<BenutzerRecord>> {
        let muster = format!("%{}%", query.to_lowercase());
        let rows = sqlx::query(
            "SELECT email, username, name, photo_url, created_at
             FROM users
             WHERE lower(username) LIKE ? OR lower(name) LIKE ?
             ORDER BY name, email
             LIMIT ?",
        )
        .bind(&muster)
        .bind(&muster)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_benutzer).collect()
    }
}

fn row_to_benutzer(row: &sqlx::sqlite::SqliteRow) -> DbResult<BenutzerRecord> {
    use sqlx::Row as _;

    let created_at: String = row.try_get("created_at")?;

    Ok(BenutzerRecord {
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        name: row.try_get("name")?,
        photo_url: row.try_get("photo_url")?,
        created_at: zeit_parsen("created_at", &created_at)?,
    })
}
