//! Durable meeting/option store.
//!
//! SQLite-backed persistence for meetings, their candidate options, and the
//! option→message anchors recorded at publish time. Every write is awaited
//! before the call returns, so a crash after a successful call never loses
//! the record. Records are create/append only; nothing here mutates or
//! deletes a meeting once written.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Pool, Sqlite};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Caller input rejected before touching the database.
    #[error("{0}")]
    Invalid(String),

    #[error("meeting {0} not found")]
    UnknownMeeting(i64),

    #[error("storage error: {0}")]
    Storage(String),
}

/// One poll instance: a title published to one channel.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Meeting {
    pub id: i64,
    pub title: String,
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
}

/// One candidate time within a meeting. `position` is the 1-based display
/// order, which is also the candidate index embedded in the published
/// message.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MeetingOption {
    pub id: i64,
    pub meeting_id: i64,
    pub position: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Binding from an option to the Slack message carrying its voting
/// reactions. Written at publish time, read-only afterward.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Anchor {
    pub option_id: i64,
    pub channel_id: String,
    pub message_ts: String,
}

#[derive(Clone)]
pub struct MeetingStore {
    pool: Pool<Sqlite>,
}

impl MeetingStore {
    /// Open (creating if necessary) the database at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Storage(format!("failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("failed to open {}: {}", path.display(), e)))?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Fresh private in-memory database. Single connection, so the schema
    /// outlives individual queries.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("failed to open in-memory db: {e}")))?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS meetings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                channel_id TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("failed to create meetings table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS options (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                meeting_id INTEGER NOT NULL REFERENCES meetings(id),
                position INTEGER NOT NULL,
                text TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("failed to create options table: {e}")))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_options_meeting ON options(meeting_id)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("failed to create options index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS anchors (
                option_id INTEGER PRIMARY KEY REFERENCES options(id),
                channel_id TEXT NOT NULL,
                message_ts TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("failed to create anchors table: {e}")))?;

        Ok(())
    }

    pub async fn create_meeting(
        &self,
        title: &str,
        channel_id: &str,
    ) -> Result<Meeting, StoreError> {
        if title.trim().is_empty() {
            return Err(StoreError::Invalid(
                "meeting title must not be empty".to_string(),
            ));
        }
        if channel_id.trim().is_empty() {
            return Err(StoreError::Invalid(
                "meeting channel must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO meetings (title, channel_id, created_at) VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(title)
        .bind(channel_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("failed to insert meeting: {e}")))?;

        Ok(Meeting {
            id: result.last_insert_rowid(),
            title: title.to_string(),
            channel_id: channel_id.to_string(),
            created_at: now,
        })
    }

    pub async fn get_meeting(&self, meeting_id: i64) -> Result<Meeting, StoreError> {
        sqlx::query_as::<_, Meeting>(
            r#"
            SELECT id, title, channel_id, created_at FROM meetings WHERE id = ?1
            "#,
        )
        .bind(meeting_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("failed to load meeting: {e}")))?
        .ok_or(StoreError::UnknownMeeting(meeting_id))
    }

    /// All meetings, newest first.
    pub async fn list_meetings(&self) -> Result<Vec<Meeting>, StoreError> {
        sqlx::query_as::<_, Meeting>(
            r#"
            SELECT id, title, channel_id, created_at FROM meetings ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("failed to list meetings: {e}")))
    }

    /// Append one option to a meeting. The position is assigned after the
    /// meeting's current last option.
    pub async fn add_option(
        &self,
        meeting_id: i64,
        text: &str,
    ) -> Result<MeetingOption, StoreError> {
        let mut options = self.add_options(meeting_id, &[text.to_string()]).await?;
        Ok(options.remove(0))
    }

    /// Append options to a meeting in the given order, as one transaction.
    pub async fn add_options(
        &self,
        meeting_id: i64,
        texts: &[String],
    ) -> Result<Vec<MeetingOption>, StoreError> {
        for text in texts {
            if text.trim().is_empty() {
                return Err(StoreError::Invalid(
                    "option text must not be empty".to_string(),
                ));
            }
        }
        self.get_meeting(meeting_id).await?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("failed to begin transaction: {e}")))?;

        let next_position: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(position), 0) + 1 FROM options WHERE meeting_id = ?1
            "#,
        )
        .bind(meeting_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("failed to read option positions: {e}")))?;

        let now = Utc::now();
        let mut inserted = Vec::with_capacity(texts.len());
        for (offset, text) in texts.iter().enumerate() {
            let position = next_position + offset as i64;
            let result = sqlx::query(
                r#"
                INSERT INTO options (meeting_id, position, text, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(meeting_id)
            .bind(position)
            .bind(text)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("failed to insert option: {e}")))?;

            inserted.push(MeetingOption {
                id: result.last_insert_rowid(),
                meeting_id,
                position,
                text: text.clone(),
                created_at: now,
            });
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("failed to commit options: {e}")))?;

        Ok(inserted)
    }

    /// Options of a meeting in display order.
    pub async fn list_options(&self, meeting_id: i64) -> Result<Vec<MeetingOption>, StoreError> {
        self.get_meeting(meeting_id).await?;
        sqlx::query_as::<_, MeetingOption>(
            r#"
            SELECT id, meeting_id, position, text, created_at
            FROM options WHERE meeting_id = ?1
            ORDER BY position, id
            "#,
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("failed to list options: {e}")))
    }

    /// Record the message anchors for published options. Re-publishing an
    /// option replaces its anchor.
    pub async fn save_anchors(&self, anchors: &[Anchor]) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("failed to begin transaction: {e}")))?;

        for anchor in anchors {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO anchors (option_id, channel_id, message_ts)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(anchor.option_id)
            .bind(&anchor.channel_id)
            .bind(&anchor.message_ts)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("failed to save anchor: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("failed to commit anchors: {e}")))?;

        Ok(())
    }

    /// Anchors of a meeting's options, in option display order.
    pub async fn anchors_for_meeting(&self, meeting_id: i64) -> Result<Vec<Anchor>, StoreError> {
        sqlx::query_as::<_, Anchor>(
            r#"
            SELECT a.option_id, a.channel_id, a.message_ts
            FROM anchors a
            JOIN options o ON o.id = a.option_id
            WHERE o.meeting_id = ?1
            ORDER BY o.position, o.id
            "#,
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("failed to load anchors: {e}")))
    }
}
