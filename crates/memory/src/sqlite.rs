//! SQLite conversation store.
//!
//! Uses a single SQLite database file with two tables:
//! - `conversations` — one row per conversation, the context frame stored as
//!   JSON next to its `frame_version` stamp
//! - `messages` — the message log, ordered by an integer rowid alias
//!
//! Frame writes are a compare-and-set on `frame_version`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldvoice_core::context::ContextFrame;
use fieldvoice_core::error::StoreError;
use fieldvoice_core::message::{Conversation, ConversationId, Message, Role};
use fieldvoice_core::store::ConversationStore;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let in_memory = path.contains(":memory:");
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        // Every connection to :memory: is a separate database.
        let max_connections = if in_memory { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite conversation store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id             TEXT PRIMARY KEY NOT NULL,
                user_id        TEXT NOT NULL,
                title          TEXT,
                context_frame  TEXT NOT NULL DEFAULT '{}',
                frame_version  INTEGER NOT NULL DEFAULT 0,
                created_at     TEXT NOT NULL,
                updated_at     TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("conversations table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                iid               INTEGER PRIMARY KEY AUTOINCREMENT,
                id                TEXT UNIQUE NOT NULL,
                conversation_id   TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                role              TEXT NOT NULL,
                content           TEXT NOT NULL,
                english_content   TEXT,
                original_language TEXT,
                timestamp         TEXT NOT NULL,
                metadata          TEXT NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, iid)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("messages index: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_conversations_user ON conversations(user_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("conversations index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let frame = serde_json::to_string(&conversation.context_frame)
            .map_err(|e| StoreError::Storage(format!("Frame serialization: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO conversations (id, user_id, title, context_frame, frame_version, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(conversation.id.as_str())
        .bind(&conversation.user_id)
        .bind(&conversation.title)
        .bind(&frame)
        .bind(conversation.frame_version as i64)
        .bind(conversation.created_at.to_rfc3339())
        .bind(conversation.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT conversation failed: {e}")))?;

        Ok(())
    }

    async fn find_conversation(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("SELECT conversation failed: {e}")))?;

        row.as_ref().map(Self::row_to_conversation).transpose()
    }

    async fn touch(&self, id: &ConversationId) -> Result<(), StoreError> {
        sqlx::query("UPDATE conversations SET updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now().to_rfc3339())
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("UPDATE updated_at failed: {e}")))?;
        Ok(())
    }

    fn row_to_conversation(row: &sqlx::sqlite::SqliteRow) -> Result<Conversation, StoreError> {
        let column = |name: &str, e: sqlx::Error| StoreError::Storage(format!("{name} column: {e}"));

        let id: String = row.try_get("id").map_err(|e| column("id", e))?;
        let user_id: String = row.try_get("user_id").map_err(|e| column("user_id", e))?;
        let title: Option<String> = row.try_get("title").map_err(|e| column("title", e))?;
        let frame_json: String = row
            .try_get("context_frame")
            .map_err(|e| column("context_frame", e))?;
        let frame_version: i64 = row
            .try_get("frame_version")
            .map_err(|e| column("frame_version", e))?;
        let created_at: String = row.try_get("created_at").map_err(|e| column("created_at", e))?;
        let updated_at: String = row.try_get("updated_at").map_err(|e| column("updated_at", e))?;

        let context_frame: ContextFrame = serde_json::from_str(&frame_json)
            .map_err(|e| StoreError::Storage(format!("Corrupt context frame for {id}: {e}")))?;

        Ok(Conversation {
            id: ConversationId(id),
            user_id,
            title,
            context_frame,
            frame_version: frame_version.max(0) as u64,
            created_at: parse_time(&created_at),
            updated_at: parse_time(&updated_at),
        })
    }

    fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<Message, StoreError> {
        let column = |name: &str, e: sqlx::Error| StoreError::Storage(format!("{name} column: {e}"));

        let role: String = row.try_get("role").map_err(|e| column("role", e))?;
        let metadata: String = row.try_get("metadata").map_err(|e| column("metadata", e))?;
        let timestamp: String = row.try_get("timestamp").map_err(|e| column("timestamp", e))?;
        let id: String = row.try_get("id").map_err(|e| column("id", e))?;

        let metadata = serde_json::from_str(&metadata)
            .map_err(|e| StoreError::Storage(format!("Corrupt metadata for message {id}: {e}")))?;

        Ok(Message {
            id,
            role: parse_role(&role)?,
            content: row.try_get("content").map_err(|e| column("content", e))?,
            english_content: row
                .try_get("english_content")
                .map_err(|e| column("english_content", e))?,
            original_language: row
                .try_get("original_language")
                .map_err(|e| column("original_language", e))?,
            timestamp: parse_time(&timestamp),
            metadata,
        })
    }
}

fn parse_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

fn parse_role(s: &str) -> Result<Role, StoreError> {
    match s {
        "user" => Ok(Role::User),
        "assistant" => Ok(Role::Assistant),
        "system" => Ok(Role::System),
        other => Err(StoreError::Storage(format!("Unknown message role '{other}'"))),
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn ensure_conversation(
        &self,
        user_id: &str,
        id: Option<&ConversationId>,
    ) -> Result<Conversation, StoreError> {
        if let Some(id) = id {
            if let Some(existing) = self.find_conversation(id).await? {
                if existing.user_id != user_id {
                    return Err(StoreError::NotFound(id.to_string()));
                }
                return Ok(existing);
            }
        }

        let mut conversation = Conversation::new(user_id);
        if let Some(id) = id {
            conversation.id = id.clone();
        }
        self.insert_conversation(&conversation).await?;
        debug!(conversation_id = %conversation.id, user_id, "Created conversation");
        Ok(conversation)
    }

    async fn get_conversation(&self, id: &ConversationId) -> Result<Conversation, StoreError> {
        self.find_conversation(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn save_message(&self, id: &ConversationId, message: Message) -> Result<Message, StoreError> {
        if self.find_conversation(id).await?.is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let metadata = serde_json::to_string(&message.metadata)
            .map_err(|e| StoreError::Storage(format!("Metadata serialization: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, english_content, original_language, timestamp, metadata)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&message.id)
        .bind(id.as_str())
        .bind(role_str(message.role))
        .bind(&message.content)
        .bind(&message.english_content)
        .bind(&message.original_language)
        .bind(message.timestamp.to_rfc3339())
        .bind(&metadata)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT message failed: {e}")))?;

        self.touch(id).await?;
        Ok(message)
    }

    async fn update_context_frame(
        &self,
        id: &ConversationId,
        frame: &ContextFrame,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let frame_json = serde_json::to_string(frame)
            .map_err(|e| StoreError::Storage(format!("Frame serialization: {e}")))?;

        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET context_frame = ?1, frame_version = frame_version + 1, updated_at = ?2
            WHERE id = ?3 AND frame_version = ?4
            "#,
        )
        .bind(&frame_json)
        .bind(Utc::now().to_rfc3339())
        .bind(id.as_str())
        .bind(expected_version as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("UPDATE context_frame failed: {e}")))?;

        if result.rows_affected() == 1 {
            return Ok(expected_version + 1);
        }

        match self.find_conversation(id).await? {
            None => Err(StoreError::NotFound(id.to_string())),
            Some(current) => Err(StoreError::VersionConflict {
                conversation_id: id.to_string(),
                expected: expected_version,
                found: current.frame_version,
            }),
        }
    }

    async fn update_title(&self, id: &ConversationId, title: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE conversations SET title = ?1 WHERE id = ?2")
            .bind(title)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("UPDATE title failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn recent_history(&self, id: &ConversationId, limit: usize) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM (
                SELECT * FROM messages WHERE conversation_id = ?1 ORDER BY iid DESC LIMIT ?2
            ) ORDER BY iid ASC
            "#,
        )
        .bind(id.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("SELECT history failed: {e}")))?;

        rows.iter().map(Self::row_to_message).collect()
    }
}
