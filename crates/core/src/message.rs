//! Message and Conversation domain types.
//!
//! These are the records the persistence collaborator owns. The turn
//! pipeline only reads `id`, `context_frame` and the message
//! `role`/`content`/`english_content` triple.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::ContextFrame;

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The farmer asking
    User,
    /// The agent answering
    Assistant,
    /// Instructions sent to the generation model
    System,
}

impl Role {
    /// Label used when history is rendered into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => "System",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text as the user saw it (original language)
    pub content: String,

    /// Working-language rendering of `content`, when it was translated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english_content: Option<String>,

    /// Detected language code of `content`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Optional metadata (linked image artifacts, etc.)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            english_content: None,
            original_language: None,
            timestamp: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Attach the working-language rendering and the detected language.
    pub fn with_translation(
        mut self,
        english_content: impl Into<String>,
        original_language: impl Into<String>,
    ) -> Self {
        self.english_content = Some(english_content.into());
        self.original_language = Some(original_language.into());
        self
    }

    /// The text to show the classifier: the English rendering if present.
    pub fn working_text(&self) -> &str {
        self.english_content
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.content)
    }
}

/// A compact `role: text` pair, used for the memory source and the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryLine {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for HistoryLine {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.working_text().to_string(),
        }
    }
}

/// A conversation record with its carried-over context frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    /// Owner of the conversation
    pub user_id: String,

    /// Optional title (generated after the first turn)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Entities resolved in earlier turns
    #[serde(default)]
    pub context_frame: ContextFrame,

    /// Bumped on every frame write; used to reject stale writes
    #[serde(default)]
    pub frame_version: u64,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the conversation was last touched
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new conversation with an empty context frame.
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            user_id: user_id.into(),
            title: None,
            context_frame: ContextFrame::default(),
            frame_version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
