//! Remote store traits and types
//!
//! Defines the common interface for the document store (messages and
//! conversation summaries) and the object store (uploaded images).

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

use crate::database::{ChatSummary, MessageDocument, NewMessageDocument, SummaryUpdate};

/// Collection holding one document per chat turn
pub const MESSAGES_COLLECTION: &str = "report-messages";
/// Collection holding one summary document per conversation, keyed by chat id
pub const CHATS_COLLECTION: &str = "report-chats";

/// Error types for store operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store not reachable (connection refused, DNS, etc.)
    Unavailable(String),
    /// Request reached the store and was rejected
    RequestFailed(String),
    /// Response could not be understood
    InvalidResponse(String),
    /// Local database failure
    Database(String),
    /// Local filesystem failure
    Io(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            StoreError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            StoreError::Database(msg) => write!(f, "Database error: {}", msg),
            StoreError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<anyhow::Error> for StoreError {
    fn from(e: anyhow::Error) -> Self {
        // {:#} keeps the context chain on one line
        StoreError::Database(format!("{:#}", e))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            StoreError::Unavailable(e.to_string())
        } else if e.is_decode() {
            StoreError::InvalidResponse(e.to_string())
        } else {
            StoreError::RequestFailed(e.to_string())
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

/// Schema-less document store holding report messages and chat summaries
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store name for logging (e.g., "sqlite", "rest")
    fn store_name(&self) -> &'static str;

    /// Insert a message document; the store assigns id and timestamp
    async fn insert_message(&self, message: NewMessageDocument) -> Result<MessageDocument, StoreError>;

    /// All messages with the given chat id, ordered by timestamp ascending
    async fn messages_for_chat(&self, chat_id: &str) -> Result<Vec<MessageDocument>, StoreError>;

    /// Merge the update into the chat's summary. `message_count` is incremented
    /// by one and `created_at` is only written when the summary is created.
    async fn upsert_summary(&self, update: SummaryUpdate) -> Result<(), StoreError>;

    /// Fetch a chat summary, `None` if the chat has never been persisted
    async fn get_summary(&self, chat_id: &str) -> Result<Option<ChatSummary>, StoreError>;
}

/// Key-based blob storage for uploaded images
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store name for logging (e.g., "http-bucket", "local")
    fn store_name(&self) -> &'static str;

    /// Upload the bytes under `key` and return a stable retrieval URL
    async fn upload(&self, key: &str, content_type: &str, data: Bytes) -> Result<String, StoreError>;
}
