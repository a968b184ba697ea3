// Database models - Report chat documents
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::types::{ImageRef, Message, Sender};

/// A stored message in the `report-messages` collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageDocument {
    /// Store-assigned document id
    pub id: String,
    pub chat_id: String,
    pub text: String,
    pub sender: Sender,
    /// Store-assigned write time
    pub timestamp: DateTime<Utc>,
    pub images: Option<Vec<ImageRef>>,
}

impl From<MessageDocument> for Message {
    fn from(doc: MessageDocument) -> Self {
        Message {
            id: doc.id,
            text: doc.text,
            sender: doc.sender,
            timestamp: doc.timestamp,
            images: doc.images,
        }
    }
}

/// Fields written when inserting a message document.
/// The timestamp is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMessageDocument {
    pub chat_id: String,
    pub text: String,
    pub sender: Sender,
    pub images: Option<Vec<ImageRef>>,
}

impl NewMessageDocument {
    pub fn from_message(chat_id: &str, message: &Message) -> Self {
        Self {
            chat_id: chat_id.to_string(),
            text: message.text.clone(),
            sender: message.sender,
            images: message.images.clone(),
        }
    }
}

/// A conversation summary in the `report-chats` collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    #[serde(skip)]
    pub chat_id: String,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    pub message_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Merge patch applied to a summary on every persisted message.
///
/// Stores must increment `messageCount` by one and only write `createdAt`
/// when the summary does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryUpdate {
    pub chat_id: String,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
}

impl SummaryUpdate {
    pub fn from_message(chat_id: &str, message: &Message) -> Self {
        Self {
            chat_id: chat_id.to_string(),
            last_message: message.text.clone(),
            last_message_time: message.timestamp,
        }
    }
}
