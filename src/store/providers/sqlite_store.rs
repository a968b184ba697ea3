//! Document store backed by the local SQLite database

use async_trait::async_trait;
use std::sync::Arc;

use crate::database::{ChatSummary, DatabaseManager, MessageDocument, NewMessageDocument, SummaryUpdate};
use crate::store::provider::{DocumentStore, StoreError};

/// Local stand-in for the remote document store
pub struct SqliteDocumentStore {
    db: Arc<DatabaseManager>,
}

impl SqliteDocumentStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn store_name(&self) -> &'static str {
        "sqlite"
    }

    async fn insert_message(&self, message: NewMessageDocument) -> Result<MessageDocument, StoreError> {
        Ok(self.db.insert_report_message(&message)?)
    }

    async fn messages_for_chat(&self, chat_id: &str) -> Result<Vec<MessageDocument>, StoreError> {
        Ok(self.db.get_report_messages(chat_id)?)
    }

    async fn upsert_summary(&self, update: SummaryUpdate) -> Result<(), StoreError> {
        Ok(self.db.upsert_chat_summary(&update)?)
    }

    async fn get_summary(&self, chat_id: &str) -> Result<Option<ChatSummary>, StoreError> {
        Ok(self.db.get_chat_summary(chat_id)?)
    }
}
