//! JSON-over-HTTP document store
//!
//! Talks to a document service exposing collections under `{base}/v1/collections`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::chat::types::{ImageRef, Sender};
use crate::database::{ChatSummary, MessageDocument, NewMessageDocument, SummaryUpdate};
use crate::store::provider::{DocumentStore, StoreError, CHATS_COLLECTION, MESSAGES_COLLECTION};

/// REST document store configuration
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RestStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// A document as returned by the service
#[derive(Debug, Deserialize)]
struct RemoteDocument<T> {
    id: String,
    data: T,
}

#[derive(Debug, Deserialize)]
struct RemoteDocumentList<T> {
    #[serde(default = "Vec::new")]
    documents: Vec<RemoteDocument<T>>,
}

/// Message fields as stored in `report-messages`
#[derive(Debug, Serialize, Deserialize)]
struct MessageData {
    chat_id: String,
    text: String,
    sender: Sender,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    images: Option<Vec<ImageRef>>,
}

impl From<RemoteDocument<MessageData>> for MessageDocument {
    fn from(doc: RemoteDocument<MessageData>) -> Self {
        MessageDocument {
            id: doc.id,
            chat_id: doc.data.chat_id,
            text: doc.data.text,
            sender: doc.data.sender,
            timestamp: doc.data.timestamp,
            images: doc.data.images,
        }
    }
}

pub struct RestDocumentStore {
    config: RestStoreConfig,
    client: Client,
}

impl RestDocumentStore {
    pub fn new(config: RestStoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        build_url(&self.config.base_url, segments)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::RequestFailed(format!("{}: {}", status, body)));
        }
        Ok(response)
    }
}

/// `{base}/v1/collections/<segments...>` with each segment percent-encoded
fn build_url(base_url: &str, segments: &[&str]) -> Result<Url, StoreError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| StoreError::RequestFailed(format!("Invalid base URL {}: {}", base_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| StoreError::RequestFailed(format!("Base URL cannot have a path: {}", base_url)))?
        .pop_if_empty()
        .extend(["v1", "collections"])
        .extend(segments);
    Ok(url)
}

fn insert_body(message: &NewMessageDocument) -> serde_json::Value {
    json!({
        "data": {
            "chat_id": message.chat_id,
            "text": message.text,
            "sender": message.sender,
            "images": message.images,
        },
        "server_timestamp": ["timestamp"],
    })
}

fn history_query(chat_id: &str) -> serde_json::Value {
    json!({
        "where": { "field": "chat_id", "op": "==", "value": chat_id },
        "order_by": { "field": "timestamp", "direction": "asc" },
    })
}

fn summary_patch(update: &SummaryUpdate, now: DateTime<Utc>) -> serde_json::Value {
    json!({
        "merge": true,
        "set": {
            "lastMessage": update.last_message,
            "lastMessageTime": update.last_message_time,
        },
        "increment": { "messageCount": 1 },
        "set_on_create": { "createdAt": now },
    })
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    fn store_name(&self) -> &'static str {
        "rest"
    }

    async fn insert_message(&self, message: NewMessageDocument) -> Result<MessageDocument, StoreError> {
        let url = self.url(&[MESSAGES_COLLECTION, "documents"])?;
        let response = self
            .send(self.client.post(url).json(&insert_body(&message)))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::RequestFailed(format!(
                "Collection {} not found",
                MESSAGES_COLLECTION
            )));
        }

        let doc: RemoteDocument<MessageData> = response.json().await?;
        Ok(doc.into())
    }

    async fn messages_for_chat(&self, chat_id: &str) -> Result<Vec<MessageDocument>, StoreError> {
        let query_segment = format!("{}:query", MESSAGES_COLLECTION);
        let url = self.url(&[query_segment.as_str()])?;
        let response = self
            .send(self.client.post(url).json(&history_query(chat_id)))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let list: RemoteDocumentList<MessageData> = response.json().await?;
        Ok(list.documents.into_iter().map(MessageDocument::from).collect())
    }

    async fn upsert_summary(&self, update: SummaryUpdate) -> Result<(), StoreError> {
        let url = self.url(&[CHATS_COLLECTION, "documents", update.chat_id.as_str()])?;
        let response = self
            .send(self.client.patch(url).json(&summary_patch(&update, Utc::now())))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::RequestFailed(format!(
                "Collection {} not found",
                CHATS_COLLECTION
            )));
        }
        Ok(())
    }

    async fn get_summary(&self, chat_id: &str) -> Result<Option<ChatSummary>, StoreError> {
        let url = self.url(&[CHATS_COLLECTION, "documents", chat_id])?;
        let response = self.send(self.client.get(url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let doc: RemoteDocument<ChatSummary> = response.json().await?;
        Ok(Some(ChatSummary {
            chat_id: doc.id,
            ..doc.data
        }))
    }
}
