//! In-memory collaborators for session tests

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use super::responder::{RandomSelector, ReplySelector};
use super::session::{ChatSession, SessionDeps};
use super::types::{MediaPermission, PermissionChoice, Sender, SessionEvent};
use crate::config::SessionConfig;
use crate::database::{ChatSummary, MessageDocument, NewMessageDocument, SummaryUpdate};
use crate::media::{MediaError, MediaSource, PermissionStatus, SourceAsset, UserPrompt};
use crate::store::{DocumentStore, ObjectStore, StoreError};

#[derive(Default)]
pub struct MemoryDocuments {
    messages: Mutex<Vec<MessageDocument>>,
    summaries: Mutex<HashMap<String, ChatSummary>>,
    fail_inserts: AtomicBool,
    fail_summaries: AtomicBool,
    fail_history: AtomicBool,
    insert_calls: AtomicUsize,
    summary_calls: AtomicUsize,
    history_calls: AtomicUsize,
}

impl MemoryDocuments {
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_summaries(&self, fail: bool) {
        self.fail_summaries.store(fail, Ordering::SeqCst);
    }

    pub fn fail_history(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::SeqCst);
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn stored(&self, chat_id: &str) -> Vec<MessageDocument> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|doc| doc.chat_id == chat_id)
            .cloned()
            .collect()
    }
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("store offline".to_string())
}

#[async_trait]
impl DocumentStore for MemoryDocuments {
    fn store_name(&self) -> &'static str {
        "memory"
    }

    async fn insert_message(&self, message: NewMessageDocument) -> Result<MessageDocument, StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let doc = MessageDocument {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: message.chat_id,
            text: message.text,
            sender: message.sender,
            timestamp: Utc::now(),
            images: message.images,
        };
        self.messages.lock().unwrap().push(doc.clone());
        Ok(doc)
    }

    async fn messages_for_chat(&self, chat_id: &str) -> Result<Vec<MessageDocument>, StoreError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let mut docs = self.stored(chat_id);
        docs.sort_by_key(|doc| doc.timestamp);
        Ok(docs)
    }

    async fn upsert_summary(&self, update: SummaryUpdate) -> Result<(), StoreError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_summaries.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let now = Utc::now();
        let mut summaries = self.summaries.lock().unwrap();
        let summary = summaries
            .entry(update.chat_id.clone())
            .or_insert_with(|| ChatSummary {
                chat_id: update.chat_id.clone(),
                last_message: String::new(),
                last_message_time: now,
                message_count: 0,
                created_at: now,
            });
        summary.last_message = update.last_message;
        summary.last_message_time = update.last_message_time;
        summary.message_count += 1;
        Ok(())
    }

    async fn get_summary(&self, chat_id: &str) -> Result<Option<ChatSummary>, StoreError> {
        Ok(self.summaries.lock().unwrap().get(chat_id).cloned())
    }
}

/// Object store that rejects any payload containing `fail`
#[derive(Default)]
pub struct MemoryObjects {
    uploads: AtomicUsize,
}

impl MemoryObjects {
    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjects {
    fn store_name(&self) -> &'static str {
        "memory"
    }

    async fn upload(&self, key: &str, _content_type: &str, data: Bytes) -> Result<String, StoreError> {
        if data.windows(4).any(|w| w == b"fail") {
            return Err(StoreError::RequestFailed(format!("rejected {}", key)));
        }
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://cdn.test/{}", key))
    }
}

/// Object store that takes `delay` per upload and tracks overlap
pub struct SlowObjects {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowObjects {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for SlowObjects {
    fn store_name(&self) -> &'static str {
        "slow"
    }

    async fn upload(&self, key: &str, _content_type: &str, _data: Bytes) -> Result<String, StoreError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(format!("https://cdn.test/{}", key))
    }
}

/// Document store whose history fetch for one chat waits for `release`
pub struct GatedHistory {
    gated_chat: String,
    history: Vec<MessageDocument>,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedHistory {
    pub fn new(gated_chat: &str, texts: &[&str]) -> Self {
        let history = texts
            .iter()
            .map(|text| MessageDocument {
                id: uuid::Uuid::new_v4().to_string(),
                chat_id: gated_chat.to_string(),
                text: text.to_string(),
                sender: Sender::User,
                timestamp: Utc::now(),
                images: None,
            })
            .collect();
        Self {
            gated_chat: gated_chat.to_string(),
            history,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl DocumentStore for GatedHistory {
    fn store_name(&self) -> &'static str {
        "gated"
    }

    async fn insert_message(&self, message: NewMessageDocument) -> Result<MessageDocument, StoreError> {
        Ok(MessageDocument {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: message.chat_id,
            text: message.text,
            sender: message.sender,
            timestamp: Utc::now(),
            images: message.images,
        })
    }

    async fn messages_for_chat(&self, chat_id: &str) -> Result<Vec<MessageDocument>, StoreError> {
        if chat_id != self.gated_chat {
            return Ok(Vec::new());
        }
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.history.clone())
    }

    async fn upsert_summary(&self, _update: SummaryUpdate) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get_summary(&self, _chat_id: &str) -> Result<Option<ChatSummary>, StoreError> {
        Ok(None)
    }
}

/// Media source whose assets read back as their own uri
pub struct FakeMedia {
    denied: Mutex<Vec<MediaPermission>>,
    library: Mutex<Option<Vec<SourceAsset>>>,
    camera: Mutex<Option<SourceAsset>>,
    settings_opened: AtomicUsize,
}

impl Default for FakeMedia {
    fn default() -> Self {
        Self {
            denied: Mutex::new(Vec::new()),
            library: Mutex::new(None),
            camera: Mutex::new(None),
            settings_opened: AtomicUsize::new(0),
        }
    }
}

impl FakeMedia {
    pub fn deny(&self, permission: MediaPermission) {
        self.denied.lock().unwrap().push(permission);
    }

    pub fn set_library(&self, uris: &[&str]) {
        *self.library.lock().unwrap() = Some(uris.iter().map(|uri| SourceAsset::new(*uri)).collect());
    }

    pub fn set_camera(&self, uri: &str) {
        *self.camera.lock().unwrap() = Some(SourceAsset::new(uri));
    }

    pub fn settings_opened(&self) -> usize {
        self.settings_opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaSource for FakeMedia {
    async fn request_permission(&self, permission: MediaPermission) -> PermissionStatus {
        if self.denied.lock().unwrap().contains(&permission) {
            PermissionStatus::Denied
        } else {
            PermissionStatus::Granted
        }
    }

    async fn pick_from_library(&self) -> Result<Option<Vec<SourceAsset>>, MediaError> {
        Ok(self.library.lock().unwrap().take())
    }

    async fn capture_from_camera(&self) -> Result<Option<SourceAsset>, MediaError> {
        Ok(self.camera.lock().unwrap().take())
    }

    async fn read_asset(&self, asset: &SourceAsset) -> Result<Bytes, MediaError> {
        Ok(Bytes::from(asset.uri.clone()))
    }

    fn open_settings(&self) {
        self.settings_opened.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakePrompt {
    choice: Mutex<PermissionChoice>,
    alerts: AtomicUsize,
}

impl Default for FakePrompt {
    fn default() -> Self {
        Self {
            choice: Mutex::new(PermissionChoice::Cancel),
            alerts: AtomicUsize::new(0),
        }
    }
}

impl FakePrompt {
    pub fn answer(&self, choice: PermissionChoice) {
        *self.choice.lock().unwrap() = choice;
    }

    pub fn alerts(&self) -> usize {
        self.alerts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserPrompt for FakePrompt {
    async fn permission_denied(&self, _permission: MediaPermission) -> PermissionChoice {
        *self.choice.lock().unwrap()
    }

    async fn upload_failed(&self, _message: &str) {
        self.alerts.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FixedSelector(pub usize);

impl ReplySelector for FixedSelector {
    fn pick(&self, _choices: usize) -> usize {
        self.0
    }
}

pub struct Fixture {
    pub documents: Arc<MemoryDocuments>,
    pub objects: Arc<MemoryObjects>,
    pub media: Arc<FakeMedia>,
    pub prompt: Arc<FakePrompt>,
    pub selector: Arc<dyn ReplySelector>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(MemoryDocuments::default()),
            objects: Arc::new(MemoryObjects::default()),
            media: Arc::new(FakeMedia::default()),
            prompt: Arc::new(FakePrompt::default()),
            selector: Arc::new(RandomSelector),
        }
    }

    pub fn with_selector(mut self, index: usize) -> Self {
        self.selector = Arc::new(FixedSelector(index));
        self
    }

    pub fn session(&self) -> (ChatSession, tokio::sync::mpsc::UnboundedReceiver<SessionEvent>) {
        self.session_with_documents(self.documents.clone())
    }

    pub fn session_with_documents(
        &self,
        documents: Arc<dyn DocumentStore>,
    ) -> (ChatSession, tokio::sync::mpsc::UnboundedReceiver<SessionEvent>) {
        self.session_with_stores(documents, self.objects.clone())
    }

    pub fn session_with_stores(
        &self,
        documents: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> (ChatSession, tokio::sync::mpsc::UnboundedReceiver<SessionEvent>) {
        let deps = SessionDeps {
            documents,
            objects,
            media: self.media.clone(),
            prompt: self.prompt.clone(),
            selector: self.selector.clone(),
        };
        ChatSession::new(deps, SessionConfig::default())
    }
}
