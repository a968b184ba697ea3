//! Chat session - conversation state, persistence and delayed replies
//!
//! One `ChatSession` backs one chat screen. Every appended message is
//! persisted best-effort; failures never roll back the transcript and are
//! reported on the session's event channel instead.

use futures_util::future::try_join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use super::ids;
use super::message_log::MessageLog;
use super::responder::{self, ImageOrigin, ReplySelector, Trigger};
use super::task_registry::TaskRegistry;
use super::types::{
    Activation, ImageRef, IngestOutcome, MediaPermission, Message, PermissionChoice,
    PersistOutcome, PersistStage, ReportRef, SessionEvent, UploadedImage,
};
use crate::config::SessionConfig;
use crate::database::{ChatSummary, NewMessageDocument, SummaryUpdate};
use crate::media::{MediaSource, PermissionStatus, SourceAsset, UserPrompt};
use crate::store::{DocumentStore, ObjectStore, StoreError};

/// Collaborators a session talks to
#[derive(Clone)]
pub struct SessionDeps {
    pub documents: Arc<dyn DocumentStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub media: Arc<dyn MediaSource>,
    pub prompt: Arc<dyn UserPrompt>,
    pub selector: Arc<dyn ReplySelector>,
}

/// Mutable per-screen state
struct SessionState {
    chat_id: Option<String>,
    /// Chat reference of the last activation; `None` before the first one
    activated_for: Option<Option<String>>,
    report: Option<ReportRef>,
    log: MessageLog,
    uploaded_images: Vec<UploadedImage>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            chat_id: None,
            activated_for: None,
            report: None,
            log: MessageLog::with_greeting(),
            uploaded_images: Vec::new(),
        }
    }
}

struct SessionInner {
    state: RwLock<SessionState>,
    deps: SessionDeps,
    config: SessionConfig,
    events: mpsc::UnboundedSender<SessionEvent>,
    tasks: TaskRegistry,
}

/// Handle owned by the chat screen. Dropping it cancels pending replies.
pub struct ChatSession {
    inner: Arc<SessionInner>,
}

impl ChatSession {
    pub fn new(
        deps: SessionDeps,
        config: SessionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let inner = SessionInner {
            state: RwLock::new(SessionState::new()),
            deps,
            config,
            events,
            tasks: TaskRegistry::new(),
        };

        (Self { inner: Arc::new(inner) }, receiver)
    }

    /// Resume the referenced conversation or mint a new one.
    ///
    /// Does nothing when called again with the same chat reference. A
    /// different reference cancels pending replies and starts over from the
    /// greeting.
    pub async fn activate(&self, report: Option<ReportRef>) -> Activation {
        let identity = report.as_ref().and_then(|r| r.chat_id.clone());

        let chat_id = {
            let mut state = self.inner.state.write().await;
            if state.activated_for.as_ref() == Some(&identity) {
                return Activation::Unchanged;
            }

            if state.activated_for.is_some() {
                log::info!("Chat reference changed, resetting session");
                self.inner.cancel_replies();
                state.log = MessageLog::with_greeting();
                state.uploaded_images.clear();
            }

            let chat_id = identity
                .clone()
                .unwrap_or_else(|| ids::new_chat_id(&self.inner.config.chat_id_prefix));
            state.activated_for = Some(identity.clone());
            state.report = report;
            state.chat_id = Some(chat_id.clone());
            chat_id
        };

        if identity.is_none() {
            log::info!("Started new chat {}", chat_id);
            return Activation::Created { chat_id };
        }

        let loaded = self.inner.load_history(&chat_id).await;
        Activation::Resumed { chat_id, loaded }
    }

    /// Send a text message and schedule the assistant's reply.
    /// Blank input is ignored.
    pub async fn send_text(&self, text: &str) -> Option<Message> {
        if text.trim().is_empty() {
            return None;
        }

        let text = truncate_chars(text, self.inner.config.max_input_chars);
        let message = Message::user(text.clone());
        let chat_id = self.inner.record(message.clone()).await;
        self.inner.schedule_reply(Trigger::UserText(text), chat_id);

        Some(message)
    }

    /// Pick images from the library, upload them all, and post one message
    pub async fn pick_from_library(&self) -> IngestOutcome {
        let inner = &self.inner;
        if let Some(choice) = inner.ensure_permission(MediaPermission::Library).await {
            return IngestOutcome::PermissionDenied(choice);
        }

        let assets = match inner.deps.media.pick_from_library().await {
            Ok(Some(assets)) if !assets.is_empty() => assets,
            Ok(_) => return IngestOutcome::Cancelled,
            Err(e) => return inner.fail_upload(e.to_string()).await,
        };

        log::info!("Uploading {} image(s) from library", assets.len());
        let urls = match try_join_all(assets.iter().map(|asset| inner.upload_asset(asset))).await {
            Ok(urls) => urls,
            Err(e) => return inner.fail_upload(e).await,
        };

        let message = Message::user_with_images(
            format!("Uploaded {} image(s)", urls.len()),
            urls.iter().map(|uri| ImageRef { uri: uri.clone() }).collect(),
        );
        inner.finish_ingest(urls, message, ImageOrigin::Library).await
    }

    /// Take one photo, upload it, and post it
    pub async fn capture_from_camera(&self) -> IngestOutcome {
        let inner = &self.inner;
        if let Some(choice) = inner.ensure_permission(MediaPermission::Camera).await {
            return IngestOutcome::PermissionDenied(choice);
        }

        let asset = match inner.deps.media.capture_from_camera().await {
            Ok(Some(asset)) => asset,
            Ok(None) => return IngestOutcome::Cancelled,
            Err(e) => return inner.fail_upload(e.to_string()).await,
        };

        let url = match inner.upload_asset(&asset).await {
            Ok(url) => url,
            Err(e) => return inner.fail_upload(e).await,
        };

        let message = Message::user_with_images(
            "Photo taken",
            vec![ImageRef { uri: url.clone() }],
        );
        inner.finish_ingest(vec![url], message, ImageOrigin::Camera).await
    }

    /// Persist a message to the current chat without appending it
    pub async fn persist(&self, message: &Message) -> PersistOutcome {
        let chat_id = self.chat_id().await;
        self.inner.persist(chat_id.as_deref(), message).await
    }

    /// Cancel pending replies. Returns how many were cancelled.
    pub fn teardown(&self) -> usize {
        let cancelled = self.inner.cancel_replies();
        if cancelled > 0 {
            log::info!("Cancelled {} pending reply task(s) on teardown", cancelled);
        }
        cancelled
    }

    /// Snapshot of the transcript in display order
    pub async fn messages(&self) -> Vec<Message> {
        self.inner.state.read().await.log.messages().to_vec()
    }

    pub async fn message_count(&self) -> usize {
        self.inner.state.read().await.log.len()
    }

    pub async fn chat_id(&self) -> Option<String> {
        self.inner.state.read().await.chat_id.clone()
    }

    pub async fn uploaded_images(&self) -> Vec<UploadedImage> {
        self.inner.state.read().await.uploaded_images.clone()
    }

    /// The report-type selector is hidden for completed reports
    pub async fn shows_report_type_selector(&self) -> bool {
        self.inner
            .state
            .read()
            .await
            .report
            .as_ref()
            .map_or(true, ReportRef::shows_report_type_selector)
    }

    /// Whether an assistant reply to a text message is pending
    pub fn is_typing(&self) -> bool {
        self.inner.tasks.is_typing()
    }

    pub fn pending_replies(&self) -> usize {
        self.inner.tasks.pending()
    }

    /// Stored summary of the current chat
    pub async fn summary(&self) -> Result<Option<ChatSummary>, StoreError> {
        match self.chat_id().await {
            Some(chat_id) => self.inner.deps.documents.get_summary(&chat_id).await,
            None => Ok(None),
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.inner.tasks.cancel_all();
    }
}

impl SessionInner {
    fn emit(&self, event: SessionEvent) {
        // The screen may have stopped listening
        let _ = self.events.send(event);
    }

    /// Fetch stored history; a non-empty result replaces the transcript.
    /// Failures leave the transcript untouched.
    async fn load_history(&self, chat_id: &str) -> usize {
        match self.deps.documents.messages_for_chat(chat_id).await {
            Ok(docs) => {
                let count = docs.len();
                if count > 0 {
                    let mut state = self.state.write().await;
                    if state.chat_id.as_deref() == Some(chat_id) {
                        state.log.replace_all(docs.into_iter().map(Message::from).collect());
                    }
                }
                log::info!("Loaded {} message(s) for chat {}", count, chat_id);
                self.emit(SessionEvent::HistoryLoaded {
                    chat_id: chat_id.to_string(),
                    count,
                });
                count
            }
            Err(e) => {
                log::warn!("Failed to load history for chat {}: {}", chat_id, e);
                self.emit(SessionEvent::HistoryLoadFailed {
                    chat_id: chat_id.to_string(),
                    error: e,
                });
                0
            }
        }
    }

    /// Append locally, then persist to the chat that was current at append
    /// time. Returns that chat.
    async fn record(&self, message: Message) -> Option<String> {
        let (index, chat_id) = {
            let mut state = self.state.write().await;
            let index = state.log.append(message.clone());
            (index, state.chat_id.clone())
        };

        self.announce_and_persist(index, chat_id.as_deref(), &message).await;
        chat_id
    }

    /// Like `record`, but only while `answering` is still the current chat.
    /// `None` means the reply was dropped.
    async fn record_reply(&self, message: Message, answering: Option<&str>) -> Option<PersistOutcome> {
        let index = {
            let mut state = self.state.write().await;
            if state.chat_id.as_deref() != answering {
                log::debug!("Dropping reply {}, chat {:?} is no longer active", message.id, answering);
                return None;
            }
            state.log.append(message.clone())
        };

        Some(self.announce_and_persist(index, answering, &message).await)
    }

    async fn announce_and_persist(
        &self,
        index: usize,
        chat_id: Option<&str>,
        message: &Message,
    ) -> PersistOutcome {
        self.emit(SessionEvent::MessageAppended {
            message_id: message.id.clone(),
            index,
        });

        self.persist(chat_id, message).await
    }

    async fn persist(&self, chat_id: Option<&str>, message: &Message) -> PersistOutcome {
        let Some(chat_id) = chat_id else {
            log::debug!("No active chat, message {} not persisted", message.id);
            return PersistOutcome::Skipped;
        };

        let documents = &self.deps.documents;

        let written = documents
            .insert_message(NewMessageDocument::from_message(chat_id, message))
            .await
            .map(|doc| doc.id);
        if let Err(e) = &written {
            self.report_persist_failure(message, PersistStage::Message, e);
        }

        let summary = documents
            .upsert_summary(SummaryUpdate::from_message(chat_id, message))
            .await;
        if let Err(e) = &summary {
            self.report_persist_failure(message, PersistStage::Summary, e);
        }

        PersistOutcome::Attempted {
            message: written,
            summary,
        }
    }

    fn report_persist_failure(&self, message: &Message, stage: PersistStage, error: &StoreError) {
        log::warn!(
            "Failed to persist {:?} for message {} via {}: {}",
            stage,
            message.id,
            self.deps.documents.store_name(),
            error
        );
        self.emit(SessionEvent::PersistFailed {
            message_id: message.id.clone(),
            stage,
            error: error.clone(),
        });
    }

    /// Spawn the delayed reply for a trigger recorded under `chat_id`
    fn schedule_reply(self: &Arc<Self>, trigger: Trigger, chat_id: Option<String>) {
        let reply = responder::select_reply(&trigger, self.deps.selector.as_ref());
        let delay = responder::reply_delay(&trigger, &self.config);
        let shows_typing = matches!(trigger, Trigger::UserText(_));

        let task_id = uuid::Uuid::new_v4().to_string();
        let was_typing = self.tasks.is_typing();
        let cancel_token = self.tasks.register(task_id.clone(), shows_typing);
        if shows_typing && !was_typing {
            self.emit(SessionEvent::TypingChanged(true));
        }

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    log::debug!("Reply {} cancelled", task_id);
                }
                _ = tokio::time::sleep(delay) => {
                    // Removed concurrently means the session was torn down
                    if inner.tasks.remove(&task_id).is_none() {
                        return;
                    }
                    if shows_typing && !inner.tasks.is_typing() {
                        inner.emit(SessionEvent::TypingChanged(false));
                    }
                    inner
                        .record_reply(Message::assistant(reply.text()), chat_id.as_deref())
                        .await;
                }
            }
        });
    }

    fn cancel_replies(&self) -> usize {
        let was_typing = self.tasks.is_typing();
        let cancelled = self.tasks.cancel_all();
        if was_typing {
            self.emit(SessionEvent::TypingChanged(false));
        }
        cancelled
    }

    /// `None` when granted, otherwise the user's answer to the prompt
    async fn ensure_permission(&self, permission: MediaPermission) -> Option<PermissionChoice> {
        match self.deps.media.request_permission(permission).await {
            PermissionStatus::Granted => None,
            PermissionStatus::Denied => {
                log::info!("{:?} permission denied", permission);
                self.emit(SessionEvent::PermissionDenied(permission));

                let choice = self.deps.prompt.permission_denied(permission).await;
                if choice == PermissionChoice::OpenSettings {
                    self.deps.media.open_settings();
                }
                Some(choice)
            }
        }
    }

    /// Read and upload one asset, returning its retrieval URL
    async fn upload_asset(&self, asset: &SourceAsset) -> Result<String, String> {
        let key = ids::new_image_key(&self.config.image_key_prefix, &asset.extension());
        let data = self
            .deps
            .media
            .read_asset(asset)
            .await
            .map_err(|e| e.to_string())?;

        self.deps
            .objects
            .upload(&key, asset.content_type(), data)
            .await
            .map_err(|e| format!("Upload of {} failed: {}", asset.uri, e))
    }

    async fn fail_upload(&self, error: String) -> IngestOutcome {
        log::error!("Image upload failed: {}", error);
        self.emit(SessionEvent::UploadFailed {
            error: error.clone(),
        });
        self.deps
            .prompt
            .upload_failed("Failed to upload image. Please try again.")
            .await;
        IngestOutcome::UploadFailed(error)
    }

    async fn finish_ingest(
        self: &Arc<Self>,
        urls: Vec<String>,
        message: Message,
        origin: ImageOrigin,
    ) -> IngestOutcome {
        {
            let mut state = self.state.write().await;
            state.uploaded_images.extend(urls.into_iter().map(|uri| UploadedImage {
                id: ids::new_image_id(),
                uri,
                timestamp: message.timestamp,
            }));
        }

        let chat_id = self.record(message.clone()).await;
        self.schedule_reply(Trigger::Images(origin), chat_id);

        IngestOutcome::Appended(message)
    }
}

/// First `max` characters of `text`
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}
