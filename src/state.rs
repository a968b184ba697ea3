// State management for the report chat front-end

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::chat::responder::RandomSelector;
use crate::chat::session::{ChatSession, SessionDeps};
use crate::chat::types::SessionEvent;
use crate::config::{AppConfig, DocumentStoreConfig, ObjectStoreConfig, SessionConfig};
use crate::database::DatabaseManager;
use crate::media::{FsMediaSource, UserPrompt};
use crate::store::providers::{
    HttpBucketStore, LocalBucketStore, RestDocumentStore, SqliteDocumentStore,
};
use crate::store::{DocumentStore, ObjectStore};

/// Long-lived collaborators shared by every chat session
pub struct AppState {
    /// Database manager for settings and the local document store
    database: Arc<DatabaseManager>,
    documents: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
    media: Arc<FsMediaSource>,
    prompt: Arc<dyn UserPrompt>,
    session_config: SessionConfig,
}

impl AppState {
    /// Open the database and build the configured stores
    pub fn init(config: &AppConfig, prompt: Arc<dyn UserPrompt>) -> Result<Self> {
        let database = Arc::new(
            DatabaseManager::in_data_dir(&config.data_dir)
                .context("Failed to initialize database")?,
        );

        // Settings table overrides the built-in session defaults
        let mut session_config = config.session.clone();
        match database.load_session_settings() {
            Ok(settings) => session_config.apply_settings(&settings),
            Err(e) => log::warn!("Failed to load session settings, using defaults: {:#}", e),
        }

        let documents: Arc<dyn DocumentStore> = match &config.document_store {
            DocumentStoreConfig::Sqlite => Arc::new(SqliteDocumentStore::new(database.clone())),
            DocumentStoreConfig::Rest(rest) => Arc::new(
                RestDocumentStore::new(rest.clone()).context("Failed to create document store")?,
            ),
        };

        let objects: Arc<dyn ObjectStore> = match &config.object_store {
            ObjectStoreConfig::Local { root } => Arc::new(LocalBucketStore::new(root.clone())),
            ObjectStoreConfig::Http(http) => Arc::new(
                HttpBucketStore::new(http.clone()).context("Failed to create object store")?,
            ),
        };

        log::info!(
            "Using {} document store and {} object store",
            documents.store_name(),
            objects.store_name()
        );

        Ok(Self {
            database,
            documents,
            objects,
            media: Arc::new(FsMediaSource::new(config.library_access, config.camera_access)),
            prompt,
            session_config,
        })
    }

    /// Start a session for a newly entered chat screen
    pub fn open_session(&self) -> (ChatSession, mpsc::UnboundedReceiver<SessionEvent>) {
        let deps = SessionDeps {
            documents: self.documents.clone(),
            objects: self.objects.clone(),
            media: self.media.clone(),
            prompt: self.prompt.clone(),
            selector: Arc::new(RandomSelector),
        };
        ChatSession::new(deps, self.session_config.clone())
    }

    pub fn media(&self) -> &FsMediaSource {
        &self.media
    }
}
