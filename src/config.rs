//! Application configuration
//!
//! Defaults, `REPORT_CHAT_*` environment overrides, and session tunables
//! overridden from the settings table.

use std::path::PathBuf;
use std::time::Duration;

use crate::database::SessionSettings;
use crate::store::providers::{HttpBucketConfig, RestStoreConfig};

/// Tunables of a chat session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Delay before the reply to a text message
    pub text_reply_delay: Duration,
    /// Delay before the reply to an image message
    pub image_reply_delay: Duration,
    /// Longest accepted message, in characters
    pub max_input_chars: usize,
    pub chat_id_prefix: String,
    /// Object store namespace for uploaded images
    pub image_key_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            text_reply_delay: Duration::from_millis(1500),
            image_reply_delay: Duration::from_millis(1000),
            max_input_chars: 500,
            chat_id_prefix: "chat_".to_string(),
            image_key_prefix: "report-images".to_string(),
        }
    }
}

impl SessionConfig {
    /// Apply overrides stored in the settings table
    pub fn apply_settings(&mut self, settings: &SessionSettings) {
        if let Some(ms) = settings.text_reply_delay_ms {
            self.text_reply_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = settings.image_reply_delay_ms {
            self.image_reply_delay = Duration::from_millis(ms);
        }
        if let Some(max) = settings.max_input_chars.filter(|max| *max > 0) {
            self.max_input_chars = max;
        }
    }
}

/// Which document store backs the session
#[derive(Debug, Clone)]
pub enum DocumentStoreConfig {
    /// Local SQLite database in the data directory
    Sqlite,
    Rest(RestStoreConfig),
}

/// Which object store receives uploaded images
#[derive(Debug, Clone)]
pub enum ObjectStoreConfig {
    /// Directory below the data directory
    Local { root: PathBuf },
    Http(HttpBucketConfig),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub document_store: DocumentStoreConfig,
    pub object_store: ObjectStoreConfig,
    pub session: SessionConfig,
    pub library_access: bool,
    pub camera_access: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("united-report-chat");

        Self {
            object_store: ObjectStoreConfig::Local {
                root: data_dir.join("objects"),
            },
            data_dir,
            document_store: DocumentStoreConfig::Sqlite,
            session: SessionConfig::default(),
            library_access: true,
            camera_access: true,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `REPORT_CHAT_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("REPORT_CHAT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
            config.object_store = ObjectStoreConfig::Local {
                root: config.data_dir.join("objects"),
            };
        }

        if let Some(base_url) = lookup("REPORT_CHAT_DOCUMENT_URL") {
            config.document_store = DocumentStoreConfig::Rest(RestStoreConfig {
                base_url,
                api_key: lookup("REPORT_CHAT_DOCUMENT_API_KEY"),
                ..RestStoreConfig::default()
            });
        }

        if let Some(base_url) = lookup("REPORT_CHAT_BUCKET_URL") {
            let defaults = HttpBucketConfig::default();
            config.object_store = ObjectStoreConfig::Http(HttpBucketConfig {
                base_url,
                bucket: lookup("REPORT_CHAT_BUCKET").unwrap_or(defaults.bucket),
                public_url: lookup("REPORT_CHAT_BUCKET_PUBLIC_URL"),
                api_key: lookup("REPORT_CHAT_BUCKET_API_KEY"),
                timeout_secs: defaults.timeout_secs,
            });
        }

        if let Some(granted) = lookup("REPORT_CHAT_LIBRARY_ACCESS").and_then(|v| parse_bool(&v)) {
            config.library_access = granted;
        }
        if let Some(granted) = lookup("REPORT_CHAT_CAMERA_ACCESS").and_then(|v| parse_bool(&v)) {
            config.camera_access = granted;
        }

        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "granted" => Some(true),
        "0" | "false" | "no" | "denied" => Some(false),
        _ => {
            log::warn!("Ignoring invalid boolean value: {:?}", value);
            None
        }
    }
}
