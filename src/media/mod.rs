//! Image acquisition from the device library and camera
//!
//! Module structure:
//! - mod.rs: MediaSource / UserPrompt traits, SourceAsset, MediaError
//! - fs_source.rs: filesystem-backed source used by the terminal front-end

pub mod fs_source;

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::path::Path;

use crate::chat::types::{MediaPermission, PermissionChoice};

pub use fs_source::FsMediaSource;

/// Error types for media acquisition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// The asset could not be read
    ReadFailed(String),
    /// The picker or camera failed to open
    Unavailable(String),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::ReadFailed(msg) => write!(f, "Failed to read image: {}", msg),
            MediaError::Unavailable(msg) => write!(f, "Image source unavailable: {}", msg),
        }
    }
}

impl std::error::Error for MediaError {}

/// Result of a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// An image selected on the device, before upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAsset {
    /// Device-local location of the image
    pub uri: String,
    pub mime_type: Option<String>,
}

impl SourceAsset {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: None,
        }
    }

    /// Declared mime type, else a guess from the file extension
    pub fn content_type(&self) -> &str {
        if let Some(mime) = &self.mime_type {
            return mime;
        }
        match self.extension().as_str() {
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "heic" => "image/heic",
            _ => "image/jpeg",
        }
    }

    /// Lowercased extension used for the storage key
    pub fn extension(&self) -> String {
        let from_uri = Path::new(&self.uri)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match from_uri.as_deref() {
            Some("jpeg") | None => "jpg".to_string(),
            Some(ext) => ext.to_string(),
        }
    }
}

/// Device library / camera access
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Ask for the permission; may prompt the user
    async fn request_permission(&self, permission: MediaPermission) -> PermissionStatus;

    /// Multi-select from the library. `None` when the picker was dismissed.
    async fn pick_from_library(&self) -> Result<Option<Vec<SourceAsset>>, MediaError>;

    /// Single camera shot. `None` when the camera was dismissed.
    async fn capture_from_camera(&self) -> Result<Option<SourceAsset>, MediaError>;

    /// Raw bytes of a selected asset
    async fn read_asset(&self, asset: &SourceAsset) -> Result<Bytes, MediaError>;

    /// Send the user to the system settings screen
    fn open_settings(&self);
}

/// Blocking prompts shown to the user by the image pipeline
#[async_trait]
pub trait UserPrompt: Send + Sync {
    /// "Permission needed" with Cancel / Open Settings
    async fn permission_denied(&self, permission: MediaPermission) -> PermissionChoice;

    /// Upload failure alert
    async fn upload_failed(&self, message: &str);
}
