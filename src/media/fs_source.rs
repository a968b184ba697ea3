//! Filesystem-backed media source
//!
//! Selections are staged as file paths before the pick/capture call; an empty
//! stage behaves like a dismissed picker.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{MediaError, MediaSource, PermissionStatus, SourceAsset};
use crate::chat::types::MediaPermission;

pub struct FsMediaSource {
    library_access: AtomicBool,
    camera_access: AtomicBool,
    staged_library: Mutex<Vec<PathBuf>>,
    staged_camera: Mutex<Option<PathBuf>>,
}

impl FsMediaSource {
    pub fn new(library_access: bool, camera_access: bool) -> Self {
        Self {
            library_access: AtomicBool::new(library_access),
            camera_access: AtomicBool::new(camera_access),
            staged_library: Mutex::new(Vec::new()),
            staged_camera: Mutex::new(None),
        }
    }

    pub fn set_access(&self, permission: MediaPermission, granted: bool) {
        self.flag(permission).store(granted, Ordering::SeqCst);
    }

    /// Files returned by the next library pick
    pub fn stage_library(&self, paths: Vec<PathBuf>) {
        if let Ok(mut guard) = self.staged_library.lock() {
            *guard = paths;
        }
    }

    /// File returned by the next camera capture
    pub fn stage_camera(&self, path: PathBuf) {
        if let Ok(mut guard) = self.staged_camera.lock() {
            *guard = Some(path);
        }
    }

    fn flag(&self, permission: MediaPermission) -> &AtomicBool {
        match permission {
            MediaPermission::Library => &self.library_access,
            MediaPermission::Camera => &self.camera_access,
        }
    }
}

fn to_asset(path: PathBuf) -> SourceAsset {
    SourceAsset::new(path.to_string_lossy().into_owned())
}

#[async_trait]
impl MediaSource for FsMediaSource {
    async fn request_permission(&self, permission: MediaPermission) -> PermissionStatus {
        if self.flag(permission).load(Ordering::SeqCst) {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    async fn pick_from_library(&self) -> Result<Option<Vec<SourceAsset>>, MediaError> {
        let staged = self
            .staged_library
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .map_err(|e| MediaError::Unavailable(format!("Lock error: {}", e)))?;

        if staged.is_empty() {
            return Ok(None);
        }
        Ok(Some(staged.into_iter().map(to_asset).collect()))
    }

    async fn capture_from_camera(&self) -> Result<Option<SourceAsset>, MediaError> {
        let staged = self
            .staged_camera
            .lock()
            .map(|mut guard| guard.take())
            .map_err(|e| MediaError::Unavailable(format!("Lock error: {}", e)))?;

        Ok(staged.map(to_asset))
    }

    async fn read_asset(&self, asset: &SourceAsset) -> Result<Bytes, MediaError> {
        tokio::fs::read(&asset.uri)
            .await
            .map(Bytes::from)
            .map_err(|e| MediaError::ReadFailed(format!("{}: {}", asset.uri, e)))
    }

    fn open_settings(&self) {
        log::info!("Grant access with REPORT_CHAT_LIBRARY_ACCESS / REPORT_CHAT_CAMERA_ACCESS, or /allow library|camera");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_staged_library_pick_is_consumed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bag.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        let source = FsMediaSource::new(true, false);
        assert_eq!(source.pick_from_library().await.unwrap(), None);

        source.stage_library(vec![path.clone()]);
        let assets = source.pick_from_library().await.unwrap().unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(source.read_asset(&assets[0]).await.unwrap(), Bytes::from_static(b"jpeg"));

        // Stage is cleared after a pick
        assert_eq!(source.pick_from_library().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_permissions() {
        let source = FsMediaSource::new(true, false);
        assert_eq!(source.request_permission(MediaPermission::Library).await, PermissionStatus::Granted);
        assert_eq!(source.request_permission(MediaPermission::Camera).await, PermissionStatus::Denied);

        source.set_access(MediaPermission::Camera, true);
        assert_eq!(source.request_permission(MediaPermission::Camera).await, PermissionStatus::Granted);
    }

    #[tokio::test]
    async fn test_missing_file_fails_to_read() {
        let source = FsMediaSource::new(true, true);
        source.stage_camera(PathBuf::from("/definitely/not/here.jpg"));
        let asset = source.capture_from_camera().await.unwrap().unwrap();
        assert!(matches!(source.read_asset(&asset).await, Err(MediaError::ReadFailed(_))));
    }
}
