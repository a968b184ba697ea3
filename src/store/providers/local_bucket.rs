//! Object store writing below a local directory

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use std::path::{Component, Path, PathBuf};

use crate::store::provider::{ObjectStore, StoreError};

pub struct LocalBucketStore {
    root: PathBuf,
}

impl LocalBucketStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Map a key to a path below the root, rejecting keys that escape it
    fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(StoreError::RequestFailed(format!("Invalid object key: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalBucketStore {
    fn store_name(&self) -> &'static str {
        "local"
    }

    async fn upload(&self, key: &str, _content_type: &str, data: Bytes) -> Result<String, StoreError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;

        let absolute = tokio::fs::canonicalize(&path).await?;
        Url::from_file_path(&absolute)
            .map(|url| url.to_string())
            .map_err(|_| StoreError::Io(format!("Cannot build file URL for {:?}", absolute)))
    }
}
