//! HTTP object store: PUT `{base}/{bucket}/{key}`

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client, Url};

use crate::store::provider::{ObjectStore, StoreError};

/// HTTP bucket configuration
#[derive(Debug, Clone)]
pub struct HttpBucketConfig {
    pub base_url: String,
    pub bucket: String,
    /// Base of the retrieval URLs; defaults to `base_url`
    pub public_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for HttpBucketConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            bucket: "report-images".to_string(),
            public_url: None,
            api_key: None,
            timeout_secs: 60,
        }
    }
}

pub struct HttpBucketStore {
    config: HttpBucketConfig,
    client: Client,
}

impl HttpBucketStore {
    pub fn new(config: HttpBucketConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Where the object is written
    fn upload_url(&self, key: &str) -> Result<Url, StoreError> {
        object_url(&self.config.base_url, &self.config.bucket, key)
    }

    /// Where the object is read back from
    fn retrieval_url(&self, key: &str) -> Result<Url, StoreError> {
        let base = self.config.public_url.as_deref().unwrap_or(&self.config.base_url);
        object_url(base, &self.config.bucket, key)
    }
}

/// `{base}/{bucket}/{key}`; slashes inside the key become path segments
fn object_url(base_url: &str, bucket: &str, key: &str) -> Result<Url, StoreError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| StoreError::RequestFailed(format!("Invalid bucket URL {}: {}", base_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| StoreError::RequestFailed(format!("Bucket URL cannot have a path: {}", base_url)))?
        .pop_if_empty()
        .push(bucket)
        .extend(key.split('/').filter(|s| !s.is_empty()));
    Ok(url)
}

#[async_trait]
impl ObjectStore for HttpBucketStore {
    fn store_name(&self) -> &'static str {
        "http-bucket"
    }

    async fn upload(&self, key: &str, content_type: &str, data: Bytes) -> Result<String, StoreError> {
        let size = data.len();
        let mut request = self
            .client
            .put(self.upload_url(key)?)
            .header(header::CONTENT_TYPE, content_type)
            .body(data);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::RequestFailed(format!(
                "Upload of {} failed with {}: {}",
                key, status, body
            )));
        }

        log::debug!("Uploaded {} ({} bytes) to bucket {}", key, size, self.config.bucket);
        Ok(self.retrieval_url(key)?.to_string())
    }
}
