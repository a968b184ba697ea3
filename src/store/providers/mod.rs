//! Store implementations

pub mod http_bucket;
pub mod local_bucket;
pub mod rest_store;
pub mod sqlite_store;

pub use http_bucket::{HttpBucketConfig, HttpBucketStore};
pub use local_bucket::LocalBucketStore;
pub use rest_store::{RestDocumentStore, RestStoreConfig};
pub use sqlite_store::SqliteDocumentStore;
