//! Remote document and object stores
//!
//! Module structure:
//! - provider.rs: DocumentStore / ObjectStore traits and StoreError
//! - providers/: SQLite and REST document stores, HTTP and local buckets

pub mod provider;
pub mod providers;

pub use provider::{DocumentStore, ObjectStore, StoreError, CHATS_COLLECTION, MESSAGES_COLLECTION};
