// Database module for the report chat store
// Provides SQLite persistence for report messages, conversation summaries and settings

pub mod manager;
pub mod migrations;
pub mod models;
pub mod settings_repo;
pub mod chat_repo;
pub mod chat_session_repo;

pub use manager::DatabaseManager;
pub use models::*;
