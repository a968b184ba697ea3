// Database models - Re-exports all domain-specific models
//
// - settings.rs: Application settings
// - chat.rs: Report message documents and conversation summaries

mod settings;
mod chat;

pub use settings::{Setting, SessionSettings};
pub use chat::{ChatSummary, MessageDocument, NewMessageDocument, SummaryUpdate};
