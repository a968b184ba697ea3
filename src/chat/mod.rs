//! Chat module for incident-report conversations
//!
//! This module provides:
//! - The in-memory transcript seeded with the assistant greeting
//! - Best-effort persistence of every message plus a running chat summary
//! - Canned assistant replies delivered after a cancellable delay
//! - Image ingestion from the library or camera
//!
//! Module structure:
//! - types.rs: Message, ReportRef, SessionEvent and operation outcomes
//! - ids.rs: chat, message and image key generation
//! - message_log.rs: MessageLog
//! - responder.rs: reply selection and delays
//! - task_registry.rs: pending reply tracking and cancellation
//! - session.rs: ChatSession orchestration

pub mod ids;
pub mod message_log;
pub mod responder;
pub mod session;
pub mod task_registry;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use message_log::MessageLog;
pub use responder::{RandomSelector, ReplySelector};
pub use session::{ChatSession, SessionDeps};
pub use types::{
    Activation, ImageRef, IngestOutcome, Message, PersistOutcome, ReportRef, ReportStatus, Sender,
    SessionEvent, UploadedImage,
};
