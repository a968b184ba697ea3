//! Chat types and structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::store::StoreError;

/// Greeting shown at the top of every new conversation
pub const DEFAULT_GREETING: &str = "Hello! I'm your AI assistant for United Airlines. I can help you create reports for customer complaints, service issues, or any airline-related problems. You can upload images and I'll analyze them to help generate comprehensive reports. What type of issue would you like to report today?";

/// Report categories offered by the report-type selector
pub const REPORT_TYPES: [&str; 6] = [
    "Customer Complaint",
    "Service Issue",
    "Booking Problem",
    "Luggage Issue",
    "Flight Delay",
    "Safety Concern",
];

/// Who wrote a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "ai",
        }
    }
}

/// A stored sender value that is neither `user` nor `ai`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSender(pub String);

impl fmt::Display for UnknownSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown message sender: {:?}", self.0)
    }
}

impl std::error::Error for UnknownSender {}

impl FromStr for Sender {
    type Err = UnknownSender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Sender::User),
            "ai" | "assistant" => Ok(Sender::Assistant),
            _ => Err(UnknownSender(s.to_string())),
        }
    }
}

/// Reference to a stored image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRef {
    pub uri: String,
}

/// One turn in the conversation. Never mutated once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageRef>>,
}

impl Message {
    /// Create a new user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text.into(), None)
    }

    /// Create a new user message carrying uploaded images
    pub fn user_with_images(text: impl Into<String>, images: Vec<ImageRef>) -> Self {
        Self::new(Sender::User, text.into(), Some(images))
    }

    /// Create a new assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text.into(), None)
    }

    /// The greeting every fresh transcript starts with
    pub fn greeting() -> Self {
        Self::assistant(DEFAULT_GREETING)
    }

    fn new(sender: Sender, text: String, images: Option<Vec<ImageRef>>) -> Self {
        Self {
            id: super::ids::new_message_id(),
            text,
            sender,
            timestamp: Utc::now(),
            images,
        }
    }
}

/// Local echo of an image that has been uploaded during this session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedImage {
    pub id: String,
    pub uri: String,
    pub timestamp: DateTime<Utc>,
}

/// Status of a previously created report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum ReportStatus {
    Completed,
    InProgress,
    Pending,
    Other(String),
}

impl ReportStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ReportStatus::Completed => "Completed",
            ReportStatus::InProgress => "In Progress",
            ReportStatus::Pending => "Pending",
            ReportStatus::Other(s) => s,
        }
    }
}

impl From<String> for ReportStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Completed" => ReportStatus::Completed,
            "In Progress" => ReportStatus::InProgress,
            "Pending" => ReportStatus::Pending,
            _ => ReportStatus::Other(s),
        }
    }
}

impl From<ReportStatus> for String {
    fn from(status: ReportStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Navigation parameter describing the report a chat screen was opened for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRef {
    #[serde(default)]
    pub chat_id: Option<String>,
    pub title: String,
    pub status: ReportStatus,
}

impl ReportRef {
    /// Completed reports hide the report-type selector
    pub fn shows_report_type_selector(&self) -> bool {
        self.status != ReportStatus::Completed
    }
}

/// Which of the two persistence writes an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStage {
    Message,
    Summary,
}

/// Device permission needed by the image pipeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaPermission {
    Library,
    Camera,
}

/// Answer to the blocking permission-denied prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionChoice {
    Cancel,
    OpenSettings,
}

/// Observable session events (transcript updates and swallowed failures)
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A message was appended; the transcript should re-render and scroll to the end
    MessageAppended { message_id: String, index: usize },
    TypingChanged(bool),
    HistoryLoaded { chat_id: String, count: usize },
    HistoryLoadFailed { chat_id: String, error: StoreError },
    PersistFailed {
        message_id: String,
        stage: PersistStage,
        error: StoreError,
    },
    PermissionDenied(MediaPermission),
    UploadFailed { error: String },
}

/// Result of activating a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// An existing conversation was resumed; `loaded` messages replaced the greeting
    Resumed { chat_id: String, loaded: usize },
    /// A new conversation id was minted
    Created { chat_id: String },
    /// Same report reference as the previous activation
    Unchanged,
}

/// Result of persisting one message
#[derive(Debug, Clone)]
pub enum PersistOutcome {
    /// No active conversation yet; nothing was written
    Skipped,
    Attempted {
        message: Result<String, StoreError>,
        summary: Result<(), StoreError>,
    },
}

impl PersistOutcome {
    pub fn is_fully_written(&self) -> bool {
        matches!(
            self,
            PersistOutcome::Attempted {
                message: Ok(_),
                summary: Ok(())
            }
        )
    }
}

/// Result of an image pick or capture
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// The image message that was appended
    Appended(Message),
    /// The picker or camera was dismissed without a selection
    Cancelled,
    PermissionDenied(PermissionChoice),
    UploadFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_wire_names() {
        assert_eq!(serde_json::to_string(&Sender::Assistant).unwrap(), "\"ai\"");
        let parsed: Sender = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(parsed, Sender::Assistant);
        assert_eq!("USER".parse::<Sender>(), Ok(Sender::User));
        assert_eq!("ai".parse::<Sender>(), Ok(Sender::Assistant));
        assert_eq!("crew".parse::<Sender>(), Err(UnknownSender("crew".to_string())));
    }

    #[test]
    fn test_completed_report_hides_type_selector() {
        let report: ReportRef = serde_json::from_value(serde_json::json!({
            "chat_id": "chat_1",
            "title": "Damaged Luggage Report",
            "status": "Completed",
        }))
        .unwrap();
        assert!(!report.shows_report_type_selector());

        let in_progress = ReportRef {
            status: ReportStatus::from("In Progress".to_string()),
            ..report
        };
        assert_eq!(in_progress.status, ReportStatus::InProgress);
        assert!(in_progress.shows_report_type_selector());
    }

    #[test]
    fn test_message_constructors() {
        let msg = Message::user_with_images(
            "Uploaded 1 image(s)",
            vec![ImageRef { uri: "https://cdn/x.jpg".into() }],
        );
        assert_eq!(msg.sender, Sender::User);
        assert_eq!(msg.images.as_ref().map(|i| i.len()), Some(1));
        assert_eq!(Message::greeting().text, DEFAULT_GREETING);
    }
}
