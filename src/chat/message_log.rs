//! Ordered, append-only transcript of a conversation

use super::types::Message;

/// In-memory transcript. Visible order is always append order.
#[derive(Debug, Clone)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    /// A transcript holding only the default greeting
    pub fn with_greeting() -> Self {
        Self {
            messages: vec![Message::greeting()],
        }
    }

    /// Append a message and return its index in the transcript
    pub fn append(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    /// Replace the whole transcript (used when resuming a conversation)
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::with_greeting()
    }
}
