// Database models - Settings
use serde::{Deserialize, Serialize};

/// A single setting stored in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub value_type: String,
    pub updated_at: String,
}

/// Session tunables persisted in the settings table.
/// `None` means the key is absent and the configured default applies.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SessionSettings {
    pub text_reply_delay_ms: Option<u64>,
    pub image_reply_delay_ms: Option<u64>,
    pub max_input_chars: Option<usize>,
}
