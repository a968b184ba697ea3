//! Canned assistant replies
//!
//! Reply selection is a pure function of the trigger and an injectable
//! selector. Timing lives in `SessionConfig`; delivery is scheduled by the
//! session.

use std::time::Duration;

use rand::Rng;

use crate::config::SessionConfig;

/// Replies to a text message. The text itself is not inspected.
pub const TEXT_REPLIES: [&str; 4] = [
    "I understand your concern. Let me help you document this issue properly. Could you provide more details about when this occurred?",
    "Thank you for reporting this. I'm analyzing the information you've provided. Is there anything else you'd like to add?",
    "I've noted this in your report. Based on the images and information provided, I can help escalate this to the appropriate department.",
    "This is important information. Let me create a comprehensive report with all the details you've shared.",
];

pub const LIBRARY_IMAGES_REPLY: &str = "I can see the images you've uploaded. I'm analyzing them to help with your report. Could you describe what these images show?";

pub const CAMERA_PHOTO_REPLY: &str = "Thanks for the photo. I'm adding it to your report as evidence. Could you tell me where and when it was taken?";

/// Where uploaded images came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    Library,
    Camera,
}

/// What a reply responds to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    UserText(String),
    Images(ImageOrigin),
}

/// Identifies one of the canned replies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedReply {
    Text(usize),
    LibraryImages,
    CameraPhoto,
}

impl CannedReply {
    pub fn text(&self) -> &'static str {
        match self {
            CannedReply::Text(index) => TEXT_REPLIES[*index % TEXT_REPLIES.len()],
            CannedReply::LibraryImages => LIBRARY_IMAGES_REPLY,
            CannedReply::CameraPhoto => CAMERA_PHOTO_REPLY,
        }
    }
}

/// Picks an index in `0..choices`
pub trait ReplySelector: Send + Sync {
    fn pick(&self, choices: usize) -> usize;
}

/// Uniform random selection
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelector;

impl ReplySelector for RandomSelector {
    fn pick(&self, choices: usize) -> usize {
        rand::thread_rng().gen_range(0..choices)
    }
}

/// Choose the reply for a trigger
pub fn select_reply(trigger: &Trigger, selector: &dyn ReplySelector) -> CannedReply {
    match trigger {
        Trigger::UserText(_) => {
            let index = selector.pick(TEXT_REPLIES.len()).min(TEXT_REPLIES.len() - 1);
            CannedReply::Text(index)
        }
        Trigger::Images(ImageOrigin::Library) => CannedReply::LibraryImages,
        Trigger::Images(ImageOrigin::Camera) => CannedReply::CameraPhoto,
    }
}

/// Artificial "thinking" latency before the reply is delivered
pub fn reply_delay(trigger: &Trigger, config: &SessionConfig) -> Duration {
    match trigger {
        Trigger::UserText(_) => config.text_reply_delay,
        Trigger::Images(_) => config.image_reply_delay,
    }
}
