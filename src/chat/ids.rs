//! Identifier generation for chats, messages and stored images
//!
//! Ids are time-based with a short random suffix so that no central allocator
//! is needed.

use rand::distributions::{Distribution, Uniform};

const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const CHAT_SUFFIX_LEN: usize = 9;
const SHORT_SUFFIX_LEN: usize = 6;

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let dist = Uniform::from(0..SUFFIX_ALPHABET.len());
    (0..len)
        .map(|_| SUFFIX_ALPHABET[dist.sample(&mut rng)] as char)
        .collect()
}

/// Mint a new conversation id: `<prefix><unix-millis>_<9 random chars>`
pub fn new_chat_id(prefix: &str) -> String {
    format!("{}{}_{}", prefix, now_millis(), random_suffix(CHAT_SUFFIX_LEN))
}

/// Local message id, unique within a session
pub fn new_message_id() -> String {
    format!("msg_{}_{}", now_millis(), random_suffix(SHORT_SUFFIX_LEN))
}

/// Local id for an uploaded-image echo entry
pub fn new_image_id() -> String {
    format!("img_{}_{}", now_millis(), random_suffix(SHORT_SUFFIX_LEN))
}

/// Object store key for an image: `<prefix>/<unix-millis>_<random>.<ext>`
pub fn new_image_key(prefix: &str, extension: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    format!(
        "{}/{}_{}.{}",
        prefix,
        now_millis(),
        random_suffix(CHAT_SUFFIX_LEN),
        extension
    )
}
