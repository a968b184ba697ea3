// Settings repository for the report chat store
// Handles CRUD operations for persisted session tunables

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use super::models::{SessionSettings, Setting};
use super::DatabaseManager;

pub const TEXT_REPLY_DELAY_MS: &str = "text_reply_delay_ms";
pub const IMAGE_REPLY_DELAY_MS: &str = "image_reply_delay_ms";
pub const MAX_INPUT_CHARS: &str = "max_input_chars";

impl DatabaseManager {
    /// Set a single setting
    pub fn set_setting(&self, key: &str, value: &str, value_type: &str) -> Result<()> {
        self.with_connection(|conn| {
            set_setting_impl(conn, key, value, value_type)
        })
    }

    /// Set an integer setting
    pub fn set_u64_setting(&self, key: &str, value: u64) -> Result<()> {
        self.set_setting(key, &value.to_string(), "integer")
    }

    /// Load the session tunables stored in the settings table
    pub fn load_session_settings(&self) -> Result<SessionSettings> {
        self.with_connection(|conn| {
            load_session_settings_impl(conn)
        })
    }
}

fn set_setting_impl(conn: &Connection, key: &str, value: &str, value_type: &str) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO settings (key, value, value_type, updated_at)
        VALUES (?1, ?2, ?3, datetime('now'))
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            value_type = excluded.value_type,
            updated_at = datetime('now')
        "#,
        params![key, value, value_type],
    ).context("Failed to set setting")?;

    Ok(())
}

fn get_all_settings_impl(conn: &Connection) -> Result<Vec<Setting>> {
    let mut stmt = conn.prepare(
        "SELECT key, value, value_type, updated_at FROM settings ORDER BY key"
    ).context("Failed to prepare get_all_settings query")?;

    let settings = stmt.query_map([], |row| {
        Ok(Setting {
            key: row.get(0)?,
            value: row.get(1)?,
            value_type: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }).context("Failed to query settings")?;

    settings.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect settings")
}

fn load_session_settings_impl(conn: &Connection) -> Result<SessionSettings> {
    let mut settings = SessionSettings::default();

    for setting in get_all_settings_impl(conn)? {
        match setting.key.as_str() {
            TEXT_REPLY_DELAY_MS => settings.text_reply_delay_ms = parse_number(&setting),
            IMAGE_REPLY_DELAY_MS => settings.image_reply_delay_ms = parse_number(&setting),
            MAX_INPUT_CHARS => settings.max_input_chars = parse_number(&setting),
            _ => {
                log::debug!("Unknown setting key: {}", setting.key);
            }
        }
    }

    Ok(settings)
}

fn parse_number<T: std::str::FromStr>(setting: &Setting) -> Option<T> {
    match setting.value.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring non-numeric setting {} = {:?}", setting.key, setting.value);
            None
        }
    }
}
