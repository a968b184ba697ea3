// Chat summary repository for the report chat store
// Handles the report-chats collection

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};

use super::chat_repo::{format_timestamp, parse_timestamp};
use super::models::{ChatSummary, SummaryUpdate};
use super::DatabaseManager;

impl DatabaseManager {
    /// Merge a summary update: overwrite the last-message fields, increment the
    /// count, and set `created_at` only when the summary is first created
    pub fn upsert_chat_summary(&self, update: &SummaryUpdate) -> Result<()> {
        self.with_connection(|conn| {
            upsert_chat_summary_impl(conn, update)
        })
    }

    /// Get a conversation summary by chat id
    pub fn get_chat_summary(&self, chat_id: &str) -> Result<Option<ChatSummary>> {
        self.with_connection(|conn| {
            get_chat_summary_impl(conn, chat_id)
        })
    }
}

fn upsert_chat_summary_impl(conn: &Connection, update: &SummaryUpdate) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO report_chats (chat_id, last_message, last_message_time, message_count, created_at)
        VALUES (?1, ?2, ?3, 1, ?4)
        ON CONFLICT(chat_id) DO UPDATE SET
            last_message = excluded.last_message,
            last_message_time = excluded.last_message_time,
            message_count = report_chats.message_count + 1
        "#,
        params![
            update.chat_id,
            update.last_message,
            format_timestamp(&update.last_message_time),
            format_timestamp(&Utc::now()),
        ],
    ).context("Failed to upsert chat summary")?;

    Ok(())
}

fn get_chat_summary_impl(conn: &Connection, chat_id: &str) -> Result<Option<ChatSummary>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT chat_id, last_message, last_message_time, message_count, created_at
        FROM report_chats
        WHERE chat_id = ?
        "#
    ).context("Failed to prepare get_chat_summary query")?;

    let result = stmt.query_row(params![chat_id], |row| {
        Ok(ChatSummary {
            chat_id: row.get(0)?,
            last_message: row.get(1)?,
            last_message_time: parse_timestamp(&row.get::<_, String>(2)?)?,
            message_count: row.get(3)?,
            created_at: parse_timestamp(&row.get::<_, String>(4)?)?,
        })
    });

    match result {
        Ok(summary) => Ok(Some(summary)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context("Failed to get chat summary"),
    }
}
