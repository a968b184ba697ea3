// Chat message repository for the report chat store
// Handles the report-messages collection

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{Connection, params};

use super::models::{MessageDocument, NewMessageDocument};
use super::DatabaseManager;
use crate::chat::types::{ImageRef, Sender};

impl DatabaseManager {
    /// Insert a message document. The id and timestamp are assigned here.
    pub fn insert_report_message(&self, message: &NewMessageDocument) -> Result<MessageDocument> {
        self.with_connection(|conn| {
            insert_report_message_impl(conn, message)
        })
    }

    /// Get all messages of a conversation, oldest first
    pub fn get_report_messages(&self, chat_id: &str) -> Result<Vec<MessageDocument>> {
        self.with_connection(|conn| {
            get_report_messages_impl(conn, chat_id)
        })
    }
}

/// Timestamps are stored with fixed precision so that text order is time order
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(e),
        ))
}

fn parse_sender(value: &str) -> rusqlite::Result<Sender> {
    value.parse::<Sender>().map_err(|e| rusqlite::Error::FromSqlConversionFailure(
        3,
        rusqlite::types::Type::Text,
        Box::new(e),
    ))
}

fn insert_report_message_impl(conn: &Connection, message: &NewMessageDocument) -> Result<MessageDocument> {
    let doc = MessageDocument {
        id: uuid::Uuid::new_v4().to_string(),
        chat_id: message.chat_id.clone(),
        text: message.text.clone(),
        sender: message.sender,
        // Stored precision, so the returned document matches a later read
        timestamp: Utc::now().trunc_subsecs(6),
        images: message.images.clone(),
    };

    let images_json = doc.images
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .context("Failed to serialize message images")?;

    conn.execute(
        r#"
        INSERT INTO report_messages (id, chat_id, text, sender, timestamp, images)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            doc.id,
            doc.chat_id,
            doc.text,
            doc.sender.as_str(),
            format_timestamp(&doc.timestamp),
            images_json,
        ],
    ).context("Failed to insert report message")?;

    Ok(doc)
}

fn get_report_messages_impl(conn: &Connection, chat_id: &str) -> Result<Vec<MessageDocument>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, chat_id, text, sender, timestamp, images
        FROM report_messages
        WHERE chat_id = ?
        ORDER BY timestamp ASC, rowid ASC
        "#
    ).context("Failed to prepare get_report_messages query")?;

    let rows = stmt.query_map(params![chat_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
        ))
    }).context("Failed to query report messages")?;

    let mut messages = Vec::new();
    for row in rows {
        let (id, chat_id, text, sender, timestamp, images) =
            row.context("Failed to read report message row")?;

        let images = images
            .map(|json| serde_json::from_str::<Vec<ImageRef>>(&json))
            .transpose()
            .with_context(|| format!("Invalid image list on message {}", id))?;

        messages.push(MessageDocument {
            timestamp: parse_timestamp(&timestamp)
                .with_context(|| format!("Invalid timestamp on message {}", id))?,
            id: id.clone(),
            chat_id,
            text,
            sender: parse_sender(&sender)
                .with_context(|| format!("Invalid sender on message {}", id))?,
            images,
        });
    }

    Ok(messages)
}
