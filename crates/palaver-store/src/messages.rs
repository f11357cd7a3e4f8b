//! Cache operations for [`CachedMessage`] rows.

use chrono::{DateTime, Utc};
use palaver_shared::{ChannelId, MessageId, UserId};
use rusqlite::params;

use crate::database::Database;
use crate::error::Result;
use crate::models::CachedMessage;

impl Database {
    /// Persist messages for a channel.
    ///
    /// Runs inside a single transaction; on failure the transaction is
    /// rolled back and the error is logged, never surfaced.  Duplicate
    /// message ids are expected and ignored, so callers may hand over a
    /// superset of what is already cached.
    pub fn save_messages(&mut self, channel_id: &ChannelId, messages: &[CachedMessage]) {
        if let Err(e) = self.try_save_messages(channel_id, messages) {
            tracing::warn!(
                channel = %channel_id,
                error = %e,
                "message cache write failed, rolled back"
            );
        }
    }

    fn try_save_messages(&mut self, channel_id: &ChannelId, messages: &[CachedMessage]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        // The FK requires a parent row; a placeholder is fine, the next
        // channel snapshot fills in the real fields.
        tx.execute(
            "INSERT INTO channels (id, name) VALUES (?1, '')
             ON CONFLICT(id) DO NOTHING",
            params![channel_id.as_str()],
        )?;

        for message in messages {
            tx.execute(
                "INSERT OR IGNORE INTO messages
                     (id, channel_id, sender_id, sender_name, body, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    message.id.as_str(),
                    message.channel_id.as_str(),
                    message.sender_id.as_str(),
                    message.sender_name,
                    message.body,
                    message.timestamp.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Fetch all cached messages of a channel, ascending by timestamp.
    ///
    /// A channel that was never cached yields an empty list, not an error.
    pub fn cached_messages(&self, channel_id: &ChannelId) -> Result<Vec<CachedMessage>> {
        let exists: bool = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM channels WHERE id = ?1)",
            params![channel_id.as_str()],
            |row| row.get(0),
        )?;
        if !exists {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn().prepare(
            "SELECT id, channel_id, sender_id, sender_name, body, timestamp
             FROM messages
             WHERE channel_id = ?1
             ORDER BY timestamp ASC",
        )?;

        let rows = stmt.query_map(params![channel_id.as_str()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<CachedMessage> {
    let id: String = row.get(0)?;
    let channel_id: String = row.get(1)?;
    let sender_id: String = row.get(2)?;
    let sender_name: String = row.get(3)?;
    let body: String = row.get(4)?;
    let ts_str: String = row.get(5)?;

    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(CachedMessage {
        id: MessageId(id),
        channel_id: ChannelId(channel_id),
        sender_id: UserId(sender_id),
        sender_name,
        body,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn open_test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn message(id: &str, channel: &str, minute: u32) -> CachedMessage {
        CachedMessage {
            id: MessageId::from(id),
            channel_id: ChannelId::from(channel),
            sender_id: UserId::from("u1"),
            sender_name: "Alice".into(),
            body: format!("message {id}"),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn unknown_channel_yields_empty_not_error() {
        let (_dir, db) = open_test_db();
        let messages = db.cached_messages(&ChannelId::from("nope")).unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn cached_messages_are_ascending_by_timestamp() {
        let (_dir, mut db) = open_test_db();
        let channel = ChannelId::from("a");

        db.save_messages(
            &channel,
            &[
                message("m2", "a", 30),
                message("m1", "a", 10),
                message("m3", "a", 50),
            ],
        );

        let cached = db.cached_messages(&channel).unwrap();
        let ids: Vec<&str> = cached.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn duplicate_message_ids_are_ignored() {
        let (_dir, mut db) = open_test_db();
        let channel = ChannelId::from("a");

        db.save_messages(&channel, &[message("m1", "a", 10)]);
        db.save_messages(&channel, &[message("m1", "a", 10), message("m2", "a", 20)]);

        let cached = db.cached_messages(&channel).unwrap();
        assert_eq!(cached.len(), 2);
    }

    #[test]
    fn messages_are_scoped_to_their_channel() {
        let (_dir, mut db) = open_test_db();

        db.save_messages(&ChannelId::from("a"), &[message("m1", "a", 10)]);
        db.save_messages(&ChannelId::from("b"), &[message("m2", "b", 20)]);

        let a = db.cached_messages(&ChannelId::from("a")).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].id.as_str(), "m1");
    }
}
