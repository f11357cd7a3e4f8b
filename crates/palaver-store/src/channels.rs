//! Cache operations for [`CachedChannel`] rows.

use chrono::{DateTime, Utc};
use palaver_shared::ChannelId;
use rusqlite::params;

use crate::database::Database;
use crate::error::Result;
use crate::models::CachedChannel;

impl Database {
    // ------------------------------------------------------------------
    // Write (best-effort)
    // ------------------------------------------------------------------

    /// Replace the cached channel list with the given snapshot.
    ///
    /// Runs inside a single transaction; on failure the transaction is
    /// rolled back and the error is logged, never surfaced.
    pub fn save_channels(&mut self, channels: &[CachedChannel]) {
        if let Err(e) = self.try_save_channels(channels) {
            tracing::warn!(error = %e, "channel cache write failed, rolled back");
        }
    }

    fn try_save_channels(&mut self, channels: &[CachedChannel]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        for channel in channels {
            // UPSERT rather than INSERT OR REPLACE: REPLACE deletes the row
            // first, which would cascade-delete the channel's cached messages.
            tx.execute(
                "INSERT INTO channels (id, name, logo_url, last_message, last_activity)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     logo_url = excluded.logo_url,
                     last_message = excluded.last_message,
                     last_activity = excluded.last_activity",
                params![
                    channel.id.as_str(),
                    channel.name,
                    channel.logo_url,
                    channel.last_message,
                    channel.last_activity.map(|t| t.to_rfc3339()),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// List all cached channels, ordered by last activity descending.
    /// Channels without any recorded activity sort last.
    pub fn cached_channels(&self) -> Result<Vec<CachedChannel>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, logo_url, last_message, last_activity
             FROM channels
             ORDER BY last_activity IS NULL, last_activity DESC",
        )?;

        let rows = stmt.query_map([], row_to_channel)?;

        let mut channels = Vec::new();
        for row in rows {
            channels.push(row?);
        }
        Ok(channels)
    }

    // ------------------------------------------------------------------
    // Delete (synchronous)
    // ------------------------------------------------------------------

    /// Delete a cached channel and, via the FK cascade, its messages.
    /// Returns `true` if a row was deleted.
    pub fn delete_channel(&self, id: &ChannelId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM channels WHERE id = ?1", params![id.as_str()])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`CachedChannel`].
fn row_to_channel(row: &rusqlite::Row<'_>) -> rusqlite::Result<CachedChannel> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let logo_url: Option<String> = row.get(2)?;
    let last_message: Option<String> = row.get(3)?;
    let activity_str: Option<String> = row.get(4)?;

    let last_activity: Option<DateTime<Utc>> = activity_str
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
        })
        .transpose()?;

    Ok(CachedChannel {
        id: ChannelId(id),
        name,
        logo_url,
        last_message,
        last_activity,
    })
}
