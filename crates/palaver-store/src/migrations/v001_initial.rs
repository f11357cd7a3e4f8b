//! v001 -- Initial schema creation.
//!
//! Creates the two cache tables: `channels` and `messages`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Channels
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS channels (
    id            TEXT PRIMARY KEY NOT NULL,  -- remote channel id
    name          TEXT NOT NULL,
    logo_url      TEXT,
    last_message  TEXT,
    last_activity TEXT                        -- ISO-8601, null if never active
);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id          TEXT PRIMARY KEY NOT NULL,    -- remote message id
    channel_id  TEXT NOT NULL,                -- FK -> channels(id)
    sender_id   TEXT NOT NULL,
    sender_name TEXT NOT NULL,
    body        TEXT NOT NULL,
    timestamp   TEXT NOT NULL,                -- ISO-8601

    FOREIGN KEY (channel_id) REFERENCES channels(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_channel_ts
    ON messages(channel_id, timestamp ASC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
