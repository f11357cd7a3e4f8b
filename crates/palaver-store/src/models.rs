//! Domain model structs persisted in the local cache database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the UI layer over IPC.

use chrono::{DateTime, Utc};
use palaver_shared::{ChannelId, MessageId, UserId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A cached channel row, reconciled from the remote record by field copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedChannel {
    /// Remote channel identifier.
    pub id: ChannelId,
    /// Human-readable channel name.
    pub name: String,
    /// Optional URL of the channel logo image.
    pub logo_url: Option<String>,
    /// Preview of the most recent message, if any.
    pub last_message: Option<String>,
    /// Timestamp of the most recent activity, if the channel ever saw one.
    pub last_activity: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A cached chat message, scoped to its parent channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedMessage {
    /// Remote message identifier.
    pub id: MessageId,
    /// The channel this message belongs to.
    pub channel_id: ChannelId,
    /// Remote identifier of the sender.
    pub sender_id: UserId,
    /// Display name of the sender at the time the message was fetched.
    pub sender_name: String,
    /// Message body text.
    pub body: String,
    /// When the message was sent (as reported by the backend).
    pub timestamp: DateTime<Utc>,
}
