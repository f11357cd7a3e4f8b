//! Record types returned by the chat backend.
//!
//! Every struct derives `Serialize` and `Deserialize` so a UI layer can
//! forward it over IPC unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, MessageId, UserId};

/// A channel as reported by the remote backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelRecord {
    pub id: ChannelId,
    /// Human-readable channel name.
    pub name: String,
    /// Optional URL of the channel logo image.
    pub logo_url: Option<String>,
    /// Preview of the most recent message, if any.
    pub last_message: Option<String>,
    /// Timestamp of the most recent activity. Channels that never saw a
    /// message have none.
    pub last_activity: Option<DateTime<Utc>>,
}

/// A single chat message as reported by the remote backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageRecord {
    pub id: MessageId,
    pub sender_id: UserId,
    pub sender_name: String,
    /// Message body text.
    pub body: String,
    /// When the message was sent, as reported by the backend.
    pub timestamp: DateTime<Utc>,
}

/// A push event from the backend's subscription stream.
///
/// Events carry only the identifier of the channel whose data changed; the
/// engine reacts by re-fetching, never by patching incrementally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteEvent {
    pub resource_id: ChannelId,
}
