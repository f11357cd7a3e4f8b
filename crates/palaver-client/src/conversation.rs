//! Conversation view models: ascending order, sender adjacency flags,
//! calendar-day grouping, and the cache set-difference.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use palaver_shared::{ChannelId, MessageId, MessageRecord, TransportError, UserId};
use palaver_store::CachedMessage;
use serde::Serialize;
use thiserror::Error;

/// Errors of the conversation flow.
#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("failed to fetch messages: {0}")]
    FetchFailed(#[source] TransportError),

    #[error("failed to send message: {0}")]
    SendFailed(#[source] TransportError),
}

/// Display-ready message entry.
///
/// The adjacency flags drive the grouped "continuation" styling and are
/// recomputed on every pass over the list.  Equality and hashing are both
/// derived from the remote message id.
#[derive(Debug, Clone, Serialize)]
pub struct MessageItem {
    pub id: MessageId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    /// The previous message in the ascending sequence has the same sender.
    pub is_previous_self: bool,
    /// The next message in the ascending sequence has the same sender.
    pub is_next_self: bool,
}

impl PartialEq for MessageItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MessageItem {}

impl Hash for MessageItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl From<MessageRecord> for MessageItem {
    fn from(r: MessageRecord) -> Self {
        Self {
            id: r.id,
            sender_id: r.sender_id,
            sender_name: r.sender_name,
            body: r.body,
            timestamp: r.timestamp,
            is_previous_self: false,
            is_next_self: false,
        }
    }
}

impl From<CachedMessage> for MessageItem {
    fn from(m: CachedMessage) -> Self {
        Self {
            id: m.id,
            sender_id: m.sender_id,
            sender_name: m.sender_name,
            body: m.body,
            timestamp: m.timestamp,
            is_previous_self: false,
            is_next_self: false,
        }
    }
}

impl MessageItem {
    /// Field-copy into the cache representation.
    pub fn to_cached(&self, channel_id: &ChannelId) -> CachedMessage {
        CachedMessage {
            id: self.id.clone(),
            channel_id: channel_id.clone(),
            sender_id: self.sender_id.clone(),
            sender_name: self.sender_name.clone(),
            body: self.body.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// One calendar day of a conversation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DaySection {
    pub day: NaiveDate,
    pub messages: Vec<MessageItem>,
}

/// Sort messages ascending by timestamp.
pub fn sort_ascending(messages: &mut [MessageItem]) {
    messages.sort_by_key(|m| m.timestamp);
}

/// Recompute the sender adjacency flags over an ascending sequence.
pub fn apply_adjacency(messages: &mut [MessageItem]) {
    for i in 0..messages.len() {
        let prev_same = i > 0 && messages[i - 1].sender_id == messages[i].sender_id;
        let next_same = i + 1 < messages.len() && messages[i + 1].sender_id == messages[i].sender_id;
        messages[i].is_previous_self = prev_same;
        messages[i].is_next_self = next_same;
    }
}

/// Group an ascending message sequence into calendar-day sections
/// (year/month/day in the given timezone).
pub fn group_by_day<Tz: TimeZone>(messages: Vec<MessageItem>, tz: &Tz) -> Vec<DaySection> {
    let mut sections: Vec<DaySection> = Vec::new();

    for message in messages {
        let day = message.timestamp.with_timezone(tz).date_naive();
        match sections.last_mut() {
            Some(section) if section.day == day => section.messages.push(message),
            _ => sections.push(DaySection {
                day,
                messages: vec![message],
            }),
        }
    }

    sections
}

/// Exactly the messages present in the fetched sequence but absent from the
/// cached set, compared by identifier alone.
pub fn new_since_cache<'a>(
    fetched: &'a [MessageItem],
    cached: &[CachedMessage],
) -> Vec<&'a MessageItem> {
    let cached_ids: HashSet<&str> = cached.iter().map(|m| m.id.as_str()).collect();
    fetched
        .iter()
        .filter(|m| !cached_ids.contains(m.id.as_str()))
        .collect()
}
