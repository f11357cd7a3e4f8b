//! Channel list view models and ordering rules.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use palaver_shared::{ChannelId, ChannelRecord, TransportError};
use palaver_store::CachedChannel;
use serde::Serialize;
use thiserror::Error;

/// Errors of the channel list flow.  Each operation fails with its own
/// variant; no corrective action is taken by this layer.
#[derive(Error, Debug)]
pub enum ChannelListError {
    #[error("failed to fetch channels: {0}")]
    FetchFailed(#[source] TransportError),

    #[error("failed to create channel: {0}")]
    CreateFailed(#[source] TransportError),

    #[error("failed to delete channel: {0}")]
    DeleteFailed(#[source] TransportError),
}

/// Display-ready channel entry.
///
/// Built fresh on every fetch; there is no identity map.  Two instances
/// describing the same remote channel compare equal by id alone, and the
/// hash is derived from that same id.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelItem {
    pub id: ChannelId,
    pub name: String,
    pub logo_url: Option<String>,
    pub last_message: Option<String>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl PartialEq for ChannelItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ChannelItem {}

impl Hash for ChannelItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl From<ChannelRecord> for ChannelItem {
    fn from(r: ChannelRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            logo_url: r.logo_url,
            last_message: r.last_message,
            last_activity: r.last_activity,
        }
    }
}

impl From<CachedChannel> for ChannelItem {
    fn from(c: CachedChannel) -> Self {
        Self {
            id: c.id,
            name: c.name,
            logo_url: c.logo_url,
            last_message: c.last_message,
            last_activity: c.last_activity,
        }
    }
}

impl ChannelItem {
    /// Field-copy into the cache representation.
    pub fn to_cached(&self) -> CachedChannel {
        CachedChannel {
            id: self.id.clone(),
            name: self.name.clone(),
            logo_url: self.logo_url.clone(),
            last_message: self.last_message.clone(),
            last_activity: self.last_activity,
        }
    }
}

/// Sort a fetched channel list ascending by last activity for display.
///
/// A channel with no recorded activity is treated as active `now`, which
/// biases it to the end of the list.
pub fn sort_for_display(channels: &mut [ChannelItem], now: DateTime<Utc>) {
    channels.sort_by_key(|c| c.last_activity.unwrap_or(now));
}

/// Case-insensitive name-contains filter over an already-fetched list.
///
/// Matches are sorted descending by last activity.  A comparison where
/// either side has no timestamp resolves to `Equal`, keeping the relative
/// order of those entries.
pub fn filter_by_keyword(channels: &[ChannelItem], keyword: &str) -> Vec<ChannelItem> {
    let needle = keyword.to_lowercase();

    let mut matches: Vec<ChannelItem> = channels
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    matches.sort_by(|a, b| match (a.last_activity, b.last_activity) {
        (Some(a), Some(b)) => b.cmp(&a),
        _ => Ordering::Equal,
    });

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn item(id: &str, name: &str, last_activity: Option<DateTime<Utc>>) -> ChannelItem {
        ChannelItem {
            id: ChannelId::from(id),
            name: name.to_string(),
            logo_url: None,
            last_message: None,
            last_activity,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn missing_activity_sorts_to_the_end() {
        let now = at(10, 12);
        let mut channels = vec![
            item("b", "beta", None),
            item("a", "alpha", Some(at(1, 12))),
            item("c", "gamma", Some(at(2, 12))),
        ];

        sort_for_display(&mut channels, now);

        let ids: Vec<&str> = channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn fetch_sort_scenario_from_remote_order() {
        // fetch returns [{id:"a", lastActivity: t1}, {id:"b", lastActivity: nil}]
        let now = at(10, 12);
        let mut channels = vec![item("a", "alpha", Some(at(1, 12))), item("b", "beta", None)];

        sort_for_display(&mut channels, now);

        let ids: Vec<&str> = channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn filter_is_case_insensitive_contains() {
        let channels = vec![
            item("a", "Rust News", Some(at(1, 12))),
            item("b", "random", Some(at(2, 12))),
            item("c", "trust me", Some(at(3, 12))),
        ];

        let filtered = filter_by_keyword(&channels, "RUS");
        let ids: Vec<&str> = filtered.iter().map(|c| c.id.as_str()).collect();

        // descending by last activity
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn filter_keeps_relative_order_for_missing_timestamps() {
        let channels = vec![
            item("a", "chat one", None),
            item("b", "chat two", Some(at(1, 12))),
            item("c", "chat three", None),
        ];

        let filtered = filter_by_keyword(&channels, "chat");
        let ids: Vec<&str> = filtered.iter().map(|c| c.id.as_str()).collect();

        // No comparison involving a missing timestamp reorders anything.
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn equality_and_hash_follow_the_id() {
        let one = item("a", "alpha", Some(at(1, 12)));
        let two = item("a", "renamed", None);
        let other = item("b", "alpha", Some(at(1, 12)));

        assert_eq!(one, two);
        assert_ne!(one, other);

        let set: HashSet<ChannelItem> = [one, two, other].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
