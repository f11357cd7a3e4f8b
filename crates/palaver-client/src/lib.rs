//! # palaver-client
//!
//! Channel and conversation synchronization for the Palaver chat client.
//!
//! The crate reconciles the remote channel/message feed (delivered by a
//! [`ChatTransport`] implementation) with the local cache in
//! `palaver-store`, and publishes display-ready view models through a typed
//! event channel.  The engine runs as a single tokio task; see
//! [`engine::spawn_engine`].
//!
//! [`ChatTransport`]: palaver_shared::ChatTransport

pub mod channels;
pub mod conversation;
pub mod engine;
pub mod profile;

pub use channels::{ChannelItem, ChannelListError};
pub use conversation::{ConversationError, DaySection, MessageItem};
pub use engine::{spawn_engine, SyncCommand, SyncEvent};
pub use profile::{ProfileError, ProfileService, SaveOutcome, UserProfile};

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the tracing subscriber for the host application.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("palaver_client=debug,palaver_store=info,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
