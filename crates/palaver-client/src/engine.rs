//! Synchronization engine with tokio mpsc command/event pattern.
//!
//! The engine loop runs in a dedicated tokio task.  External code (the UI
//! layer) communicates with it through typed command and event channels,
//! keeping the synchronization logic fully asynchronous and decoupled.
//! Subscriber teardown is the natural one: dropping the command sender (or
//! sending [`SyncCommand::Shutdown`]) ends the loop, and the transport event
//! subscription dies with the task.

use std::sync::Arc;

use chrono::{Local, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use palaver_shared::{ChannelId, ChatTransport, RemoteEvent};
use palaver_store::{CachedChannel, CachedMessage, Database};

use crate::channels::{self, ChannelItem, ChannelListError};
use crate::conversation::{self, ConversationError, DaySection, MessageItem};
use crate::profile::ProfileService;

const CHANNEL_CAPACITY: usize = 256;

/// Commands sent *into* the engine task.
#[derive(Debug)]
pub enum SyncCommand {
    /// Fetch the full remote channel list and publish it.
    FetchChannels,
    /// Answer with the already-fetched channels whose name contains the
    /// keyword (no remote call).
    FilterChannels {
        keyword: String,
        reply: oneshot::Sender<Vec<ChannelItem>>,
    },
    /// Create a channel remotely; a success triggers a full re-fetch.
    CreateChannel { name: String },
    /// Delete a channel remotely; the caller re-fetches after the
    /// [`SyncEvent::ChannelDeleted`] signal.
    DeleteChannel { id: ChannelId },
    /// Make a channel the active conversation and fetch its messages.
    OpenConversation { channel_id: ChannelId },
    /// Re-fetch the active conversation.
    FetchMessages,
    /// Send a text message into the active conversation.
    SendMessage { text: String },
    /// Gracefully stop the engine.
    Shutdown,
}

/// Events sent *from* the engine task to its subscriber.
#[derive(Debug)]
pub enum SyncEvent {
    /// A fresh, display-sorted channel list.
    ChannelsUpdated(Vec<ChannelItem>),
    /// A channel was deleted remotely and removed from the cache.
    ChannelDeleted(ChannelId),
    /// The active conversation, grouped into calendar-day sections.
    ConversationUpdated {
        channel_id: ChannelId,
        days: Vec<DaySection>,
    },
    /// A message was accepted by the backend (the re-fetch follows).
    MessageSent { channel_id: ChannelId },
    /// A channel list operation failed.
    ChannelListFailed(ChannelListError),
    /// A conversation operation failed.
    ConversationFailed(ConversationError),
}

/// Spawn the synchronization engine in a background tokio task.
///
/// Returns the command sender and the event receiver.  The transport, store,
/// and profile service are owned by the task for its lifetime; construct
/// them at the composition root and hand them over here.
pub fn spawn_engine(
    transport: Arc<dyn ChatTransport>,
    store: Database,
    profile: ProfileService,
) -> (mpsc::Sender<SyncCommand>, mpsc::Receiver<SyncEvent>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let remote_rx = transport.subscribe();

    tokio::spawn(async move {
        let engine = Engine {
            transport,
            store,
            profile,
            channels: Vec::new(),
            active_channel: None,
            event_tx,
        };
        engine.run(cmd_rx, remote_rx).await;
    });

    (cmd_tx, event_rx)
}

struct Engine {
    transport: Arc<dyn ChatTransport>,
    store: Database,
    profile: ProfileService,
    /// Last successfully published channel list; the keyword filter operates
    /// on this snapshot without touching the network.
    channels: Vec<ChannelItem>,
    active_channel: Option<ChannelId>,
    event_tx: mpsc::Sender<SyncEvent>,
}

impl Engine {
    /// Main loop over commands and remote push events.
    ///
    /// Every command and event is handled to completion before the next one
    /// is taken, so a newer fetch can never be overtaken by the result of an
    /// older one.
    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<SyncCommand>,
        mut remote_rx: mpsc::Receiver<RemoteEvent>,
    ) {
        info!("sync engine started");

        let mut remote_open = true;

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(SyncCommand::FetchChannels) => self.fetch_channels().await,
                        Some(SyncCommand::FilterChannels { keyword, reply }) => {
                            let _ = reply.send(channels::filter_by_keyword(&self.channels, &keyword));
                        }
                        Some(SyncCommand::CreateChannel { name }) => self.create_channel(&name).await,
                        Some(SyncCommand::DeleteChannel { id }) => self.delete_channel(id).await,
                        Some(SyncCommand::OpenConversation { channel_id }) => {
                            self.active_channel = Some(channel_id);
                            self.fetch_messages().await;
                        }
                        Some(SyncCommand::FetchMessages) => self.fetch_messages().await,
                        Some(SyncCommand::SendMessage { text }) => self.send_message(&text).await,
                        Some(SyncCommand::Shutdown) => {
                            info!("sync engine shutdown requested");
                            break;
                        }
                        None => {
                            info!("command channel closed, stopping sync engine");
                            break;
                        }
                    }
                }

                event = remote_rx.recv(), if remote_open => {
                    match event {
                        Some(event) => self.handle_remote_event(event).await,
                        None => {
                            warn!("remote event stream ended");
                            remote_open = false;
                        }
                    }
                }
            }
        }

        info!("sync engine stopped");
    }

    // ------------------------------------------------------------------
    // Channel list flow
    // ------------------------------------------------------------------

    async fn fetch_channels(&mut self) {
        match self.transport.load_channels().await {
            Ok(records) => {
                let mut items: Vec<ChannelItem> =
                    records.into_iter().map(ChannelItem::from).collect();
                channels::sort_for_display(&mut items, Utc::now());

                let snapshot: Vec<CachedChannel> =
                    items.iter().map(ChannelItem::to_cached).collect();
                self.store.save_channels(&snapshot);

                debug!(count = items.len(), "channel list fetched");
                self.channels = items.clone();
                self.emit(SyncEvent::ChannelsUpdated(items)).await;
            }
            Err(e) => {
                warn!(error = %e, "channel fetch failed");
                self.emit(SyncEvent::ChannelListFailed(ChannelListError::FetchFailed(e)))
                    .await;
                self.publish_cached_channels().await;
            }
        }
    }

    /// Offline fallback: serve the cached channel list, if any.
    async fn publish_cached_channels(&mut self) {
        match self.store.cached_channels() {
            Ok(cached) if !cached.is_empty() => {
                let items: Vec<ChannelItem> = cached.into_iter().map(ChannelItem::from).collect();
                debug!(count = items.len(), "serving cached channel list");
                self.channels = items.clone();
                self.emit(SyncEvent::ChannelsUpdated(items)).await;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "cached channel read failed"),
        }
    }

    async fn create_channel(&mut self, name: &str) {
        match self.transport.create_channel(name).await {
            Ok(record) => {
                info!(channel = %record.id, name = %record.name, "channel created");
                // No optimistic insert; the re-fetch is the source of truth.
                self.fetch_channels().await;
            }
            Err(e) => {
                warn!(name, error = %e, "channel create failed");
                self.emit(SyncEvent::ChannelListFailed(ChannelListError::CreateFailed(e)))
                    .await;
            }
        }
    }

    async fn delete_channel(&mut self, id: ChannelId) {
        match self.transport.delete_channel(&id).await {
            Ok(()) => {
                if let Err(e) = self.store.delete_channel(&id) {
                    warn!(channel = %id, error = %e, "cached channel delete failed");
                }
                if self.active_channel.as_ref() == Some(&id) {
                    self.active_channel = None;
                }
                info!(channel = %id, "channel deleted");
                // The caller decides when to re-fetch the list.
                self.emit(SyncEvent::ChannelDeleted(id)).await;
            }
            Err(e) => {
                warn!(channel = %id, error = %e, "channel delete failed");
                self.emit(SyncEvent::ChannelListFailed(ChannelListError::DeleteFailed(e)))
                    .await;
            }
        }
    }

    // ------------------------------------------------------------------
    // Conversation flow
    // ------------------------------------------------------------------

    async fn fetch_messages(&mut self) {
        let Some(channel_id) = self.active_channel.clone() else {
            debug!("no active conversation, ignoring message fetch");
            return;
        };

        match self.transport.load_messages(&channel_id).await {
            Ok(records) => {
                let mut items: Vec<MessageItem> =
                    records.into_iter().map(MessageItem::from).collect();
                conversation::sort_ascending(&mut items);
                conversation::apply_adjacency(&mut items);

                // Persist exactly what the cache has not seen yet.
                let cached = self.store.cached_messages(&channel_id).unwrap_or_default();
                let fresh: Vec<CachedMessage> = conversation::new_since_cache(&items, &cached)
                    .into_iter()
                    .map(|m| m.to_cached(&channel_id))
                    .collect();
                if !fresh.is_empty() {
                    debug!(channel = %channel_id, count = fresh.len(), "caching new messages");
                    self.store.save_messages(&channel_id, &fresh);
                }

                let days = conversation::group_by_day(items, &Local);
                self.emit(SyncEvent::ConversationUpdated { channel_id, days })
                    .await;
            }
            Err(e) => {
                warn!(channel = %channel_id, error = %e, "message fetch failed");
                self.emit(SyncEvent::ConversationFailed(ConversationError::FetchFailed(e)))
                    .await;
                self.publish_cached_messages(channel_id).await;
            }
        }
    }

    /// Offline fallback: serve the cached conversation, if any.
    async fn publish_cached_messages(&mut self, channel_id: ChannelId) {
        match self.store.cached_messages(&channel_id) {
            Ok(cached) if !cached.is_empty() => {
                // Cached rows come back ascending by timestamp.
                let mut items: Vec<MessageItem> =
                    cached.into_iter().map(MessageItem::from).collect();
                conversation::apply_adjacency(&mut items);

                let days = conversation::group_by_day(items, &Local);
                debug!(channel = %channel_id, "serving cached conversation");
                self.emit(SyncEvent::ConversationUpdated { channel_id, days })
                    .await;
            }
            Ok(_) => {}
            Err(e) => warn!(channel = %channel_id, error = %e, "cached message read failed"),
        }
    }

    async fn send_message(&mut self, text: &str) {
        let Some(channel_id) = self.active_channel.clone() else {
            debug!("no active conversation, dropping outgoing message");
            return;
        };

        let sender_id = self.profile.user_id().clone();
        let sender_name = self.profile.current().name.clone();

        match self
            .transport
            .send_message(&channel_id, text, &sender_id, &sender_name)
            .await
        {
            Ok(()) => {
                info!(channel = %channel_id, "message sent");
                self.emit(SyncEvent::MessageSent {
                    channel_id: channel_id.clone(),
                })
                .await;
                self.fetch_messages().await;
            }
            Err(e) => {
                warn!(channel = %channel_id, error = %e, "message send failed");
                self.emit(SyncEvent::ConversationFailed(ConversationError::SendFailed(e)))
                    .await;
            }
        }
    }

    // ------------------------------------------------------------------
    // Remote push events
    // ------------------------------------------------------------------

    async fn handle_remote_event(&mut self, event: RemoteEvent) {
        if self.active_channel.as_ref() == Some(&event.resource_id) {
            debug!(channel = %event.resource_id, "remote update for active conversation");
            self.fetch_messages().await;
        } else {
            debug!(channel = %event.resource_id, "remote update for inactive channel, ignored");
        }
    }

    async fn emit(&mut self, event: SyncEvent) {
        if self.event_tx.send(event).await.is_err() {
            debug!("event receiver dropped");
        }
    }
}
