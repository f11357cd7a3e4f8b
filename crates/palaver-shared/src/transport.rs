//! Contract for the vendor chat backend.
//!
//! The synchronization engine only ever talks to the backend through this
//! trait; the production implementation wraps the vendor SDK, tests use an
//! in-memory fake.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::records::{ChannelRecord, MessageRecord, RemoteEvent};
use crate::types::{ChannelId, UserId};

/// Errors surfaced by the chat backend.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("remote call failed: {0}")]
    Remote(String),

    #[error("transport is offline")]
    Offline,
}

/// Operations the synchronization engine requires from the chat backend.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Load the full channel list.
    async fn load_channels(&self) -> Result<Vec<ChannelRecord>, TransportError>;

    /// Create a channel with the given name and return the created record.
    async fn create_channel(&self, name: &str) -> Result<ChannelRecord, TransportError>;

    /// Delete a channel.
    async fn delete_channel(&self, id: &ChannelId) -> Result<(), TransportError>;

    /// Load all messages of a channel.
    async fn load_messages(
        &self,
        channel_id: &ChannelId,
    ) -> Result<Vec<MessageRecord>, TransportError>;

    /// Send a text message into a channel on behalf of the given user.
    async fn send_message(
        &self,
        channel_id: &ChannelId,
        text: &str,
        sender_id: &UserId,
        sender_name: &str,
    ) -> Result<(), TransportError>;

    /// Subscribe to the push event stream. Each call returns a fresh
    /// receiver; the subscription ends when the receiver is dropped.
    fn subscribe(&self) -> mpsc::Receiver<RemoteEvent>;
}
