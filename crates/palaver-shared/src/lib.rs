//! # palaver-shared
//!
//! Types shared between the synchronization engine and the local store:
//! identifier newtypes, the record types the chat backend returns, and the
//! [`ChatTransport`] trait that abstracts the vendor SDK.

pub mod records;
pub mod transport;
pub mod types;

pub use records::{ChannelRecord, MessageRecord, RemoteEvent};
pub use transport::{ChatTransport, TransportError};
pub use types::{ChannelId, MessageId, UserId};
