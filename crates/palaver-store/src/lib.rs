//! # palaver-store
//!
//! Local message/channel cache backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for the cached domain
//! models.  Writes are best-effort: a failed save is logged and rolled back
//! without surfacing an error to the caller.  Reads either succeed, return
//! empty, or surface a [`StoreError`] depending on the call site.

pub mod channels;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod models;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
