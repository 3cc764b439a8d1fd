//! # sync-client
//!
//! Client library for the matrix-sync long-poll sync engine.
//!
//! [`MatrixClient`] maintains a continuously advancing cursor over a
//! homeserver's event stream, classifies incoming events, updates local
//! room and membership state, and fans events out to registered listeners.
//!
//! ## Features
//!
//! - **Pluggable transport**: the engine consumes a [`HomeserverApi`]
//!   collaborator; [`MockApi`] serves tests.
//! - **Pure bookkeeping**: room state, listener ordering, and backoff come
//!   from `sync-core` and carry no I/O.
//! - **Continuous listening**: `listen_forever` retries homeserver errors
//!   with capped exponential backoff and stops cooperatively.
//!
//! ## Example
//!
//! ```ignore
//! use matrix_sync_client::{MatrixClient, MockApi};
//!
//! let mut client = MatrixClient::new(api);
//! client.add_listener(|event| { println!("{}", event.event_type); Ok(()) },
//!                     Some("m.room.message"));
//! client.listen_forever(30_000, None, DEFAULT_INITIAL_BACKOFF).await?;
//! ```
//!
//! ## Concurrency
//!
//! One logical thread of control per client: every mutating entry point
//! takes `&mut self`, so at most one sync pass is in flight per instance
//! and listener callbacks run inline on that pass. The only cross-thread
//! surface is [`StopHandle`], an atomic flag observed between iterations.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod client;

pub use api::{HomeserverApi, MockApi, SyncCall};
pub use client::{
    ClientError, DispatchResult, EphemeralCallback, ErrorHandler, EventCallback, InviteCallback,
    LeaveCallback, MatrixClient, PresenceCallback, StopHandle, SyncDelta,
    DEFAULT_INITIAL_BACKOFF, DEFAULT_SYNC_TIMEOUT_MS,
};
pub use sync_core::{ListenerId, Room, RoomTracker, UserProfile};
pub use sync_types::{
    Event, LeftRoomUpdate, MatrixError, RoomId, SyncFilter, SyncResponse, UserId,
};
