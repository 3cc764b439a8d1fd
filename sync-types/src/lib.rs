//! # sync-types
//!
//! Wire format and domain types for the matrix-sync client engine.
//!
//! This crate provides the foundational types used across all matrix-sync
//! crates:
//! - [`RoomId`], [`UserId`] - Validated protocol identifiers
//! - [`Event`] - The discriminated event structure delivered by `/sync`
//! - [`SyncResponse`] - The tiered long-poll response schema
//! - [`SyncFilter`] - Declarative timeline limit for sync requests
//! - [`MatrixError`] - Error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod event;
mod filter;
mod ids;
mod response;

pub use error::MatrixError;
pub use event::Event;
pub use filter::SyncFilter;
pub use ids::{RoomId, UserId};
pub use response::{
    EventContainer, InvitedRoomUpdate, JoinedRoomUpdate, LeftRoomUpdate, RoomUpdates,
    SyncResponse, Timeline,
};
