//! # sync-core
//!
//! Pure logic for matrix-sync (no I/O, instant tests).
//!
//! This crate implements the bookkeeping behind the sync engine without any
//! network I/O:
//! - [`ListenerRegistry`] - ordered callback registrations per listener kind
//! - [`RoomTracker`] / [`Room`] - joined-room state, timelines, and the
//!   shared user arena
//! - [`Backoff`] - capped exponential retry delays for continuous listening
//!
//! ## Design Philosophy
//!
//! Everything here is deterministic and side-effect free. The actual I/O
//! (the long-poll request, backoff sleeps) is performed by `sync-client`,
//! which drives these structures from each decoded response.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backoff;
pub mod listeners;
pub mod rooms;

pub use backoff::{Backoff, BACKOFF_CEILING};
pub use listeners::{ListenerId, ListenerRegistry};
pub use rooms::{Room, RoomTracker, UserProfile};
