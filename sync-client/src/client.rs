//! MatrixClient - the sync cursor, loop, and listener fan-out.
//!
//! This module provides [`MatrixClient`], the engine that drives repeated
//! long-poll requests against a [`HomeserverApi`], decomposes each tiered
//! response (presence / invite / leave / join / ephemeral), updates the
//! room tracker, and dispatches events to listeners in registration order.
//!
//! # Architecture
//!
//! ```text
//! Application → MatrixClient → HomeserverApi → Network
//!                    ↓
//!               sync-core (rooms, listeners, backoff - no I/O)
//! ```
//!
//! A sync pass commits the new cursor before any dispatch: a response that
//! arrives but whose dispatch partially fails still advances the cursor,
//! so a retried pass may duplicate straddling events but can never build
//! an unbounded backlog. Downstream consumers are expected to be
//! idempotent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use sync_core::{Backoff, ListenerId, ListenerRegistry, Room, RoomTracker, BACKOFF_CEILING};
use sync_types::{Event, LeftRoomUpdate, MatrixError, RoomId, SyncFilter};

use crate::api::HomeserverApi;

/// Default long-poll timeout handed to the homeserver.
pub const DEFAULT_SYNC_TIMEOUT_MS: u32 = 30_000;

/// Default initial retry delay for continuous listen mode.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(5);

/// Errors surfaced by a sync pass.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport collaborator failed the request.
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    /// A listener callback failed. The remainder of that dispatch pass was
    /// aborted; the cursor had already been committed.
    #[error("listener callback failed: {0}")]
    Listener(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ClientError {
    /// Whether this wraps a server-side (>= 500) homeserver response.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Matrix(err) if err.is_server_error())
    }
}

/// Result returned by listener callbacks. An `Err` aborts the remainder of
/// the dispatch pass for that sync iteration.
pub type DispatchResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Callback invoked for timeline events matching a global registration.
pub type EventCallback = Box<dyn FnMut(&Event) -> DispatchResult + Send>;

/// Callback invoked for each presence event.
pub type PresenceCallback = Box<dyn FnMut(&Event) -> DispatchResult + Send>;

/// Callback invoked with a room id and its stripped invite state.
pub type InviteCallback = Box<dyn FnMut(&RoomId, &[Event]) -> DispatchResult + Send>;

/// Callback invoked with a room id and the left-room payload.
pub type LeaveCallback = Box<dyn FnMut(&RoomId, &LeftRoomUpdate) -> DispatchResult + Send>;

/// Callback invoked for ephemeral events matching a registration.
pub type EphemeralCallback = Box<dyn FnMut(&Event) -> DispatchResult + Send>;

/// Handler for non-retryable errors during `listen_forever`. When present,
/// the loop reports the error and keeps listening instead of stopping.
pub type ErrorHandler = Box<dyn FnMut(&ClientError) + Send>;

/// Summary of one decomposed sync response.
#[derive(Debug, Clone, Default)]
pub struct SyncDelta {
    /// The cursor committed by this pass.
    pub next_batch: String,
    /// Number of presence events dispatched.
    pub presence_events: usize,
    /// Rooms reported under the invited section, in processing order.
    pub invited: Vec<RoomId>,
    /// Rooms reported under the left section, in processing order.
    pub left: Vec<RoomId>,
    /// Rooms reported under the joined section, in processing order.
    pub joined: Vec<RoomId>,
    /// Number of timeline events appended and dispatched.
    pub timeline_events: usize,
    /// Number of ephemeral events dispatched.
    pub ephemeral_events: usize,
}

/// Cooperative cancellation handle for `listen_forever`.
///
/// Clearing the flag stops the loop between iterations; a long-poll
/// already in flight completes or times out first.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Ask the listen loop to stop after the iteration in progress.
    pub fn stop(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// The client-side sync engine.
///
/// Owns the sync cursor, the joined-room tracker, and five independent
/// listener registries. All mutating entry points take `&mut self`: the
/// cursor and room state are not safe for concurrent mutation, and the
/// type system enforces at most one in-flight sync per instance.
pub struct MatrixClient<A: HomeserverApi> {
    api: A,
    sync_token: Option<String>,
    filter: String,
    encryption: bool,
    rooms: RoomTracker,
    listeners: ListenerRegistry<EventCallback>,
    presence_listeners: ListenerRegistry<PresenceCallback>,
    invite_listeners: ListenerRegistry<InviteCallback>,
    leave_listeners: ListenerRegistry<LeaveCallback>,
    ephemeral_listeners: ListenerRegistry<EphemeralCallback>,
    should_listen: Arc<AtomicBool>,
}

impl<A: HomeserverApi> MatrixClient<A> {
    /// Create a client with the default sync filter and encryption off.
    pub fn new(api: A) -> Self {
        Self {
            api,
            sync_token: None,
            filter: SyncFilter::default().to_filter_string(),
            encryption: false,
            rooms: RoomTracker::new(),
            listeners: ListenerRegistry::new(),
            presence_listeners: ListenerRegistry::new(),
            invite_listeners: ListenerRegistry::new(),
            leave_listeners: ListenerRegistry::new(),
            ephemeral_listeners: ListenerRegistry::new(),
            should_listen: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the sync filter (e.g. on re-login).
    pub fn with_filter(mut self, filter: SyncFilter) -> Self {
        self.filter = filter.to_filter_string();
        self
    }

    /// Enable the encryption capability. New rooms are probed for
    /// protocol-level encryption; the capability itself stays a no-op
    /// (no key exchange is performed).
    pub fn with_encryption(mut self, encryption: bool) -> Self {
        self.encryption = encryption;
        self
    }

    // ===========================================
    // Listener registration
    // ===========================================

    /// Register a global listener for timeline events. `event_type` of
    /// `None` matches every type.
    pub fn add_listener(
        &mut self,
        callback: impl FnMut(&Event) -> DispatchResult + Send + 'static,
        event_type: Option<&str>,
    ) -> ListenerId {
        self.listeners
            .register(Box::new(callback), event_type.map(String::from))
    }

    /// Remove a global listener. Idempotent.
    pub fn remove_listener(&mut self, id: &ListenerId) {
        self.listeners.unregister(id);
    }

    /// Register a presence listener.
    pub fn add_presence_listener(
        &mut self,
        callback: impl FnMut(&Event) -> DispatchResult + Send + 'static,
    ) -> ListenerId {
        self.presence_listeners.register(Box::new(callback), None)
    }

    /// Remove a presence listener. Idempotent.
    pub fn remove_presence_listener(&mut self, id: &ListenerId) {
        self.presence_listeners.unregister(id);
    }

    /// Register an invite listener, called with the room id and its
    /// stripped invite state.
    pub fn add_invite_listener(
        &mut self,
        callback: impl FnMut(&RoomId, &[Event]) -> DispatchResult + Send + 'static,
    ) -> ListenerId {
        self.invite_listeners.register(Box::new(callback), None)
    }

    /// Remove an invite listener. Idempotent.
    pub fn remove_invite_listener(&mut self, id: &ListenerId) {
        self.invite_listeners.unregister(id);
    }

    /// Register a leave listener, called with the room id and the
    /// left-room payload.
    pub fn add_leave_listener(
        &mut self,
        callback: impl FnMut(&RoomId, &LeftRoomUpdate) -> DispatchResult + Send + 'static,
    ) -> ListenerId {
        self.leave_listeners.register(Box::new(callback), None)
    }

    /// Remove a leave listener. Idempotent.
    pub fn remove_leave_listener(&mut self, id: &ListenerId) {
        self.leave_listeners.unregister(id);
    }

    /// Register an ephemeral-event listener. `event_type` of `None`
    /// matches every type.
    pub fn add_ephemeral_listener(
        &mut self,
        callback: impl FnMut(&Event) -> DispatchResult + Send + 'static,
        event_type: Option<&str>,
    ) -> ListenerId {
        self.ephemeral_listeners
            .register(Box::new(callback), event_type.map(String::from))
    }

    /// Remove an ephemeral-event listener. Idempotent.
    pub fn remove_ephemeral_listener(&mut self, id: &ListenerId) {
        self.ephemeral_listeners.unregister(id);
    }

    // ===========================================
    // Accessors
    // ===========================================

    /// The last committed cursor, `None` before the first successful sync.
    pub fn sync_token(&self) -> Option<&str> {
        self.sync_token.as_deref()
    }

    /// The tracked joined rooms and user arena.
    pub fn rooms(&self) -> &RoomTracker {
        &self.rooms
    }

    /// One tracked room, if joined.
    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// A handle that stops `listen_forever` cooperatively.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Arc::clone(&self.should_listen),
        }
    }

    /// Ask a running listen loop to stop after the iteration in progress.
    pub fn stop_listening(&self) {
        self.should_listen.store(false, Ordering::SeqCst);
    }

    // ===========================================
    // Sync
    // ===========================================

    /// Perform one sync pass.
    ///
    /// Issues a long-poll with the current cursor, commits the response's
    /// `next_batch`, then decomposes the response in order: presence,
    /// invites, leaves, one-time-key counts, joins. Absent sections are
    /// skipped silently. Listener failures abort the remainder of the
    /// dispatch pass but the cursor stays committed.
    pub async fn sync(&mut self, timeout_ms: u32) -> Result<SyncDelta, ClientError> {
        let response = self
            .api
            .sync(self.sync_token.as_deref(), timeout_ms, &self.filter)
            .await?;

        // Commit the cursor before dispatch; it is never rolled back.
        self.sync_token = Some(response.next_batch.clone());

        let mut delta = SyncDelta {
            next_batch: response.next_batch.clone(),
            ..Default::default()
        };

        for event in &response.presence.events {
            for callback in self.presence_listeners.iter_mut() {
                callback(event).map_err(ClientError::Listener)?;
            }
            delta.presence_events += 1;
        }

        for (room_id, update) in &response.rooms.invite {
            for callback in self.invite_listeners.iter_mut() {
                callback(room_id, &update.invite_state.events).map_err(ClientError::Listener)?;
            }
            delta.invited.push(room_id.clone());
        }

        for (room_id, update) in &response.rooms.leave {
            for callback in self.leave_listeners.iter_mut() {
                callback(room_id, update).map_err(ClientError::Listener)?;
            }
            if self.rooms.remove_room(room_id).is_some() {
                tracing::debug!(room = %room_id, "left room dropped from joined set");
            }
            delta.left.push(room_id.clone());
        }

        if self.encryption && !response.device_one_time_keys_count.is_empty() {
            // Key replenishment needs the OLM bindings, which are not
            // implemented; the counts are acknowledged and dropped.
            tracing::debug!(
                counts = ?response.device_one_time_keys_count,
                "ignoring one-time key counts, encryption is a stub"
            );
        }

        for (room_id, update) in &response.rooms.join {
            self.register_joined_room(room_id).await?;
            if let Some(room) = self.rooms.get_mut(room_id) {
                room.prev_batch = update.timeline.prev_batch.clone();
            }

            // The wire format may report state once across all rooms; it is
            // applied to every joined room processed in this pass, matching
            // upstream behavior.
            for event in &response.state.events {
                let mut event = event.clone();
                event.stamp_room(room_id.clone());
                self.rooms.apply_state_event(room_id, event);
            }

            for event in &update.timeline.events {
                let mut event = event.clone();
                event.stamp_room(room_id.clone());
                if let Some(room) = self.rooms.get_mut(room_id) {
                    room.put_event(event.clone());
                }
                for callback in self.listeners.matching_mut(&event.event_type) {
                    callback(&event).map_err(ClientError::Listener)?;
                }
                delta.timeline_events += 1;
            }

            for event in &update.ephemeral.events {
                let mut event = event.clone();
                event.stamp_room(room_id.clone());
                if let Some(room) = self.rooms.get_mut(room_id) {
                    room.put_ephemeral_event(&event);
                }
                for callback in self.ephemeral_listeners.matching_mut(&event.event_type) {
                    callback(&event).map_err(ClientError::Listener)?;
                }
                delta.ephemeral_events += 1;
            }

            delta.joined.push(room_id.clone());
        }

        Ok(delta)
    }

    /// Ensure a joined room is tracked, probing the encryption capability
    /// for rooms seen for the first time. This is the same creation path
    /// an explicit join would take.
    async fn register_joined_room(&mut self, room_id: &RoomId) -> Result<(), ClientError> {
        if self.rooms.contains(room_id) {
            return Ok(());
        }
        let encrypted = if self.encryption {
            self.probe_encryption(room_id).await?
        } else {
            false
        };
        let room = self.rooms.ensure_room(room_id.clone());
        room.set_encrypted(encrypted);
        tracing::debug!(room = %room_id, encrypted, "tracking newly joined room");
        Ok(())
    }

    /// A 404 from the probe means "not encrypted"; any other failure
    /// propagates.
    async fn probe_encryption(&self, room_id: &RoomId) -> Result<bool, ClientError> {
        match self.api.state_event(room_id, "m.room.encryption").await {
            Ok(content) => Ok(content.get("algorithm").and_then(|a| a.as_str())
                == Some("m.megolm.v1.aes-sha2")),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    // ===========================================
    // Continuous listening
    // ===========================================

    /// Sync in a loop until stopped.
    ///
    /// Homeserver errors (status >= 500) are retried after a doubling
    /// delay starting at `initial_backoff`, capped at one hour, and reset
    /// only by a successful pass. Every other error is handed to
    /// `on_error` when supplied, or ends the loop by propagating.
    ///
    /// Cancellation is cooperative: [`StopHandle::stop`] (or
    /// [`MatrixClient::stop_listening`]) is observed between iterations,
    /// after any in-flight long-poll completes or times out.
    pub async fn listen_forever(
        &mut self,
        timeout_ms: u32,
        mut on_error: Option<ErrorHandler>,
        initial_backoff: Duration,
    ) -> Result<(), ClientError> {
        self.should_listen.store(true, Ordering::SeqCst);
        let mut backoff = Backoff::new(initial_backoff, BACKOFF_CEILING);
        tracing::info!(timeout_ms, "entering continuous listen mode");

        while self.should_listen.load(Ordering::SeqCst) {
            match self.sync(timeout_ms).await {
                Ok(delta) => {
                    backoff.reset();
                    tracing::debug!(
                        next_batch = %delta.next_batch,
                        joined = delta.joined.len(),
                        timeline_events = delta.timeline_events,
                        "sync pass complete"
                    );
                }
                Err(err) if err.is_server_error() => {
                    let delay = backoff.next_delay();
                    tracing::warn!(error = %err, ?delay, "homeserver error, backing off");
                    tokio::time::sleep(delay).await;
                }
                // TODO: transport failures take the fatal path below like any
                // other client-side error; they should arguably back off the
                // way 5xx responses do.
                Err(err) => match on_error.as_mut() {
                    Some(handler) => {
                        tracing::warn!(error = %err, "sync error handed to error handler");
                        handler(&err);
                    }
                    None => {
                        tracing::error!(error = %err, "sync error with no handler, stopping");
                        return Err(err);
                    }
                },
            }
        }

        tracing::info!("listen loop stopped");
        Ok(())
    }
}
