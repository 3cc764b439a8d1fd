//! Mock homeserver API for testing.
//!
//! Allows queueing sync results and capturing issued requests for
//! verification.

use super::HomeserverApi;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use sync_types::{MatrixError, RoomId, SyncResponse};

/// One recorded call to [`HomeserverApi::sync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCall {
    /// The cursor the client presented.
    pub since: Option<String>,
    /// The requested long-poll timeout.
    pub timeout_ms: u32,
    /// The rendered filter string.
    pub filter: String,
}

enum StateProbe {
    Content(serde_json::Value),
    Failure { status: u16, body: String },
}

#[derive(Default)]
struct MockApiInner {
    sync_queue: VecDeque<Result<SyncResponse, MatrixError>>,
    sync_calls: Vec<SyncCall>,
    state_events: HashMap<(RoomId, String), StateProbe>,
}

/// Mock homeserver API for testing.
///
/// Sync results are consumed FIFO; an empty queue answers with a
/// `Transport` error, which ends a handler-less listen loop
/// deterministically in tests. Clones share the same queue and call log.
#[derive(Clone, Default)]
pub struct MockApi {
    inner: Arc<Mutex<MockApiInner>>,
}

impl MockApi {
    /// Create a new mock with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful sync response.
    pub fn queue_sync(&self, response: SyncResponse) {
        let mut inner = self.inner.lock().unwrap();
        inner.sync_queue.push_back(Ok(response));
    }

    /// Queue a sync failure.
    pub fn queue_sync_error(&self, error: MatrixError) {
        let mut inner = self.inner.lock().unwrap();
        inner.sync_queue.push_back(Err(error));
    }

    /// All sync calls issued so far.
    pub fn sync_calls(&self) -> Vec<SyncCall> {
        let inner = self.inner.lock().unwrap();
        inner.sync_calls.clone()
    }

    /// Serve `content` for a `state_event(room_id, event_type)` probe.
    pub fn set_state_event(&self, room_id: RoomId, event_type: &str, content: serde_json::Value) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .state_events
            .insert((room_id, event_type.to_string()), StateProbe::Content(content));
    }

    /// Fail a `state_event(room_id, event_type)` probe with the given
    /// status. Probes with no configured entry answer 404.
    pub fn fail_state_event(&self, room_id: RoomId, event_type: &str, status: u16, body: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.state_events.insert(
            (room_id, event_type.to_string()),
            StateProbe::Failure {
                status,
                body: body.to_string(),
            },
        );
    }
}

#[async_trait]
impl HomeserverApi for MockApi {
    async fn sync(
        &self,
        since: Option<&str>,
        timeout_ms: u32,
        filter: &str,
    ) -> Result<SyncResponse, MatrixError> {
        let mut inner = self.inner.lock().unwrap();
        inner.sync_calls.push(SyncCall {
            since: since.map(String::from),
            timeout_ms,
            filter: filter.to_string(),
        });
        inner
            .sync_queue
            .pop_front()
            .unwrap_or_else(|| Err(MatrixError::Transport("no queued sync response".into())))
    }

    async fn state_event(
        &self,
        room_id: &RoomId,
        event_type: &str,
    ) -> Result<serde_json::Value, MatrixError> {
        let inner = self.inner.lock().unwrap();
        match inner
            .state_events
            .get(&(room_id.clone(), event_type.to_string()))
        {
            Some(StateProbe::Content(content)) => Ok(content.clone()),
            Some(StateProbe::Failure { status, body }) => Err(MatrixError::request(*status, body)),
            None => Err(MatrixError::request(
                404,
                r#"{"errcode":"M_NOT_FOUND","error":"Event not found."}"#,
            )),
        }
    }
}
