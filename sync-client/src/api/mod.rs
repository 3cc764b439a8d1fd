//! The transport collaborator boundary.
//!
//! The sync engine performs no HTTP itself; it consumes a collaborator that
//! knows how to issue authenticated requests against a homeserver and hand
//! back decoded payloads. One operation is required (`sync`); the optional
//! `state_event` probe only matters when the encryption capability is
//! switched on, so it carries a default implementation and minimal
//! transports implement a single method.
//!
//! # Example
//!
//! ```ignore
//! let api = MockApi::new();
//! api.queue_sync(response);
//! let mut client = MatrixClient::new(api);
//! client.sync(30_000).await?;
//! ```

mod mock;

pub use mock::{MockApi, SyncCall};

use async_trait::async_trait;
use sync_types::{MatrixError, RoomId, SyncResponse};

/// The raw request surface the sync engine depends on.
///
/// Implementations map these onto authenticated homeserver requests.
/// Failure modes follow the [`MatrixError`] taxonomy: `Request` when the
/// homeserver answered with a non-success status, `Transport` when the
/// request never completed.
#[async_trait]
pub trait HomeserverApi: Send + Sync {
    /// Long-poll the event stream.
    ///
    /// `since` is the client's last-known cursor (`None` for the initial
    /// sync); the server may hold the request open for up to `timeout_ms`
    /// before answering.
    async fn sync(
        &self,
        since: Option<&str>,
        timeout_ms: u32,
        filter: &str,
    ) -> Result<SyncResponse, MatrixError>;

    /// Fetch the content of a single state event.
    ///
    /// Used only for the room encryption capability probe. The default
    /// implementation reports the event as absent.
    async fn state_event(
        &self,
        room_id: &RoomId,
        event_type: &str,
    ) -> Result<serde_json::Value, MatrixError> {
        let _ = (room_id, event_type);
        Err(MatrixError::request(
            404,
            r#"{"errcode":"M_NOT_FOUND","error":"Event not found."}"#,
        ))
    }
}
