//! The declarative sync filter.

use serde_json::json;

/// Limits how many timeline events per room a sync response may contain.
///
/// Immutable once a sync session begins; reconfigure the client to change
/// it (e.g. on re-login).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncFilter {
    limit: u32,
}

impl SyncFilter {
    /// Create a filter with the given per-room timeline limit.
    pub fn new(limit: u32) -> Self {
        Self { limit }
    }

    /// The per-room timeline limit.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Render the filter to its wire representation.
    pub fn to_filter_string(&self) -> String {
        json!({"room": {"timeline": {"limit": self.limit}}}).to_string()
    }
}

impl Default for SyncFilter {
    fn default() -> Self {
        Self { limit: 20 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_wire_filter() {
        let filter = SyncFilter::new(10);
        assert_eq!(
            filter.to_filter_string(),
            r#"{"room":{"timeline":{"limit":10}}}"#
        );
    }

    #[test]
    fn default_limit_is_twenty() {
        assert_eq!(SyncFilter::default().limit(), 20);
    }
}
