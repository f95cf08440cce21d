use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Unique identifier for a connection (server-generated, never reused)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Returned when a transport handle can no longer accept frames, which is
/// what drives a connection's final removal from the registry.
#[derive(Debug)]
pub struct SendError;

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "transport handle closed")
    }
}

impl StdError for SendError {}

/// Send-capable transport handle. Implemented by both the WebSocket and
/// SSE adapters so the broadcaster can treat every connection uniformly.
pub trait Sendable: Send + Sync {
    /// Queues one serialized frame for delivery to the client.
    fn send(&self, frame: &str) -> Result<(), SendError>;
}

/// Tracks all live transport connections for one user. Entries carry no
/// persisted state; the registry is rebuilt from scratch whenever the
/// owning channel restarts.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Arc<dyn Sendable>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handle under a fresh unique id
    pub fn add(&mut self, connection_id: ConnectionId, handle: Arc<dyn Sendable>) {
        self.connections.insert(connection_id, handle);
    }

    /// Idempotent; removing an absent id is a no-op
    pub fn remove(&mut self, connection_id: &ConnectionId) {
        self.connections.remove(connection_id);
    }

    /// Snapshot of the current entries. Fan-out iterates the snapshot so
    /// removals triggered mid-pass cannot skip or double-visit an entry.
    pub fn snapshot(&self) -> Vec<(ConnectionId, Arc<dyn Sendable>)> {
        self.connections
            .iter()
            .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
            .collect()
    }

    /// Current live connection count
    pub fn size(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullHandle;

    impl Sendable for NullHandle {
        fn send(&self, _frame: &str) -> Result<(), SendError> {
            Ok(())
        }
    }

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }

    #[test]
    fn add_and_remove_track_size() {
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new();

        registry.add(id.clone(), Arc::new(NullHandle));
        assert_eq!(registry.size(), 1);

        registry.remove(&id);
        assert_eq!(registry.size(), 0);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = ConnectionRegistry::new();
        let registered = ConnectionId::new();
        registry.add(registered.clone(), Arc::new(NullHandle));

        // Removing an id that was never added changes nothing.
        registry.remove(&ConnectionId::new());
        assert_eq!(registry.size(), 1);

        registry.remove(&registered);
        registry.remove(&registered);
        assert_eq!(registry.size(), 0);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_removals() {
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new();
        registry.add(id.clone(), Arc::new(NullHandle));

        let snapshot = registry.snapshot();
        registry.remove(&id);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.size(), 0);
    }
}
