//! Listener id bookkeeping per UI node.

use std::collections::HashMap;

/// Sentinel meaning "no listener registered".
pub const INVALID_LISTENER_ID: u32 = 0;

/// Node id → event name → listener id.
///
/// One listener per (node, event): registering again replaces the previous
/// id, since script can only bind a single callback per event.
#[derive(Debug, Default, Clone)]
pub struct ListenerTable {
    nodes: HashMap<u32, HashMap<String, u32>>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `listener_id` for (`node_id`, `event_name`).
    ///
    /// Returns the id it replaced, if any. The sentinel id is never stored.
    pub fn insert(&mut self, node_id: u32, event_name: &str, listener_id: u32) -> Option<u32> {
        if listener_id == INVALID_LISTENER_ID {
            tracing::warn!(
                "[listeners] Ignoring sentinel listener id for node {} event '{}'",
                node_id,
                event_name
            );
            return None;
        }

        self.nodes
            .entry(node_id)
            .or_default()
            .insert(event_name.to_string(), listener_id)
    }

    /// Listener id for (`node_id`, `event_name`), or [`INVALID_LISTENER_ID`].
    pub fn get(&self, node_id: u32, event_name: &str) -> u32 {
        self.nodes
            .get(&node_id)
            .and_then(|events| events.get(event_name))
            .copied()
            .unwrap_or(INVALID_LISTENER_ID)
    }

    /// Number of nodes with at least one listener.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
