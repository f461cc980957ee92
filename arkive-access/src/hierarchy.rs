//! Hierarchy integrity: cycle prevention for node re-parenting

use std::sync::Arc;

use arkive_core::{ArkiveError, ArkiveResult};
use tokio::sync::Mutex;
use tracing::warn;

use crate::store::ArchiveStore;

/// Upper bound on the ancestor walk. The tree is kept acyclic, so a
/// chain longer than this indicates existing corruption; the walk stops
/// and reports a dependency failure instead of spinning.
const MAX_ANCESTOR_DEPTH: usize = 4096;

/// Validates that re-parenting a node keeps the tree a forest.
pub struct HierarchyGuard {
    store: Arc<dyn ArchiveStore>,
    /// Serializes check-then-write across concurrent re-parents. Two
    /// interleaved moves could each pass the cycle check and jointly
    /// close a cycle; holding this for the whole mutation rules that out.
    reparent_lock: Mutex<()>,
}

impl HierarchyGuard {
    pub fn new(store: Arc<dyn ArchiveStore>) -> Self {
        Self {
            store,
            reparent_lock: Mutex::new(()),
        }
    }

    /// Whether attaching `node_id` under `proposed_parent_id` would close
    /// a cycle.
    ///
    /// A node can never parent itself. Otherwise the ancestor chain of
    /// the proposed parent is walked iteratively; finding `node_id` on it
    /// means the move would place the node under its own descendant.
    /// Reaching a root or an unknown node ends the walk cleanly.
    pub async fn would_create_cycle(
        &self,
        node_id: &str,
        proposed_parent_id: &str,
    ) -> ArkiveResult<bool> {
        if node_id == proposed_parent_id {
            return Ok(true);
        }

        let mut current = proposed_parent_id.to_string();
        for _ in 0..MAX_ANCESTOR_DEPTH {
            match self.store.find_node_parent(&current).await? {
                Some(parent) => {
                    if parent == node_id {
                        return Ok(true);
                    }
                    current = parent;
                }
                None => return Ok(false),
            }
        }

        warn!(
            node = node_id,
            parent = proposed_parent_id,
            "ancestor chain exceeded {} levels",
            MAX_ANCESTOR_DEPTH
        );
        Err(ArkiveError::dependency(
            "ancestor chain exceeds maximum depth",
        ))
    }

    /// Move `node_id` under `new_parent_id` (or make it a root), running
    /// the cycle check first. A rejected move performs no write.
    pub async fn reparent(&self, node_id: &str, new_parent_id: Option<&str>) -> ArkiveResult<()> {
        let _guard = self.reparent_lock.lock().await;

        if let Some(parent_id) = new_parent_id {
            if self.would_create_cycle(node_id, parent_id).await? {
                return Err(ArkiveError::invalid_operation("would create a cycle"));
            }
        }

        self.store.update_node_parent(node_id, new_parent_id).await
    }
}
