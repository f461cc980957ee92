//! In-memory store for tests and local development

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use arkive_core::{ArkiveError, ArkiveResult, Group, Node, NodeId, NodeOwnership};
use async_trait::async_trait;

use crate::store::ArchiveStore;

/// An [`ArchiveStore`] backed by hash maps.
///
/// Not meant for production data; it exists so the engine can be
/// exercised without a database.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    groups: HashMap<String, Group>,
    /// group id -> member user ids
    members: HashMap<String, HashSet<String>>,
    nodes: HashMap<String, Node>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_group(&self, group: Group) {
        let mut inner = self.inner.write().unwrap();
        inner.groups.insert(group.id.clone(), group);
    }

    pub fn add_member(&self, group_id: &str, user_id: &str) {
        let mut inner = self.inner.write().unwrap();
        inner
            .members
            .entry(group_id.to_string())
            .or_default()
            .insert(user_id.to_string());
    }

    pub fn insert_node(&self, node: Node) {
        let mut inner = self.inner.write().unwrap();
        inner.nodes.insert(node.id.clone(), node);
    }
}

#[async_trait]
impl ArchiveStore for MemoryStore {
    async fn find_node(&self, id: &str) -> ArkiveResult<Option<Node>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.nodes.get(id).cloned())
    }

    async fn find_node_parent(&self, id: &str) -> ArkiveResult<Option<NodeId>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.nodes.get(id).and_then(|n| n.parent_id.clone()))
    }

    async fn update_node_parent(&self, id: &str, new_parent: Option<&str>) -> ArkiveResult<()> {
        let mut inner = self.inner.write().unwrap();
        let node = inner
            .nodes
            .get_mut(id)
            .ok_or_else(|| ArkiveError::not_found("node"))?;
        node.parent_id = new_parent.map(|p| p.to_string());
        Ok(())
    }

    async fn find_node_children(&self, parent: &str) -> ArkiveResult<Vec<Node>> {
        let inner = self.inner.read().unwrap();
        let mut children: Vec<Node> = inner
            .nodes
            .values()
            .filter(|n| n.parent_id.as_deref() == Some(parent))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    async fn find_node_ownership(&self, id: &str) -> ArkiveResult<Option<NodeOwnership>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.nodes.get(id).map(|n| n.ownership()))
    }

    async fn find_user_groups(&self, user: &str) -> ArkiveResult<Vec<Group>> {
        let inner = self.inner.read().unwrap();
        let mut groups: Vec<Group> = inner
            .groups
            .values()
            .filter(|g| {
                inner
                    .members
                    .get(&g.id)
                    .is_some_and(|members| members.contains(user))
            })
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    async fn is_member_of_group_named(&self, user: &str, name: &str) -> ArkiveResult<bool> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .groups
            .values()
            .filter(|g| g.name == name)
            .any(|g| {
                inner
                    .members
                    .get(&g.id)
                    .is_some_and(|members| members.contains(user))
            }))
    }
}
