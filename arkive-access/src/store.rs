//! Storage boundary consumed by the access engine

use arkive_core::{ArkiveResult, Group, Node, NodeId, NodeOwnership};
use async_trait::async_trait;

/// The read/write operations the access engine needs from durable
/// storage. The engine never sees SQL or connection handles; hosts
/// implement this over whatever store they run.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    async fn find_node(&self, id: &str) -> ArkiveResult<Option<Node>>;

    /// Parent of `id`, or `None` when `id` is a root or unknown. The
    /// ancestor walk treats both the same: the chain ends.
    async fn find_node_parent(&self, id: &str) -> ArkiveResult<Option<NodeId>>;

    async fn update_node_parent(&self, id: &str, new_parent: Option<&str>) -> ArkiveResult<()>;

    /// Direct children of `parent`, ordered by name ascending.
    async fn find_node_children(&self, parent: &str) -> ArkiveResult<Vec<Node>>;

    async fn find_node_ownership(&self, id: &str) -> ArkiveResult<Option<NodeOwnership>>;

    /// Groups `user` belongs to, ordered by name ascending. No
    /// membership yields an empty set, not an error.
    async fn find_user_groups(&self, user: &str) -> ArkiveResult<Vec<Group>>;

    async fn is_member_of_group_named(&self, user: &str, name: &str) -> ArkiveResult<bool>;
}
