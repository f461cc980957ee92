//! Access-scoped child listing

use std::sync::Arc;

use arkive_core::{ArkiveError, ArkiveResult, Node};

use crate::capability::Capability;
use crate::membership::MembershipDirectory;
use crate::store::ArchiveStore;

/// Lists the children of a node a caller is allowed to see.
///
/// Administrators get the unfiltered listing. For everyone else the
/// filter is exactly the predicate the permission evaluator applies for
/// `View`, resolved with a single membership lookup instead of one
/// evaluator call per child.
#[derive(Clone)]
pub struct AccessScopedLister {
    store: Arc<dyn ArchiveStore>,
    membership: MembershipDirectory,
}

impl AccessScopedLister {
    pub fn new(store: Arc<dyn ArchiveStore>, membership: MembershipDirectory) -> Self {
        Self { store, membership }
    }

    /// Children of `parent_id` visible to `caller_id`, ordered by name
    /// ascending.
    pub async fn list_children(
        &self,
        caller_id: &str,
        parent_id: &str,
    ) -> ArkiveResult<Vec<Node>> {
        if self.store.find_node(parent_id).await?.is_none() {
            return Err(ArkiveError::not_found("node"));
        }

        let children = self.store.find_node_children(parent_id).await?;

        if self.membership.is_administrator(caller_id).await? {
            return Ok(children);
        }

        let groups = self.membership.groups_of(caller_id).await?;
        Ok(children
            .into_iter()
            .filter(|node| {
                if !Capability::View.granted_by(node.permissions) {
                    return false;
                }
                if node.owner_user_id.as_deref() == Some(caller_id) {
                    return true;
                }
                node.owner_group_id
                    .as_ref()
                    .is_some_and(|group_id| groups.iter().any(|g| &g.id == group_id))
            })
            .collect())
    }
}
