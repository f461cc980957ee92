//! Arkive Access - access control and hierarchy integrity
//!
//! The decision core of the archive backend. It authenticates callers
//! from bearer credentials, decides whether a caller may perform an
//! operation on a node, keeps the node tree a forest across re-parents,
//! and filters child listings down to what a caller may see.
//!
//! Storage is abstracted behind [`store::ArchiveStore`]; hosts hand in an
//! implementation and wire their transport against [`AccessControl`].

pub mod capability;
pub mod hierarchy;
pub mod listing;
pub mod membership;
pub mod memory;
pub mod policy;
pub mod store;
pub mod token;

pub use capability::Capability;
pub use hierarchy::HierarchyGuard;
pub use listing::AccessScopedLister;
pub use membership::MembershipDirectory;
pub use memory::MemoryStore;
pub use policy::PermissionEvaluator;
pub use store::ArchiveStore;
pub use token::{Identity, TokenAuthority};

use std::sync::Arc;

use arkive_core::{ArkiveResult, Group, Node};
use chrono::Duration;

/// The engine facade hosts wire their transport against.
///
/// Every inbound request authenticates once through here, every node or
/// file operation authorizes through here, and every re-parent goes
/// through the hierarchy guard. Identity is always an explicit argument;
/// nothing is read from ambient state.
pub struct AccessControl {
    authority: TokenAuthority,
    membership: MembershipDirectory,
    evaluator: PermissionEvaluator,
    hierarchy: HierarchyGuard,
    lister: AccessScopedLister,
}

impl AccessControl {
    pub fn new(secret: &[u8], store: Arc<dyn ArchiveStore>) -> Self {
        let authority = TokenAuthority::new(secret);
        let membership = MembershipDirectory::new(store.clone());
        let evaluator = PermissionEvaluator::new(store.clone(), membership.clone());
        let hierarchy = HierarchyGuard::new(store.clone());
        let lister = AccessScopedLister::new(store, membership.clone());

        Self {
            authority,
            membership,
            evaluator,
            hierarchy,
            lister,
        }
    }

    /// Issue a seven-day session token.
    pub fn issue(&self, user_id: &str, username: &str) -> ArkiveResult<String> {
        self.authority.issue(user_id, username)
    }

    /// Issue a session token with an explicit lifetime.
    pub fn issue_with_ttl(
        &self,
        user_id: &str,
        username: &str,
        ttl: Duration,
    ) -> ArkiveResult<String> {
        self.authority.issue_with_ttl(user_id, username, ttl)
    }

    /// Revoke a token; it fails authentication from now on.
    pub fn revoke(&self, token: &str) {
        self.authority.revoke(token);
    }

    /// Establish the caller identity from a raw authorization header
    /// value.
    pub fn authenticate(&self, header_value: &str) -> ArkiveResult<Identity> {
        self.authority.authenticate(header_value)
    }

    /// Whether `caller_id` may exercise `capability` on `node_id`.
    pub async fn authorize(
        &self,
        caller_id: &str,
        node_id: &str,
        capability: Capability,
    ) -> ArkiveResult<bool> {
        self.evaluator.authorize(caller_id, node_id, capability).await
    }

    /// Authorize or fail with `PermissionDenied`.
    pub async fn require(
        &self,
        caller_id: &str,
        node_id: &str,
        capability: Capability,
    ) -> ArkiveResult<()> {
        self.evaluator.require(caller_id, node_id, capability).await
    }

    /// Whether moving `node_id` under `proposed_parent_id` would close a
    /// cycle.
    pub async fn would_create_cycle(
        &self,
        node_id: &str,
        proposed_parent_id: &str,
    ) -> ArkiveResult<bool> {
        self.hierarchy
            .would_create_cycle(node_id, proposed_parent_id)
            .await
    }

    /// Move a node, rejecting any cyclic placement before writing.
    pub async fn reparent(&self, node_id: &str, new_parent_id: Option<&str>) -> ArkiveResult<()> {
        self.hierarchy.reparent(node_id, new_parent_id).await
    }

    /// Children of `parent_id` visible to `caller_id`.
    pub async fn list_children(
        &self,
        caller_id: &str,
        parent_id: &str,
    ) -> ArkiveResult<Vec<Node>> {
        self.lister.list_children(caller_id, parent_id).await
    }

    /// Groups `user_id` belongs to.
    pub async fn groups_of(&self, user_id: &str) -> ArkiveResult<Vec<Group>> {
        self.membership.groups_of(user_id).await
    }

    /// Group memberships of `target_id` as seen by `caller_id`.
    pub async fn visible_groups_of(
        &self,
        caller_id: &str,
        target_id: &str,
    ) -> ArkiveResult<Vec<Group>> {
        self.membership.visible_groups_of(caller_id, target_id).await
    }

    /// Whether `user_id` is in the Administrators group.
    pub async fn is_administrator(&self, user_id: &str) -> ArkiveResult<bool> {
        self.membership.is_administrator(user_id).await
    }
}
