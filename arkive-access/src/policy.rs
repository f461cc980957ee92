//! Per-node permission decisions

use std::sync::Arc;

use arkive_core::{ArkiveError, ArkiveResult};
use tracing::debug;

use crate::capability::Capability;
use crate::membership::MembershipDirectory;
use crate::store::ArchiveStore;

/// Decides whether a caller may exercise a capability on a node.
///
/// A pure decision function over externally supplied facts: group
/// membership, node ownership and the node's permission mask. The
/// evaluation order is fixed and the administrator override comes first
/// because it bypasses ownership entirely.
#[derive(Clone)]
pub struct PermissionEvaluator {
    store: Arc<dyn ArchiveStore>,
    membership: MembershipDirectory,
}

impl PermissionEvaluator {
    pub fn new(store: Arc<dyn ArchiveStore>, membership: MembershipDirectory) -> Self {
        Self { store, membership }
    }

    /// Whether `caller_id` may exercise `capability` on `node_id`.
    ///
    /// A missing node surfaces as `NotFound`. A node the caller cannot
    /// view yields `Ok(false)` like any other denial; existence is gated
    /// by `View`, so reads must not translate that denial into a
    /// not-found answer.
    pub async fn authorize(
        &self,
        caller_id: &str,
        node_id: &str,
        capability: Capability,
    ) -> ArkiveResult<bool> {
        if self.membership.is_administrator(caller_id).await? {
            return Ok(true);
        }

        let ownership = self
            .store
            .find_node_ownership(node_id)
            .await?
            .ok_or_else(|| ArkiveError::not_found("node"))?;

        // Both ownership branches require the capability's bit.
        if !capability.granted_by(ownership.permissions) {
            return Ok(false);
        }

        if ownership.owner_user_id.as_deref() == Some(caller_id) {
            return Ok(true);
        }

        if let Some(group_id) = &ownership.owner_group_id {
            let groups = self.membership.groups_of(caller_id).await?;
            if groups.iter().any(|g| &g.id == group_id) {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Like [`authorize`](Self::authorize), but a withheld grant becomes
    /// a `PermissionDenied` error naming the attempted action only.
    pub async fn require(
        &self,
        caller_id: &str,
        node_id: &str,
        capability: Capability,
    ) -> ArkiveResult<()> {
        if self.authorize(caller_id, node_id, capability).await? {
            Ok(())
        } else {
            debug!(
                user = caller_id,
                node = node_id,
                "denied {} on node",
                capability
            );
            Err(ArkiveError::permission_denied(format!(
                "{} node",
                capability
            )))
        }
    }
}
