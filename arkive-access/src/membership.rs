//! Group membership resolution

use std::sync::Arc;

use arkive_core::{ArkiveError, ArkiveResult, Group, ADMINISTRATORS_GROUP};

use crate::store::ArchiveStore;

/// Resolves which groups a user belongs to and whether they hold the
/// administrator override.
#[derive(Clone)]
pub struct MembershipDirectory {
    store: Arc<dyn ArchiveStore>,
}

impl MembershipDirectory {
    pub fn new(store: Arc<dyn ArchiveStore>) -> Self {
        Self { store }
    }

    /// Groups `user_id` belongs to, ordered by name ascending.
    pub async fn groups_of(&self, user_id: &str) -> ArkiveResult<Vec<Group>> {
        self.store.find_user_groups(user_id).await
    }

    /// Whether `user_id` is a member of the Administrators group.
    pub async fn is_administrator(&self, user_id: &str) -> ArkiveResult<bool> {
        self.store
            .is_member_of_group_named(user_id, ADMINISTRATORS_GROUP)
            .await
    }

    /// Group memberships of `target_id` as seen by `caller_id`.
    ///
    /// A user may always list their own memberships; this path does not
    /// go through the node permission evaluator at all. Anyone else's
    /// memberships are visible to administrators only.
    pub async fn visible_groups_of(
        &self,
        caller_id: &str,
        target_id: &str,
    ) -> ArkiveResult<Vec<Group>> {
        if caller_id != target_id && !self.is_administrator(caller_id).await? {
            return Err(ArkiveError::permission_denied("view user groups"));
        }
        self.groups_of(target_id).await
    }
}
