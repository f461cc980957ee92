//! Domain types stored in the archive

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = String;
pub type GroupId = String;
pub type NodeId = String;
pub type FileId = String;

/// Name of the group whose members bypass every per-node permission
/// check.
pub const ADMINISTRATORS_GROUP: &str = "Administrators";

/// A registered user. Created by user provisioning; the access engine
/// only ever reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A named collection of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

/// A folder-like entry in the archive tree.
///
/// `parent_id` of `None` marks a root. The set of nodes always forms a
/// forest; re-parenting goes through the hierarchy guard which rejects
/// any move that would close a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_group_id: Option<GroupId>,
    /// Capability bit mask, see `arkive-access`.
    pub permissions: u32,
}

/// The ownership facts the permission evaluator consumes for one node.
#[derive(Debug, Clone)]
pub struct NodeOwnership {
    pub owner_user_id: Option<UserId>,
    pub owner_group_id: Option<GroupId>,
    pub permissions: u32,
}

impl Node {
    pub fn ownership(&self) -> NodeOwnership {
        NodeOwnership {
            owner_user_id: self.owner_user_id.clone(),
            owner_group_id: self.owner_group_id.clone(),
            permissions: self.permissions,
        }
    }
}

/// A file stored under a node, with its key/value metadata.
///
/// `file_data` carries the base64-encoded blob and is only populated on
/// download; plain reads leave it out of the response entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: FileId,
    pub node_id: NodeId,
    pub name: String,
    pub size: i64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,
    pub metadata: Vec<FileMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub key: String,
    pub value: String,
}
