//! Arkive Core - shared foundation for the archive backend
//!
//! This crate holds the pieces every other crate needs: the error
//! taxonomy, the domain types stored in the archive, and the logging
//! bootstrap. It contains no business logic; the access-control engine
//! lives in `arkive-access` and the HTTP host in `arkive-web`.

pub mod error;
pub mod logging;
pub mod types;

pub use error::{ArkiveError, ArkiveResult};
pub use logging::init_logging;
pub use types::{
    FileEntry, FileMetadata, Group, GroupId, Node, NodeId, NodeOwnership, User, UserId,
    ADMINISTRATORS_GROUP,
};
