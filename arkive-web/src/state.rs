//! Application state shared across handlers

use std::sync::Arc;

use arkive_access::AccessControl;
use tracing::info;

use crate::{database::SqliteStore, WebConfig, WebResult};

/// Shared application state: the SQLite store and the access engine
/// wired on top of it.
#[derive(Clone)]
pub struct AppState {
    pub config: WebConfig,
    pub store: Arc<SqliteStore>,
    pub access: Arc<AccessControl>,
}

impl AppState {
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let store = Arc::new(SqliteStore::connect(&config.database_url).await?);
        let access = Arc::new(AccessControl::new(
            config.jwt_secret.as_bytes(),
            store.clone(),
        ));

        info!("application state initialized");
        Ok(Self {
            config,
            store,
            access,
        })
    }
}
