//! Server bootstrap

use tracing::info;

use crate::{create_app, AppState, WebConfig, WebResult};

/// The arkive web server, built from a config and started once.
pub struct ArkiveServer {
    config: WebConfig,
    app: axum::Router,
}

impl ArkiveServer {
    /// Build the server: connect storage, seed defaults, wire routes.
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone()).await?;
        let app = create_app(state);
        Ok(Self { config, app })
    }

    /// Bind and serve until shutdown.
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();
        let listener = tokio::net::TcpListener::bind(&address).await?;

        info!("arkive server listening on http://{}", address);
        axum::serve(listener, self.app).await?;

        Ok(())
    }
}
