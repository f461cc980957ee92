//! Arkive Web Server
//!
//! HTTP host for the archive: wires the access engine to an axum router
//! and a SQLite store. Every node and file operation authenticates the
//! caller and authorizes against the node's permission mask before it
//! touches storage.

pub mod database;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod password;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{WebError, WebResult};
pub use server::ArkiveServer;
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    // Configure CORS for the frontend dev origin
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .cors_origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:5173")),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            AUTHORIZATION,
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static("authenticate"),
        ]);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Base64 file payloads get large; keep headroom above the raw
        // blob size.
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024))
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Secret the token authority signs with
    pub jwt_secret: String,
    /// Allowed CORS origin for the frontend
    pub cors_origin: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "sqlite::memory:".to_string(),
            // Default secret - must be overridden in production
            jwt_secret: "arkive-default-secret-change-in-production".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("ARKIVE_HOST").unwrap_or(defaults.host),
            port: std::env::var("ARKIVE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            jwt_secret: std::env::var("ARKIVE_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            cors_origin: std::env::var("ARKIVE_CORS_ORIGIN").unwrap_or(defaults.cors_origin),
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
