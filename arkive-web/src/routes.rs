//! Route definitions for the arkive web server

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Authentication
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::current_user))
        // Node tree
        .route("/nodes", post(handlers::nodes::create_node))
        .route(
            "/nodes/{id}",
            get(handlers::nodes::get_node)
                .patch(handlers::nodes::update_node)
                .delete(handlers::nodes::delete_node),
        )
        .route("/nodes/{id}/children", get(handlers::nodes::list_children))
        .route("/nodes/{id}/files", post(handlers::files::save_file))
        // Files and metadata
        .route(
            "/files/{id}",
            get(handlers::files::get_file).delete(handlers::files::delete_file),
        )
        .route("/files/{id}/download", get(handlers::files::download_file))
        .route(
            "/files/{id}/metadata",
            put(handlers::files::replace_metadata).delete(handlers::files::delete_metadata),
        )
        // Users and groups
        .route("/users/{id}/groups", get(handlers::groups::user_groups))
        .route("/groups", get(handlers::groups::list_groups))
        .route("/groups/{id}/members", get(handlers::groups::group_members))
}
