//! End-to-end tests for the HTTP API over an in-memory database.

use arkive_core::{Node, User};
use arkive_web::{create_app, password, AppState, WebConfig};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn setup() -> (Router, AppState) {
    let config = WebConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        ..WebConfig::default()
    };
    let state = AppState::new(config).await.unwrap();
    (create_app(state.clone()), state)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

async fn create_user(state: &AppState, username: &str, pass: &str) -> String {
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        name: None,
    };
    state
        .store
        .create_user(&user, &password::hash_password(pass).unwrap())
        .await
        .unwrap();
    user.id
}

#[tokio::test]
async fn login_rejects_bad_credentials_identically() {
    let (app, _) = setup().await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let wrong_password = body["message"].clone();

    let (status, body) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "nobody", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // Unknown user and wrong password are indistinguishable.
    assert_eq!(body["message"], wrong_password);
}

#[tokio::test]
async fn admin_can_walk_and_grow_the_tree() {
    let (app, _) = setup().await;
    let token = login(&app, "admin", "admin123").await;

    let (status, root) = request(&app, "GET", "/api/nodes/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(root["name"], "Root");

    let (status, reports) = request(
        &app,
        "POST",
        "/api/nodes",
        Some(&token),
        Some(json!({ "name": "Reports", "parent_id": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let reports_id = reports["id"].as_str().unwrap().to_string();

    let (status, children) = request(&app, "GET", "/api/nodes/1/children", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = children
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Reports"));

    // Rename sticks.
    let (status, renamed) = request(
        &app,
        "PATCH",
        &format!("/api/nodes/{}", reports_id),
        Some(&token),
        Some(json!({ "name": "Reports 2025" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Reports 2025");
}

#[tokio::test]
async fn cyclic_moves_are_rejected() {
    let (app, _) = setup().await;
    let token = login(&app, "admin", "admin123").await;

    let (_, reports) = request(
        &app,
        "POST",
        "/api/nodes",
        Some(&token),
        Some(json!({ "name": "Reports", "parent_id": "1" })),
    )
    .await;
    let reports_id = reports["id"].as_str().unwrap().to_string();

    let (_, q1) = request(
        &app,
        "POST",
        "/api/nodes",
        Some(&token),
        Some(json!({ "name": "Q1", "parent_id": reports_id })),
    )
    .await;
    let q1_id = q1["id"].as_str().unwrap().to_string();

    // Moving a node under its own child closes a cycle.
    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/api/nodes/{}", reports_id),
        Some(&token),
        Some(json!({ "parent_id": q1_id })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_operation");

    // So does self-parenting.
    let (status, _) = request(
        &app,
        "PATCH",
        &format!("/api/nodes/{}", reports_id),
        Some(&token),
        Some(json!({ "parent_id": reports_id })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // The rejected moves wrote nothing.
    let (_, reports) = request(
        &app,
        "GET",
        &format!("/api/nodes/{}", reports_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(reports["parent_id"], "1");
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let (app, _) = setup().await;
    let token = login(&app, "admin", "admin123").await;

    let (status, _) = request(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(&app, "POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // The token is structurally valid for another week, but dead.
    let (status, _) = request(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn authenticate_header_is_accepted() {
    let (app, _) = setup().await;
    let token = login(&app, "admin", "admin123").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header("Authenticate", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn file_lifecycle_under_a_node() {
    let (app, _) = setup().await;
    let token = login(&app, "admin", "admin123").await;

    let payload = BASE64.encode("hello archive");
    let (status, saved) = request(
        &app,
        "POST",
        "/api/nodes/1/files",
        Some(&token),
        Some(json!({
            "name": "notes.txt",
            "size": 13,
            "content_type": "text/plain",
            "file_data": payload,
            "metadata": [{ "key": "author", "value": "admin" }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let file_id = saved["id"].as_str().unwrap().to_string();

    // Plain read carries metadata but no blob.
    let (status, fetched) = request(
        &app,
        "GET",
        &format!("/api/files/{}", file_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(fetched.get("file_data").is_none());
    assert_eq!(fetched["metadata"][0]["key"], "author");

    // Download returns the original bytes.
    let (status, downloaded) = request(
        &app,
        "GET",
        &format!("/api/files/{}/download", file_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = BASE64
        .decode(downloaded["file_data"].as_str().unwrap())
        .unwrap();
    assert_eq!(data, b"hello archive");

    // Replace the metadata wholesale.
    let (status, updated) = request(
        &app,
        "PUT",
        &format!("/api/files/{}/metadata", file_id),
        Some(&token),
        Some(json!([
            { "key": "author", "value": "archive team" },
            { "key": "year", "value": "2025" },
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["metadata"].as_array().unwrap().len(), 2);

    // Drop one key.
    let (status, trimmed) = request(
        &app,
        "DELETE",
        &format!("/api/files/{}/metadata", file_id),
        Some(&token),
        Some(json!({ "keys": ["year"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trimmed["metadata"].as_array().unwrap().len(), 1);

    // Delete the file; it is gone afterwards.
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/files/{}", file_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        "GET",
        &format!("/api/files/{}", file_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_members_are_denied_not_hidden() {
    let (app, state) = setup().await;
    let bob_id = create_user(&state, "bob", "bob-password").await;
    let bob = login(&app, "bob", "bob-password").await;

    // The root exists but bob has no VIEW on it: denial, not a 404.
    let (status, body) = request(&app, "GET", "/api/nodes/1", Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");

    // Listing filters to nothing rather than failing.
    let (status, children) = request(&app, "GET", "/api/nodes/1/children", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(children.as_array().unwrap().is_empty());

    // No MODIFY on the root either.
    let (status, _) = request(
        &app,
        "POST",
        "/api/nodes",
        Some(&bob),
        Some(json!({ "name": "Intruder", "parent_id": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Own memberships are always listable; someone else's are not.
    let (status, groups) = request(
        &app,
        "GET",
        &format!("/api/users/{}/groups", bob_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(groups.as_array().unwrap().is_empty());

    let admin_token = login(&app, "admin", "admin123").await;
    let (_, me) = request(&app, "GET", "/api/auth/me", Some(&admin_token), None).await;
    let admin_id = me["id"].as_str().unwrap();

    let (status, _) = request(
        &app,
        "GET",
        &format!("/api/users/{}/groups", admin_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn group_ownership_excludes_a_personal_owner() {
    let (app, _) = setup().await;
    let token = login(&app, "admin", "admin123").await;

    let (_, groups) = request(&app, "GET", "/api/groups", Some(&token), None).await;
    let admins_id = groups
        .as_array()
        .unwrap()
        .iter()
        .find(|g| g["name"] == "Administrators")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Handing the node to a group drops the creator's personal
    // ownership; the grant lives on the group alone.
    let (status, node) = request(
        &app,
        "POST",
        "/api/nodes",
        Some(&token),
        Some(json!({ "name": "Shared", "parent_id": "1", "owner_group_id": admins_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(node["owner_group_id"], admins_id.as_str());
    assert!(node.get("owner_user_id").is_none());

    // Without a group the creator owns the node.
    let (status, node) = request(
        &app,
        "POST",
        "/api/nodes",
        Some(&token),
        Some(json!({ "name": "Personal", "parent_id": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(node.get("owner_user_id").is_some());
    assert!(node.get("owner_group_id").is_none());
}

#[tokio::test]
async fn rejected_update_writes_nothing() {
    let (app, state) = setup().await;
    let bob_id = create_user(&state, "bob", "bob-password").await;
    let bob = login(&app, "bob", "bob-password").await;

    // A node bob may view and modify, but whose permission mask he may
    // not touch.
    let node = Node {
        id: "bob-node".to_string(),
        name: "Drafts".to_string(),
        parent_id: Some("1".to_string()),
        owner_user_id: Some(bob_id),
        owner_group_id: None,
        permissions: 3, // VIEW|MODIFY
    };
    state.store.create_node(&node).await.unwrap();

    // The permissions part is unauthorized, so the rename part must not
    // land either.
    let (status, body) = request(
        &app,
        "PATCH",
        "/api/nodes/bob-node",
        Some(&bob),
        Some(json!({ "name": "Renamed", "permissions": 63 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");

    let (status, unchanged) = request(&app, "GET", "/api/nodes/bob-node", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged["name"], "Drafts");
    assert_eq!(unchanged["permissions"], 3);
}
