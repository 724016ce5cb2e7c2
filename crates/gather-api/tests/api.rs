use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use gather_api::{AppStateInner, router};
use gather_db::Database;

fn app() -> Router {
    let db = Database::open_in_memory().unwrap();
    router(AppStateInner::new(db, "test-secret-for-the-api-suite", 1))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Registers `username` and returns `(user_id, token)`.
async fn register(app: &Router, username: &str, phone: &str) -> (String, String) {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "country_code": "+1",
            "phone_number": phone,
            "password": "correct horse battery",
            "display_name": username,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["success"], true);
    (
        body["user_id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_register_and_login() {
    let app = app();
    let (id, _) = register(&app, "alice", "5550100").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "correct horse battery" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], id.as_str());
    assert_eq!(body["username"], "alice");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_register_conflict_and_short_password() {
    let app = app();
    register(&app, "alice", "5550100").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "email": "other@example.com",
            "country_code": "+1",
            "phone_number": "5550101",
            "password": "correct horse battery",
            "display_name": "Other",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["msg"], "username is already taken");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": "bob",
            "email": "bob@example.com",
            "country_code": "+1",
            "phone_number": "5550102",
            "password": "short",
            "display_name": "Bob",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/friends", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = call(&app, Method::GET, "/api/friends", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_of_deleted_account_is_rejected() {
    let app = app();
    let (_, token) = register(&app, "gus", "5550100").await;

    let (status, _) = call(&app, Method::DELETE, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/posts",
        Some(&token),
        Some(json!({ "body": "still here?" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_friend_request_flow() {
    let app = app();
    let (alice, alice_token) = register(&app, "alice", "5550100").await;
    let (bob, bob_token) = register(&app, "bob", "5550101").await;

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/friends/requests/{alice}"),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/friends/requests/{bob}"),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(&app, Method::GET, "/api/friends/requests", Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["incoming"][0]["id"], alice.as_str());

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/friends/requests/{alice}/accept"),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for (token, other) in [(&alice_token, &bob), (&bob_token, &alice)] {
        let (_, body) = call(&app, Method::GET, "/api/friends", Some(token), None).await;
        assert_eq!(body["friends"][0]["id"], other.as_str());
    }

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/friends/requests/{bob}"),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["msg"], "you are already friends");

    let (_, body) = call(&app, Method::GET, "/api/notifications", Some(&alice_token), None).await;
    assert_eq!(body["notifications"][0]["kind"], "friend_accept");
}

#[tokio::test]
async fn test_closed_community_flow() {
    let app = app();
    let (_, owner_token) = register(&app, "olga", "5550100").await;
    let (uma, uma_token) = register(&app, "uma", "5550101").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/communities",
        Some(&owner_token),
        Some(json!({ "name": "climbers", "is_open": false })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["membership"], "owner");
    let community = body["community"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/communities/{community}/join"),
        Some(&uma_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["membership"], "pending_request");

    // Members only until accepted.
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/communities/{community}/outings"),
        Some(&uma_token),
        Some(json!({ "title": "Bouldering" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/communities/{community}/requests/{uma}/accept"),
        Some(&uma_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/communities/{community}/requests/{uma}/accept"),
        Some(&owner_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/communities/{community}/outings"),
        Some(&uma_token),
        Some(json!({ "title": "Bouldering" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["outing"]["title"], "Bouldering");

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/communities/{community}/leave"),
        Some(&owner_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["msg"], "owners cannot leave their community");
}

#[tokio::test]
async fn test_unknown_fields_are_rejected() {
    let app = app();
    let (_, token) = register(&app, "alice", "5550100").await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/posts",
        Some(&token),
        Some(json!({ "body": "hi", "owner_id": "someone-else" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
