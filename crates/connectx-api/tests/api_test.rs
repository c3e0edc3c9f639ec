//! HTTP-level tests: drive the full router in memory and check status codes,
//! bodies and the `{ "message" }` error envelope.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use connectx_api::{AppStateInner, router};
use connectx_db::Database;

fn app() -> Router {
    let db = Database::open_in_memory().unwrap();
    router(Arc::new(AppStateInner {
        db,
        jwt_secret: "test-secret".to_string(),
    }))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Returns (token, user id).
async fn register(app: &Router, name: &str) -> (String, String) {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "password": "hunter22",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = call(&app, Method::GET, "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("/api/nope"));
}

#[tokio::test]
async fn register_login_and_me() {
    let app = app();
    let (token, id) = register(&app, "Alice").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"name": "Alice", "email": "ALICE@example.com", "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"name": " ", "email": "nobody", "password": "123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Please enter a valid email, Name is required, Password must be at least 6 characters"
    );

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "alice@example.com", "password": "wrong-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "alice@example.com", "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (status, body) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/api/connections", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, no token");

    let (status, _) = call(&app, Method::GET, "/api/connections", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_input_uses_the_error_envelope() {
    let app = app();
    let (token, _) = register(&app, "Alice").await;

    let (status, body) = call(&app, Method::GET, "/api/posts/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/messages",
        Some(&token),
        Some(json!({"content": "missing recipient"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn connection_lifecycle() {
    let app = app();
    let (alice, alice_id) = register(&app, "Alice").await;
    let (bob, bob_id) = register(&app, "Bob").await;

    let (status, request) = call(
        &app,
        Method::POST,
        "/api/connections/request",
        Some(&alice),
        Some(json!({"recipientId": bob_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/connections/request",
        Some(&bob),
        Some(json!({"recipientId": alice_id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Connection request already exists");

    let (_, pending) = call(&app, Method::GET, "/api/connections/requests", Some(&bob), None).await;
    assert_eq!(pending[0]["requester"]["name"], "Alice");

    let accept_uri = format!("/api/connections/accept/{}", request["id"].as_str().unwrap());
    let (status, _) = call(&app, Method::PUT, &accept_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, accepted) = call(&app, Method::PUT, &accept_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "accepted");

    let (_, list) = call(&app, Method::GET, "/api/connections", Some(&alice), None).await;
    assert_eq!(list[0]["name"], "Bob");

    let (status, body) = call(&app, Method::DELETE, &format!("/api/connections/{bob_id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Connection removed successfully");

    let (_, list) = call(&app, Method::GET, "/api/connections", Some(&bob), None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn reject_and_status_routes() {
    let app = app();
    let (alice, alice_id) = register(&app, "Alice").await;
    let (bob, bob_id) = register(&app, "Bob").await;
    let status_uri = format!("/api/connections/status/{bob_id}");

    let (status, body) = call(&app, Method::GET, &status_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "not_connected", "requestId": null}));

    let (_, request) = call(
        &app,
        Method::POST,
        "/api/connections/request",
        Some(&alice),
        Some(json!({"recipientId": bob_id})),
    )
    .await;
    let request_id = request["id"].as_str().unwrap();

    let (_, body) = call(&app, Method::GET, &status_uri, Some(&alice), None).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["requestId"], request_id);
    assert_eq!(body["isSender"], true);

    let reject_uri = format!("/api/connections/reject/{request_id}");
    let (status, body) = call(&app, Method::PUT, &reject_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized");

    let (status, rejected) = call(&app, Method::PUT, &reject_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "rejected");

    let (status, body) = call(&app, Method::PUT, &reject_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Connection request not found or already processed");

    let (_, body) = call(&app, Method::GET, &format!("/api/connections/status/{alice_id}"), Some(&bob), None).await;
    assert_eq!(body["status"], "not_connected");
    assert_eq!(body["isSender"], false);

    let (_, body) = call(&app, Method::GET, &format!("/api/connections/status/{alice_id}"), Some(&alice), None).await;
    assert_eq!(body["message"], "Cannot connect with yourself");
}

#[tokio::test]
async fn matching_ranks_peers() {
    let app = app();
    let (alice, _) = register(&app, "Alice").await;
    let (bob, bob_id) = register(&app, "Bob").await;

    let (status, body) = call(&app, Method::GET, "/api/matching", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Please complete your profile (skills and college required) before finding matches"
    );

    for token in [&alice, &bob] {
        let (status, _) = call(
            &app,
            Method::PUT,
            "/api/users/profile",
            Some(token),
            Some(json!({"skills": ["Rust"], "college": "MIT", "year": "2026"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = call(&app, Method::GET, "/api/matching?limit=5", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["matches"][0]["userId"], bob_id.as_str());
    assert_eq!(body["matches"][0]["matchPercentage"], 100);
    assert_eq!(body["matches"][0]["year"], "2026");

    let (status, _) = call(&app, Method::GET, "/api/matching", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn posts_feed_like_comment_delete() {
    let app = app();
    let (alice, _) = register(&app, "Alice").await;
    let (bob, _) = register(&app, "Bob").await;

    let (status, post) = call(
        &app,
        Method::POST,
        "/api/posts",
        Some(&alice),
        Some(json!({"content": "hello", "hashtags": ["rust"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_uri = format!("/api/posts/{}", post["id"].as_str().unwrap());

    let (_, feed) = call(&app, Method::GET, "/api/posts", None, None).await;
    assert_eq!(feed[0]["content"], "hello");
    assert_eq!(feed[0]["createdAt"], post["createdAt"]);
    assert_eq!(feed[0]["likes"], json!([]));
    assert_eq!(feed[0]["comments"], json!([]));

    let like_uri = format!("{post_uri}/like");
    let (_, liked) = call(&app, Method::POST, &like_uri, Some(&bob), None).await;
    assert_eq!(liked["likes"].as_array().unwrap().len(), 1);
    let (_, unliked) = call(&app, Method::POST, &like_uri, Some(&bob), None).await;
    assert_eq!(unliked["likes"], json!([]));

    let (_, commented) = call(
        &app,
        Method::POST,
        &format!("{post_uri}/comment"),
        Some(&bob),
        Some(json!({"text": "nice"})),
    )
    .await;
    assert_eq!(commented["comments"][0]["user"]["name"], "Bob");

    let (status, body) = call(&app, Method::DELETE, &post_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());
    let (status, _) = call(&app, Method::GET, &post_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, Method::DELETE, &post_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, Method::GET, &post_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Post not found");
}

#[tokio::test]
async fn messaging_marks_thread_read() {
    let app = app();
    let (sam, sam_id) = register(&app, "Sam").await;
    let (rita, rita_id) = register(&app, "Rita").await;

    for text in ["one", "two", "three"] {
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/messages",
            Some(&sam),
            Some(json!({"recipient": rita_id, "content": text})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, convos) = call(&app, Method::GET, "/api/messages/conversations", Some(&rita), None).await;
    assert_eq!(convos.as_array().unwrap().len(), 1);
    assert_eq!(convos[0]["id"], sam_id.as_str());
    assert_eq!(convos[0]["lastMessage"]["content"], "three");

    let thread_uri = format!("/api/messages/{sam_id}");
    let (_, first) = call(&app, Method::GET, &thread_uri, Some(&rita), None).await;
    assert!(first.as_array().unwrap().iter().all(|m| m["read"] == false));
    let (_, second) = call(&app, Method::GET, &thread_uri, Some(&rita), None).await;
    assert!(second.as_array().unwrap().iter().all(|m| m["read"] == true));
}

#[tokio::test]
async fn opportunities_create_and_apply() {
    let app = app();
    let (alice, _) = register(&app, "Alice").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/opportunities",
        Some(&alice),
        Some(json!({"title": "Hack", "description": "d", "type": "meetup", "company": "Acme"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("meetup"));

    let (status, opp) = call(
        &app,
        Method::POST,
        "/api/opportunities",
        Some(&alice),
        Some(json!({
            "title": "Hack",
            "description": "Build things",
            "type": "hackathon",
            "company": "Acme",
            "deadline": "2030-01-31",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(opp["location"], "Remote");
    assert_eq!(opp["createdBy"]["name"], "Alice");

    let apply_uri = format!("/api/opportunities/{}/apply", opp["id"].as_str().unwrap());
    let (status, body) = call(&app, Method::POST, &apply_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Applied successfully");

    let (status, body) = call(&app, Method::POST, &apply_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Already applied to this opportunity");

    let (_, list) = call(&app, Method::GET, "/api/opportunities", None, None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["createdAt"], opp["createdAt"]);

    let detail_uri = format!("/api/opportunities/{}", opp["id"].as_str().unwrap());
    let (status, detail) = call(&app, Method::GET, &detail_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["title"], "Hack");
    assert_eq!(detail["deadline"], opp["deadline"]);
    assert_eq!(detail["applicants"][0]["name"], "Alice");
    assert!(detail["applicants"][0]["headline"].is_string());

    let missing = "/api/opportunities/00000000-0000-4000-8000-000000000000";
    let (status, body) = call(&app, Method::GET, missing, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Opportunity not found");
}

#[tokio::test]
async fn deadline_past_year_9999_is_refused() {
    let app = app();
    let (alice, _) = register(&app, "Alice").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/opportunities",
        Some(&alice),
        Some(json!({
            "title": "Far future",
            "description": "d",
            "type": "job",
            "company": "Acme",
            "deadline": "9999-12-31T23:00:00-14:00",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("out of range"));

    let (status, list) = call(&app, Method::GET, "/api/opportunities", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn user_search_and_profile_update() {
    let app = app();
    let (alice, alice_id) = register(&app, "Alice").await;

    let (status, updated) = call(
        &app,
        Method::PUT,
        "/api/users/profile",
        Some(&alice),
        Some(json!({"skills": ["React", "Rust"], "headline": "Frontend"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Alice");

    let (_, found) = call(&app, Method::GET, "/api/users/search?query=react", None, None).await;
    assert_eq!(found[0]["id"], alice_id.as_str());

    let (status, _) = call(&app, Method::GET, &format!("/api/users/{alice_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, suggested) = call(&app, Method::GET, "/api/users/suggested", Some(&alice), None).await;
    assert_eq!(suggested, json!([]));
}
