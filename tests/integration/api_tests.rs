//! API integration tests against the in-memory store

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use bookclub_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

fn app() -> Router {
    let config = AppConfig::default();
    let services = Services::new(Repository::in_memory(), config.auth.clone());
    api::router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
    send_with(app, method, uri, token, body, None).await
}

async fn send_with(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
    if_match: Option<&str>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(format!("/api/v1{}", uri));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(etag) = if_match {
        builder = builder.header(header::IF_MATCH, format!("\"{}\"", etag));
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
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    Reply { status, headers, body }
}

/// Sign up and return (token, user id)
async fn signup(app: &Router, email: &str) -> (String, String) {
    let reply = send(
        app,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({
            "email": email,
            "password": "correct horse battery",
            "firstName": "Test",
            "lastName": "Reader"
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    (
        reply.body["token"].as_str().unwrap().to_string(),
        reply.body["user"]["id"].as_str().unwrap().to_string(),
    )
}

async fn create_book(app: &Router, token: &str, title: &str) -> Value {
    let reply = send(
        app,
        Method::POST,
        "/book",
        Some(token),
        Some(json!({ "author": "Ursula K. Le Guin", "title": title })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    reply.body
}

fn rent_uri(action: &str, book_id: &str, user_id: &str) -> String {
    format!("/book/rent/{}?bookId={}&userId={}", action, book_id, user_id)
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let reply = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "healthy");
}

#[tokio::test]
async fn test_signup_login_and_check() {
    let app = app();
    let (token, user_id) = signup(&app, "ada@example.com").await;

    let reply = send(&app, Method::GET, "/auth/check", Some(&token), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["id"], user_id.as_str());
    assert!(reply.body.get("password").is_none());

    let reply = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "correct horse battery" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["token_type"], "Bearer");

    let reply = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "wrong password" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["error"]["code"], 403);
}

#[tokio::test]
async fn test_duplicate_signup() {
    let app = app();
    signup(&app, "ada@example.com").await;

    let reply = send(
        &app,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({
            "email": "ada@example.com",
            "password": "another password",
            "firstName": "Ada",
            "lastName": "Again"
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["error"]["code"], 404);
}

#[tokio::test]
async fn test_create_book_requires_auth() {
    let app = app();
    let reply = send(
        &app,
        Method::POST,
        "/book",
        None,
        Some(json!({ "author": "Anyone", "title": "Anything" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["error"]["code"], 401);
}

#[tokio::test]
async fn test_rental_scenario() {
    let app = app();
    let (owner_token, _) = signup(&app, "owner@example.com").await;
    let (_, a) = signup(&app, "a@example.com").await;
    let (_, b) = signup(&app, "b@example.com").await;
    let (_, c) = signup(&app, "c@example.com").await;

    let book = create_book(&app, &owner_token, "The Dispossessed").await;
    let id = book["id"].as_str().unwrap();
    assert_eq!(book["renter"], Value::Null);
    assert_eq!(book["rentRequests"], json!([]));

    let reply = send(&app, Method::POST, &rent_uri("request", id, &a), None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["renter"], a.as_str());
    let etag = reply.body["eTag"].as_str().unwrap().to_string();
    assert_eq!(
        reply.headers.get(header::ETAG).unwrap().to_str().unwrap(),
        format!("\"{}\"", etag)
    );

    send(&app, Method::POST, &rent_uri("request", id, &b), None, None).await;
    let reply = send(&app, Method::POST, &rent_uri("request", id, &c), None, None).await;
    assert_eq!(reply.body["rentRequests"], json!([b, c]));

    let reply = send(&app, Method::POST, &rent_uri("return", id, &a), None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["renter"], b.as_str());
    assert_eq!(reply.body["rentRequests"], json!([c]));

    let reply = send(&app, Method::POST, &rent_uri("cancel", id, &c), None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["renter"], b.as_str());
    assert_eq!(reply.body["rentRequests"], json!([]));

    let reply = send(&app, Method::GET, &format!("/book/{}", id), None, None).await;
    assert_eq!(reply.body["renter"], b.as_str());
}

#[tokio::test]
async fn test_rental_missing_parameters() {
    let app = app();
    let reply = send(&app, Method::POST, "/book/rent/request", None, None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"]["code"], 100);
    let message = reply.body["error"]["message"].as_str().unwrap();
    assert!(message.contains("bookId"), "{}", message);

    let uri = format!("/book/rent/return?bookId={}", uuid::Uuid::new_v4());
    let reply = send(&app, Method::POST, &uri, None, None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body["error"]["message"].as_str().unwrap().contains("userId"));
}

#[tokio::test]
async fn test_rental_rejections() {
    let app = app();
    let (token, _) = signup(&app, "owner@example.com").await;
    let (_, a) = signup(&app, "a@example.com").await;
    let (_, b) = signup(&app, "b@example.com").await;
    let book = create_book(&app, &token, "The Left Hand of Darkness").await;
    let id = book["id"].as_str().unwrap();

    send(&app, Method::POST, &rent_uri("request", id, &a), None, None).await;

    let reply = send(&app, Method::POST, &rent_uri("request", id, &a), None, None).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["error"]["code"], 301);

    let reply = send(&app, Method::POST, &rent_uri("return", id, &b), None, None).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["error"]["code"], 302);

    let reply = send(&app, Method::POST, &rent_uri("cancel", id, &b), None, None).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["error"]["code"], 303);

    let unknown = uuid::Uuid::new_v4().to_string();
    let reply = send(&app, Method::POST, &rent_uri("request", &unknown, &a), None, None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"]["code"], 201);
}

#[tokio::test]
async fn test_stale_if_match_is_refused() {
    let app = app();
    let (token, _) = signup(&app, "owner@example.com").await;
    let (_, a) = signup(&app, "a@example.com").await;
    let (_, b) = signup(&app, "b@example.com").await;
    let book = create_book(&app, &token, "Lathe of Heaven").await;
    let id = book["id"].as_str().unwrap();
    let stale = book["eTag"].as_str().unwrap();

    send(&app, Method::POST, &rent_uri("request", id, &a), None, None).await;

    let reply = send_with(&app, Method::POST, &rent_uri("request", id, &b), None, None, Some(stale)).await;
    assert_eq!(reply.status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(reply.body["error"]["code"], 200);
    assert_eq!(reply.body["resource"]["renter"], a.as_str());

    let fresh = reply.body["resource"]["eTag"].as_str().unwrap().to_string();
    let reply = send_with(&app, Method::POST, &rent_uri("request", id, &b), None, None, Some(&fresh)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["rentRequests"], json!([b]));
}

#[tokio::test]
async fn test_update_book_checks_owner_and_etag() {
    let app = app();
    let (owner, _) = signup(&app, "owner@example.com").await;
    let (other, _) = signup(&app, "other@example.com").await;
    let book = create_book(&app, &owner, "Earthsea").await;
    let uri = format!("/book/{}", book["id"].as_str().unwrap());
    let etag = book["eTag"].as_str().unwrap();

    let update = json!({ "title": "A Wizard of Earthsea", "eTag": etag });
    let reply = send(&app, Method::PUT, &uri, Some(&other), Some(update.clone())).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["error"]["code"], 203);

    let reply = send(&app, Method::PUT, &uri, Some(&owner), Some(update.clone())).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["title"], "A Wizard of Earthsea");
    assert_ne!(reply.body["eTag"], etag);

    let reply = send(&app, Method::PUT, &uri, Some(&owner), Some(update)).await;
    assert_eq!(reply.status, StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_duplicate_title() {
    let app = app();
    let (token, _) = signup(&app, "owner@example.com").await;
    create_book(&app, &token, "Always Coming Home").await;

    let reply = send(
        &app,
        Method::POST,
        "/book",
        Some(&token),
        Some(json!({ "author": "Someone Else", "title": "Always Coming Home" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["error"]["code"], 202);
}

#[tokio::test]
async fn test_delete_account_cascades() {
    let app = app();
    let (owner, owner_id) = signup(&app, "owner@example.com").await;
    let (leaver, leaver_id) = signup(&app, "leaver@example.com").await;
    let (_, next) = signup(&app, "next@example.com").await;

    let kept = create_book(&app, &owner, "Kept").await;
    let kept_id = kept["id"].as_str().unwrap();
    create_book(&app, &leaver, "Leaves with its owner").await;

    send(&app, Method::POST, &rent_uri("request", kept_id, &leaver_id), None, None).await;
    send(&app, Method::POST, &rent_uri("request", kept_id, &next), None, None).await;

    let reply = send(&app, Method::DELETE, "/user", Some(&leaver), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["booksDeleted"], 1);
    assert_eq!(reply.body["booksReleased"], 1);

    let reply = send(&app, Method::GET, "/book", None, None).await;
    let books = reply.body.as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["owner"], owner_id.as_str());
    assert_eq!(books[0]["renter"], next.as_str());
    assert_eq!(books[0]["rentRequests"], json!([]));

    let reply = send(&app, Method::GET, "/auth/check", Some(&leaver), None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}
