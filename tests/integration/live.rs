//! Tests against a running server
//!
//! Start the server, then run with: cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:3000/api/v1";

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_signup_and_rent() {
    let client = Client::new();
    let email = format!("{}@example.com", uuid::Uuid::new_v4());

    let response = client
        .post(format!("{}/auth/signup", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "correct horse battery",
            "firstName": "Live",
            "lastName": "Test"
        }))
        .send()
        .await
        .expect("Failed to send signup request");
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse signup response");
    let token = body["token"].as_str().expect("No token in response").to_string();
    let user_id = body["user"]["id"].as_str().expect("No user id").to_string();

    let response = client
        .post(format!("{}/book", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "author": "Live Author", "title": format!("Live {}", user_id) }))
        .send()
        .await
        .expect("Failed to send create request");
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let book: Value = response.json().await.expect("Failed to parse book");
    let response = client
        .post(format!("{}/book/rent/request", BASE_URL))
        .query(&[("bookId", book["id"].as_str().unwrap()), ("userId", user_id.as_str())])
        .send()
        .await
        .expect("Failed to send rent request");
    assert!(response.status().is_success());
    assert!(response.headers().contains_key(reqwest::header::ETAG));

    client
        .delete(format!("{}/user", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to delete test account");
}
