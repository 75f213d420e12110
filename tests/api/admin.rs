use std::collections::HashMap;

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::TestApp;

#[tokio::test]
async fn admin_listing_returns_signups_newest_first() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(path("/mail/send"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&test_app.email_server)
        .await;

    for email in ["older@gmail.com", "newer@sharjah.ac.ae"] {
        let body = HashMap::from([("email", email), ("university", "AUS")]);
        test_app.post_signup(body).await;
    }

    let response = test_app.get_admin_signups().await;

    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Response body was not JSON.");
    let signups = body["signups"].as_array().unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(signups.len(), 2);
    assert_eq!(signups[0]["email"], "newer@sharjah.ac.ae");
    assert_eq!(signups[0]["isPriorityEmail"], true);
    assert_eq!(signups[0]["emailDomain"], "sharjah.ac.ae");
    assert_eq!(signups[1]["email"], "older@gmail.com");
    assert!(signups[0].get("createdAt").is_some());
    assert!(signups[0].get("ipAddress").is_some());
}

#[tokio::test]
async fn admin_listing_is_empty_before_any_signup() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app.get_admin_signups().await;
    let body: serde_json::Value = response.json().await.expect("Response body was not JSON.");

    assert_eq!(body["success"], true);
    assert_eq!(body["signups"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn admin_listing_returns_503_when_the_primary_store_is_missing() {
    let test_app = TestApp::spawn_app_without_stores().await;

    let response = test_app.get_admin_signups().await;

    assert_eq!(503, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Response body was not JSON.");

    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn migration_returns_503_when_the_mirror_is_missing() {
    // Test apps run without a mirror, so the one-shot migration has nothing
    // to read from.
    let test_app = TestApp::spawn_app().await;

    let response = test_app.post_migrate().await;

    assert_eq!(503, response.status().as_u16());
}
