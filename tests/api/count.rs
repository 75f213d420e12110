use std::collections::HashMap;

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::TestApp;

#[tokio::test]
async fn count_reports_the_historical_offset_when_the_store_is_empty() {
    let test_app = TestApp::spawn_app_with(|config| {
        config.waitlist.historical_offset = 247;
    })
    .await;

    let response = test_app.get_count().await;

    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Response body was not JSON.");

    assert_eq!(body["count"], 247);
}

#[tokio::test]
async fn count_is_non_decreasing_across_successful_admissions() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(path("/mail/send"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&test_app.email_server)
        .await;

    let mut previous = {
        let response = test_app.get_count().await;
        let body: serde_json::Value = response.json().await.unwrap();
        body["count"].as_i64().unwrap()
    };

    for email in ["first@gmail.com", "second@gmail.com", "third@sharjah.ac.ae"] {
        let body = HashMap::from([("email", email), ("university", "AUS")]);
        test_app.post_signup(body).await;

        let response = test_app.get_count().await;
        let body: serde_json::Value = response.json().await.unwrap();
        let current = body["count"].as_i64().unwrap();

        assert!(current > previous);
        previous = current;
    }
}

#[tokio::test]
async fn count_still_answers_when_no_store_is_available() {
    let test_app = TestApp::spawn_app_without_stores().await;

    let response = test_app.get_count().await;

    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Response body was not JSON.");

    // Live count degrades to zero; the offset still shows.
    assert_eq!(body["count"], 247);
}
