//! Integration tests for the admin-only `GET /api/_count` endpoint.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{body_json, test_app, InMemoryUserStore, TEST_ADMIN_API_KEY};
use london_travel_site::models::TravelUser;
use tower::util::ServiceExt;

fn count_request(api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/api/_count");

    if let Some(key) = api_key {
        builder = builder.header("X-Admin-Api-Key", key);
    }

    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn count_requires_the_admin_api_key() {
    let store = InMemoryUserStore::new(Vec::new());
    let app = test_app(store);

    let response = app.oneshot(count_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn count_rejects_a_wrong_admin_api_key() {
    let store = InMemoryUserStore::new(Vec::new());
    let app = test_app(store);

    let response = app
        .oneshot(count_request(Some("not-the-key")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn count_returns_the_number_of_users() {
    let users = vec![
        TravelUser::new(vec!["victoria".to_string()], Some("token-a".to_string())),
        TravelUser::new(Vec::new(), None),
        TravelUser::new(Vec::new(), Some("token-b".to_string())),
    ];
    let store = InMemoryUserStore::new(users);
    let app = test_app(store);

    let response = app
        .oneshot(count_request(Some(TEST_ADMIN_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["count"], 3);
}
