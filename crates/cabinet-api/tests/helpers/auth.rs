use super::TestApp;
use cabinet_core::models::UserResponse;
use cabinet_db::TokenStore;
use std::time::Duration;
use uuid::Uuid;

/// Signed-up user with a live session token.
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

/// Sign up through the API, then issue a token the way the operator CLI does.
pub async fn register_test_user(app: &TestApp, email: &str) -> TestUser {
    let response = app
        .client()
        .post("/users")
        .json(&serde_json::json!({ "email": email, "password": "TestPassword123!" }))
        .await;
    assert_eq!(response.status_code(), 201, "signup failed: {}", response.text());
    let user: UserResponse = response.json();

    let token = app
        .state
        .stores
        .tokens
        .put(user.id, Duration::from_secs(3600))
        .await
        .expect("Failed to issue token");

    TestUser {
        id: user.id,
        email: user.email,
        token,
    }
}
