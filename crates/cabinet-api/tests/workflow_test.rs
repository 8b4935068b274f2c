//! End-to-end flows over the full router.
//!
//! Run with: `cargo test -p cabinet-api --test workflow_test`

mod helpers;

use cabinet_core::models::{FileKind, FileResponse, ParentRef};
use helpers::auth::register_test_user;
use helpers::fixtures::{create_test_png, encode};
use helpers::{setup_test_app, wait_for_ok};
use serde_json::json;

#[tokio::test]
async fn test_photos_folder_with_thumbnailed_image() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(&app, "alice@example.com").await;

    let response = client
        .post("/upload")
        .add_header("X-Token", user.token.clone())
        .json(&json!({ "name": "Photos", "type": "folder" }))
        .await;
    assert_eq!(response.status_code(), 201);
    let photos: FileResponse = response.json();
    assert_eq!(photos.kind, FileKind::Folder);
    assert_eq!(photos.parent_id, ParentRef::Root);

    let root: Vec<FileResponse> = client
        .get("/files")
        .add_header("X-Token", user.token.clone())
        .await
        .json();
    assert!(root.iter().any(|f| f.id == photos.id));

    let original = create_test_png(600, 400);
    let response = client
        .post("/upload")
        .add_header("X-Token", user.token.clone())
        .json(&json!({
            "name": "cat.png",
            "type": "image",
            "parentId": photos.id.to_string(),
            "data": encode(&original),
        }))
        .await;
    assert_eq!(response.status_code(), 201);
    let cat: FileResponse = response.json();
    assert_eq!(cat.kind, FileKind::Image);
    assert_eq!(cat.user_id, user.id);
    assert_eq!(cat.parent_id, ParentRef::Folder(photos.id));

    let children: Vec<FileResponse> = client
        .get("/files")
        .add_query_param("parentId", photos.id.to_string())
        .add_header("X-Token", user.token.clone())
        .await
        .json();
    assert_eq!(children, vec![cat.clone()]);

    let thumbnail = wait_for_ok(
        client,
        &format!("/files/{}/data?size=100", cat.id),
        &user.token,
    )
    .await
    .expect("thumbnail was never generated");
    assert_ne!(thumbnail, original);
    assert!(thumbnail.len() < original.len());

    let decoded = image::load_from_memory(&thumbnail).unwrap();
    assert_eq!(decoded.width(), 100);

    let response = client
        .get(&format!("/files/{}/data", cat.id))
        .add_header("X-Token", user.token.clone())
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "image/png");
    assert_eq!(response.as_bytes().to_vec(), original);
}

#[tokio::test]
async fn test_file_bytes_round_trip() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(&app, "bytes@example.com").await;

    let payload: Vec<u8> = (0..=255u8).chain([0, 0, 255, 10, 13]).collect();
    let response = client
        .post("/upload")
        .add_header("X-Token", user.token.clone())
        .json(&json!({ "name": "blob.bin", "type": "file", "data": encode(&payload) }))
        .await;
    assert_eq!(response.status_code(), 201);
    let file: FileResponse = response.json();

    let response = client
        .get(&format!("/files/{}/data", file.id))
        .add_header("X-Token", user.token.clone())
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.as_bytes().to_vec(), payload);
    assert_eq!(response.header("content-type"), "application/octet-stream");
}

#[tokio::test]
async fn test_visibility_controls_anonymous_access() {
    let app = setup_test_app().await;
    let client = app.client();
    let owner = register_test_user(&app, "owner@example.com").await;
    let other = register_test_user(&app, "other@example.com").await;

    let file: FileResponse = client
        .post("/upload")
        .add_header("X-Token", owner.token.clone())
        .json(&json!({ "name": "notes.txt", "type": "file", "data": encode(b"private notes") }))
        .await
        .json();
    assert!(!file.is_public);
    let data_path = format!("/files/{}/data", file.id);

    // Hidden, not forbidden
    assert_eq!(client.get(&data_path).await.status_code(), 404);
    let response = client
        .get(&format!("/files/{}", file.id))
        .add_header("X-Token", other.token.clone())
        .await;
    assert_eq!(response.status_code(), 404);

    // Only the owner can publish
    let response = client
        .put(&format!("/files/{}/publish", file.id))
        .add_header("X-Token", other.token.clone())
        .await;
    assert_eq!(response.status_code(), 404);

    let response = client
        .put(&format!("/files/{}/publish", file.id))
        .add_header("X-Token", owner.token.clone())
        .await;
    assert_eq!(response.status_code(), 200);
    let published: FileResponse = response.json();
    assert!(published.is_public);
    assert_eq!(published.name, "notes.txt");

    let response = client.get(&data_path).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text(), "private notes");
    assert_eq!(response.header("content-type"), "text/plain");

    let response = client
        .get(&format!("/files/{}", file.id))
        .add_header("X-Token", other.token.clone())
        .await;
    assert_eq!(response.status_code(), 200);

    let response = client
        .put(&format!("/files/{}/unpublish", file.id))
        .add_header("X-Token", owner.token.clone())
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(client.get(&data_path).await.status_code(), 404);
}

#[tokio::test]
async fn test_invalid_token_on_public_data_is_anonymous() {
    let app = setup_test_app().await;
    let client = app.client();
    let owner = register_test_user(&app, "pub@example.com").await;

    let file: FileResponse = client
        .post("/upload")
        .add_header("X-Token", owner.token.clone())
        .json(&json!({ "name": "readme.md", "type": "file", "isPublic": true, "data": encode(b"# hi") }))
        .await
        .json();

    let response = client
        .get(&format!("/files/{}/data", file.id))
        .add_header("X-Token", "not-a-session")
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text(), "# hi");
}
