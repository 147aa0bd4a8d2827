use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use postboard_api::{build_router, AppState};
use postboard_common::config::{AuthConfig, LimitsConfig};
use postboard_db::{storage::StorageClient, Database};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "postboard-test-boundary";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

async fn app() -> (Router, TempDir) {
    let (app, dir, _db) = app_with_limits(LimitsConfig {
        max_image_bytes: 1024 * 1024,
        max_page_size: 50,
    })
    .await;
    (app, dir)
}

async fn app_with_limits(limits: LimitsConfig) -> (Router, TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::in_memory().await.unwrap();
    let state = AppState {
        db: db.clone(),
        storage: StorageClient::local(dir.path()),
        auth: AuthConfig {
            jwt_secret: "test-secret".into(),
            token_ttl_secs: 3600,
        },
        limits,
        public_url: Some("http://posts.test".into()),
    };
    (build_router(state), dir, db)
}

fn stored_images(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path().join("images"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn multipart_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    image: Option<(&str, &str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content_type, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}

/// Sign up and log in, returning (token, user id).
async fn login_as(app: &Router, email: &str) -> (String, String) {
    let creds = json!({ "email": email, "password": "hunter22" });
    let (status, _) = send(app, json_request(Method::POST, "/api/user/signup", None, creds.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(app, json_request(Method::POST, "/api/user/login", None, creds)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expiresIn"], 3600);
    (
        body["token"].as_str().unwrap().to_string(),
        body["userId"].as_str().unwrap().to_string(),
    )
}

async fn create_post(app: &Router, token: &str, title: &str) -> Value {
    let req = multipart_request(
        Method::POST,
        "/api/posts",
        Some(token),
        &[("title", title), ("content", "Some content")],
        Some((title, "image/png", PNG)),
    );
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["post"].clone()
}

#[tokio::test]
async fn created_post_round_trips_with_server_assigned_id() {
    let (app, _dir) = app().await;
    let (token, user_id) = login_as(&app, "writer@example.com").await;

    let created = create_post(&app, &token, "My First Post").await;
    let id = created["_id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(created["creator"], user_id.as_str());

    let (status, fetched) = send(&app, empty_request(Method::GET, &format!("/api/posts/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["_id"], id.as_str());
    assert_eq!(fetched["title"], "My First Post");
    assert_eq!(fetched["content"], "Some content");

    let image_path = fetched["imagePath"].as_str().unwrap();
    assert!(image_path.starts_with("http://posts.test/images/my-first-post-"));
    assert!(image_path.ends_with(".png"));

    let image_uri = image_path.trim_start_matches("http://posts.test");
    let resp = app.clone().oneshot(empty_request(Method::GET, image_uri, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], PNG);
}

#[tokio::test]
async fn mutating_routes_require_a_valid_token() {
    let (app, _dir) = app().await;

    let req = multipart_request(
        Method::POST,
        "/api/posts",
        None,
        &[("title", "Title"), ("content", "Body")],
        Some(("a.png", "image/png", PNG)),
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Auth failed!");

    let (status, _) = send(
        &app,
        empty_request(Method::DELETE, "/api/posts/whatever", Some("not-a-jwt")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reads stay public
    let (status, body) = send(&app, empty_request(Method::GET, "/api/posts", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["maxPosts"], 0);
}

#[tokio::test]
async fn unsupported_image_types_are_rejected() {
    let (app, _dir) = app().await;
    let (token, _) = login_as(&app, "writer@example.com").await;

    let req = multipart_request(
        Method::POST,
        "/api/posts",
        Some(&token),
        &[("title", "Animated"), ("content", "Body")],
        Some(("cat.gif", "image/gif", b"GIF89a")),
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Invalid mime type"));

    let req = multipart_request(
        Method::POST,
        "/api/posts",
        Some(&token),
        &[("title", "No image"), ("content", "Body")],
        None,
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Image is required"));
}

#[tokio::test]
async fn oversized_images_are_rejected() {
    let (app, dir, _db) = app_with_limits(LimitsConfig {
        max_image_bytes: 16,
        max_page_size: 50,
    })
    .await;
    let (token, _) = login_as(&app, "writer@example.com").await;

    let req = multipart_request(
        Method::POST,
        "/api/posts",
        Some(&token),
        &[("title", "Too big"), ("content", "Body")],
        Some(("big.png", "image/png", PNG)),
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Image too large"));
    assert_eq!(stored_images(&dir), 0);
}

#[tokio::test]
async fn listing_without_paging_returns_every_post() {
    let (app, _dir) = app().await;
    let (token, _) = login_as(&app, "writer@example.com").await;
    for title in ["Alpha", "Beta", "Gamma", "Delta"] {
        create_post(&app, &token, title).await;
    }

    for uri in ["/api/posts", "/api/posts?pagesize=2", "/api/posts?page=2"] {
        let (status, body) = send(&app, empty_request(Method::GET, uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["posts"].as_array().unwrap().len(), 4, "{uri}");
        assert_eq!(body["maxPosts"], 4);
    }
}

#[tokio::test]
async fn page_size_is_clamped_to_the_configured_maximum() {
    let (app, _dir, _db) = app_with_limits(LimitsConfig {
        max_image_bytes: 1024 * 1024,
        max_page_size: 2,
    })
    .await;
    let (token, _) = login_as(&app, "writer@example.com").await;
    for title in ["Post one", "Post two", "Post three"] {
        create_post(&app, &token, title).await;
    }

    let (status, body) = send(&app, empty_request(Method::GET, "/api/posts?pagesize=100&page=1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"].as_array().unwrap().len(), 2);
    assert_eq!(body["maxPosts"], 3);

    let (_, body) = send(&app, empty_request(Method::GET, "/api/posts?pagesize=100&page=2", None)).await;
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "Post three");
}

#[tokio::test]
async fn listing_pages_through_posts_and_reports_total() {
    let (app, _dir) = app().await;
    let (token, _) = login_as(&app, "writer@example.com").await;
    for title in ["Post one", "Post two", "Post three"] {
        create_post(&app, &token, title).await;
    }

    let (status, body) = send(&app, empty_request(Method::GET, "/api/posts?pagesize=2&page=2", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Posts fetched successfully!");
    assert_eq!(body["maxPosts"], 3);
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "Post three");

    let (_, body) = send(&app, empty_request(Method::GET, "/api/posts", None)).await;
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 3);
    assert!(posts.iter().all(|p| p.get("_id").is_some()));
}

#[tokio::test]
async fn only_the_creator_may_update_or_delete() {
    let (app, _dir) = app().await;
    let (owner, _) = login_as(&app, "owner@example.com").await;
    let (intruder, _) = login_as(&app, "intruder@example.com").await;

    let created = create_post(&app, &owner, "Original").await;
    let id = created["_id"].as_str().unwrap().to_string();
    let image_path = created["imagePath"].as_str().unwrap().to_string();
    let uri = format!("/api/posts/{id}");

    let update = json!({ "id": id, "title": "Edited", "content": "New text", "imagePath": image_path });
    let (status, _) = send(&app, json_request(Method::PUT, &uri, Some(&intruder), update.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, empty_request(Method::DELETE, &uri, Some(&intruder))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, json_request(Method::PUT, &uri, Some(&owner), update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Update successful!");

    let (_, fetched) = send(&app, empty_request(Method::GET, &uri, None)).await;
    assert_eq!(fetched["title"], "Edited");
    assert_eq!(fetched["imagePath"], image_path.as_str());
}

#[tokio::test]
async fn updating_with_a_new_image_replaces_the_stored_file() {
    let (app, _dir) = app().await;
    let (token, _) = login_as(&app, "owner@example.com").await;
    let created = create_post(&app, &token, "Pictured").await;
    let id = created["_id"].as_str().unwrap().to_string();
    let old_uri = created["imagePath"].as_str().unwrap().trim_start_matches("http://posts.test").to_string();

    let req = multipart_request(
        Method::PUT,
        &format!("/api/posts/{id}"),
        Some(&token),
        &[("id", id.as_str()), ("title", "Pictured again"), ("content", "Body")],
        Some(("New Shot.jpg", "image/jpeg", b"jpeg-bytes")),
    );
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let (_, fetched) = send(&app, empty_request(Method::GET, &format!("/api/posts/{id}"), None)).await;
    let new_path = fetched["imagePath"].as_str().unwrap();
    assert!(new_path.contains("/images/new-shot-"));
    assert!(new_path.ends_with(".jpg"));

    let (status, _) = send(&app, empty_request(Method::GET, &old_uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_removes_the_post_and_its_image() {
    let (app, _dir) = app().await;
    let (token, _) = login_as(&app, "owner@example.com").await;
    let created = create_post(&app, &token, "Short lived").await;
    let id = created["_id"].as_str().unwrap().to_string();
    let image_uri = created["imagePath"].as_str().unwrap().trim_start_matches("http://posts.test").to_string();

    let (status, body) = send(&app, empty_request(Method::DELETE, &format!("/api/posts/{id}"), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Deletion successful!");

    let (status, body) = send(&app, empty_request(Method::GET, &format!("/api/posts/{id}"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Post not found!");

    let (status, _) = send(&app, empty_request(Method::GET, &image_uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_ids_are_not_found() {
    let (app, _dir) = app().await;
    let (status, _) = send(&app, empty_request(Method::GET, "/api/posts/not-a-uuid", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_signup_and_bad_password_fail() {
    let (app, _dir) = app().await;
    login_as(&app, "dup@example.com").await;

    let creds = json!({ "email": "DUP@example.com", "password": "hunter22" });
    let (status, _) = send(&app, json_request(Method::POST, "/api/user/signup", None, creds)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let wrong = json!({ "email": "dup@example.com", "password": "wrong-password" });
    let (status, body) = send(&app, json_request(Method::POST, "/api/user/login", None, wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid authentication credentials!");
}

#[tokio::test]
async fn updates_cannot_repoint_a_post_at_another_users_image() {
    let (app, _dir) = app().await;
    let (victim, _) = login_as(&app, "victim@example.com").await;
    let (attacker, _) = login_as(&app, "attacker@example.com").await;

    let victim_post = create_post(&app, &victim, "Victim post").await;
    let victim_image = victim_post["imagePath"].as_str().unwrap().to_string();
    let own = create_post(&app, &attacker, "Attacker post").await;
    let own_id = own["_id"].as_str().unwrap().to_string();
    let own_uri = format!("/api/posts/{own_id}");

    let update = json!({ "id": own_id, "title": "Borrowed", "content": "x", "imagePath": victim_image });
    let (status, body) = send(&app, json_request(Method::PUT, &own_uri, Some(&attacker), update)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("does not match"));

    let (_, fetched) = send(&app, empty_request(Method::GET, &own_uri, None)).await;
    assert_eq!(fetched["imagePath"], own["imagePath"]);

    let (status, _) = send(&app, empty_request(Method::DELETE, &own_uri, Some(&attacker))).await;
    assert_eq!(status, StatusCode::OK);

    let victim_uri = victim_image.trim_start_matches("http://posts.test");
    let (status, _) = send(&app, empty_request(Method::GET, victim_uri, None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn json_update_without_an_image_path_keeps_the_stored_image() {
    let (app, _dir) = app().await;
    let (token, _) = login_as(&app, "owner@example.com").await;
    let created = create_post(&app, &token, "Keep me").await;
    let uri = format!("/api/posts/{}", created["_id"].as_str().unwrap());

    let update = json!({ "title": "Kept", "content": "Same image", "imagePath": "" });
    let (status, _) = send(&app, json_request(Method::PUT, &uri, Some(&token), update)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, fetched) = send(&app, empty_request(Method::GET, &uri, None)).await;
    assert_eq!(fetched["title"], "Kept");
    assert_eq!(fetched["imagePath"], created["imagePath"]);
}

#[tokio::test]
async fn failed_insert_leaves_no_stored_image_behind() {
    let (app, dir, db) = app_with_limits(LimitsConfig {
        max_image_bytes: 1024 * 1024,
        max_page_size: 50,
    })
    .await;
    let (token, _) = login_as(&app, "ghost@example.com").await;

    // The token outlives the account, so the post insert trips the foreign key.
    sqlx::query("DELETE FROM users").execute(&db.pool).await.unwrap();

    let req = multipart_request(
        Method::POST,
        "/api/posts",
        Some(&token),
        &[("title", "Orphan"), ("content", "Body")],
        Some(("orphan.png", "image/png", PNG)),
    );
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stored_images(&dir), 0);
}
