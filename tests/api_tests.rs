mod common;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chirp::{
    AppState,
    auth::{INVALID_EMAIL, PasswordHasher, TokenIssuer, TokenKind},
    service::SignUp,
    upload::UploadStore,
};
use chrono::{Duration, Utc};
use common::STRONG_PASSWORD;
use entity::user;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "chirp-test-boundary";

struct TestApp {
    app: Router,
    state: AppState,
    dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState {
            db: common::connect().await,
            tokens: Arc::new(TokenIssuer::new(common::SECRET)),
            hasher: PasswordHasher::new(4),
            uploads: UploadStore::new(dir.path()),
        };
        Self {
            app: chirp::router(state.clone()),
            state,
            dir,
        }
    }

    async fn user(&self, username: &str) -> (user::Model, String) {
        let user = self
            .state
            .accounts()
            .sign_up(SignUp {
                username: username.to_owned(),
                email: format!("{username}@example.com"),
                password: STRONG_PASSWORD.to_owned(),
                ..Default::default()
            })
            .await
            .unwrap();
        let token = self
            .state
            .tokens
            .issue(user.id, TokenKind::Access, Utc::now())
            .unwrap();
        (user, token)
    }

    async fn raw(&self, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let res = self.app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.raw(req).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn files_in(&self, folder: &str) -> usize {
        std::fs::read_dir(self.dir.path().join(folder))
            .map(|dir| dir.count())
            .unwrap_or(0)
    }
}

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

fn get(uri: &str, token: &str) -> Request<Body> {
    request(Method::GET, uri, Some(token)).body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    request(method, uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart(
    method: Method,
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
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
    if let Some((name, file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    request(method, uri, token)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn sign_up_login_and_profile() {
    let t = TestApp::new().await;

    let (status, body) = t
        .send(multipart(
            Method::POST,
            "/signup",
            None,
            &[
                ("UserName", "alice"),
                ("Email", "alice@example.com"),
                ("Password", STRONG_PASSWORD),
                ("Bio", "hello"),
            ],
            Some(("Picture", "me.PNG", b"png-bytes")),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"].get("password").is_none());
    let picture = body["user"]["picture"].as_str().unwrap().to_owned();
    assert!(picture.starts_with("uploads/profile_pictures/"));
    assert!(picture.ends_with(".png"));

    let res = t
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/login",
            None,
            json!({ "username": "alice", "password": STRONG_PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_owned();
    assert!(cookie.starts_with("Authorization="));
    assert!(cookie.contains("HttpOnly"));
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let tokens: Value = serde_json::from_slice(&bytes).unwrap();
    let access = tokens["access_token"].as_str().unwrap().to_owned();
    assert!(tokens["refresh_token"].is_string());

    let (status, body) = t.send(get("/user", &access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["user"],
        json!({
            "username": "alice",
            "email": "alice@example.com",
            "bio": "hello",
            "picture": picture,
        })
    );

    // The login cookie alone is enough.
    let cookie_pair = cookie.split(';').next().unwrap().to_owned();
    let (status, _) = t
        .send(
            Request::builder()
                .uri("/")
                .header(header::COOKIE, cookie_pair)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Stored files are served to signed-in users only.
    let uri = format!("/{picture}");
    let (status, bytes) = t.raw(get(&uri, &access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"png-bytes");
    let (status, _) = t
        .raw(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn failed_sign_up_leaves_no_file_behind() {
    let t = TestApp::new().await;

    let (status, body) = t
        .send(multipart(
            Method::POST,
            "/signup",
            None,
            &[
                ("UserName", "alice"),
                ("Email", "not-an-email"),
                ("Password", STRONG_PASSWORD),
            ],
            Some(("Picture", "me.png", b"png-bytes")),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": INVALID_EMAIL }));
    assert_eq!(t.files_in("profile_pictures"), 0);
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let t = TestApp::new().await;

    let (status, body) = t
        .send(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = t.send(get("/tweet", "garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, access) = t.user("alice").await;
    let (status, body) = t.send(get("/", &access)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn expired_access_token_is_refused_until_refreshed() {
    let t = TestApp::new().await;
    let (alice, _) = t.user("alice").await;

    let issued = Utc::now() - Duration::seconds(3601);
    let stale = t.state.tokens.issue_pair(alice.id, issued).unwrap();

    let (status, body) = t.send(get("/user", &stale.access_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    // An access token cannot stand in for a refresh token.
    let (status, _) = t
        .send(json_request(
            Method::POST,
            "/refresh",
            None,
            json!({ "refresh_token": stale.access_token }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = t
        .send(json_request(
            Method::POST,
            "/refresh",
            None,
            json!({ "refresh_token": stale.refresh_token }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let fresh = body["access_token"].as_str().unwrap().to_owned();

    let (status, body) = t.send(get("/user", &fresh)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
}

#[tokio::test]
async fn tweet_lifecycle() {
    let t = TestApp::new().await;
    let (_, alice) = t.user("alice").await;
    let (_, bob) = t.user("bob").await;

    let (status, body) = t
        .send(multipart(
            Method::POST,
            "/create-tweet",
            Some(&alice),
            &[("title", "Hello"), ("body", "First post")],
            Some(("file", "a.txt", b"first")),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["tweet"]["id"].as_i64().unwrap();
    let first_file = body["tweet"]["file"].as_str().unwrap().to_owned();
    assert_eq!(t.files_in("tweets"), 1);

    let (status, body) = t.send(get("/tweet?search=FIRST", &bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tweets"].as_array().unwrap().len(), 1);
    assert_eq!(body["tweets"][0]["title"], "Hello");

    let (status, body) = t.send(get("/tweet?search=nothing", &bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tweets"], json!([]));

    // Likes
    let like_uri = format!("/tweet/{id}/like");
    let (status, _) = t
        .send(request(Method::POST, &like_uri, Some(&bob)).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = t
        .send(request(Method::POST, &like_uri, Some(&bob)).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "error": "tweet already liked" }));

    let (status, body) = t.send(get(&format!("/tweet/{id}"), &alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tweet"]["likes"], 1);

    let unlike_uri = format!("/tweet/{id}/unlike");
    let (status, _) = t
        .send(request(Method::DELETE, &unlike_uri, Some(&bob)).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t
        .send(request(Method::DELETE, &unlike_uri, Some(&bob)).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Someone else's tweet looks missing.
    let tweet_uri = format!("/tweet/{id}");
    let (status, body) = t
        .send(multipart(Method::PATCH, &tweet_uri, Some(&bob), &[("title", "Mine now")], None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "tweet not found" }));

    // Replacing the attachment removes the old file.
    let (status, body) = t
        .send(multipart(
            Method::PATCH,
            &tweet_uri,
            Some(&alice),
            &[("title", "Hello again")],
            Some(("file", "b.txt", b"second")),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tweet"]["title"], "Hello again");
    assert_eq!(body["tweet"]["body"], "First post");
    assert_ne!(body["tweet"]["file"], first_file);
    assert!(!t.dir.path().join(first_file.trim_start_matches("uploads/")).exists());
    assert_eq!(t.files_in("tweets"), 1);

    let (status, body) = t
        .send(request(Method::DELETE, &tweet_uri, Some(&alice)).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    assert_eq!(t.files_in("tweets"), 0);

    let (status, _) = t.send(get(&tweet_uri, &alice)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tweet_needs_title_and_body() {
    let t = TestApp::new().await;
    let (_, alice) = t.user("alice").await;

    let (status, body) = t
        .send(multipart(
            Method::POST,
            "/create-tweet",
            Some(&alice),
            &[("title", "No body")],
            Some(("file", "a.txt", b"data")),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(t.files_in("tweets"), 0);
}

#[tokio::test]
async fn follow_over_http() {
    let t = TestApp::new().await;
    let (alice_user, alice) = t.user("alice").await;
    let (bob_user, bob) = t.user("bob").await;

    let follow_uri = format!("/follow/{}", bob_user.id);
    let (status, _) = t
        .send(request(Method::POST, &follow_uri, Some(&alice)).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t
        .send(request(Method::POST, &follow_uri, Some(&alice)).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let self_uri = format!("/follow/{}", alice_user.id);
    let (status, body) = t
        .send(request(Method::POST, &self_uri, Some(&alice)).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "cannot follow yourself" }));

    let (status, body) = t
        .send(request(Method::POST, "/follow/abc", Some(&alice)).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid ID format" }));

    let (status, body) = t.send(get("/followers", &bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["followers"],
        json!([{ "id": alice_user.id, "username": "alice", "bio": "", "picture": "" }])
    );

    let (status, body) = t.send(get("/followings", &alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["followings"][0]["username"], "bob");

    let unfollow_uri = format!("/unfollow/{}", bob_user.id);
    let (status, _) = t
        .send(request(Method::POST, &unfollow_uri, Some(&alice)).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = t
        .send(request(Method::POST, &unfollow_uri, Some(&alice)).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = t.send(get("/followers", &bob)).await;
    assert_eq!(body["followers"], json!([]));
}

#[tokio::test]
async fn change_password_and_update_profile() {
    let t = TestApp::new().await;
    let (_, alice) = t.user("alice").await;

    let (status, body) = t
        .send(json_request(
            Method::POST,
            "/change-password",
            Some(&alice),
            json!({ "current_password": "Wr0ng!Pass", "new_password": "N3w!Password" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Invalid password" }));

    let (status, _) = t
        .send(json_request(
            Method::POST,
            "/change-password",
            Some(&alice),
            json!({ "current_password": STRONG_PASSWORD, "new_password": "N3w!Password" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t
        .send(json_request(
            Method::POST,
            "/login",
            None,
            json!({ "email": "alice@example.com", "password": "N3w!Password" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t
        .send(multipart(
            Method::PATCH,
            "/user",
            Some(&alice),
            &[("Bio", "updated")],
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["bio"], "updated");
    assert_eq!(body["user"]["username"], "alice");
}
