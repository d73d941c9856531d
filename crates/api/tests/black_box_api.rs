use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use serde_json::json;

use flashweb_api::app::services::AppServices;
use flashweb_auth::TokenOptions;
use flashweb_infra::{AdminSeed, InMemoryUserStore, seed_admin};

const ADMIN: (&str, &str) = ("admin", "admin-pass");
const ALICE: (&str, &str) = ("alice", "alice-pass");

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod over an in-memory store, with one admin and one plain user.
    async fn spawn() -> Self {
        let users = Arc::new(InMemoryUserStore::new());
        seed_admin(
            &users,
            &AdminSeed {
                username: ADMIN.0.into(),
                password: ADMIN.1.into(),
            },
        )
        .await
        .expect("failed to seed admin");

        let services = AppServices::new(TokenOptions::default().with_generated_defaults(), users);
        services
            .register(ALICE.0, ALICE.1)
            .await
            .expect("failed to register user");

        let app = flashweb_api::app::build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Cookie-keeping client that reports redirects instead of following them.
fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

fn bare_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

fn location(res: &reqwest::Response) -> &str {
    res.headers().get(LOCATION).unwrap().to_str().unwrap()
}

async fn sign_in(client: &reqwest::Client, srv: &TestServer, (username, password): (&str, &str)) {
    let res = client
        .post(srv.url("/login"))
        .form(&[("username", username), ("password", password)])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
}

async fn api_token(srv: &TestServer, (username, password): (&str, &str)) -> String {
    let res = bare_client()
        .post(srv.url("/api/token"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["token_type"], "Bearer");
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = bare_client().get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_visitor_is_sent_to_login() {
    let srv = TestServer::spawn().await;
    let client = browser();

    for path in ["/", "/user", "/admin", "/admin/users"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&res), "/login", "{path}");
    }

    let res = client.get(srv.url("/login")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().contains("<form method=\"post\" action=\"/login\">"));
}

#[tokio::test]
async fn admin_reaches_every_page() {
    let srv = TestServer::spawn().await;
    let client = browser();
    sign_in(&client, &srv, ADMIN).await;

    for path in ["/", "/user", "/admin"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{path}");
        assert!(res.text().await.unwrap().contains("Signed in as <strong>admin</strong>"));
    }

    let res = client.get(srv.url("/admin/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let users: serde_json::Value = res.json().await.unwrap();
    let names: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["admin", "alice"]);
    assert!(users[0].get("password_hash").is_none());
}

#[tokio::test]
async fn role_mismatch_signs_the_user_out() {
    let srv = TestServer::spawn().await;
    let client = browser();
    sign_in(&client, &srv, ALICE).await;

    let res = client.get(srv.url("/user")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/admin")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");

    // The rejected token was dropped from both the session and the cookie.
    let res = client.get(srv.url("/user")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn wrong_password_stays_on_login() {
    let srv = TestServer::spawn().await;
    let client = browser();

    let res = client
        .post(srv.url("/login"))
        .form(&[("username", ALICE.0), ("password", "not-her-password")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.text().await.unwrap().contains("Invalid username or password"));

    let res = client.get(srv.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn logout_forgets_the_token() {
    let srv = TestServer::spawn().await;
    let client = browser();
    sign_in(&client, &srv, ALICE).await;

    let res = client.post(srv.url("/logout")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");

    let res = client.get(srv.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    // Repeating it is harmless.
    let res = client.post(srv.url("/logout")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn token_cookie_alone_restores_access() {
    let srv = TestServer::spawn().await;
    let token = api_token(&srv, ADMIN).await;

    // No `sid` cookie: a brand new session fills its cache from the cookie.
    let res = bare_client()
        .get(srv.url("/admin"))
        .header(COOKIE, format!("token={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn garbage_token_cookie_is_removed() {
    let srv = TestServer::spawn().await;

    let res = bare_client()
        .get(srv.url("/"))
        .header(COOKIE, "token=not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");

    let removal = res
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("token="))
        .expect("token cookie should be cleared");
    assert!(removal.contains("Max-Age=0"));
}

#[tokio::test]
async fn register_creates_plain_users() {
    let srv = TestServer::spawn().await;
    let client = browser();

    let res = client
        .post(srv.url("/register"))
        .form(&[("username", "bob"), ("password", "bob-pass")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["username"], "bob");
    assert_eq!(body["role"], "User");

    let res = client
        .post(srv.url("/register"))
        .form(&[("username", "bob"), ("password", "other-pass")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(srv.url("/register"))
        .form(&[("username", "no spaces"), ("password", "bob-pass")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    sign_in(&client, &srv, ("bob", "bob-pass")).await;
    let res = client.get(srv.url("/user")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn bearer_api_uses_token_claims() {
    let srv = TestServer::spawn().await;

    let res = bare_client().get(srv.url("/api/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = bare_client()
        .post(srv.url("/api/token"))
        .json(&json!({ "username": ALICE.0, "password": "wrong-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let token = api_token(&srv, ALICE).await;
    let res = bare_client()
        .get(srv.url("/api/whoami"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["roles"], json!(["User"]));
}
