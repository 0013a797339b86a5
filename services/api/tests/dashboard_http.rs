use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use api_lib::adapters::FileStore;
use api_lib::config::Config;
use api_lib::web::{router, AppState};
use referral_rewards_core::{RandomSource, SessionStore};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::tempdir;
use tokio::sync::oneshot;

/// Returns `low + offset`, cycling through the given offsets.
struct Scripted {
    offsets: Vec<u32>,
    next: AtomicU32,
}

impl RandomSource for Scripted {
    fn next_in_range(&self, low: u32, high: u32) -> u32 {
        let i = self.next.fetch_add(1, Ordering::SeqCst) as usize;
        (low + self.offsets[i % self.offsets.len()]).min(high - 1)
    }
}

struct TestServer {
    base: String,
    client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start(store_path: &Path, offsets: Vec<u32>, latency: Duration) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");

        let config = Arc::new(Config {
            bind_address: addr,
            log_level: tracing::Level::INFO,
            session_store_path: store_path.to_path_buf(),
            public_origin: "http://localhost:3000".to_string(),
            cors_origin: "http://localhost:8080".to_string(),
        });
        let sessions = SessionStore::new(
            Arc::new(FileStore::new(store_path)),
            Arc::new(Scripted {
                offsets,
                next: AtomicU32::new(0),
            }),
        );
        let state = Arc::new(AppState::with_latency(sessions, config, latency));

        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router(state))
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await;
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            shutdown: Some(tx),
        }
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .expect("send");
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await
            .expect("send");
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn signup_body(password: &str, confirm: &str) -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": "ada@example.org",
        "password": password,
        "confirmPassword": confirm
    })
}

fn unlocked_ids(dashboard: &Value) -> Vec<u64> {
    dashboard["tiers"]
        .as_array()
        .expect("tiers")
        .iter()
        .filter(|t| t["unlocked"] == json!(true))
        .map(|t| t["id"].as_u64().expect("id"))
        .collect()
}

#[tokio::test]
async fn anonymous_visitor_is_sent_to_login() {
    let dir = tempdir().unwrap();
    let server = TestServer::start(&dir.path().join("session.json"), vec![0], Duration::ZERO).await;

    let (status, body) = server.get("/dashboard").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["redirect"], "/login");
    assert_eq!(body["error"], "session_absent");

    let (status, body) = server.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["redirect"], Value::Null);

    let (status, _) = server.post("/donations", json!({ "amount": 50 })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_password_mismatch_creates_nothing() {
    let dir = tempdir().unwrap();
    let server = TestServer::start(&dir.path().join("session.json"), vec![0], Duration::ZERO).await;

    let (status, body) = server.post("/auth/signup", signup_body("a", "b")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "password_mismatch");

    let (status, _) = server.get("/dashboard").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_then_donations_unlock_tiers() {
    let dir = tempdir().unwrap();
    let server = TestServer::start(&dir.path().join("session.json"), vec![0], Duration::ZERO).await;

    let (status, dashboard) = server.post("/auth/signup", signup_body("pw", "pw")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dashboard["totalDonations"], json!(0.0));
    assert_eq!(dashboard["user"]["referralCode"], "adalovelace2025");
    assert_eq!(dashboard["user"]["initials"], "AL");
    assert_eq!(
        dashboard["referralLink"],
        "http://localhost:3000/join?ref=adalovelace2025"
    );
    assert_eq!(unlocked_ids(&dashboard), vec![1]);
    assert_eq!(dashboard["nextTier"]["requirement"], json!(1000.0));

    let (status, body) = server
        .post("/donations", json!({ "amount": 500 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["receipt"]["donorName"], "Anonymous");
    assert_eq!(body["receipt"]["paymentMethod"], "credit-card");
    assert_eq!(body["message"], "$500 donation from Anonymous has been added.");

    let (status, body) = server
        .post(
            "/donations",
            json!({ "amount": "600", "donorName": "Grace", "paymentMethod": "bank" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let dashboard = &body["dashboard"];
    assert_eq!(dashboard["totalDonations"], json!(1100.0));
    assert_eq!(unlocked_ids(dashboard), vec![1, 2]);
    assert_eq!(dashboard["nextTier"]["requirement"], json!(5000.0));
    assert_eq!(dashboard["progressPercent"], json!(22));
    assert_eq!(dashboard["remainingToNext"], json!(3900.0));
    assert_eq!(dashboard["activeReferrals"], json!(2));
    assert_eq!(body["receipt"]["donorName"], "Grace");
}

#[tokio::test]
async fn invalid_amounts_leave_total_unchanged() {
    let dir = tempdir().unwrap();
    let server = TestServer::start(&dir.path().join("session.json"), vec![0], Duration::ZERO).await;
    server.post("/auth/signup", signup_body("pw", "pw")).await;
    server.post("/donations", json!({ "amount": 500 })).await;

    for amount in [json!(0), json!(-10), json!("abc"), json!("")] {
        let (status, body) = server.post("/donations", json!({ "amount": amount })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{amount}");
        assert_eq!(body["error"], "invalid_amount");
    }

    let (_, dashboard) = server.get("/dashboard").await;
    assert_eq!(dashboard["totalDonations"], json!(500.0));
}

#[tokio::test]
async fn login_seeds_total_and_state_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");

    let code_after_regenerate = {
        let server = TestServer::start(&path, vec![45_000, 77], Duration::ZERO).await;
        let (status, dashboard) = server
            .post("/auth/login", json!({ "email": "grace@example.org", "password": "x" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dashboard["user"]["name"], "grace");
        assert_eq!(dashboard["totalDonations"], json!(55000.0));
        assert!(dashboard["nextTier"].is_null());
        assert_eq!(dashboard["progressFraction"], json!(1.0));
        assert_eq!(dashboard["unlockedCount"], json!(6));

        let (status, dashboard) = server.post("/referral/regenerate", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dashboard["user"]["referralCode"], "grace77");
        dashboard["user"]["referralCode"].clone()
    };

    let server = TestServer::start(&path, vec![0], Duration::ZERO).await;
    let (status, body) = server.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["redirect"], "/dashboard");

    let (status, referral) = server.get("/referral").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(referral["code"], code_after_regenerate);
    assert_eq!(referral["link"], "http://localhost:3000/join?ref=grace77");

    let (_, dashboard) = server.get("/dashboard").await;
    assert_eq!(dashboard["totalDonations"], json!(55000.0));
}

#[tokio::test]
async fn logout_is_idempotent() {
    let dir = tempdir().unwrap();
    let server = TestServer::start(&dir.path().join("session.json"), vec![0], Duration::ZERO).await;
    server.post("/auth/signup", signup_body("pw", "pw")).await;

    let (status, _) = server.post("/auth/logout", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.post("/auth/logout", json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server.get("/dashboard").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn join_page_degrades_gracefully() {
    let dir = tempdir().unwrap();
    let server = TestServer::start(&dir.path().join("session.json"), vec![0], Duration::ZERO).await;

    let (status, body) = server.get("/join?ref=ada2025").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["referralCode"], "ada2025");

    for path in ["/join", "/join?ref=", "/join?ref=%3Cscript%3E"] {
        let (status, body) = server.get(path).await;
        assert_eq!(status, StatusCode::OK, "{path}");
        assert!(body["referralCode"].is_null(), "{path}");
        assert_eq!(body["headline"], "You've Been Invited!");
    }
}

#[tokio::test]
async fn duplicate_donation_submission_is_rejected_while_pending() {
    let dir = tempdir().unwrap();
    let server = TestServer::start(
        &dir.path().join("session.json"),
        vec![0],
        Duration::from_millis(400),
    )
    .await;
    let (status, _) = server.post("/auth/signup", signup_body("pw", "pw")).await;
    assert_eq!(status, StatusCode::CREATED);

    let first = server.post("/donations", json!({ "amount": 100 }));
    let second = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        server.post("/donations", json!({ "amount": 100 })).await
    };
    let ((first_status, _), (second_status, second_body)) = tokio::join!(first, second);

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::CONFLICT);
    assert_eq!(second_body["error"], "in_progress");

    let (_, dashboard) = server.get("/dashboard").await;
    assert_eq!(dashboard["totalDonations"], json!(100.0));
}

#[tokio::test]
async fn corrupt_store_file_does_not_lock_the_user_out() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, b"not json").unwrap();
    let server = TestServer::start(&path, vec![0], Duration::ZERO).await;

    let (status, _) = server.post("/auth/logout", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.get("/dashboard").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    std::fs::write(&path, b"not json").unwrap();
    let (status, dashboard) = server
        .post("/auth/login", json!({ "email": "grace@example.org", "password": "x" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["user"]["referralCode"], "grace2025");

    let (status, _) = server.get("/dashboard").await;
    assert_eq!(status, StatusCode::OK);
}
