use std::sync::Arc;
use std::time::Duration;

use medrec_auth::UserStorage;
use medrec_db_memory::InMemoryStorage;
use medrec_notifications::{Mailer, MemoryTransport, OutgoingMail};
use medrec_server::config::StorageBackend;
use medrec_server::{AppConfig, AppState, build_app};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

struct TestApp {
    base: String,
    storage: Arc<InMemoryStorage>,
    mail: Arc<MemoryTransport>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            // Pooled client connections can hold graceful shutdown open.
            let abort = handle.abort_handle();
            if tokio::time::timeout(Duration::from_secs(2), handle).await.is_err() {
                abort.abort();
            }
        }
    }

    async fn verification_code(&self, email: &str) -> String {
        self.storage
            .find_user_by_email(email)
            .await
            .unwrap()
            .expect("user exists")
            .verification_code
            .expect("code pending")
    }

    async fn wait_for_mail(&self, subject: &str, to: &str) -> OutgoingMail {
        for _ in 0..200 {
            let sent = self.mail.sent().await;
            if let Some(mail) = sent.into_iter().find(|m| m.subject == subject && m.to == to) {
                return mail;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no '{subject}' mail for {to}");
    }

    /// Registers, verifies and returns a logged-in client.
    async fn verified_client(&self, email: &str) -> Client {
        let client = client();
        let resp = client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "name": "Dr. Test", "email": email, "password": "s3cret-pass" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let code = self.verification_code(email).await;
        let resp = client
            .post(self.url("/api/auth/verify-email"))
            .json(&json!({ "code": code }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        client
    }
}

fn client() -> Client {
    Client::builder().cookie_store(true).build().unwrap()
}

fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = "integration-test-secret-integration".into();
    cfg.auth.client_url = "http://client.test".into();
    cfg.storage.backend = StorageBackend::Memory;
    cfg
}

async fn start_server() -> TestApp {
    let cfg = test_config();
    let storage = medrec_db_memory::create_storage();
    let mail = Arc::new(MemoryTransport::new());
    let state = AppState::new(
        storage.clone(),
        Mailer::new(mail.clone(), "DR-VIPS"),
        &cfg.auth,
        false,
    );
    let app = build_app(state, &cfg);

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    TestApp {
        base: format!("http://{addr}"),
        storage,
        mail,
        shutdown: Some(tx),
        handle: Some(handle),
    }
}

fn patient_body(n: u32, age: i64, bloodtype: &str) -> Value {
    json!({
        "fullname": format!("Patient {n}"),
        "diseases": ["hypertension"],
        "email": format!("patient{n}@example.com"),
        "phone": format!("555-01{n:02}"),
        "age": age,
        "bloodtype": bloodtype,
    })
}

async fn create_patient(app: &TestApp, client: &Client, body: Value) -> Value {
    let resp = client
        .post(app.url("/api/patients"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.unwrap()
}

async fn error_of(resp: reqwest::Response) -> String {
    let body: Value = resp.json().await.unwrap();
    body["error"].as_str().expect("error field").to_string()
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = start_server().await;
    let client = client();

    let resp = client.get(app.url("/healthz")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let resp = client
        .get(app.url("/readyz"))
        .header("x-request-id", "req-123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-request-id"], "req-123");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ready");

    let resp = client.get(app.url("/api/nothing")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.headers().contains_key("x-request-id"));
    assert_eq!(error_of(resp).await, "Not found");

    app.stop().await;
}

#[tokio::test]
async fn cors_preflight_lists_routed_methods() {
    let app = start_server().await;
    let resp = client()
        .request(reqwest::Method::OPTIONS, app.url("/api/patients"))
        .header("origin", "http://client.test")
        .header("access-control-request-method", "PUT")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers["access-control-allow-origin"], "http://client.test");
    assert_eq!(headers["access-control-allow-credentials"], "true");
    let methods = headers["access-control-allow-methods"].to_str().unwrap();
    for method in ["GET", "POST", "PUT", "DELETE"] {
        assert!(methods.contains(method), "{methods}");
    }
    assert!(!methods.contains("PATCH"), "{methods}");

    app.stop().await;
}

#[tokio::test]
async fn register_login_and_patient_lifecycle() {
    let app = start_server().await;
    let alice = client();

    // Register: 201, unverified, logged in straight away
    let resp = alice
        .post(app.url("/api/auth/register"))
        .json(&json!({ "name": "Alice", "email": "Alice@Example.com", "password": "correct-horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let set_cookie = resp.headers()["set-cookie"].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("HttpOnly"));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["isVerified"], false);
    assert!(body["user"].get("passwordHash").is_none());
    assert_eq!(body["message"], "Registered. Verification code sent to your email.");
    app.wait_for_mail("Verify your email", "alice@example.com").await;

    let resp = client()
        .post(app.url("/api/auth/register"))
        .json(&json!({ "name": "Mallory", "email": "alice@example.com", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(error_of(resp).await, "User already exists");

    // Login: wrong password, then right one
    let other = client();
    let resp = other
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": "alice@example.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_of(resp).await, "Invalid credentials");

    let resp = other
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": "nobody@example.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_of(resp).await, "Invalid credentials");

    let resp = other
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": "alice@example.com", "password": "correct-horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = other.get(app.url("/api/auth/me")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["name"], "Alice");

    // Unverified users cannot touch records
    let resp = alice
        .post(app.url("/api/patients"))
        .json(&patient_body(1, 45, "O+"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = alice
        .post(app.url("/api/auth/verify-email"))
        .json(&json!({ "code": "not-it" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "Invalid code");

    let code = app.verification_code("alice@example.com").await;
    let resp = alice
        .post(app.url("/api/auth/verify-email"))
        .json(&json!({ "code": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "success": true, "message": "Email verified" }));
    app.wait_for_mail("Welcome to DR-VIPS", "alice@example.com").await;

    // Create: age 45 is an adult
    let patient = create_patient(&app, &alice, patient_body(1, 45, "o+")).await;
    assert_eq!(patient["ageCategory"], "18-59");
    assert_eq!(patient["bloodtype"], "O+");
    let id = patient["id"].as_str().unwrap().to_string();

    let resp = alice
        .get(app.url(&format!("/api/patients/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Value = resp.json().await.unwrap();
    assert_eq!(fetched, patient);

    // Partial update: the band follows the age
    let resp = alice
        .put(app.url(&format!("/api/patients/{id}")))
        .json(&json!({ "age": 8 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["age"], 8);
    assert_eq!(updated["ageCategory"], "0-12");
    assert_eq!(updated["fullname"], "Patient 1");

    let resp = alice.get(app.url("/api/patients")).send().await.unwrap();
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["page"], 1);
    assert_eq!(page["pages"], 1);

    // Logout drops the session
    let resp = alice.post(app.url("/api/auth/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = alice.get(app.url("/api/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = alice.get(app.url("/api/patients")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    app.stop().await;
}

#[tokio::test]
async fn records_are_private_to_their_owner() {
    let app = start_server().await;
    let alice = app.verified_client("alice@example.com").await;
    let bob = app.verified_client("bob@example.com").await;

    let patient = create_patient(&app, &alice, patient_body(1, 30, "A-")).await;
    let id = patient["id"].as_str().unwrap().to_string();
    let path = format!("/api/patients/{id}");

    let resp = bob.get(app.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = bob
        .put(app.url(&path))
        .json(&json!({ "fullname": "Stolen" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = bob.delete(app.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = bob
        .post(app.url("/api/diagnoses"))
        .json(&json!({ "title": "Flu", "medicine": ["rest"], "patient": id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = bob
        .get(app.url(&format!("/api/diagnoses/patient/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = bob.get(app.url("/api/patients")).send().await.unwrap();
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["total"], 0);

    // Uniqueness is per owner
    create_patient(&app, &bob, patient_body(1, 30, "A-")).await;
    let resp = alice
        .post(app.url("/api/patients"))
        .json(&patient_body(1, 50, "B+"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(error_of(resp).await, "Patient with this email already exists");

    // Alice's record is untouched
    let resp = alice.get(app.url(&path)).send().await.unwrap();
    let fetched: Value = resp.json().await.unwrap();
    assert_eq!(fetched["fullname"], "Patient 1");

    app.stop().await;
}

#[tokio::test]
async fn diagnoses_search_and_cascade() {
    let app = start_server().await;
    let alice = app.verified_client("alice@example.com").await;
    let patient = create_patient(&app, &alice, patient_body(1, 40, "AB+")).await;
    let patient_id = patient["id"].as_str().unwrap().to_string();

    let mut ids = Vec::new();
    for (title, description) in [
        ("Asthma", "seasonal"),
        ("Checkup", "mild asthma noted"),
        ("Fracture", "left wrist"),
    ] {
        let resp = alice
            .post(app.url("/api/diagnoses"))
            .json(&json!({
                "title": title,
                "description": description,
                "medicine": ["ibuprofen", " "],
                "patient": patient_id,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["patient"], patient_id.as_str());
        assert_eq!(body["medicine"], json!(["ibuprofen"]));
        ids.push(body["id"].as_str().unwrap().to_string());
    }

    let list_url = app.url(&format!("/api/diagnoses/patient/{patient_id}"));
    let resp = alice.get(&list_url).send().await.unwrap();
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["total"], 3);

    let resp = alice
        .get(&list_url)
        .query(&[("q", "asthma")])
        .send()
        .await
        .unwrap();
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["total"], 2);
    assert_eq!(page["items"][0]["title"], "Asthma");
    assert_eq!(page["items"][1]["title"], "Checkup");

    // A term with no words is still a search, and matches nothing.
    let resp = alice
        .get(format!("{list_url}?q=%3F%3F%3F"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["total"], 0);
    assert_eq!(page["pages"], 0);
    assert_eq!(page["items"], json!([]));

    let resp = alice
        .get(&list_url)
        .query(&[("page", "2"), ("limit", "2")])
        .send()
        .await
        .unwrap();
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["pages"], 2);

    // Update keeps the patient link
    let resp = alice
        .put(app.url(&format!("/api/diagnoses/{}", ids[2])))
        .json(&json!({ "description": "right wrist", "patient": "ignored" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["description"], "right wrist");
    assert_eq!(body["title"], "Fracture");

    let resp = alice
        .delete(app.url(&format!("/api/diagnoses/{}", ids[2])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = alice
        .delete(app.url(&format!("/api/diagnoses/{}", ids[2])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Deleting the patient takes the remaining diagnoses with it
    let resp = alice
        .delete(app.url(&format!("/api/patients/{patient_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(resp.bytes().await.unwrap().is_empty());
    assert_eq!(app.storage.diagnosis_count().await, 0);

    for id in &ids[..2] {
        let resp = alice
            .get(app.url(&format!("/api/diagnoses/{id}")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
    let resp = alice
        .delete(app.url(&format!("/api/patients/{patient_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    app.stop().await;
}

#[tokio::test]
async fn patient_list_filters() {
    let app = start_server().await;
    let alice = app.verified_client("alice@example.com").await;

    create_patient(&app, &alice, patient_body(1, 7, "A+")).await;
    create_patient(&app, &alice, patient_body(2, 65, "O-")).await;
    create_patient(&app, &alice, patient_body(3, 72, "AB+")).await;

    // A raw '+' arrives as a space and still means positive
    let resp = alice
        .get(app.url("/api/patients?bloodtype=AB+&bloodtype=O-"))
        .send()
        .await
        .unwrap();
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["total"], 2);

    let resp = alice
        .get(app.url("/api/patients"))
        .query(&[("bloodtype", "A+,O-"), ("category", "60+")])
        .send()
        .await
        .unwrap();
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["fullname"], "Patient 2");

    let resp = alice
        .get(app.url("/api/patients"))
        .query(&[("q", "PATIENT3@"), ("category", "All"), ("bloodtype", "All")])
        .send()
        .await
        .unwrap();
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["age"], 72);

    // Newest first
    let resp = alice
        .get(app.url("/api/patients"))
        .query(&[("limit", "2")])
        .send()
        .await
        .unwrap();
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["pages"], 2);
    assert_eq!(page["items"][0]["fullname"], "Patient 3");

    let resp = alice
        .get(app.url("/api/patients"))
        .query(&[("bloodtype", "Z+")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    app.stop().await;
}

#[tokio::test]
async fn invalid_input_is_rejected() {
    let app = start_server().await;
    let alice = app.verified_client("alice@example.com").await;

    let resp = alice
        .post(app.url("/api/patients"))
        .json(&json!({ "diseases": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "fullname is required");

    let mut body = patient_body(1, 30, "O+");
    body["ageCategory"] = json!("60+");
    let resp = alice
        .post(app.url("/api/patients"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    for (field, value) in [
        ("age", json!(121)),
        ("bloodtype", json!("C+")),
        ("bloodtype", json!("O ")),
        ("diseases", json!([" "])),
    ] {
        let mut body = patient_body(1, 30, "O+");
        body[field] = value;
        let resp = alice
            .post(app.url("/api/patients"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{field}");
    }

    let resp = alice
        .post(app.url("/api/patients"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = alice
        .get(app.url("/api/patients/64b7f0c2e1a1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let patient = create_patient(&app, &alice, patient_body(1, 30, "O+")).await;
    let resp = alice
        .post(app.url("/api/diagnoses"))
        .json(&json!({ "title": "Flu", "medicine": [], "patient": patient["id"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = alice
        .post(app.url("/api/diagnoses"))
        .json(&json!({ "title": "Flu", "medicine": ["rest"], "patient": "abc" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // The gate runs before validation
    let resp = client()
        .post(app.url("/api/patients"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    app.stop().await;
}

#[tokio::test]
async fn resend_code_replaces_pending_code() {
    let app = start_server().await;
    let alice = client();
    alice
        .post(app.url("/api/auth/register"))
        .json(&json!({ "name": "Alice", "email": "alice@example.com", "password": "pw-123456" }))
        .send()
        .await
        .unwrap();

    let resp = alice
        .post(app.url("/api/auth/resend-code"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Verification code resent");

    let code = app.verification_code("alice@example.com").await;
    let resp = alice
        .post(app.url("/api/auth/verify-email"))
        .json(&json!({ "code": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = alice
        .post(app.url("/api/auth/resend-code"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "Already verified");

    let resp = client()
        .post(app.url("/api/auth/resend-code"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    app.stop().await;
}

#[tokio::test]
async fn password_reset_flow() {
    let app = start_server().await;
    let alice = client();
    alice
        .post(app.url("/api/auth/register"))
        .json(&json!({ "name": "Alice", "email": "alice@example.com", "password": "old-password" }))
        .send()
        .await
        .unwrap();

    // Same answer for unknown and known emails
    for email in ["nobody@example.com", "ALICE@example.com"] {
        let resp = client()
            .post(app.url("/api/auth/forgot-password"))
            .json(&json!({ "email": email }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body,
            json!({ "success": true, "message": "If the email exists, we sent a link" })
        );
    }

    let mail = app.wait_for_mail("Reset your password", "alice@example.com").await;
    let marker = "http://client.test/reset-password/";
    let start = mail.html_body.find(marker).expect("reset link") + marker.len();
    let token: String = mail.html_body[start..]
        .chars()
        .take_while(|c| *c != '"')
        .collect();
    assert!(!token.is_empty());

    // Only the digest is stored
    let stored = app
        .storage
        .find_user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.reset_token_hash.as_deref(), Some(token.as_str()));

    let resp = client()
        .post(app.url("/api/auth/reset-password/not-a-token"))
        .json(&json!({ "password": "new-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "Invalid or expired reset link");

    let reset_url = app.url(&format!("/api/auth/reset-password/{token}"));
    let resp = client()
        .post(&reset_url)
        .json(&json!({ "password": "new-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Password updated");
    app.wait_for_mail("Password Reset Successful", "alice@example.com").await;

    let resp = client()
        .post(&reset_url)
        .json(&json!({ "password": "third-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let login = |password: &'static str| {
        let url = app.url("/api/auth/login");
        async move {
            client()
                .post(url)
                .json(&json!({ "email": "alice@example.com", "password": password }))
                .send()
                .await
                .unwrap()
                .status()
        }
    };
    assert_eq!(login("old-password").await, StatusCode::UNAUTHORIZED);
    assert_eq!(login("new-password").await, StatusCode::OK);

    app.stop().await;
}
