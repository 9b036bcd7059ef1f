use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration as ChronoDuration, Utc};
use invoicer_ai::{AiError, GenerativeModel, ModelResponse};
use invoicer_api::app::services::AppServices;
use invoicer_auth::JwtClaims;
use invoicer_core::UserId;
use invoicer_infra::{MailError, Mailer, OutgoingEmail};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";

/// Model stub that always answers with the same text and counts calls.
struct CannedModel {
    reply: String,
    calls: AtomicUsize,
}

impl CannedModel {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GenerativeModel for CannedModel {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<ModelResponse, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ModelResponse::Text(self.reply.clone()))
    }
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

struct TestServer {
    base_url: String,
    model: Arc<CannedModel>,
    mailer: Arc<RecordingMailer>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(model_reply: &str) -> Self {
        let model = CannedModel::new(model_reply);
        let mailer = Arc::new(RecordingMailer::default());
        let services = AppServices::in_memory(JWT_SECRET, model.clone(), mailer.clone());

        // Same router as prod, bound to an ephemeral port.
        let app = invoicer_api::app::build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            model,
            mailer,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut req = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.unwrap()).await
    }

    async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        read(self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap()).await
    }

    async fn register(&self, email: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "name": "Sam", "email": email, "password": "hunter22" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_invoice(&self, token: &str, number: &str, status: &str) -> Value {
        let (code, body) = self
            .post(
                "/api/invoices",
                Some(token),
                json!({
                    "invoiceNumber": number,
                    "dueDate": "2025-01-15",
                    "billFrom": { "businessName": "Studio Nine" },
                    "billTo": { "clientName": "Acme Corp", "email": "ap@acme.test" },
                    "items": [
                        { "name": "Design", "quantity": 2, "unitPrice": 500, "taxPercent": 10 }
                    ],
                    "status": status
                }),
            )
            .await;
        assert_eq!(code, StatusCode::CREATED, "{body}");
        body
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read(res: reqwest::Response) -> (StatusCode, Value) {
    let status = res.status();
    let body = res.json().await.unwrap_or(Value::Null);
    (status, body)
}

fn mint_jwt(jwt_secret: &str, sub: UserId) -> String {
    let claims = JwtClaims::new(sub, "someone@example.test", Utc::now(), ChronoDuration::minutes(10));

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_reports_environment_flags() {
    let srv = TestServer::spawn("").await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    let (status, body) = read(res).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "API is running...");
    assert_eq!(body["env"]["hasJWT"], true);
    assert_eq!(body["env"]["hasDatabase"], false);
}

#[tokio::test]
async fn unknown_route_is_404_with_path() {
    let srv = TestServer::spawn("").await;
    let res = srv.client.get(srv.url("/nope")).send().await.unwrap();
    let (status, body) = read(res).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["path"], "/nope");
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn("").await;

    let res = srv.client.get(srv.url("/api/invoices")).send().await.unwrap();
    let (status, body) = read(res).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, no token");

    let forged = mint_jwt("other-secret", UserId::new());
    let (status, body) = srv.get("/api/invoices", &forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, token failed");

    let (status, _) = srv.post("/api/ai/parse-text", None, json!({ "text": "x" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_login_and_profile() {
    let srv = TestServer::spawn("").await;
    let token = srv.register("Sam@Example.test").await;

    let (status, _) = srv
        .post(
            "/api/auth/register",
            None,
            json!({ "name": "Sam", "email": "sam@example.test", "password": "hunter22" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = srv
        .post("/api/auth/register", None, json!({ "email": "x@example.test" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = srv
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "sam@example.test", "password": "hunter22" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "sam@example.test");
    assert!(body["token"].as_str().is_some());

    let (status, _) = srv
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "sam@example.test", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .put(srv.url("/api/auth/me"))
        .bearer_auth(&token)
        .json(&json!({ "businessName": "Sam & Co" }))
        .send()
        .await
        .unwrap();
    let (status, body) = read(res).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["businessName"], "Sam & Co");
    assert_eq!(body["name"], "Sam");

    let (status, body) = srv.get("/api/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["businessName"], "Sam & Co");
}

#[tokio::test]
async fn invoice_crud_is_scoped_to_owner() {
    let srv = TestServer::spawn("").await;
    let alice = srv.register("alice@example.test").await;
    let bob = srv.register("bob@example.test").await;

    let created = srv.create_invoice(&alice, "INV-001", "Unpaid").await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["subtotal"], 1000.0);
    assert_eq!(created["taxTotal"], 100.0);
    assert_eq!(created["total"], 1100.0);
    assert_eq!(created["paymentTerms"], "Net 15");

    let (status, list) = srv.get("/api/invoices", &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, list) = srv.get("/api/invoices", &bob).await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().is_empty());

    let (status, _) = srv.get(&format!("/api/invoices/{id}"), &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = srv.get("/api/invoices/not-an-id", &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let res = srv
        .client
        .put(srv.url(&format!("/api/invoices/{id}")))
        .bearer_auth(&alice)
        .json(&json!({ "status": "Paid", "items": [{ "name": "Audit", "quantity": 1, "unitPrice": 40 }] }))
        .send()
        .await
        .unwrap();
    let (status, updated) = read(res).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Paid");
    assert_eq!(updated["total"], 40.0);
    assert_eq!(updated["invoiceNumber"], "INV-001");

    let res = srv
        .client
        .delete(srv.url(&format!("/api/invoices/{id}")))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .delete(srv.url(&format!("/api/invoices/{id}")))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    let (status, body) = read(res).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().is_some());

    let (status, _) = srv.get(&format!("/api/invoices/{id}"), &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invoice_without_number_is_rejected() {
    let srv = TestServer::spawn("").await;
    let token = srv.register("nonum@example.test").await;

    let (status, body) = srv
        .post("/api/invoices", Some(&token), json!({ "items": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn unreadable_bodies_are_json_bad_requests() {
    let srv = TestServer::spawn("").await;
    let token = srv.register("bodies@example.test").await;

    let res = srv.client.post(srv.url("/api/auth/login")).send().await.unwrap();
    let (status, body) = read(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let res = srv
        .client
        .post(srv.url("/api/invoices"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    let (status, body) = read(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
async fn unknown_email_and_wrong_password_fail_alike() {
    let srv = TestServer::spawn("").await;
    srv.register("known@example.test").await;

    let (status, wrong_password) = srv
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "known@example.test", "password": "not-the-one" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown) = srv
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "nobody@example.test", "password": "not-the-one" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, wrong_password);
    assert_eq!(unknown["message"], "Invalid email or password");
}

#[tokio::test]
async fn missing_invoice_names_the_record_kind() {
    let srv = TestServer::spawn("").await;
    let token = srv.register("kind@example.test").await;

    let (status, body) = srv.get("/api/invoices/not-an-id", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "Invoice not found");
}

#[tokio::test]
async fn null_due_date_clears_it() {
    let srv = TestServer::spawn("").await;
    let token = srv.register("due@example.test").await;
    let created = srv.create_invoice(&token, "INV-DUE", "Unpaid").await;
    let id = created["id"].as_str().unwrap().to_string();
    assert!(created["dueDate"].is_string());

    let put = |body: Value| {
        srv.client
            .put(srv.url(&format!("/api/invoices/{id}")))
            .bearer_auth(&token)
            .json(&body)
            .send()
    };

    let (status, kept) = read(put(json!({ "status": "Paid" })).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kept["dueDate"], created["dueDate"]);

    let (status, cleared) = read(put(json!({ "dueDate": null })).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["dueDate"].is_null());
}

#[tokio::test]
async fn parse_text_requires_text() {
    let srv = TestServer::spawn("{}").await;
    let token = mint_jwt(JWT_SECRET, UserId::new());

    let (status, _) = srv.post("/api/ai/parse-text", Some(&token), json!({ "text": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = srv.post("/api/ai/parse-text", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(srv.model.calls(), 0);
}

#[tokio::test]
async fn parse_text_uses_model_json() {
    let reply = "```json\n{\"clientName\":\"Globex\",\"email\":\"ap@globex.test\",\"address\":\"\",\"items\":[{\"name\":\"Support\",\"quantity\":3,\"unitPrice\":20}]}\n```";
    let srv = TestServer::spawn(reply).await;
    let token = mint_jwt(JWT_SECRET, UserId::new());

    let (status, body) = srv
        .post("/api/ai/parse-text", Some(&token), json!({ "text": "three hours of support for Globex" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clientName"], "Globex");
    assert_eq!(body["items"][0]["quantity"], 3.0);
    assert!(body.get("aiError").is_none());
}

#[tokio::test]
async fn malformed_model_output_falls_back_with_ai_error() {
    let srv = TestServer::spawn("Sure! Here is your invoice, hope it helps.").await;
    let token = mint_jwt(JWT_SECRET, UserId::new());

    let text = "Bill To: Acme Corp\nacme@example.com\n2 x Widget @ 10.00";
    let (status, body) = srv.post("/api/ai/parse-text", Some(&token), json!({ "text": text })).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["aiError"].as_str().is_some());
    assert_eq!(body["clientName"], "Acme Corp");
    assert_eq!(body["email"], "acme@example.com");
    assert_eq!(body["items"][0]["name"], "Widget");
    assert_eq!(body["items"][0]["quantity"], 2.0);
    assert_eq!(body["items"][0]["unitPrice"], 10.0);
    assert_eq!(srv.model.calls(), 1);
}

#[tokio::test]
async fn reminder_for_unknown_invoice_is_404_without_model_call() {
    let srv = TestServer::spawn("Subject: hi\n\nplease pay").await;
    let token = srv.register("rem@example.test").await;

    let (status, _) = srv
        .post(
            "/api/ai/generate-reminder",
            Some(&token),
            json!({ "invoiceId": invoicer_core::InvoiceId::new().to_string() }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = srv.post("/api/ai/generate-reminder", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(srv.model.calls(), 0);
}

#[tokio::test]
async fn short_model_reminder_uses_template() {
    let srv = TestServer::spawn("ok").await;
    let token = srv.register("tmpl@example.test").await;
    let invoice = srv.create_invoice(&token, "INV-7", "Unpaid").await;

    let (status, body) = srv
        .post(
            "/api/ai/generate-reminder",
            Some(&token),
            json!({ "invoiceId": invoice["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let text = body["reminderText"].as_str().unwrap();
    assert!(text.contains("INV-7"));
    assert!(text.contains("Acme Corp"));
    assert!(text.contains("1100.00"));
    assert!(text.contains("Studio Nine"));
    assert!(body["aiError"].as_str().is_some());
    assert_eq!(srv.model.calls(), 1);
}

#[tokio::test]
async fn dashboard_without_invoices_skips_model() {
    let srv = TestServer::spawn("{\"insights\":[\"x\"]}").await;
    let token = srv.register("dash@example.test").await;

    let (status, body) = srv.get("/api/ai/dashboard-summary", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["insights"], json!(["No invoice data available to generate insights."]));
    assert_eq!(srv.model.calls(), 0);
}

#[tokio::test]
async fn dashboard_degrades_when_model_output_is_unusable() {
    let srv = TestServer::spawn("not json at all").await;
    let token = srv.register("dash2@example.test").await;
    srv.create_invoice(&token, "INV-1", "Paid").await;
    srv.create_invoice(&token, "INV-2", "Unpaid").await;

    let (status, body) = srv.get("/api/ai/dashboard-summary", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["insights"].as_array().unwrap().is_empty());
    assert!(body["aiError"].as_str().is_some());
    assert_eq!(srv.model.calls(), 1);
}

#[tokio::test]
async fn send_reminder_validates_and_splits_subject() {
    let srv = TestServer::spawn("").await;
    let token = mint_jwt(JWT_SECRET, UserId::new());

    let (status, body) = srv
        .post(
            "/api/send-reminder",
            Some(&token),
            json!({ "clientEmail": "ap@acme.test", "reminderText": "pay" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields.");

    let (status, body) = srv
        .post(
            "/api/send-reminder",
            Some(&token),
            json!({
                "clientEmail": "ap@acme.test",
                "clientName": "Acme Corp",
                "reminderText": "Subject: Invoice INV-7 is due\n\nDear Acme Corp,\nplease pay.",
                "senderName": "Studio \"Nine\""
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Email sent successfully!");

    let sent = srv.mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ap@acme.test");
    assert_eq!(sent[0].subject, "Invoice INV-7 is due");
    assert!(sent[0].text.starts_with("Dear Acme Corp,"));
    assert_eq!(sent[0].from, "\"Studio Nine\" <no-reply@localhost>");
}
