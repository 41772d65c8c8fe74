#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use storefront::{
    config::{AppConfig, MailConfig, StripeConfig},
    db::{create_orm_conn, run_migrations},
    entity::{cart_items, items, users},
    mail::{Mailer, OutgoingEmail},
    payments::{
        CheckoutSession, CheckoutSessionRequest, PaymentError, PaymentGateway,
        signature::signature_header,
    },
    routes::create_app,
    state::AppState,
    tokens::issue_session_token,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET_KEY: &str = "test-secret-key";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const CHECKOUT_URL: &str = "https://checkout.stripe.test/c/pay/cs_test_1";
pub const LOGIN_URL: &str = "http://localhost:3000/login";

/// Records every session request and answers with a fixed URL, or with the
/// configured rejection.
#[derive(Default)]
pub struct FakeGateway {
    pub requests: Mutex<Vec<CheckoutSessionRequest>>,
    pub reject_with: Mutex<Option<String>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(message) = self.reject_with.lock().unwrap().clone() {
            return Err(PaymentError::Rejected(message));
        }
        Ok(CheckoutSession {
            id: "cs_test_1".into(),
            url: CHECKOUT_URL.into(),
        })
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: Mutex<bool>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        if *self.fail.lock().unwrap() {
            anyhow::bail!("smtp unavailable");
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
    pub mailer: Arc<RecordingMailer>,
    pub upload_dir: PathBuf,
}

impl TestApp {
    pub fn router(&self) -> Router {
        create_app(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }
}

pub fn test_config(upload_dir: PathBuf) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 3000,
        secret_key: SECRET_KEY.into(),
        public_url: "http://localhost:3000".into(),
        login_redirect_url: LOGIN_URL.into(),
        upload_dir,
        stripe: StripeConfig {
            secret_key: "sk_test".into(),
            webhook_secret: WEBHOOK_SECRET.into(),
            api_base: "http://127.0.0.1:9".into(),
        },
        mail: MailConfig {
            server: "localhost".into(),
            port: 25,
            sender: "Storefront <no-reply@localhost>".into(),
            credentials: None,
        },
    }
}

/// Fresh in-memory database with the schema applied.
pub async fn spawn_app() -> TestApp {
    let upload_dir = std::env::temp_dir().join(format!("storefront-test-{}", Uuid::new_v4()));
    let config = test_config(upload_dir.clone());
    let orm = create_orm_conn(&config.database_url).await.unwrap();
    run_migrations(&orm).await.unwrap();

    let gateway = Arc::new(FakeGateway::default());
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState {
        orm,
        config: Arc::new(config),
        payments: gateway.clone(),
        mailer: mailer.clone(),
    };
    TestApp {
        state,
        gateway,
        mailer,
        upload_dir,
    }
}

pub async fn create_user(app: &TestApp, email: &str, admin: bool) -> users::Model {
    users::ActiveModel {
        id: NotSet,
        name: Set("Test User".into()),
        email: Set(email.into()),
        phone: Set("5550100".into()),
        password_hash: Set("not-a-real-hash".into()),
        admin: Set(admin),
        email_confirmed: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(&app.state.orm)
    .await
    .unwrap()
}

pub async fn create_item(app: &TestApp, name: &str, price: f64, price_id: &str) -> items::Model {
    items::ActiveModel {
        id: NotSet,
        name: Set(name.into()),
        price: Set(price),
        category: Set("misc".into()),
        image: Set("/static/uploads/x.png".into()),
        details: Set(format!("{name} details")),
        price_id: Set(price_id.into()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&app.state.orm)
    .await
    .unwrap()
}

pub async fn add_cart_row(app: &TestApp, user_id: i32, item_id: i32, quantity: i32) {
    cart_items::ActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        item_id: Set(item_id),
        quantity: Set(quantity),
        created_at: Set(Utc::now().into()),
    }
    .insert(&app.state.orm)
    .await
    .unwrap();
}

pub fn bearer(user_id: i32) -> String {
    format!("Bearer {}", issue_session_token(SECRET_KEY, user_id).unwrap())
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn completed_event(session_id: &str, client_reference_id: &str) -> Vec<u8> {
    serde_json::json!({
        "id": format!("evt_{session_id}"),
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "object": "checkout.session",
                "client_reference_id": client_reference_id,
                "payment_status": "paid"
            }
        }
    })
    .to_string()
    .into_bytes()
}

pub fn signed_webhook(payload: Vec<u8>) -> Request<Body> {
    let header = signature_header(WEBHOOK_SECRET, &payload, Utc::now().timestamp()).unwrap();
    webhook_request(payload, Some(&header))
}

pub fn webhook_request(payload: Vec<u8>, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/webhooks/stripe")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header("Stripe-Signature", signature);
    }
    builder.body(Body::from(payload)).unwrap()
}
