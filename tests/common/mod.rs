//! Shared test harness: an app wired to a test configuration with the
//! gateway pointed at a caller-supplied base URL (wiremock in the flow
//! tests) and all simulated delays set to zero.

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use hmac::{Hmac, Mac};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use sha2::Sha256;
use tokio::sync::mpsc;
use tower::ServiceExt;

use storefront_api::config::{AppConfig, SmsEligibility};
use storefront_api::events::{process_events, EventSender};
use storefront_api::handlers::AppServices;
use storefront_api::{app_router, AppState};

pub const GATEWAY_SECRET: &str = "test_gateway_secret";

pub fn test_app_config(gateway_api_base: &str) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        log_level: "debug".to_string(),
        log_json: false,
        cors_allowed_origins: None,
        gateway_key_id: "rzp_test_key".to_string(),
        gateway_key_secret: GATEWAY_SECRET.to_string(),
        gateway_api_base: gateway_api_base.to_string(),
        currency: "INR".to_string(),
        admin_phone: "+91 0000000000".to_string(),
        free_shipping_threshold: dec!(1500),
        shipping_flat_fee: dec!(99),
        tax_rate: dec!(0.18),
        order_id_prefix: "ORD".to_string(),
        notification_log_capacity: 50,
        recent_window_secs: 5,
        toast_capacity: 5,
        toast_ttl_secs: 60,
        simulated_processing_delay_ms: 0,
        sms_send_delay_ms: 0,
        event_channel_capacity: 64,
        sms: SmsEligibility::default(),
        seed_demo_users: false,
    }
}

pub struct TestApp {
    router: Router,
}

impl TestApp {
    /// App with the gateway pointed at a port nothing listens on; fine
    /// for every test that never reaches the gateway.
    pub async fn new() -> Self {
        Self::with_gateway_base("http://127.0.0.1:9").await
    }

    pub async fn with_gateway_base(gateway_api_base: &str) -> Self {
        let config = test_app_config(gateway_api_base);

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);
        let services = AppServices::new(&config, EventSender::new(tx));
        tokio::spawn(process_events(rx, services.notifications.clone()));

        let router = app_router(AppState { config, services });
        Self { router }
    }

    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(path);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Signature the gateway would attach for these identifiers.
pub fn gateway_signature(order_id: &str, payment_id: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(GATEWAY_SECRET.as_bytes()).unwrap();
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Seeds a cart with one 1600-rupee jacket (free shipping tier: total
/// 1888) and returns the cart session key.
pub async fn seed_cart(app: &TestApp) -> &'static str {
    let session = "cart-session-1";
    let response = app
        .request(
            Method::POST,
            &format!("/api/carts/{}/items", session),
            Some(json!({
                "product": {
                    "id": 3,
                    "name": "Denim Jacket",
                    "price": 1600,
                    "image": "/images/jacket.jpg",
                    "sizes": ["M", "L"]
                },
                "size": "L",
                "quantity": 1
            })),
        )
        .await;
    assert_eq!(response.status(), 200);
    session
}

pub fn shipping_form() -> Value {
    json!({
        "email": "shopper@example.com",
        "first_name": "Asha",
        "last_name": "Rao",
        "address": "12 MG Road",
        "city": "Bengaluru",
        "state": "KA",
        "zip_code": "560001",
        "phone": "+91 9000000000"
    })
}

/// Drives a seeded cart to the payment step; returns the checkout id.
pub async fn checkout_at_payment(app: &TestApp) -> String {
    let cart_session = seed_cart(app).await;

    let response = app
        .request(
            Method::POST,
            "/api/checkout",
            Some(json!({ "cart_session": cart_session })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    let id = body["data"]["id"].as_str().expect("checkout id").to_string();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/checkout/{}/shipping", id),
            Some(shipping_form()),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["state"]["step"], "payment");

    id
}
