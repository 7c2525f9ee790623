//! Contract tests for the public API endpoints: payment verification,
//! auth, admin notifications, and the SMS channel.

mod common;

use axum::http::Method;
use common::{gateway_signature, response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn verify_payment_accepts_an_authentic_signature() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/verify-payment",
            Some(json!({
                "razorpay_order_id": "order_1",
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": gateway_signature("order_1", "pay_1"),
            })),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Payment verified successfully");
}

#[tokio::test]
async fn verify_payment_rejects_a_tampered_signature() {
    let app = TestApp::new().await;

    let mut signature = gateway_signature("order_1", "pay_1");
    let tail = signature.pop().unwrap();
    signature.push(if tail == 'f' { 'e' } else { 'f' });

    let response = app
        .request(
            Method::POST,
            "/api/verify-payment",
            Some(json!({
                "razorpay_order_id": "order_1",
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": signature,
            })),
        )
        .await;

    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn verify_payment_treats_missing_fields_as_failure() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/verify-payment",
            Some(json!({ "razorpay_order_id": "order_1" })),
        )
        .await;

    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn signup_then_login_round_trip() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/signup",
            Some(json!({
                "email": "new@example.com",
                "password": "password123",
                "firstName": "New",
                "lastName": "Shopper",
                "phone": "+91 9111111111"
            })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], "new@example.com");
    assert!(body["user"].get("password").is_none());

    let response = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "new@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["user"]["firstName"], "New");
}

#[tokio::test]
async fn duplicate_signup_is_a_400() {
    let app = TestApp::new().await;
    let payload = json!({
        "email": "dup@example.com",
        "password": "password123",
        "firstName": "Dup",
        "lastName": "Licate"
    });

    let response = app
        .request(Method::POST, "/api/auth/signup", Some(payload.clone()))
        .await;
    assert_eq!(response.status(), 201);

    let response = app
        .request(Method::POST, "/api/auth/signup", Some(payload))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn login_with_bad_credentials_is_a_401() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "ghost@example.com", "password": "nope" })),
        )
        .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn admin_ingestion_reports_sms_eligibility_per_kind() {
    let app = TestApp::new().await;

    for (kind, expected) in [
        ("cart_add", true),
        ("order_placed", true),
        ("user_signup", false),
        ("wishlist_add", false),
    ] {
        let response = app
            .request(
                Method::POST,
                "/api/admin/notifications",
                Some(json!({
                    "type": kind,
                    "message": format!("{} event", kind),
                    "userEmail": "shopper@example.com"
                })),
            )
            .await;
        assert_eq!(response.status(), 200);
        let body = response_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["smsSent"], expected, "kind {}", kind);
    }
}

#[tokio::test]
async fn dashboard_aggregates_revenue_from_order_values_only() {
    let app = TestApp::new().await;

    for value in [500, 1200, 300] {
        app.request(
            Method::POST,
            "/api/admin/notifications",
            Some(json!({
                "type": "order_placed",
                "message": format!("New order placed - ₹{}/-", value),
                "userEmail": "shopper@example.com",
                "orderValue": value
            })),
        )
        .await;
    }
    app.request(
        Method::POST,
        "/api/admin/notifications",
        Some(json!({ "type": "cart_add", "message": "Tee added to cart" })),
    )
    .await;

    let response = app
        .request(Method::GET, "/api/admin/notifications", None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["stats"]["total_orders"], 3);
    assert_eq!(body["stats"]["total_revenue"], "2000");
    assert_eq!(body["stats"]["cart_additions"], 1);
    assert_eq!(body["stats"]["total_signups"], 0);
}

#[tokio::test]
async fn notification_log_keeps_the_fifty_most_recent() {
    let app = TestApp::new().await;

    for i in 0..55 {
        app.request(
            Method::POST,
            "/api/admin/notifications",
            Some(json!({
                "type": "cart_add",
                "message": format!("item {} added to cart", i)
            })),
        )
        .await;
    }

    let response = app
        .request(Method::GET, "/api/admin/notifications", None)
        .await;
    let body = response_json(response).await;
    let notifications = body["notifications"].as_array().unwrap();

    assert_eq!(notifications.len(), 50);
    assert_eq!(notifications[0]["message"], "item 54 added to cart");
    assert_eq!(notifications[49]["message"], "item 5 added to cart");
}

#[tokio::test]
async fn clearing_the_log_resets_the_dashboard() {
    let app = TestApp::new().await;

    app.request(
        Method::POST,
        "/api/admin/notifications",
        Some(json!({ "type": "order_placed", "message": "order", "orderValue": 700 })),
    )
    .await;

    let response = app
        .request(Method::DELETE, "/api/admin/notifications", None)
        .await;
    assert_eq!(response.status(), 204);

    let response = app
        .request(Method::GET, "/api/admin/notifications", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["stats"]["total_orders"], 0);
    assert!(body["notifications"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn sms_send_simulates_delivery() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/sms/send",
            Some(json!({
                "to": "+91 9876543210",
                "message": "🎉 NEW ORDER RECEIVED!",
                "type": "order_placed"
            })),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert!(!body["messageId"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn cart_merges_lines_and_toasts_are_capped() {
    let app = TestApp::new().await;

    for i in 0..6 {
        let response = app
            .request(
                Method::POST,
                "/api/carts/toast-session/items",
                Some(json!({
                    "product": {
                        "id": i,
                        "name": format!("Product {}", i),
                        "price": 700,
                        "image": "/images/p.jpg",
                        "sizes": ["M"]
                    },
                    "size": "M"
                })),
            )
            .await;
        assert_eq!(response.status(), 200);
    }

    let response = app.request(Method::GET, "/api/toasts", None).await;
    let body = response_json(response).await;
    let toasts = body["data"].as_array().unwrap();
    assert_eq!(toasts.len(), 5);
    assert_eq!(toasts[0]["message"], "Product 5 added to cart!");
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None).await;
    assert_eq!(response.status(), 200);

    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert!(body["paths"].get("/api/verify-payment").is_some());
}
