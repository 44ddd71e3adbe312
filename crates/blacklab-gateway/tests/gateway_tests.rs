// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router behaviour driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use blacklab_core::message::ids;
use blacklab_core::{OutboundIntent, PluginAdapter, UserId};
use blacklab_gateway::{AdminStores, AuthConfig, GatewayState, HealthState, WebhookConfig, router};
use blacklab_test_utils::TestHarness;
use blacklab_whatsapp::signature::{SIGNATURE_HEADER, sign};
use serde_json::{Value, json};
use tower::ServiceExt;

const VERIFY_TOKEN: &str = "blacklab-verify";
const APP_SECRET: &str = "app-secret";
const ADMIN_TOKEN: &str = "admin-token";

fn state(harness: &TestHarness, app_secret: Option<&str>) -> GatewayState {
    let channel: Arc<dyn PluginAdapter> = harness.channel.clone();
    GatewayState {
        dispatcher: Arc::new(harness.dispatcher(Duration::from_secs(60))),
        webhook: WebhookConfig {
            verify_token: Some(VERIFY_TOKEN.into()),
            app_secret: app_secret.map(String::from),
        },
        admin: AdminStores {
            catalog: harness.stores.catalog.clone(),
            orders: harness.stores.orders.clone(),
            users: harness.stores.users.clone(),
        },
        auth: AuthConfig {
            bearer_token: Some(ADMIN_TOKEN.into()),
        },
        health: HealthState {
            start_time: Instant::now(),
            adapters: vec![channel],
        },
    }
}

fn delivery(object: &str, text: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "object": object,
        "entry": [{
            "id": "102290129340398",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": { "phone_number_id": "106540352242922" },
                    "messages": [{
                        "from": "254712345678",
                        "id": "wamid.gateway.1",
                        "timestamp": "1760000001",
                        "type": "text",
                        "text": { "body": text }
                    }]
                }
            }]
        }]
    }))
    .unwrap()
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn post_webhook(body: Vec<u8>, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn handshake_echoes_challenge_for_matching_token() {
    let harness = TestHarness::new().await.unwrap();
    let request = Request::builder()
        .uri(format!(
            "/webhook?hub.mode=subscribe&hub.verify_token={VERIFY_TOKEN}&hub.challenge=1158201444"
        ))
        .body(Body::empty())
        .unwrap();

    let (status, body) = call(router(state(&harness, None)), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"1158201444");
}

#[tokio::test]
async fn handshake_with_wrong_token_is_forbidden() {
    let harness = TestHarness::new().await.unwrap();
    let request = Request::builder()
        .uri("/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=42")
        .body(Body::empty())
        .unwrap();

    let (status, _) = call(router(state(&harness, None)), request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unsigned_delivery_is_rejected_when_secret_is_set() {
    let harness = TestHarness::new().await.unwrap();
    let app = router(state(&harness, Some(APP_SECRET)));

    let body = delivery("whatsapp_business_account", "hi");
    let (status, _) = call(app.clone(), post_webhook(body.clone(), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = sign("other-secret", &body);
    let (status, _) = call(app, post_webhook(body, Some(forged))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(harness.channel.sent_count().await, 0);
}

#[tokio::test]
async fn signed_delivery_is_dispatched_to_the_engine() {
    let harness = TestHarness::new().await.unwrap();
    let state = state(&harness, Some(APP_SECRET));
    let dispatcher = state.dispatcher.clone();
    let app = router(state);

    let body = delivery("whatsapp_business_account", "hi");
    let signature = sign(APP_SECRET, &body);
    let (status, _) = call(app, post_webhook(body, Some(signature))).await;
    assert_eq!(status, StatusCode::OK);

    harness
        .channel
        .wait_for_sent(1, Duration::from_secs(5))
        .await
        .unwrap();
    dispatcher.shutdown().await;

    let sent = harness.channel.sent_to(&UserId::from("254712345678")).await;
    assert_eq!(sent, vec![OutboundIntent::MainMenu]);
}

#[tokio::test]
async fn malformed_delivery_is_bad_request() {
    let harness = TestHarness::new().await.unwrap();
    let (status, _) = call(
        router(state(&harness, None)),
        post_webhook(b"{not json".to_vec(), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_whatsapp_object_is_not_found() {
    let harness = TestHarness::new().await.unwrap();
    let body = delivery("page", "hi");
    let (status, _) = call(router(state(&harness, None)), post_webhook(body, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(harness.channel.sent_count().await, 0);
}

#[tokio::test]
async fn health_reports_adapters_without_auth() {
    let harness = TestHarness::new().await.unwrap();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = call(router(state(&harness, None)), request).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["active_users"], 0);
    assert_eq!(json["adapters"]["mock-channel"], "healthy");
}

#[tokio::test]
async fn admin_api_requires_bearer_token() {
    let harness = TestHarness::new().await.unwrap();
    let app = router(state(&harness, None));

    let anonymous = Request::builder()
        .uri("/v1/packages")
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(app.clone(), anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/v1/orders")
        .header("authorization", "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(app.clone(), wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let authorized = Request::builder()
        .uri("/v1/packages")
        .header("authorization", format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(app, authorized).await;
    assert_eq!(status, StatusCode::OK);
    let packages: Vec<Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(packages.len(), harness.stores.catalog.list_all().await.unwrap().len());
}

#[tokio::test]
async fn admin_lists_orders_and_users_after_a_purchase() {
    let harness = TestHarness::new().await.unwrap();
    let user = UserId::from("254712345678");
    harness.send_text(&user, "hi").await.unwrap();
    harness.tap_button(&user, ids::SEE_PACKAGES).await.unwrap();
    harness.tap_button(&user, "data").await.unwrap();
    harness.pick_row(&user, "pkg_1").await.unwrap();
    harness.send_text(&user, "0712345678").await.unwrap();
    harness.send_text(&user, "0712345678").await.unwrap();
    harness.tap_button(&user, ids::CONFIRM).await.unwrap();
    assert_eq!(harness.orders().await.unwrap().len(), 1);

    let app = router(state(&harness, None));
    let get = |uri: &str| {
        Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {ADMIN_TOKEN}"))
            .body(Body::empty())
            .unwrap()
    };

    let (status, body) = call(app.clone(), get("/v1/orders?limit=10")).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(orders.len(), 1);

    let (status, body) = call(app, get("/v1/users")).await;
    assert_eq!(status, StatusCode::OK);
    let users: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(users, vec!["254712345678".to_string()]);
}
