use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use villa_whatsapp::config::AppConfig;
use villa_whatsapp::models::TemplatePayload;
use villa_whatsapp::routes;
use villa_whatsapp::services::messaging::{MessagingProvider, ProviderError};
use villa_whatsapp::state::AppState;

// ── Mock Provider ──

/// Records every payload; numbers listed in `reject` get a 400 back.
struct MockProvider {
    sent: Arc<Mutex<Vec<serde_json::Value>>>,
    reject: Vec<String>,
}

#[async_trait]
impl MessagingProvider for MockProvider {
    async fn send_template(
        &self,
        payload: &TemplatePayload,
    ) -> Result<serde_json::Value, ProviderError> {
        self.sent
            .lock()
            .unwrap()
            .push(serde_json::to_value(payload).unwrap());

        if self.reject.iter().any(|p| p == payload.to.as_str()) {
            return Err(ProviderError::Rejected {
                status: 400,
                body: serde_json::json!({
                    "error": {"message": "Recipient phone number not in allowed list", "code": 131030}
                }),
            });
        }

        Ok(serde_json::json!({
            "messaging_product": "whatsapp",
            "contacts": [{"input": payload.to.as_str(), "wa_id": payload.to.as_str()}],
            "messages": [{"id": format!("wamid.{}", payload.to)}]
        }))
    }
}

// ── Helpers ──

fn simulated_app() -> Router {
    routes::app(Arc::new(AppState {
        config: AppConfig::default(),
        messaging: None,
    }))
}

fn live_app(reject: &[&str]) -> (Router, Arc<Mutex<Vec<serde_json::Value>>>) {
    let sent = Arc::new(Mutex::new(vec![]));
    let provider = MockProvider {
        sent: Arc::clone(&sent),
        reject: reject.iter().map(|s| s.to_string()).collect(),
    };
    let state = Arc::new(AppState {
        config: AppConfig::default(),
        messaging: Some(Box::new(provider)),
    });
    (routes::app(state), sent)
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/whatsapp")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let content_type = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    assert_eq!(content_type, "application/json");

    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

// ── Envelope Tests ──

#[tokio::test]
async fn test_non_post_rejected() {
    for method in ["GET", "PUT", "DELETE", "PATCH", "OPTIONS"] {
        let req = Request::builder()
            .method(method)
            .uri("/api/whatsapp")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(simulated_app(), req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "method {method}");
        assert_eq!(json["error"], "Method not allowed");
    }
}

#[tokio::test]
async fn test_preflight_answered_when_origin_configured() {
    let state = Arc::new(AppState {
        config: AppConfig {
            cors_allow_origin: Some("https://156euphoriavilla.co.za".to_string()),
            ..AppConfig::default()
        },
        messaging: None,
    });
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/whatsapp")
        .header("Origin", "https://156euphoriavilla.co.za")
        .header("Access-Control-Request-Method", "POST")
        .body(Body::empty())
        .unwrap();

    let res = routes::app(state).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("https://156euphoriavilla.co.za")
    );
}

#[tokio::test]
async fn test_oversized_body_rejected_as_json() {
    let filler = "x".repeat(3 * 1024 * 1024);
    let body = format!(r#"{{"action":"opt_in","phone":"0798393537","name":"{filler}","email":"a@b.com"}}"#);
    let (status, json) = send(simulated_app(), post_json(&body)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json["error"].as_str().unwrap().contains("length limit"));
}

#[tokio::test]
async fn test_missing_action() {
    let (status, json) = send(simulated_app(), post_json(r#"{"phone":"123"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing required field: action");
}

#[tokio::test]
async fn test_malformed_body_counts_as_missing_action() {
    let (status, json) = send(simulated_app(), post_json("not json at all")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing required field: action");
}

#[tokio::test]
async fn test_unknown_action() {
    let (status, json) = send(simulated_app(), post_json(r#"{"action":"send_sms"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Unknown action: send_sms");
}

#[tokio::test]
async fn test_unknown_path_is_json_404() {
    let req = Request::builder()
        .uri("/api/other")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(simulated_app(), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Not found");
}

#[tokio::test]
async fn test_health_reports_mode() {
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, json) = send(simulated_app(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["mode"], "simulate");

    let (app, _) = live_app(&[]);
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (_, json) = send(app, req).await;
    assert_eq!(json["mode"], "live");
}

// ── opt_in ──

#[tokio::test]
async fn test_opt_in_normalizes_phone() {
    let (status, json) = send(
        simulated_app(),
        post_json(r#"{"action":"opt_in","phone":"+27 79 839 3537","name":"A","email":"a@b.com"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Opt-in successfully recorded");
    assert_eq!(json["data"]["phone"], "27798393537");
    assert_eq!(json["data"]["name"], "A");
    assert_eq!(json["data"]["email"], "a@b.com");
    assert_eq!(json["data"]["source"], "website");
    assert!(json["data"]["timestamp"].is_string());
}

#[tokio::test]
async fn test_opt_in_keeps_source() {
    let (_, json) = send(
        simulated_app(),
        post_json(r#"{"action":"opt_in","phone":"0798393537","name":"A","email":"a@b.com","source":"contact_form"}"#),
    )
    .await;
    assert_eq!(json["data"]["source"], "contact_form");
}

#[tokio::test]
async fn test_opt_in_missing_email() {
    let (status, json) = send(
        simulated_app(),
        post_json(r#"{"action":"opt_in","phone":"+27 79 839 3537","name":"A"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing required fields for opt-in");
}

#[tokio::test]
async fn test_opt_in_repeated_is_accepted_twice() {
    let body = r#"{"action":"opt_in","phone":"0798393537","name":"A","email":"a@b.com"}"#;
    let app = simulated_app();

    let (first, _) = send(app.clone(), post_json(body)).await;
    let (second, json) = send(app, post_json(body)).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(json["success"], true);
}

// ── send_template ──

#[tokio::test]
async fn test_send_template_with_parameters() {
    let (status, json) = send(
        simulated_app(),
        post_json(r#"{"action":"send_template","phone":"0798393537","template":"welcome_message","language":"en","parameters":["X"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Template message would be sent (simulation)");

    let payload = &json["payload"];
    assert_eq!(payload["messaging_product"], "whatsapp");
    assert_eq!(payload["to"], "0798393537");
    assert_eq!(payload["type"], "template");
    assert_eq!(payload["template"]["name"], "welcome_message");
    assert_eq!(payload["template"]["language"]["code"], "en");
    assert_eq!(payload["template"]["components"][0]["type"], "body");
    assert_eq!(
        payload["template"]["components"][0]["parameters"][0],
        serde_json::json!({"type": "text", "text": "X"})
    );
}

#[tokio::test]
async fn test_send_template_without_parameters() {
    for body in [
        r#"{"action":"send_template","phone":"0798393537","template":"welcome_message","language":"en"}"#,
        r#"{"action":"send_template","phone":"0798393537","template":"welcome_message","language":"en","parameters":[]}"#,
    ] {
        let (status, json) = send(simulated_app(), post_json(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["payload"]["template"].get("components").is_none());
    }
}

#[tokio::test]
async fn test_send_template_missing_language() {
    let (status, json) = send(
        simulated_app(),
        post_json(r#"{"action":"send_template","phone":"0798393537","template":"welcome_message"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing required fields for template message");
}

#[tokio::test]
async fn test_send_template_live_success() {
    let (app, sent) = live_app(&[]);
    let (status, json) = send(
        app,
        post_json(r#"{"action":"send_template","phone":"+27 79 839 3537","template":"booking_confirmation","language":"en","parameters":["Ann"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["response"]["messages"][0]["id"], "wamid.27798393537");

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["to"], "27798393537");
    assert_eq!(sent[0]["template"]["components"][0]["parameters"][0]["text"], "Ann");
}

#[tokio::test]
async fn test_send_template_live_rejection_passes_through() {
    let (app, _) = live_app(&["27798393537"]);
    let (status, json) = send(
        app,
        post_json(r#"{"action":"send_template","phone":"27798393537","template":"welcome_message","language":"en"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "API request failed");
    assert_eq!(json["response"]["error"]["code"], 131030);
}

// ── send_promotional ──

#[tokio::test]
async fn test_promotional_queued_in_order() {
    let (status, json) = send(
        simulated_app(),
        post_json(r#"{"action":"send_promotional","phones":["111","222"],"template":"promotional_offer","language":"en","parameters":["Winter","20%"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Promotional broadcast queued");

    let responses = json["responses"].as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0], serde_json::json!({"phone": "111", "status": "queued"}));
    assert_eq!(responses[1], serde_json::json!({"phone": "222", "status": "queued"}));
}

#[tokio::test]
async fn test_promotional_missing_fields() {
    for body in [
        r#"{"action":"send_promotional","phones":["111"],"template":"promotional_offer","language":"en"}"#,
        r#"{"action":"send_promotional","phones":[],"template":"promotional_offer","language":"en","parameters":[]}"#,
        r#"{"action":"send_promotional","template":"promotional_offer","language":"en","parameters":[]}"#,
    ] {
        let (status, json) = send(simulated_app(), post_json(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(json["error"], "Missing required fields for promotional broadcast");
    }
}

#[tokio::test]
async fn test_promotional_live_failure_isolated() {
    let (app, sent) = live_app(&["222"]);
    let (status, json) = send(
        app,
        post_json(r#"{"action":"send_promotional","phones":["111","222","+333"],"template":"promotional_offer","language":"en","parameters":["Winter"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Promotional broadcast processed");

    let responses = json["responses"].as_array().unwrap();
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["status"], "sent");
    assert_eq!(responses[1]["phone"], "222");
    assert_eq!(responses[1]["status"], "failed");
    assert_eq!(responses[1]["response"]["error"]["code"], 131030);
    assert_eq!(responses[2]["phone"], "+333");
    assert_eq!(responses[2]["status"], "sent");

    assert_eq!(sent.lock().unwrap().len(), 3);
}

// ── send_abandoned_cart ──

#[tokio::test]
async fn test_abandoned_cart_payload() {
    let (status, json) = send(
        simulated_app(),
        post_json(r#"{"action":"send_abandoned_cart","phone":"0798393537","bookingDetails":{"dates":"2024-01-01","guests":"2"}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let template = &json["payload"]["template"];
    assert_eq!(template["name"], "abandoned_cart");
    assert_eq!(template["language"]["code"], "en");
    let texts: Vec<&str> = template["components"][0]["parameters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["text"].as_str().unwrap())
        .collect();
    assert_eq!(
        texts,
        vec!["2024-01-01", "2", "https://156euphoriavilla.co.za/booking"]
    );
}

#[tokio::test]
async fn test_abandoned_cart_missing_booking_details() {
    let (status, json) = send(
        simulated_app(),
        post_json(r#"{"action":"send_abandoned_cart","phone":"0798393537"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing required fields for abandoned cart reminder");
}

#[tokio::test]
async fn test_abandoned_cart_uses_configured_booking_url() {
    let state = Arc::new(AppState {
        config: AppConfig {
            booking_url: "https://example.test/book".to_string(),
            ..AppConfig::default()
        },
        messaging: None,
    });
    let (_, json) = send(
        routes::app(state),
        post_json(r#"{"action":"send_abandoned_cart","phone":"0798393537","bookingDetails":{"dates":"2024-01-01","guests":2}}"#),
    )
    .await;
    let params = &json["payload"]["template"]["components"][0]["parameters"];
    assert_eq!(params[1]["text"], "2");
    assert_eq!(params[2]["text"], "https://example.test/book");
}
