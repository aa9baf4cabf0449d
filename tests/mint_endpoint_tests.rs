//! HTTP tests for the mint function
//!
//! These tests drive the full router (CORS and tracing layers included) and
//! check the wire contract the dashboard relies on:
//! - success is `200 {url, expiresAt}`
//! - every failure is `400 {error}`
//! - preflight answers 200 with an empty body

use axum::http::{HeaderValue, Method, StatusCode, header};
use axum_test::TestServer;
use paylink::prelude::*;
use serde_json::{Value, json};

const TOKEN: &str = "user-token";
const APP_ORIGIN: &str = "https://app.invoices.test";

struct Fixture {
    server: TestServer,
    store: InMemoryInvoiceStore,
    sent: Invoice,
}

fn sent_invoice(amount: f64) -> Invoice {
    let mut invoice = Invoice::draft("INV-2001", Uuid::new_v4(), amount);
    invoice.status = InvoiceStatus::Sent;
    invoice
}

fn fixture_with_config(config: PaylinkConfig) -> Fixture {
    let store = InMemoryInvoiceStore::new();
    let sent = sent_invoice(120.0);
    store.put_invoice(sent.clone()).unwrap();

    let auth = StaticTokenAuthProvider::new().with_user(TOKEN, Uuid::new_v4(), Some("ops@acme.test"));

    let app = ServerBuilder::new()
        .with_config(config)
        .with_store(store.clone())
        .with_auth_provider(auth)
        .build()
        .expect("router should build");

    Fixture {
        server: TestServer::new(app),
        store,
        sent,
    }
}

fn fixture() -> Fixture {
    fixture_with_config(PaylinkConfig::default())
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

fn origin() -> HeaderValue {
    HeaderValue::from_static(APP_ORIGIN)
}

// =============================================================================
// Success
// =============================================================================

mod success_tests {
    use super::*;

    #[tokio::test]
    async fn test_mint_returns_url_and_expiry() {
        let fx = fixture();

        let response = fx
            .server
            .post("/mint-payment-token")
            .add_header(header::AUTHORIZATION, bearer(TOKEN))
            .add_header(header::ORIGIN, origin())
            .json(&json!({ "invoiceId": fx.sent.id }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();

        let url = body["url"].as_str().unwrap();
        let prefix = format!("{}/pay/{}?token=", APP_ORIGIN, fx.sent.id);
        assert!(url.starts_with(&prefix), "unexpected url {}", url);
        assert_eq!(url.len() - prefix.len(), 64, "token should be a sha-256 hex digest");

        let expires_at: DateTime<Utc> =
            serde_json::from_value(body["expiresAt"].clone()).unwrap();
        let hours = (expires_at - Utc::now()).num_hours();
        assert!((7 * 24 - 1..=7 * 24).contains(&hours));
    }

    #[tokio::test]
    async fn test_configured_origin_wins_over_header() {
        let mut config = PaylinkConfig::default();
        config.minter.public_origin = Some("https://pay.acme.test/".to_string());
        let fx = fixture_with_config(config);

        let response = fx
            .server
            .post("/mint-payment-token")
            .add_header(header::AUTHORIZATION, bearer(TOKEN))
            .add_header(header::ORIGIN, origin())
            .json(&json!({ "invoiceId": fx.sent.id }))
            .await;

        response.assert_status_ok();
        let link: PaymentLink = response.json();
        assert!(
            link.url
                .starts_with(&format!("https://pay.acme.test/pay/{}?token=", fx.sent.id))
        );
    }

    #[tokio::test]
    async fn test_draft_invoice_is_still_minted() {
        // Drafts are refused by the dashboard, not by the function
        let fx = fixture();
        let draft = Invoice::draft("INV-2002", Uuid::new_v4(), 10.0);
        fx.store.put_invoice(draft.clone()).unwrap();

        let response = fx
            .server
            .post("/mint-payment-token")
            .add_header(header::AUTHORIZATION, bearer(TOKEN))
            .add_header(header::ORIGIN, origin())
            .json(&json!({ "invoiceId": draft.id }))
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_response_carries_cors_header() {
        let fx = fixture();

        let response = fx
            .server
            .post("/mint-payment-token")
            .add_header(header::AUTHORIZATION, bearer(TOKEN))
            .add_header(header::ORIGIN, origin())
            .json(&json!({ "invoiceId": fx.sent.id }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
    }
}

// =============================================================================
// Failures (all 400 {error})
// =============================================================================

mod failure_tests {
    use super::*;

    fn assert_error(response: &axum_test::TestResponse) -> String {
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        body["error"]
            .as_str()
            .expect("error body should carry a message")
            .to_string()
    }

    #[tokio::test]
    async fn test_missing_authorization() {
        let fx = fixture();

        let response = fx
            .server
            .post("/mint-payment-token")
            .add_header(header::ORIGIN, origin())
            .json(&json!({ "invoiceId": fx.sent.id }))
            .await;

        let message = assert_error(&response);
        assert!(message.starts_with("Unauthorized"));
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let fx = fixture();

        let response = fx
            .server
            .post("/mint-payment-token")
            .add_header(header::AUTHORIZATION, bearer("stolen"))
            .add_header(header::ORIGIN, origin())
            .json(&json!({ "invoiceId": fx.sent.id }))
            .await;

        assert_error(&response);
    }

    #[tokio::test]
    async fn test_missing_invoice_id() {
        let fx = fixture();

        let response = fx
            .server
            .post("/mint-payment-token")
            .add_header(header::AUTHORIZATION, bearer(TOKEN))
            .add_header(header::ORIGIN, origin())
            .json(&json!({}))
            .await;

        assert_eq!(assert_error(&response), "invoiceId is required");
    }

    #[tokio::test]
    async fn test_empty_body() {
        let fx = fixture();

        let response = fx
            .server
            .post("/mint-payment-token")
            .add_header(header::AUTHORIZATION, bearer(TOKEN))
            .add_header(header::ORIGIN, origin())
            .await;

        assert_eq!(assert_error(&response), "invoiceId is required");
    }

    #[tokio::test]
    async fn test_unknown_invoice() {
        let fx = fixture();
        let missing = Uuid::new_v4();

        let response = fx
            .server
            .post("/mint-payment-token")
            .add_header(header::AUTHORIZATION, bearer(TOKEN))
            .add_header(header::ORIGIN, origin())
            .json(&json!({ "invoiceId": missing }))
            .await;

        let message = assert_error(&response);
        assert!(message.contains(&missing.to_string()));
        assert!(message.contains("not found"));
    }

    #[tokio::test]
    async fn test_no_origin_available() {
        let fx = fixture();

        let response = fx
            .server
            .post("/mint-payment-token")
            .add_header(header::AUTHORIZATION, bearer(TOKEN))
            .json(&json!({ "invoiceId": fx.sent.id }))
            .await;

        assert_error(&response);
    }
}

// =============================================================================
// Preflight and health
// =============================================================================

mod preflight_tests {
    use super::*;

    #[tokio::test]
    async fn test_options_returns_empty_200() {
        let fx = fixture();

        let response = fx
            .server
            .method(Method::OPTIONS, "/mint-payment-token")
            .await;

        response.assert_status_ok();
        assert!(response.text().is_empty());
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_client_headers() {
        let fx = fixture();

        let response = fx
            .server
            .method(Method::OPTIONS, "/mint-payment-token")
            .add_header(header::ORIGIN, origin())
            .add_header(
                header::ACCESS_CONTROL_REQUEST_METHOD,
                HeaderValue::from_static("POST"),
            )
            .add_header(
                header::ACCESS_CONTROL_REQUEST_HEADERS,
                HeaderValue::from_static("authorization,x-client-info,apikey,content-type"),
            )
            .await;

        response.assert_status_ok();
        assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");

        let allowed = response
            .header(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        for name in ["authorization", "x-client-info", "apikey", "content-type"] {
            assert!(allowed.contains(name), "{} not allowed: {}", name, allowed);
        }
    }

    #[tokio::test]
    async fn test_health() {
        let fx = fixture();

        let response = fx.server.get("/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}
