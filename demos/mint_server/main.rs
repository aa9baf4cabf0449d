//! Payment Link Example
//!
//! Runs the mint function on an in-memory store, then drives the dashboard
//! side against it:
//! - mints (and caches) a link for a sent invoice
//! - opens the payment drawer and feeds it the frame's messages
//! - records a manual payment and prints the reconciled invoice
//!
//! Config path comes from the first argument or `PAYLINK_CONFIG`.

use anyhow::Result;
use paylink::prelude::*;
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEMO_TOKEN: &str = "demo-token";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,paylink=debug")),
        )
        .init();

    let mut config = match std::env::args().nth(1).or_else(|| std::env::var("PAYLINK_CONFIG").ok()) {
        Some(path) => PaylinkConfig::from_yaml_file(&path)?,
        None => PaylinkConfig::default(),
    }
    .apply_env_overrides()?;

    // Server-to-server calls carry no Origin header
    if config.minter.public_origin.is_none() {
        config.minter.public_origin = Some(format!("http://{}", config.server.bind_addr));
    }

    // Seed data
    let store = InMemoryInvoiceStore::new();
    let mut invoice = Invoice::draft("INV-001", Uuid::new_v4(), 100.0);
    invoice.customer_name = Some("Alice Smith".to_string());
    invoice.status = InvoiceStatus::Sent;
    store.put_invoice(invoice.clone())?;

    let auth = StaticTokenAuthProvider::new().with_user(
        DEMO_TOKEN,
        Uuid::new_v4(),
        Some("owner@acme.test"),
    );

    let server = ServerBuilder::new()
        .with_config(config.clone())
        .with_store(store.clone())
        .with_auth_provider(auth);
    let server_task = tokio::spawn(server.serve());

    println!("🚀 Mint function on http://{}", config.server.bind_addr);
    println!("   POST    /mint-payment-token  {{\"invoiceId\": \"{}\"}}", invoice.id);
    println!("   OPTIONS /mint-payment-token");
    println!("   GET     /health");

    // Give the listener a moment to bind
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    // Dashboard side
    let events = EventBus::new(config.client.event_capacity);
    let mut feed = events.subscribe();
    tokio::spawn(async move {
        while let Ok(envelope) = feed.recv().await {
            if let DashboardEvent::Toast { level, message } = envelope.event {
                println!("   💬 [{:?}] {}", level, message);
            }
        }
    });

    let minter = HttpTokenMinter::new(&config.client.functions_url, DEMO_TOKEN);
    let links = Arc::new(PaymentLinkCache::with_refresh_margin(
        Arc::new(minter),
        config.client.link_refresh_margin()?,
    ));
    let reconciler = Arc::new(InvoiceReconciler::new(
        Arc::new(store.clone()),
        events.clone(),
        "owner@acme.test",
    ));
    let mut drawer = PaymentDrawer::new(
        links.clone(),
        reconciler.clone(),
        config.client.payment_provider_origin.clone(),
    );

    match links.ensure_link(&invoice, false).await {
        Ok(link) => println!("\n🔗 Payment link: {}", link.url),
        Err(err) => println!("\n❌ Could not mint a link: {}", err.user_message()),
    }

    if drawer.open(&invoice).await.is_ok() {
        println!("🪟 Drawer frame: {:?}", drawer.state().frame_url);
        let origin = config.client.payment_provider_origin.as_str();
        for kind in ["payment-frame-ready", "payment-loading", "payment-error"] {
            let message = FrameMessage::new(origin, json!({ "type": format!("anet/{}", kind) }));
            drawer.handle_message(&message).await?;
            println!("   {} -> {:?}", kind, drawer.phase());
        }
        drawer.cancel();
    }

    let snapshot = reconciler
        .record_manual_payment(invoice.id, ManualPayment::new(40.0, PaymentMethod::Cash))
        .await?;
    println!(
        "\n💵 {} is now {} with {:.2} remaining ({} audit entries)",
        snapshot.invoice.number,
        snapshot.invoice.status,
        snapshot.remaining_amount,
        snapshot.audit_log.len()
    );

    println!("\nPress Ctrl+C to stop the server.");
    server_task.await??;
    Ok(())
}
