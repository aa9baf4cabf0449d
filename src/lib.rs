//! # Paylink
//!
//! Shareable payment links for invoices, and the dashboard flow around them.
//!
//! ## Pieces
//!
//! - **Token minter** ([`mint`]): an HTTP function that turns an invoice id into a
//!   signed payment link. Deterministic per `{invoice, customer, amount, exp}`.
//! - **Link cache** ([`client::link_cache`]): one link per invoice, re-minted when
//!   it is about to expire.
//! - **Payment drawer** ([`client::drawer`]): drives the embedded payment frame
//!   from its `anet/*` messages.
//! - **Reconciliation** ([`client::reconcile`]): reloads invoice, payments and
//!   audit log after anything that moves money.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use paylink::prelude::*;
//!
//! let store = InMemoryInvoiceStore::new();
//! let auth = StaticTokenAuthProvider::new().with_user("dev-token", Uuid::new_v4(), None);
//!
//! let app = ServerBuilder::new()
//!     .with_config(PaylinkConfig::default())
//!     .with_store(store)
//!     .with_auth_provider(auth)
//!     .build()?;
//! ```

pub mod client;
pub mod config;
pub mod core;
pub mod mint;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{AuthContext, AuthProvider, StaticTokenAuthProvider},
        entity::{
            AuditAction, AuditLogEntry, Invoice, InvoiceStatus, NewPayment, Payment,
            PaymentMethod, PaymentStatus,
        },
        error::{InputError, PaylinkError, PaylinkResult},
        events::{DashboardEvent, EventBus, ToastLevel},
        link::PaymentLink,
        store::InvoiceStore,
    };

    // === Mint ===
    pub use crate::mint::{LinkMinter, MintState};

    // === Client ===
    pub use crate::client::{
        DrawerOutcome, DrawerPhase, EmailDispatcher, FrameMessage, FrameSignal,
        HttpEmailDispatcher, HttpTokenMinter, InvoiceReconciler, InvoiceSnapshot, ManualPayment,
        PaymentDrawer, PaymentLinkCache, SendInvoiceRequest, TokenMinter,
    };

    // === Storage ===
    pub use crate::storage::{
        InMemoryEmailOutbox, InMemoryInvoiceStore, RestAuthProvider, RestInvoiceStore,
    };

    // === Config ===
    pub use crate::config::PaylinkConfig;

    // === Server ===
    pub use crate::server::{ServerBuilder, ServerHost};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use uuid::Uuid;
}
