//! Domain types shared by the mint function and the dashboard client

pub mod auth;
pub mod entity;
pub mod error;
pub mod events;
pub mod link;
pub mod mapping;
pub mod store;

pub use auth::{AuthContext, AuthProvider, StaticTokenAuthProvider};
pub use entity::{
    AuditAction, AuditLogEntry, Invoice, InvoiceStatus, LineItem, NewPayment,
    PartialPaymentPolicy, Payment, PaymentMethod, PaymentStatus, TaxType,
};
pub use error::{ErrorResponse, InputError, PaylinkError, PaylinkResult};
pub use events::{DashboardEvent, EventBus, EventEnvelope, ToastLevel};
pub use link::PaymentLink;
pub use store::InvoiceStore;
