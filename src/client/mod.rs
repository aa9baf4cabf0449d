//! The dashboard half of the payment flow
//!
//! - [`link_cache`]: memoized payment links per invoice
//! - [`drawer`]: the embedded payment session state machine
//! - [`reconcile`]: reloading invoice state after anything that moves money
//! - [`minter`], [`email`]: adapters for the hosted functions

pub mod drawer;
pub mod email;
pub mod frame;
pub mod http;
pub mod link_cache;
pub mod minter;
pub mod reconcile;

pub use drawer::{DrawerOutcome, DrawerPhase, DrawerState, PaymentDrawer};
pub use email::{EmailDispatcher, HttpEmailDispatcher, SendInvoiceRequest};
pub use frame::{FrameMessage, FrameSignal};
pub use link_cache::PaymentLinkCache;
pub use minter::{HttpTokenMinter, TokenMinter};
pub use reconcile::{InvoiceReconciler, InvoiceSnapshot, ManualPayment};
