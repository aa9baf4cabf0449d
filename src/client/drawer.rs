//! Payment drawer controller
//!
//! Drives one embedded payment session:
//!
//! ```text
//! Closed ──open()──▶ Launching ──link ok──▶ Loading ──frame-ready──▶ Ready
//!                        │                     │                       │
//!                   link failed          loading / fallback-opened (processing flag)
//!                        ▼                     ▼                       ▼
//!                     Closed          complete ──▶ Closed + reconcile + broadcast
//!                                     error    ──▶ Error (drawer stays open)
//! ```
//!
//! `cancel()` closes from any phase. Signals may arrive duplicated or out
//! of order; the processing flag is last-write-wins and signals received
//! while closed are dropped, so a repeated `payment-complete` reconciles once.

use super::frame::{FrameMessage, FrameSignal};
use super::link_cache::PaymentLinkCache;
use super::reconcile::{InvoiceReconciler, InvoiceSnapshot};
use crate::core::entity::Invoice;
use crate::core::error::PaylinkResult;
use crate::core::events::DashboardEvent;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const PAYMENT_FAILED_MESSAGE: &str =
    "Payment could not be completed. Please try again or use another payment method.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawerPhase {
    Closed,
    Launching,
    Loading,
    Ready,
    Error,
}

/// What a frame message did to the drawer
#[derive(Debug, Clone, PartialEq)]
pub enum DrawerOutcome {
    /// Not a trusted, recognized signal, or the drawer is closed
    Ignored,
    /// Phase or processing flag changed (or stayed the same)
    Updated,
    /// Payment finished; data was reloaded
    Completed(Box<InvoiceSnapshot>),
    /// The frame reported a failure
    Failed,
}

/// Current drawer state, as rendered
#[derive(Debug, Clone, PartialEq)]
pub struct DrawerState {
    pub phase: DrawerPhase,
    pub invoice_id: Option<Uuid>,
    pub frame_url: Option<String>,
    pub processing: bool,
    pub error: Option<String>,
}

impl DrawerState {
    fn closed() -> Self {
        Self {
            phase: DrawerPhase::Closed,
            invoice_id: None,
            frame_url: None,
            processing: false,
            error: None,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.phase, DrawerPhase::Closed | DrawerPhase::Launching)
    }
}

pub struct PaymentDrawer {
    links: Arc<PaymentLinkCache>,
    reconciler: Arc<InvoiceReconciler>,
    provider_origin: String,
    state: DrawerState,
}

impl PaymentDrawer {
    /// `provider_origin` is the only origin whose messages are acted on
    pub fn new(
        links: Arc<PaymentLinkCache>,
        reconciler: Arc<InvoiceReconciler>,
        provider_origin: impl Into<String>,
    ) -> Self {
        Self {
            links,
            reconciler,
            provider_origin: provider_origin.into(),
            state: DrawerState::closed(),
        }
    }

    pub fn state(&self) -> &DrawerState {
        &self.state
    }

    pub fn phase(&self) -> DrawerPhase {
        self.state.phase
    }

    /// Start a payment session for `invoice`
    ///
    /// On failure the drawer stays closed and an error toast is published.
    pub async fn open(&mut self, invoice: &Invoice) -> PaylinkResult<()> {
        self.state = DrawerState {
            phase: DrawerPhase::Launching,
            invoice_id: Some(invoice.id),
            ..DrawerState::closed()
        };

        match self.links.ensure_link(invoice, false).await {
            Ok(link) => {
                self.state.frame_url = Some(link.embed_url());
                self.state.phase = DrawerPhase::Loading;
                info!(invoice_id = %invoice.id, "payment drawer opened");
                Ok(())
            }
            Err(err) => {
                warn!(invoice_id = %invoice.id, error = %err, "could not open payment drawer");
                self.state = DrawerState::closed();
                self.reconciler
                    .events()
                    .publish(DashboardEvent::toast_error(err.user_message()));
                Err(err)
            }
        }
    }

    /// Close the drawer without waiting for the frame
    pub fn cancel(&mut self) {
        if self.state.phase != DrawerPhase::Closed {
            debug!(invoice_id = ?self.state.invoice_id, "payment drawer cancelled");
        }
        self.state = DrawerState::closed();
    }

    /// React to a message posted by the embedded frame
    pub async fn handle_message(&mut self, message: &FrameMessage) -> PaylinkResult<DrawerOutcome> {
        if !self.state.is_open() {
            return Ok(DrawerOutcome::Ignored);
        }
        let Some(signal) = FrameSignal::from_message(message, &self.provider_origin) else {
            return Ok(DrawerOutcome::Ignored);
        };
        let Some(invoice_id) = self.state.invoice_id else {
            return Ok(DrawerOutcome::Ignored);
        };

        debug!(%invoice_id, signal = signal.as_str(), "payment frame signal");

        match signal {
            FrameSignal::FrameReady => {
                if self.state.phase == DrawerPhase::Loading {
                    self.state.phase = DrawerPhase::Ready;
                }
                Ok(DrawerOutcome::Updated)
            }
            FrameSignal::Loading | FrameSignal::FallbackOpened => {
                self.state.processing = true;
                self.state.error = None;
                if self.state.phase == DrawerPhase::Error {
                    // retried inside the frame
                    self.state.phase = DrawerPhase::Ready;
                }
                Ok(DrawerOutcome::Updated)
            }
            FrameSignal::Complete => {
                self.state = DrawerState::closed();
                info!(%invoice_id, "payment completed in drawer");

                let snapshot = self.reconciler.refresh(invoice_id).await?;
                let events = self.reconciler.events();
                events.publish(DashboardEvent::PaymentCompleted { invoice_id });
                events.publish(DashboardEvent::toast_success("Payment received"));

                Ok(DrawerOutcome::Completed(Box::new(snapshot)))
            }
            FrameSignal::Error { message } => {
                warn!(%invoice_id, detail = ?message, "payment frame reported an error");
                self.state.processing = false;
                self.state.phase = DrawerPhase::Error;
                self.state.error = Some(PAYMENT_FAILED_MESSAGE.to_string());
                self.reconciler
                    .events()
                    .publish(DashboardEvent::toast_error(PAYMENT_FAILED_MESSAGE));
                Ok(DrawerOutcome::Failed)
            }
        }
    }
}
