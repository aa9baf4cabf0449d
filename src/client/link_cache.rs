//! Per-invoice memo of minted payment links
//!
//! Concurrent callers for the same invoice are not coalesced; each may mint.
//! That only costs a request, since minting is a pure derivation.

use super::minter::TokenMinter;
use crate::core::entity::Invoice;
use crate::core::error::{InputError, PaylinkResult};
use crate::core::link::PaymentLink;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 60;

pub struct PaymentLinkCache {
    minter: Arc<dyn TokenMinter>,
    refresh_margin: Duration,
    links: Mutex<HashMap<Uuid, PaymentLink>>,
}

impl PaymentLinkCache {
    pub fn new(minter: Arc<dyn TokenMinter>) -> Self {
        Self::with_refresh_margin(minter, Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS))
    }

    pub fn with_refresh_margin(minter: Arc<dyn TokenMinter>, refresh_margin: Duration) -> Self {
        Self {
            minter,
            refresh_margin,
            links: Mutex::new(HashMap::new()),
        }
    }

    fn links(&self) -> MutexGuard<'_, HashMap<Uuid, PaymentLink>> {
        // Entries are plain values, a poisoned map is still consistent
        self.links.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached link for an invoice, regardless of expiry
    pub fn cached(&self, invoice_id: &Uuid) -> Option<PaymentLink> {
        self.links().get(invoice_id).cloned()
    }

    /// Cached link that is still usable at `now`
    fn fresh(&self, invoice_id: &Uuid, now: DateTime<Utc>) -> Option<PaymentLink> {
        self.links()
            .get(invoice_id)
            .filter(|link| !link.expires_within(now, self.refresh_margin))
            .cloned()
    }

    /// Drop the cached link of an invoice
    pub fn invalidate(&self, invoice_id: &Uuid) -> Option<PaymentLink> {
        self.links().remove(invoice_id)
    }

    /// Return a usable link for `invoice`, minting one if needed
    ///
    /// Draft invoices are rejected before anything is sent. Unless `force`
    /// is set, a cached link expiring more than the refresh margin from now
    /// (or never) is returned as-is.
    pub async fn ensure_link(&self, invoice: &Invoice, force: bool) -> PaylinkResult<PaymentLink> {
        if invoice.is_draft() {
            return Err(InputError::DraftInvoice.into());
        }

        if !force {
            if let Some(link) = self.fresh(&invoice.id, Utc::now()) {
                debug!(invoice_id = %invoice.id, "payment link cache hit");
                return Ok(link);
            }
        }

        let link = self.minter.mint(invoice.id).await?;
        debug!(invoice_id = %invoice.id, force, "minted payment link");
        self.links().insert(invoice.id, link.clone());
        Ok(link)
    }
}
