//! In-memory invoice store for testing and development
//!
//! Mirrors what the hosted store does server-side: inserting a payment bumps
//! the invoice's `paid_amount` and settles its status. Payments above the
//! remaining balance are refused.

use crate::client::email::{EmailDispatcher, SendInvoiceRequest};
use crate::core::entity::{
    AuditLogEntry, Invoice, InvoiceStatus, NewPayment, Payment, PaymentStatus,
};
use crate::core::error::{InputError, PaylinkError, PaylinkResult};
use crate::core::store::InvoiceStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// In-memory store. Uses RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryInvoiceStore {
    invoices: Arc<RwLock<HashMap<Uuid, Invoice>>>,
    payments: Arc<RwLock<Vec<Payment>>>,
    audit_log: Arc<RwLock<Vec<AuditLogEntry>>>,
}

fn lock_error(e: impl std::fmt::Display) -> PaylinkError {
    PaylinkError::upstream("store", format!("failed to acquire lock: {}", e))
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an invoice
    pub fn put_invoice(&self, invoice: Invoice) -> PaylinkResult<()> {
        let mut invoices = self.invoices.write().map_err(lock_error)?;
        invoices.insert(invoice.id, invoice);
        Ok(())
    }

    /// Set an invoice's status, as the email function does on dispatch
    pub fn set_status(&self, id: &Uuid, status: InvoiceStatus) -> PaylinkResult<()> {
        let mut invoices = self.invoices.write().map_err(lock_error)?;
        let invoice = invoices
            .get_mut(id)
            .ok_or_else(|| PaylinkError::invoice_not_found(*id))?;
        invoice.status = status;
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn get_invoice(&self, id: &Uuid) -> PaylinkResult<Option<Invoice>> {
        let invoices = self.invoices.read().map_err(lock_error)?;
        Ok(invoices.get(id).cloned())
    }

    async fn list_payments(&self, invoice_id: &Uuid) -> PaylinkResult<Vec<Payment>> {
        let payments = self.payments.read().map_err(lock_error)?;
        let mut found: Vec<Payment> = payments
            .iter()
            .filter(|p| &p.invoice_id == invoice_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
        Ok(found)
    }

    async fn list_audit_log(&self, invoice_id: &Uuid) -> PaylinkResult<Vec<AuditLogEntry>> {
        let audit_log = self.audit_log.read().map_err(lock_error)?;
        // Entries are appended in order, so reversing gives newest first
        Ok(audit_log
            .iter()
            .rev()
            .filter(|e| &e.invoice_id == invoice_id)
            .cloned()
            .collect())
    }

    async fn insert_payment(&self, payment: NewPayment) -> PaylinkResult<Payment> {
        let mut invoices = self.invoices.write().map_err(lock_error)?;
        let invoice = invoices
            .get_mut(&payment.invoice_id)
            .ok_or_else(|| PaylinkError::invoice_not_found(payment.invoice_id))?;

        if invoice.exceeds_remaining(payment.amount) {
            return Err(InputError::Field {
                field: "amount".to_string(),
                message: format!(
                    "exceeds the remaining balance of {:.2}",
                    invoice.remaining_amount()
                ),
            }
            .into());
        }

        if payment.status == PaymentStatus::Completed {
            invoice.paid_amount += payment.amount;
            invoice.status = invoice.status_for_paid_amount();
        }

        let stored = Payment {
            id: Uuid::new_v4(),
            invoice_id: payment.invoice_id,
            amount: payment.amount,
            method: payment.method,
            paid_at: payment.paid_at,
            status: payment.status,
            reference: payment.reference,
        };

        self.payments
            .write()
            .map_err(lock_error)?
            .push(stored.clone());

        Ok(stored)
    }

    async fn append_audit(&self, entry: AuditLogEntry) -> PaylinkResult<AuditLogEntry> {
        let mut audit_log = self.audit_log.write().map_err(lock_error)?;
        audit_log.push(entry.clone());
        Ok(entry)
    }
}

/// Email dispatcher that records requests instead of delivering them
///
/// Like the hosted email function, a successful dispatch moves a draft
/// invoice to `sent`.
#[derive(Clone)]
pub struct InMemoryEmailOutbox {
    store: InMemoryInvoiceStore,
    sent: Arc<RwLock<Vec<SendInvoiceRequest>>>,
}

impl InMemoryEmailOutbox {
    pub fn new(store: InMemoryInvoiceStore) -> Self {
        Self {
            store,
            sent: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Requests dispatched so far, oldest first
    pub fn sent(&self) -> PaylinkResult<Vec<SendInvoiceRequest>> {
        Ok(self.sent.read().map_err(lock_error)?.clone())
    }
}

#[async_trait]
impl EmailDispatcher for InMemoryEmailOutbox {
    async fn dispatch(&self, request: &SendInvoiceRequest) -> PaylinkResult<()> {
        let invoice = self
            .store
            .get_invoice(&request.invoice_id)
            .await?
            .ok_or_else(|| PaylinkError::invoice_not_found(request.invoice_id))?;

        if invoice.is_draft() {
            self.store.set_status(&invoice.id, InvoiceStatus::Sent)?;
        }

        self.sent.write().map_err(lock_error)?.push(request.clone());
        Ok(())
    }
}
