//! The invoice store collaborator
//!
//! Invoices, payments and audit entries live in the hosted relational store.
//! The crate only needs a handful of reads and two appends; updating
//! `paid_amount` and the invoice status after a payment is the store's job.

use crate::core::entity::{AuditLogEntry, Invoice, NewPayment, Payment};
use crate::core::error::PaylinkResult;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Get an invoice by id
    async fn get_invoice(&self, id: &Uuid) -> PaylinkResult<Option<Invoice>>;

    /// Payments for an invoice, newest first
    async fn list_payments(&self, invoice_id: &Uuid) -> PaylinkResult<Vec<Payment>>;

    /// Audit entries for an invoice, newest first
    async fn list_audit_log(&self, invoice_id: &Uuid) -> PaylinkResult<Vec<AuditLogEntry>>;

    /// Append a payment to the invoice's ledger
    ///
    /// The store is trusted to bump `paid_amount` and the status.
    async fn insert_payment(&self, payment: NewPayment) -> PaylinkResult<Payment>;

    /// Append an audit entry
    async fn append_audit(&self, entry: AuditLogEntry) -> PaylinkResult<AuditLogEntry>;
}
