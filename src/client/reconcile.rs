//! Invoice reconciliation
//!
//! After anything that can move money or status (manual payment, drawer
//! completion, send) the dashboard reloads the invoice, its audit log and its
//! payments together and recomputes the derived values. A refresh either
//! yields a full [`InvoiceSnapshot`] or an error; never a mix of old and new.

use super::email::{EmailDispatcher, SendInvoiceRequest};
use crate::core::entity::{
    AuditAction, AuditLogEntry, Invoice, NewPayment, Payment, PaymentMethod, PaymentStatus,
};
use crate::core::error::{InputError, PaylinkError, PaylinkResult};
use crate::core::events::{DashboardEvent, EventBus};
use crate::core::store::InvoiceStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shown when money moved but its audit entry could not be written
pub const AUDIT_SKIPPED_MESSAGE: &str =
    "Saved, but the activity log could not be updated. Do not repeat the action.";

/// Everything the invoice detail view renders
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceSnapshot {
    pub invoice: Invoice,
    /// Newest first
    pub payments: Vec<Payment>,
    /// Newest first
    pub audit_log: Vec<AuditLogEntry>,
    pub remaining_amount: f64,
    pub can_edit: bool,
}

impl InvoiceSnapshot {
    pub fn new(
        invoice: Invoice,
        mut payments: Vec<Payment>,
        mut audit_log: Vec<AuditLogEntry>,
    ) -> Self {
        payments.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
        audit_log.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Self {
            remaining_amount: invoice.remaining_amount(),
            can_edit: invoice.can_edit(),
            invoice,
            payments,
            audit_log,
        }
    }
}

/// A payment entered by hand (cash, check, transfer)
#[derive(Debug, Clone, PartialEq)]
pub struct ManualPayment {
    pub amount: f64,
    pub method: PaymentMethod,
    pub paid_at: Option<DateTime<Utc>>,
    pub reference: Option<String>,
}

impl ManualPayment {
    pub fn new(amount: f64, method: PaymentMethod) -> Self {
        Self {
            amount,
            method,
            paid_at: None,
            reference: None,
        }
    }

    /// Amount must be a finite number above zero
    pub fn validate(&self) -> PaylinkResult<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(InputError::NonPositiveAmount {
                amount: self.amount,
            }
            .into());
        }
        Ok(())
    }
}

pub struct InvoiceReconciler {
    store: Arc<dyn InvoiceStore>,
    events: EventBus,
    actor: String,
    email: Option<Arc<dyn EmailDispatcher>>,
}

impl InvoiceReconciler {
    /// `actor` is recorded on the audit entries this reconciler writes
    pub fn new(store: Arc<dyn InvoiceStore>, events: EventBus, actor: impl Into<String>) -> Self {
        Self {
            store,
            events,
            actor: actor.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: Arc<dyn EmailDispatcher>) -> Self {
        self.email = Some(email);
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Surface a failure as an error toast and hand it back
    fn report<T>(&self, result: PaylinkResult<T>) -> PaylinkResult<T> {
        if let Err(err) = &result {
            self.events
                .publish(DashboardEvent::toast_error(err.user_message()));
        }
        result
    }

    async fn load(&self, invoice_id: Uuid) -> PaylinkResult<InvoiceSnapshot> {
        let (invoice, audit_log, payments) = tokio::try_join!(
            self.store.get_invoice(&invoice_id),
            self.store.list_audit_log(&invoice_id),
            self.store.list_payments(&invoice_id),
        )?;

        let invoice = invoice.ok_or_else(|| PaylinkError::invoice_not_found(invoice_id))?;
        Ok(InvoiceSnapshot::new(invoice, payments, audit_log))
    }

    /// Reload invoice, audit log and payments
    ///
    /// Publishes `InvoiceRefreshed` when all three reads succeed.
    pub async fn refresh(&self, invoice_id: Uuid) -> PaylinkResult<InvoiceSnapshot> {
        let snapshot = self.report(self.load(invoice_id).await)?;
        debug!(
            %invoice_id,
            status = %snapshot.invoice.status,
            remaining = snapshot.remaining_amount,
            "invoice reconciled"
        );
        self.events
            .publish(DashboardEvent::InvoiceRefreshed { invoice_id });
        Ok(snapshot)
    }

    async fn insert_manual_payment(
        &self,
        invoice_id: Uuid,
        payment: &ManualPayment,
    ) -> PaylinkResult<Payment> {
        let invoice = self
            .store
            .get_invoice(&invoice_id)
            .await?
            .ok_or_else(|| PaylinkError::invoice_not_found(invoice_id))?;

        let recorded = self
            .store
            .insert_payment(NewPayment {
                invoice_id,
                amount: payment.amount,
                method: payment.method.clone(),
                paid_at: payment.paid_at.unwrap_or_else(Utc::now),
                status: PaymentStatus::Completed,
                reference: payment.reference.clone(),
            })
            .await?;

        let entry = AuditLogEntry::new(invoice_id, AuditAction::ManualPayment, &self.actor)
            .with_change(
                "paid_amount",
                Some(format!("{:.2}", invoice.paid_amount)),
                Some(format!("{:.2}", invoice.paid_amount + payment.amount)),
            );
        // The payment is already in the ledger; failing here would invite a duplicate
        self.append_audit_after_write(entry).await;

        Ok(recorded)
    }

    async fn append_audit_after_write(&self, entry: AuditLogEntry) {
        let invoice_id = entry.invoice_id;
        let action = entry.action.as_str().to_string();
        if let Err(err) = self.store.append_audit(entry).await {
            warn!(%invoice_id, %action, error = %err, "audit entry not written");
            self.events
                .publish(DashboardEvent::toast_info(AUDIT_SKIPPED_MESSAGE));
        }
    }

    /// Record a manual payment, then reconcile
    ///
    /// Invalid amounts are rejected before the store is touched.
    pub async fn record_manual_payment(
        &self,
        invoice_id: Uuid,
        payment: ManualPayment,
    ) -> PaylinkResult<InvoiceSnapshot> {
        self.report(payment.validate())?;

        let recorded = self.report(self.insert_manual_payment(invoice_id, &payment).await)?;
        info!(
            %invoice_id,
            payment_id = %recorded.id,
            amount = recorded.amount,
            "manual payment recorded"
        );

        self.events.publish(DashboardEvent::PaymentRecorded {
            invoice_id,
            amount: recorded.amount,
        });
        self.events
            .publish(DashboardEvent::toast_success("Payment recorded"));

        self.refresh(invoice_id).await
    }

    async fn dispatch_email(&self, request: &SendInvoiceRequest) -> PaylinkResult<()> {
        let email = self
            .email
            .as_ref()
            .ok_or_else(|| PaylinkError::upstream("email", "email dispatch is not configured"))?;
        email.dispatch(request).await?;

        let mut entry = AuditLogEntry::new(request.invoice_id, AuditAction::Sent, &self.actor);
        if let Some(cc) = &request.cc {
            entry = entry.with_change("cc", None, Some(cc.clone()));
        }
        self.append_audit_after_write(entry).await;
        Ok(())
    }

    /// Email the invoice to its customer, then reconcile
    pub async fn send_invoice(&self, request: SendInvoiceRequest) -> PaylinkResult<InvoiceSnapshot> {
        let request = self.report(request.checked())?;
        self.report(self.dispatch_email(&request).await)?;

        let invoice_id = request.invoice_id;
        self.events
            .publish(DashboardEvent::InvoiceSent { invoice_id });
        self.events
            .publish(DashboardEvent::toast_success("Invoice sent"));

        self.refresh(invoice_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_payment_validation() {
        assert!(ManualPayment::new(40.0, PaymentMethod::Cash).validate().is_ok());

        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = ManualPayment::new(amount, PaymentMethod::Cash)
                .validate()
                .unwrap_err();
            assert_eq!(err.error_code(), "INVALID_AMOUNT");
        }
    }

    #[test]
    fn test_snapshot_sorts_newest_first() {
        let invoice = Invoice::draft("INV-9", Uuid::new_v4(), 100.0);
        let old = AuditLogEntry {
            created_at: Utc::now() - chrono::Duration::hours(1),
            ..AuditLogEntry::new(invoice.id, AuditAction::Created, "a")
        };
        let new = AuditLogEntry::new(invoice.id, AuditAction::Sent, "a");

        let snapshot = InvoiceSnapshot::new(invoice, vec![], vec![old, new]);
        assert_eq!(snapshot.audit_log[0].action, AuditAction::Sent);
        assert_eq!(snapshot.remaining_amount, 100.0);
        assert!(snapshot.can_edit);
    }
}
