//! Row adapters between the hosted store and the domain entities
//!
//! The store hands back snake_case rows whose JSON columns were written by
//! several clients over time, so line items may use either naming convention.
//! All of that is absorbed here; nothing else in the crate sees a row.

use crate::core::entity::{
    AuditAction, AuditLogEntry, Invoice, InvoiceStatus, LineItem, NewPayment,
    PartialPaymentPolicy, Payment, PaymentMethod, PaymentStatus, TaxType,
};
use crate::core::error::PaylinkError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const STORE: &str = "store";

/// `invoices` table row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub invoice_number: String,
    pub customer_id: Uuid,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub paid_amount: Option<f64>,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub status: String,
    #[serde(default)]
    pub items: Vec<LineItemRow>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub allow_partial_payment: Option<bool>,
    #[serde(default)]
    pub minimum_partial_amount: Option<f64>,
}

/// Element of the `items` JSON column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemRow {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default, alias = "price", alias = "unitPrice")]
    pub rate: f64,
    #[serde(default, alias = "taxRate", alias = "tax")]
    pub tax_rate: Option<f64>,
    #[serde(default, alias = "taxType")]
    pub tax_type: Option<String>,
}

/// `payments` table row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRow {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount: f64,
    pub payment_method: String,
    pub payment_date: DateTime<Utc>,
    pub status: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Insert body for the `payments` table
#[derive(Debug, Clone, Serialize)]
pub struct NewPaymentRow {
    pub invoice_id: Uuid,
    pub amount: f64,
    pub payment_method: String,
    pub payment_date: DateTime<Utc>,
    pub status: String,
    pub transaction_id: Option<String>,
}

/// `invoice_audit_log` table row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogRow {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub action: String,
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default)]
    pub old_value: Option<String>,
    #[serde(default)]
    pub new_value: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = PaylinkError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        let status = InvoiceStatus::parse(&row.status).ok_or_else(|| {
            PaylinkError::upstream(
                STORE,
                format!("invoice {} has unknown status '{}'", row.id, row.status),
            )
        })?;

        let paid_amount = row.paid_amount.unwrap_or(0.0);
        if paid_amount > row.amount {
            tracing::warn!(
                invoice_id = %row.id,
                amount = row.amount,
                paid_amount,
                "store returned an overpaid invoice"
            );
        }

        Ok(Invoice {
            id: row.id,
            number: row.invoice_number,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            amount: row.amount,
            paid_amount,
            issue_date: row.issue_date,
            due_date: row.due_date,
            status,
            items: row.items.into_iter().map(LineItem::from).collect(),
            notes: row.notes,
            partial_payment: PartialPaymentPolicy {
                allowed: row.allow_partial_payment.unwrap_or(false),
                minimum_amount: row.minimum_partial_amount,
            },
        })
    }
}

impl From<LineItemRow> for LineItem {
    fn from(row: LineItemRow) -> Self {
        let tax_type = match row.tax_type.as_deref() {
            Some("fixed") | Some("flat") => TaxType::Fixed,
            _ => TaxType::Percentage,
        };
        LineItem {
            description: row.description,
            quantity: row.quantity,
            rate: row.rate,
            tax_rate: row.tax_rate.unwrap_or(0.0),
            tax_type,
        }
    }
}

impl TryFrom<PaymentRow> for Payment {
    type Error = PaylinkError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = PaymentStatus::parse(&row.status).ok_or_else(|| {
            PaylinkError::upstream(
                STORE,
                format!("payment {} has unknown status '{}'", row.id, row.status),
            )
        })?;

        Ok(Payment {
            id: row.id,
            invoice_id: row.invoice_id,
            amount: row.amount,
            method: PaymentMethod::parse(&row.payment_method),
            paid_at: row.payment_date,
            status,
            reference: row.transaction_id,
        })
    }
}

impl From<&NewPayment> for NewPaymentRow {
    fn from(payment: &NewPayment) -> Self {
        NewPaymentRow {
            invoice_id: payment.invoice_id,
            amount: payment.amount,
            payment_method: payment.method.as_str().to_string(),
            payment_date: payment.paid_at,
            status: payment.status.as_str().to_string(),
            transaction_id: payment.reference.clone(),
        }
    }
}

impl From<AuditLogRow> for AuditLogEntry {
    fn from(row: AuditLogRow) -> Self {
        AuditLogEntry {
            id: row.id,
            invoice_id: row.invoice_id,
            action: AuditAction::parse(&row.action),
            field: row.field_name,
            old_value: row.old_value,
            new_value: row.new_value,
            actor: row.user_email.unwrap_or_else(|| "system".to_string()),
            created_at: row.created_at,
        }
    }
}

impl From<&AuditLogEntry> for AuditLogRow {
    fn from(entry: &AuditLogEntry) -> Self {
        AuditLogRow {
            id: entry.id,
            invoice_id: entry.invoice_id,
            action: entry.action.as_str().to_string(),
            field_name: entry.field.clone(),
            old_value: entry.old_value.clone(),
            new_value: entry.new_value.clone(),
            user_email: Some(entry.actor.clone()),
            created_at: entry.created_at,
        }
    }
}
