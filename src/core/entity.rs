//! Domain entities: invoices, line items, payments and audit log entries
//!
//! These are the internal shapes. Rows coming from the hosted store are
//! converted into them by [`crate::core::mapping`], never deserialized directly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Invoice lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Partial,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Partial => "partial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(InvoiceStatus::Draft),
            "sent" => Some(InvoiceStatus::Sent),
            "paid" => Some(InvoiceStatus::Paid),
            "overdue" => Some(InvoiceStatus::Overdue),
            "partial" => Some(InvoiceStatus::Partial),
            _ => None,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amounts closer than half a cent are treated as equal
pub const AMOUNT_TOLERANCE: f64 = 0.005;

/// How the tax of a line item is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxType {
    /// `tax_rate` is a percentage of quantity × rate
    #[default]
    Percentage,
    /// `tax_rate` is an absolute amount
    Fixed,
}

/// A single billable line on an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub rate: f64,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub tax_type: TaxType,
}

impl LineItem {
    pub fn subtotal(&self) -> f64 {
        self.quantity * self.rate
    }

    pub fn tax(&self) -> f64 {
        match self.tax_type {
            TaxType::Percentage => self.subtotal() * self.tax_rate / 100.0,
            TaxType::Fixed => self.tax_rate,
        }
    }

    /// quantity × rate + tax
    pub fn amount(&self) -> f64 {
        self.subtotal() + self.tax()
    }
}

/// Whether a customer may pay less than the remaining balance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialPaymentPolicy {
    pub allowed: bool,
    pub minimum_amount: Option<f64>,
}

impl PartialPaymentPolicy {
    /// Check a payment amount against the policy and the remaining balance
    ///
    /// Paying the full remaining balance is always accepted.
    pub fn accepts(&self, amount: f64, remaining: f64) -> bool {
        if remaining - amount < AMOUNT_TOLERANCE {
            return true;
        }
        if !self.allowed {
            return false;
        }
        self.minimum_amount.is_none_or(|min| amount >= min)
    }
}

/// A billing document owed by a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub number: String,
    pub customer_id: Uuid,
    pub customer_name: Option<String>,
    pub amount: f64,
    pub paid_amount: f64,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub items: Vec<LineItem>,
    pub notes: Option<String>,
    pub partial_payment: PartialPaymentPolicy,
}

impl Invoice {
    /// Create a draft invoice with nothing paid
    pub fn draft(number: impl Into<String>, customer_id: Uuid, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            number: number.into(),
            customer_id,
            customer_name: None,
            amount,
            paid_amount: 0.0,
            issue_date: None,
            due_date: None,
            status: InvoiceStatus::Draft,
            items: Vec::new(),
            notes: None,
            partial_payment: PartialPaymentPolicy::default(),
        }
    }

    /// `max(0, amount - paid_amount)`, with sub-cent leftovers reading as zero
    pub fn remaining_amount(&self) -> f64 {
        let remaining = self.amount - self.paid_amount;
        if remaining < AMOUNT_TOLERANCE {
            0.0
        } else {
            remaining
        }
    }

    /// Whether paying `amount` would go past the remaining balance by a cent or more
    pub fn exceeds_remaining(&self, amount: f64) -> bool {
        amount - self.remaining_amount() > AMOUNT_TOLERANCE
    }

    /// Invoices can only be edited until the first payment lands
    pub fn can_edit(&self) -> bool {
        self.paid_amount == 0.0
    }

    pub fn is_draft(&self) -> bool {
        self.status == InvoiceStatus::Draft
    }

    pub fn items_total(&self) -> f64 {
        self.items.iter().map(LineItem::amount).sum()
    }

    /// Status as a viewer on `today` should see it
    ///
    /// Outstanding invoices past their due date read as overdue.
    pub fn effective_status(&self, today: NaiveDate) -> InvoiceStatus {
        match (self.status, self.due_date) {
            (InvoiceStatus::Sent | InvoiceStatus::Partial, Some(due)) if due < today => {
                InvoiceStatus::Overdue
            }
            (status, _) => status,
        }
    }

    /// Status an invoice settles into after its paid amount changed
    pub fn status_for_paid_amount(&self) -> InvoiceStatus {
        if self.amount > 0.0 && self.amount - self.paid_amount < AMOUNT_TOLERANCE {
            InvoiceStatus::Paid
        } else if self.paid_amount > 0.0 {
            InvoiceStatus::Partial
        } else {
            self.status
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    Cash,
    Check,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Check => "check",
            PaymentMethod::Other => "other",
        }
    }

    /// Unknown methods recorded by other writers read as `Other`
    pub fn parse(s: &str) -> Self {
        match s {
            "card" | "credit_card" => PaymentMethod::Card,
            "bank_transfer" | "ach" => PaymentMethod::BankTransfer,
            "cash" => PaymentMethod::Cash,
            "check" => PaymentMethod::Check,
            _ => PaymentMethod::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "completed" | "succeeded" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// A recorded payment. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount: f64,
    pub method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
    pub status: PaymentStatus,
    pub reference: Option<String>,
}

/// Payment about to be inserted; the store assigns the id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPayment {
    pub invoice_id: Uuid,
    pub amount: f64,
    pub method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
    pub status: PaymentStatus,
    pub reference: Option<String>,
}

/// Action recorded in the audit log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditAction {
    Created,
    Updated,
    Sent,
    ManualPayment,
    PaymentReceived,
    PaymentLinkCreated,
    StatusChanged,
    Other(String),
}

impl AuditAction {
    pub fn as_str(&self) -> &str {
        match self {
            AuditAction::Created => "created",
            AuditAction::Updated => "updated",
            AuditAction::Sent => "sent",
            AuditAction::ManualPayment => "manual_payment",
            AuditAction::PaymentReceived => "payment_received",
            AuditAction::PaymentLinkCreated => "payment_link_created",
            AuditAction::StatusChanged => "status_changed",
            AuditAction::Other(tag) => tag,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "created" => AuditAction::Created,
            "updated" => AuditAction::Updated,
            "sent" => AuditAction::Sent,
            "manual_payment" => AuditAction::ManualPayment,
            "payment_received" => AuditAction::PaymentReceived,
            "payment_link_created" => AuditAction::PaymentLinkCreated,
            "status_changed" => AuditAction::StatusChanged,
            other => AuditAction::Other(other.to_string()),
        }
    }
}

impl Serialize for AuditAction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AuditAction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(AuditAction::parse(&tag))
    }
}

/// Immutable record of an action taken against an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub action: AuditAction,
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(invoice_id: Uuid, action: AuditAction, actor: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            invoice_id,
            action,
            field: None,
            old_value: None,
            new_value: None,
            actor: actor.into(),
            created_at: Utc::now(),
        }
    }

    /// Attach a field diff
    pub fn with_change(
        mut self,
        field: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        self.field = Some(field.into());
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }
}
