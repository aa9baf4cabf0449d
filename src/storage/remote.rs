//! The hosted backend: PostgREST-style tables and the auth user endpoint
//!
//! Rows are decoded into [`crate::core::mapping`] row types and converted to
//! entities right here, so callers only ever see domain types.

use crate::client::http::{authorize, error_from_response, join_url, transport_error};
use crate::core::auth::{AuthContext, AuthProvider};
use crate::core::entity::{AuditLogEntry, Invoice, NewPayment, Payment};
use crate::core::error::{PaylinkError, PaylinkResult};
use crate::core::mapping::{AuditLogRow, InvoiceRow, NewPaymentRow, PaymentRow};
use crate::core::store::InvoiceStore;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

const STORE: &str = "store";
const AUTH: &str = "auth";

/// Invoice store backed by the hosted REST API (`{url}/rest/v1`)
#[derive(Clone)]
pub struct RestInvoiceStore {
    client: reqwest::Client,
    rest_url: String,
    anon_key: String,
    access_token: String,
}

impl RestInvoiceStore {
    /// `access_token` is the signed-in user's session token
    pub fn new(
        backend_url: &str,
        anon_key: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            rest_url: join_url(backend_url, "rest/v1"),
            anon_key: anon_key.into(),
            access_token: access_token.into(),
        }
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> PaylinkResult<Vec<T>> {
        let request = self
            .client
            .get(join_url(&self.rest_url, table))
            .query(query);

        let response = authorize(request, &self.access_token, Some(&self.anon_key))
            .send()
            .await
            .map_err(|e| transport_error(STORE, e))?;

        if !response.status().is_success() {
            return Err(error_from_response(STORE, response).await);
        }

        response
            .json()
            .await
            .map_err(|e| PaylinkError::upstream(STORE, format!("decoding {} rows: {}", table, e)))
    }

    async fn insert<B: serde::Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> PaylinkResult<T> {
        let request = self
            .client
            .post(join_url(&self.rest_url, table))
            .header("Prefer", "return=representation")
            .json(body);

        let response = authorize(request, &self.access_token, Some(&self.anon_key))
            .send()
            .await
            .map_err(|e| transport_error(STORE, e))?;

        if !response.status().is_success() {
            return Err(error_from_response(STORE, response).await);
        }

        let mut rows: Vec<T> = response
            .json()
            .await
            .map_err(|e| PaylinkError::upstream(STORE, format!("decoding {} rows: {}", table, e)))?;

        if rows.is_empty() {
            return Err(PaylinkError::upstream(
                STORE,
                format!("insert into {} returned no row", table),
            ));
        }
        Ok(rows.swap_remove(0))
    }
}

fn eq(id: &Uuid) -> String {
    format!("eq.{}", id)
}

#[async_trait]
impl InvoiceStore for RestInvoiceStore {
    async fn get_invoice(&self, id: &Uuid) -> PaylinkResult<Option<Invoice>> {
        let rows: Vec<InvoiceRow> = self
            .select("invoices", &[("id", eq(id)), ("select", "*".to_string())])
            .await?;

        rows.into_iter().next().map(Invoice::try_from).transpose()
    }

    async fn list_payments(&self, invoice_id: &Uuid) -> PaylinkResult<Vec<Payment>> {
        let rows: Vec<PaymentRow> = self
            .select(
                "payments",
                &[
                    ("invoice_id", eq(invoice_id)),
                    ("order", "payment_date.desc".to_string()),
                ],
            )
            .await?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn list_audit_log(&self, invoice_id: &Uuid) -> PaylinkResult<Vec<AuditLogEntry>> {
        let rows: Vec<AuditLogRow> = self
            .select(
                "invoice_audit_log",
                &[
                    ("invoice_id", eq(invoice_id)),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?;

        Ok(rows.into_iter().map(AuditLogEntry::from).collect())
    }

    async fn insert_payment(&self, payment: NewPayment) -> PaylinkResult<Payment> {
        let row: PaymentRow = self
            .insert("payments", &NewPaymentRow::from(&payment))
            .await?;
        Payment::try_from(row)
    }

    async fn append_audit(&self, entry: AuditLogEntry) -> PaylinkResult<AuditLogEntry> {
        let row: AuditLogRow = self
            .insert("invoice_audit_log", &AuditLogRow::from(&entry))
            .await?;
        Ok(AuditLogEntry::from(row))
    }
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

/// Resolves bearer tokens through the hosted auth provider (`GET {url}/auth/v1/user`)
#[derive(Clone)]
pub struct RestAuthProvider {
    client: reqwest::Client,
    user_url: String,
    anon_key: String,
}

impl RestAuthProvider {
    pub fn new(backend_url: &str, anon_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            user_url: join_url(backend_url, "auth/v1/user"),
            anon_key: anon_key.into(),
        }
    }
}

#[async_trait]
impl AuthProvider for RestAuthProvider {
    async fn resolve_bearer(&self, token: &str) -> PaylinkResult<AuthContext> {
        let request = self.client.get(&self.user_url);
        let response = authorize(request, token, Some(&self.anon_key))
            .send()
            .await
            .map_err(|e| transport_error(AUTH, e))?;

        if !response.status().is_success() {
            return Err(match error_from_response(AUTH, response).await {
                PaylinkError::Unauthorized { message } => PaylinkError::Unauthorized { message },
                PaylinkError::Upstream { message, .. } => PaylinkError::Unauthorized {
                    message: if message.is_empty() {
                        "invalid token".to_string()
                    } else {
                        message
                    },
                },
                other => other,
            });
        }

        let user: AuthUser = response
            .json()
            .await
            .map_err(|e| PaylinkError::upstream(AUTH, format!("decoding user: {}", e)))?;

        Ok(AuthContext::User {
            user_id: user.id,
            email: user.email,
        })
    }
}
