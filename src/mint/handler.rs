//! HTTP handler for `POST /mint-payment-token`
//!
//! Every failure is answered with `400 {"error": "..."}`; the dashboard only
//! looks at the message.

use super::token::LinkMinter;
use crate::core::auth::{self, AuthProvider};
use crate::core::error::{InputError, PaylinkError, PaylinkResult};
use crate::core::link::PaymentLink;
use crate::core::store::InvoiceStore;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// State shared by every mint request. Immutable after startup.
#[derive(Clone)]
pub struct MintState {
    pub store: Arc<dyn InvoiceStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub minter: Arc<LinkMinter>,
}

/// Mint error rendered as `400 {error}`
#[derive(Debug)]
pub struct MintFailure(pub PaylinkError);

impl From<PaylinkError> for MintFailure {
    fn from(err: PaylinkError) -> Self {
        MintFailure(err)
    }
}

impl IntoResponse for MintFailure {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self.0.to_response())).into_response()
    }
}

/// Read `invoiceId` out of the request body
pub fn parse_invoice_id(body: &[u8]) -> PaylinkResult<Uuid> {
    if body.is_empty() {
        return Err(InputError::MissingInvoiceId.into());
    }

    let payload: Value = serde_json::from_slice(body).map_err(|e| InputError::Field {
        field: "body".to_string(),
        message: format!("invalid JSON: {}", e),
    })?;

    let raw = match payload.get("invoiceId") {
        None | Some(Value::Null) => return Err(InputError::MissingInvoiceId.into()),
        Some(Value::String(s)) if s.trim().is_empty() => {
            return Err(InputError::MissingInvoiceId.into());
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    Uuid::parse_str(raw.trim()).map_err(|_| InputError::MalformedInvoiceId { value: raw }.into())
}

async fn mint(state: &MintState, headers: &HeaderMap, body: &[u8]) -> PaylinkResult<PaymentLink> {
    let caller = auth::authenticate(state.auth.as_ref(), headers).await?;
    let invoice_id = parse_invoice_id(body)?;

    let invoice = state
        .store
        .get_invoice(&invoice_id)
        .await?
        .ok_or_else(|| PaylinkError::invoice_not_found(invoice_id))?;

    let request_origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok());

    let link = state.minter.mint(&invoice, request_origin, Utc::now())?;

    info!(
        invoice_id = %invoice.id,
        caller = %caller.actor(),
        expires_at = ?link.expires_at,
        "minted payment link"
    );

    Ok(link)
}

/// `POST /mint-payment-token`
pub async fn mint_payment_token(
    State(state): State<MintState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PaymentLink>, MintFailure> {
    match mint(&state, &headers, &body).await {
        Ok(link) => Ok(Json(link)),
        Err(err) => {
            warn!(code = err.error_code(), error = %err, "payment link mint failed");
            Err(err.into())
        }
    }
}

/// `OPTIONS /mint-payment-token`: 200 with an empty body
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}
