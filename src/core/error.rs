//! Typed error handling for paylink
//!
//! Every operation in the crate (minting, link caching, drawer signals,
//! reconciliation) fails with a [`PaylinkError`]. The categories follow the
//! failure modes of the payment-link flow:
//!
//! - `Unauthorized`: missing or unresolvable bearer credential
//! - `NotFound`: the referenced invoice does not exist
//! - `InvalidInput`: the caller supplied something we refuse locally
//! - `Upstream`: the data store, a hosted function or the auth provider failed
//!
//! # Example
//!
//! ```rust,ignore
//! match cache.ensure_link(&invoice, false).await {
//!     Ok(link) => println!("share {}", link.url),
//!     Err(PaylinkError::InvalidInput(InputError::DraftInvoice)) => {
//!         println!("send it first");
//!     }
//!     Err(e) => eprintln!("{}", e.user_message()),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Message shown when a failure carries nothing a user can act on
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// The main error type for paylink
#[derive(Debug, Clone, PartialEq)]
pub enum PaylinkError {
    /// Missing or invalid bearer credential
    Unauthorized { message: String },

    /// A referenced record does not exist
    NotFound { entity_type: String, id: Uuid },

    /// Input rejected before reaching any collaborator
    InvalidInput(InputError),

    /// Data store, hosted function or auth provider failure
    Upstream { service: String, message: String },
}

/// Input errors raised locally
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    /// Mint request without an invoice id
    MissingInvoiceId,

    /// Invoice id that is not a UUID
    MalformedInvoiceId { value: String },

    /// Payment links are only available once the invoice has been sent
    DraftInvoice,

    /// Payment amount that is zero, negative or not a finite number
    NonPositiveAmount { amount: f64 },

    /// Request has no origin to build the payment URL from
    MissingOrigin,

    /// Generic field-level failure
    Field { field: String, message: String },
}

pub type PaylinkResult<T> = Result<T, PaylinkError>;

impl fmt::Display for PaylinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaylinkError::Unauthorized { message } => write!(f, "Unauthorized: {}", message),
            PaylinkError::NotFound { entity_type, id } => {
                write!(f, "{} with id '{}' not found", entity_type, id)
            }
            PaylinkError::InvalidInput(e) => write!(f, "{}", e),
            PaylinkError::Upstream { service, message } => {
                write!(f, "{} request failed: {}", service, message)
            }
        }
    }
}

impl std::error::Error for PaylinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PaylinkError::InvalidInput(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::MissingInvoiceId => write!(f, "invoiceId is required"),
            InputError::MalformedInvoiceId { value } => {
                write!(f, "invoiceId '{}' is not a valid id", value)
            }
            InputError::DraftInvoice => {
                write!(f, "Send the invoice before sharing a payment link.")
            }
            InputError::NonPositiveAmount { .. } => {
                write!(f, "Enter a payment amount greater than zero.")
            }
            InputError::MissingOrigin => {
                write!(f, "Cannot build a payment URL without an origin")
            }
            InputError::Field { field, message } => write!(f, "{}: {}", field, message),
        }
    }
}

impl std::error::Error for InputError {}

impl From<InputError> for PaylinkError {
    fn from(err: InputError) -> Self {
        PaylinkError::InvalidInput(err)
    }
}

impl PaylinkError {
    /// Shorthand for an invoice that could not be found
    pub fn invoice_not_found(id: Uuid) -> Self {
        PaylinkError::NotFound {
            entity_type: "invoice".to_string(),
            id,
        }
    }

    /// Shorthand for an upstream failure
    pub fn upstream(service: impl Into<String>, message: impl fmt::Display) -> Self {
        PaylinkError::Upstream {
            service: service.into(),
            message: message.to_string(),
        }
    }

    /// Semantic HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaylinkError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            PaylinkError::NotFound { .. } => StatusCode::NOT_FOUND,
            PaylinkError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PaylinkError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            PaylinkError::Unauthorized { .. } => "UNAUTHORIZED",
            PaylinkError::NotFound { .. } => "NOT_FOUND",
            PaylinkError::InvalidInput(e) => match e {
                InputError::MissingInvoiceId | InputError::MalformedInvoiceId { .. } => {
                    "INVALID_INVOICE_ID"
                }
                InputError::DraftInvoice => "INVOICE_NOT_SENT",
                InputError::NonPositiveAmount { .. } => "INVALID_AMOUNT",
                InputError::MissingOrigin => "MISSING_ORIGIN",
                InputError::Field { .. } => "INVALID_INPUT",
            },
            PaylinkError::Upstream { .. } => "UPSTREAM_FAILURE",
        }
    }

    /// Text suitable for a toast
    ///
    /// Upstream failures with an empty message fall back to a generic text.
    pub fn user_message(&self) -> String {
        match self {
            PaylinkError::Upstream { message, .. } if message.trim().is_empty() => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            PaylinkError::Upstream { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this error came from local validation (no collaborator was called)
    pub fn is_local(&self) -> bool {
        matches!(self, PaylinkError::InvalidInput(_))
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
        }
    }
}

/// Wire shape of an error returned by the hosted functions
#[derive(Debug, Clone, Serialize, serde::Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for PaylinkError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self.to_response())).into_response()
    }
}
