//! Invoice email dispatch
//!
//! Delivery itself happens in a hosted function; the dashboard only asks for
//! it and reports the outcome.

use super::http::{authorize, error_from_response, join_url, transport_error};
use crate::core::error::{InputError, PaylinkError, PaylinkResult};
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

const SERVICE: &str = "send-invoice-email";

/// Body of the email function: `{invoiceId, note?, cc?}`
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendInvoiceRequest {
    pub invoice_id: Uuid,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub note: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub cc: Option<String>,
}

impl SendInvoiceRequest {
    pub fn new(invoice_id: Uuid) -> Self {
        Self {
            invoice_id,
            note: None,
            cc: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_cc(mut self, cc: impl Into<String>) -> Self {
        self.cc = Some(cc.into());
        self
    }

    /// Validate, blanking out empty optional fields first
    pub fn checked(mut self) -> PaylinkResult<Self> {
        self.note = self.note.filter(|n| !n.trim().is_empty());
        self.cc = self
            .cc
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        self.validate().map_err(|errors| {
            let field = errors
                .field_errors()
                .keys()
                .next()
                .map(|k| k.to_string())
                .unwrap_or_else(|| "request".to_string());
            PaylinkError::from(InputError::Field {
                field,
                message: "is invalid".to_string(),
            })
        })?;
        Ok(self)
    }
}

#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    /// Ask for the invoice email to be sent
    async fn dispatch(&self, request: &SendInvoiceRequest) -> PaylinkResult<()>;
}

/// Email function reached over HTTP at `{functions_url}/send-invoice-email`
#[derive(Clone)]
pub struct HttpEmailDispatcher {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    anon_key: Option<String>,
}

impl HttpEmailDispatcher {
    pub fn new(functions_url: &str, access_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: join_url(functions_url, SERVICE),
            access_token: access_token.into(),
            anon_key: None,
        }
    }

    pub fn with_anon_key(mut self, anon_key: impl Into<String>) -> Self {
        self.anon_key = Some(anon_key.into());
        self
    }
}

#[async_trait]
impl EmailDispatcher for HttpEmailDispatcher {
    async fn dispatch(&self, request: &SendInvoiceRequest) -> PaylinkResult<()> {
        let builder = self.client.post(&self.endpoint).json(request);
        let response = authorize(builder, &self.access_token, self.anon_key.as_deref())
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(error_from_response(SERVICE, response).await);
        }

        tracing::info!(invoice_id = %request.invoice_id, "invoice email dispatched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(SendInvoiceRequest::new(id).with_note("Thanks!")).unwrap();
        assert_eq!(json["invoiceId"], id.to_string());
        assert_eq!(json["note"], "Thanks!");
        assert!(json.get("cc").is_none());
    }

    #[test]
    fn test_invalid_cc_rejected() {
        let err = SendInvoiceRequest::new(Uuid::new_v4())
            .with_cc("not-an-address")
            .checked()
            .unwrap_err();
        assert_eq!(
            err,
            PaylinkError::InvalidInput(InputError::Field {
                field: "cc".to_string(),
                message: "is invalid".to_string()
            })
        );
    }

    #[test]
    fn test_blank_fields_are_dropped() {
        let request = SendInvoiceRequest::new(Uuid::new_v4())
            .with_cc("  ")
            .with_note("")
            .checked()
            .unwrap();
        assert_eq!(request.cc, None);
        assert_eq!(request.note, None);

        let request = SendInvoiceRequest::new(Uuid::new_v4())
            .with_cc(" books@acme.test ")
            .checked()
            .unwrap();
        assert_eq!(request.cc.as_deref(), Some("books@acme.test"));
    }

    #[test]
    fn test_overlong_note_rejected() {
        let err = SendInvoiceRequest::new(Uuid::new_v4())
            .with_note("x".repeat(2001))
            .checked()
            .unwrap_err();
        assert!(err.is_local());
    }
}
