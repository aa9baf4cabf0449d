//! Calling the token minter from the dashboard

use super::http::{authorize, error_from_response, join_url, transport_error};
use crate::core::error::{PaylinkError, PaylinkResult};
use crate::core::link::PaymentLink;
use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

const SERVICE: &str = "mint-payment-token";

/// Anything that can mint a payment link for an invoice
#[async_trait]
pub trait TokenMinter: Send + Sync {
    async fn mint(&self, invoice_id: Uuid) -> PaylinkResult<PaymentLink>;
}

/// Minter reached over HTTP at `{functions_url}/mint-payment-token`
#[derive(Clone)]
pub struct HttpTokenMinter {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    anon_key: Option<String>,
}

impl HttpTokenMinter {
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

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl TokenMinter for HttpTokenMinter {
    async fn mint(&self, invoice_id: Uuid) -> PaylinkResult<PaymentLink> {
        let request = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "invoiceId": invoice_id }));

        let response = authorize(request, &self.access_token, self.anon_key.as_deref())
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(error_from_response(SERVICE, response).await);
        }

        let link: PaymentLink = response
            .json()
            .await
            .map_err(|e| PaylinkError::upstream(SERVICE, format!("unexpected response: {}", e)))?;

        tracing::debug!(%invoice_id, expires_at = ?link.expires_at, "received payment link");
        Ok(link)
    }
}
