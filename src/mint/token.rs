//! Payment token derivation
//!
//! A token is the fingerprint of `{invoiceId, customerId, amount, exp}`.
//! Nothing is stored: the same payload always yields the same token, and a
//! token cannot be revoked before `exp`.

use crate::config::{ConfigError, MinterConfig};
use crate::core::entity::Invoice;
use crate::core::error::{InputError, PaylinkError, PaylinkResult};
use crate::core::link::PaymentLink;
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// The fields a payment token is bound to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    pub invoice_id: Uuid,
    pub customer_id: Uuid,
    pub amount: f64,
    /// Unix seconds
    pub exp: i64,
}

impl TokenPayload {
    /// Payload expiring `ttl` after `now`
    ///
    /// Fails when `now + ttl` is past the representable date range.
    pub fn for_invoice(invoice: &Invoice, now: DateTime<Utc>, ttl: Duration) -> PaylinkResult<Self> {
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            PaylinkError::upstream("minter", format!("token lifetime {} is out of range", ttl))
        })?;

        Ok(Self {
            invoice_id: invoice.id,
            customer_id: invoice.customer_id,
            amount: invoice.amount,
            exp: expires_at.timestamp(),
        })
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// Hex fingerprint of the serialized payload
    ///
    /// Keyed with `secret` when one is given.
    pub fn fingerprint(&self, secret: Option<&str>) -> PaylinkResult<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|e| PaylinkError::upstream("minter", format!("serializing payload: {}", e)))?;

        let digest = match secret {
            Some(secret) => {
                let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                    .map_err(|e| PaylinkError::upstream("minter", e))?;
                mac.update(&bytes);
                hex::encode(mac.finalize().into_bytes())
            }
            None => hex::encode(Sha256::digest(&bytes)),
        };
        Ok(digest)
    }
}

/// Builds payment links for invoices
#[derive(Debug, Clone)]
pub struct LinkMinter {
    public_origin: Option<String>,
    ttl: Duration,
    signing_secret: Option<String>,
}

impl LinkMinter {
    pub fn new(public_origin: Option<String>, ttl: Duration, signing_secret: Option<String>) -> Self {
        Self {
            public_origin,
            ttl,
            signing_secret,
        }
    }

    pub fn from_config(config: &MinterConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.public_origin.clone(),
            config.token_ttl()?,
            config.signing_secret.clone(),
        ))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Pick the origin for the payment URL
    ///
    /// The configured origin wins over the caller's `Origin` header.
    pub fn resolve_origin(&self, request_origin: Option<&str>) -> PaylinkResult<String> {
        self.public_origin
            .as_deref()
            .or(request_origin)
            .map(|origin| origin.trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .ok_or_else(|| InputError::MissingOrigin.into())
    }

    /// Mint a link for `invoice` as of `now`
    pub fn mint(
        &self,
        invoice: &Invoice,
        request_origin: Option<&str>,
        now: DateTime<Utc>,
    ) -> PaylinkResult<PaymentLink> {
        let origin = self.resolve_origin(request_origin)?;
        let payload = TokenPayload::for_invoice(invoice, now, self.ttl)?;
        let token = payload.fingerprint(self.signing_secret.as_deref())?;

        Ok(PaymentLink::new(
            format!("{}/pay/{}?token={}", origin, invoice.id, token),
            payload.expires_at(),
        ))
    }
}

impl Default for LinkMinter {
    fn default() -> Self {
        let config = MinterConfig::default();
        Self::new(config.public_origin, Duration::days(7), config.signing_secret)
    }
}
