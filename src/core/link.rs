//! Payment links as handed to the dashboard

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A minted payment URL and when it stops working
///
/// Links are ephemeral: they are derived on demand and cached client-side,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub url: String,

    #[serde(rename = "expiresAt", default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PaymentLink {
    pub fn new(url: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            url: url.into(),
            expires_at,
        }
    }

    /// Whether the link expires within `margin` of `now`
    ///
    /// Links without an expiry never do.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at.is_some_and(|exp| exp - now <= margin)
    }

    /// URL of the same link rendered inside the embedded drawer
    pub fn embed_url(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}embed=1", self.url, separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_url_appends_parameter() {
        let link = PaymentLink::new("https://pay.test/pay/1?token=abc", None);
        assert_eq!(link.embed_url(), "https://pay.test/pay/1?token=abc&embed=1");

        let link = PaymentLink::new("https://pay.test/pay/1", None);
        assert_eq!(link.embed_url(), "https://pay.test/pay/1?embed=1");
    }

    #[test]
    fn test_expires_within() {
        let now = Utc::now();
        let margin = Duration::seconds(60);

        let far = PaymentLink::new("u", Some(now + Duration::minutes(10)));
        assert!(!far.expires_within(now, margin));

        let near = PaymentLink::new("u", Some(now + Duration::seconds(30)));
        assert!(near.expires_within(now, margin));

        let past = PaymentLink::new("u", Some(now - Duration::seconds(1)));
        assert!(past.expires_within(now, margin));

        let forever = PaymentLink::new("u", None);
        assert!(!forever.expires_within(now, margin));
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::json!({
            "url": "https://pay.test/pay/1?token=abc",
            "expiresAt": "2030-01-01T00:00:00Z"
        });
        let link: PaymentLink = serde_json::from_value(json).unwrap();
        assert!(link.expires_at.is_some());

        let link: PaymentLink = serde_json::from_value(serde_json::json!({"url": "u"})).unwrap();
        assert_eq!(link.expires_at, None);
    }
}
