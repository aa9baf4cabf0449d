//! Messages posted by the embedded payment frame
//!
//! The frame posts objects like `{"type": "anet/payment-complete"}`. Only
//! messages from the payment provider's origin with a known type count.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MESSAGE_PREFIX: &str = "anet/";

/// A raw cross-frame message as delivered to the parent window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMessage {
    pub origin: String,
    pub data: Value,
}

impl FrameMessage {
    pub fn new(origin: impl Into<String>, data: Value) -> Self {
        Self {
            origin: origin.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSignal {
    /// `payment-frame-ready`
    FrameReady,
    /// `payment-loading`
    Loading,
    /// `payment-fallback-opened`
    FallbackOpened,
    /// `payment-complete`
    Complete,
    /// `payment-error`
    Error { message: Option<String> },
}

fn same_origin(a: &str, b: &str) -> bool {
    a.trim_end_matches('/')
        .eq_ignore_ascii_case(b.trim_end_matches('/'))
}

impl FrameSignal {
    /// Interpret a message, or `None` if it should be ignored
    pub fn from_message(message: &FrameMessage, expected_origin: &str) -> Option<Self> {
        if !same_origin(&message.origin, expected_origin) {
            tracing::debug!(origin = %message.origin, "ignoring frame message from foreign origin");
            return None;
        }

        let kind = message
            .data
            .get("type")?
            .as_str()?
            .strip_prefix(MESSAGE_PREFIX)?;

        let signal = match kind {
            "payment-frame-ready" => FrameSignal::FrameReady,
            "payment-loading" => FrameSignal::Loading,
            "payment-fallback-opened" => FrameSignal::FallbackOpened,
            "payment-complete" => FrameSignal::Complete,
            "payment-error" => FrameSignal::Error {
                message: message
                    .data
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            _ => return None,
        };
        Some(signal)
    }

    /// Wire name without the prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameSignal::FrameReady => "payment-frame-ready",
            FrameSignal::Loading => "payment-loading",
            FrameSignal::FallbackOpened => "payment-fallback-opened",
            FrameSignal::Complete => "payment-complete",
            FrameSignal::Error { .. } => "payment-error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PROVIDER: &str = "https://pay.provider.test";

    fn msg(data: Value) -> FrameMessage {
        FrameMessage::new(PROVIDER, data)
    }

    #[test]
    fn test_recognized_types() {
        let cases = [
            ("anet/payment-frame-ready", FrameSignal::FrameReady),
            ("anet/payment-loading", FrameSignal::Loading),
            ("anet/payment-fallback-opened", FrameSignal::FallbackOpened),
            ("anet/payment-complete", FrameSignal::Complete),
            ("anet/payment-error", FrameSignal::Error { message: None }),
        ];
        for (kind, expected) in cases {
            assert_eq!(
                FrameSignal::from_message(&msg(json!({ "type": kind })), PROVIDER),
                Some(expected)
            );
        }
    }

    #[test]
    fn test_error_message_is_kept() {
        let signal = FrameSignal::from_message(
            &msg(json!({"type": "anet/payment-error", "message": "card declined"})),
            PROVIDER,
        );
        assert_eq!(
            signal,
            Some(FrameSignal::Error {
                message: Some("card declined".to_string())
            })
        );
    }

    #[test]
    fn test_unrecognized_messages_ignored() {
        for data in [
            json!({"type": "payment-complete"}),
            json!({"type": "anet/payment-refunded"}),
            json!({"type": 5}),
            json!("anet/payment-complete"),
            json!({}),
        ] {
            assert_eq!(FrameSignal::from_message(&msg(data), PROVIDER), None);
        }
    }

    #[test]
    fn test_foreign_origin_ignored() {
        let message = FrameMessage::new(
            "https://evil.test",
            json!({"type": "anet/payment-complete"}),
        );
        assert_eq!(FrameSignal::from_message(&message, PROVIDER), None);

        let message = FrameMessage::new(
            "https://PAY.provider.test/",
            json!({"type": "anet/payment-complete"}),
        );
        assert_eq!(
            FrameSignal::from_message(&message, PROVIDER),
            Some(FrameSignal::Complete)
        );
    }
}
