//! Bearer-credential resolution
//!
//! The hosted auth provider owns sessions and passwords. All we need from it
//! is "which user does this bearer token belong to", expressed by
//! [`AuthProvider`].

use crate::core::error::{PaylinkError, PaylinkResult};
use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Authorization context resolved from a request
#[derive(Debug, Clone, PartialEq)]
pub enum AuthContext {
    /// Authenticated dashboard user
    User { user_id: Uuid, email: Option<String> },

    /// No credential presented
    Anonymous,
}

impl AuthContext {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::User { user_id, .. } => Some(*user_id),
            AuthContext::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, AuthContext::Anonymous)
    }

    /// Name recorded as the actor of audit entries
    pub fn actor(&self) -> String {
        match self {
            AuthContext::User {
                email: Some(email), ..
            } => email.clone(),
            AuthContext::User { user_id, .. } => user_id.to_string(),
            AuthContext::Anonymous => "anonymous".to_string(),
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Trait for auth providers
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve a bearer token to a user
    ///
    /// Fails with `Unauthorized` when the token is unknown or expired.
    async fn resolve_bearer(&self, token: &str) -> PaylinkResult<AuthContext>;
}

/// Resolve the credential carried by a request
pub async fn authenticate(
    provider: &dyn AuthProvider,
    headers: &HeaderMap,
) -> PaylinkResult<AuthContext> {
    let token = bearer_token(headers).ok_or_else(|| PaylinkError::Unauthorized {
        message: "missing bearer token".to_string(),
    })?;

    let context = provider.resolve_bearer(token).await?;
    if !context.is_authenticated() {
        return Err(PaylinkError::Unauthorized {
            message: "token does not belong to a user".to_string(),
        });
    }
    Ok(context)
}

/// Token table kept in memory (for tests and development)
#[derive(Clone, Default)]
pub struct StaticTokenAuthProvider {
    tokens: Arc<RwLock<HashMap<String, AuthContext>>>,
}

impl StaticTokenAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for a user
    pub fn with_user(self, token: impl Into<String>, user_id: Uuid, email: Option<&str>) -> Self {
        self.insert(token, user_id, email);
        self
    }

    pub fn insert(&self, token: impl Into<String>, user_id: Uuid, email: Option<&str>) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(
                token.into(),
                AuthContext::User {
                    user_id,
                    email: email.map(str::to_string),
                },
            );
        }
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuthProvider {
    async fn resolve_bearer(&self, token: &str) -> PaylinkResult<AuthContext> {
        let tokens = self
            .tokens
            .read()
            .map_err(|e| PaylinkError::upstream("auth", format!("lock poisoned: {}", e)))?;

        tokens
            .get(token)
            .cloned()
            .ok_or_else(|| PaylinkError::Unauthorized {
                message: "invalid token".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers_with("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers_with("bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers_with("Basic abc123")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_actor_prefers_email() {
        let id = Uuid::new_v4();
        let ctx = AuthContext::User {
            user_id: id,
            email: Some("owner@shop.test".into()),
        };
        assert_eq!(ctx.actor(), "owner@shop.test");

        let ctx = AuthContext::User {
            user_id: id,
            email: None,
        };
        assert_eq!(ctx.actor(), id.to_string());
    }

    #[tokio::test]
    async fn test_static_provider_resolves_known_tokens() {
        let user_id = Uuid::new_v4();
        let provider = StaticTokenAuthProvider::new().with_user("t0k", user_id, None);

        let ctx = authenticate(&provider, &headers_with("Bearer t0k"))
            .await
            .unwrap();
        assert_eq!(ctx.user_id(), Some(user_id));

        let err = authenticate(&provider, &headers_with("Bearer nope"))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHORIZED");

        let err = authenticate(&provider, &HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHORIZED");
    }
}
