//! Identity verification.
//!
//! The platform's real identity provider lives upstream; from this
//! service's point of view it is an opaque capability: hand it the request
//! headers, get back a stable external user id (or nothing). The trait
//! keeps handlers testable; the production implementation is a static
//! bearer-token map loaded from configuration.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

/// Resolves an inbound request to a stable external user identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Return the external identity for this request, or `None` if the
    /// request carries no (or an unrecognized) credential.
    async fn verify(&self, headers: &HeaderMap) -> Option<String>;
}

/// Bearer-token verifier backed by a static token → user-id map.
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    /// Parse `token:userId` pairs (comma separated) from configuration.
    /// Malformed pairs are skipped.
    pub fn from_config(raw: &SecretString) -> Self {
        let tokens = raw
            .expose_secret()
            .split(',')
            .filter_map(|pair| {
                let (token, user_id) = pair.trim().split_once(':')?;
                if token.is_empty() || user_id.is_empty() {
                    return None;
                }
                Some((token.to_string(), user_id.to_string()))
            })
            .collect();
        Self { tokens }
    }

    /// Build from explicit pairs (tests).
    pub fn with_tokens(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            tokens: pairs.into_iter().collect(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, headers: &HeaderMap) -> Option<String> {
        let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let token = header.strip_prefix("Bearer ")?;
        match self.tokens.get(token) {
            Some(user_id) => Some(user_id.clone()),
            None => {
                debug!("Rejected unknown bearer token");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[tokio::test]
    async fn resolves_known_token() {
        let verifier = StaticTokenVerifier::with_tokens([("tok1".into(), "user_a".into())]);
        let id = verifier.verify(&headers_with("Bearer tok1")).await;
        assert_eq!(id.as_deref(), Some("user_a"));
    }

    #[tokio::test]
    async fn rejects_unknown_token() {
        let verifier = StaticTokenVerifier::with_tokens([("tok1".into(), "user_a".into())]);
        assert!(verifier.verify(&headers_with("Bearer nope")).await.is_none());
    }

    #[tokio::test]
    async fn rejects_missing_header() {
        let verifier = StaticTokenVerifier::with_tokens([("tok1".into(), "user_a".into())]);
        assert!(verifier.verify(&HeaderMap::new()).await.is_none());
    }

    #[tokio::test]
    async fn rejects_non_bearer_scheme() {
        let verifier = StaticTokenVerifier::with_tokens([("tok1".into(), "user_a".into())]);
        assert!(verifier.verify(&headers_with("Basic tok1")).await.is_none());
    }

    #[test]
    fn from_config_skips_malformed_pairs() {
        let raw = SecretString::from("tok1:user_a, bad, :x, tok2:user_b,");
        let verifier = StaticTokenVerifier::from_config(&raw);
        assert_eq!(verifier.tokens.len(), 2);
        assert_eq!(verifier.tokens["tok2"], "user_b");
    }
}
