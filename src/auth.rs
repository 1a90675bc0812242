//! Caller identity resolution.
//!
//! Handlers never reject on their own when identity is missing: the [`Caller`]
//! extractor always succeeds and each handler decides when the check happens.

use crate::{config::AuthConfig, state::AppState};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::debug;

/// Resolves the authenticated principal for a request, if any.
pub trait IdentityProvider: Send + Sync {
    fn caller_id(&self, headers: &HeaderMap) -> Option<String>;
}

/// Session claims; only `sub` is used as the caller id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Verifies HS256 bearer tokens issued by the identity provider.
pub struct JwtIdentity {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentity {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }
}

impl IdentityProvider for JwtIdentity {
    fn caller_id(&self, headers: &HeaderMap) -> Option<String> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))?;

        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) if !data.claims.sub.is_empty() => Some(data.claims.sub),
            Ok(_) => None,
            Err(err) => {
                debug!(error = %err, "rejected bearer token");
                None
            }
        }
    }
}

/// The caller behind the current request, or `None` when unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Option<String>);

impl FromRequestParts<AppState> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Caller(state.identity.caller_id(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "unit-test-secret";

    fn identity(issuer: Option<&str>) -> JwtIdentity {
        JwtIdentity::new(&AuthConfig {
            secret: SECRET.into(),
            issuer: issuer.map(str::to_string),
        })
    }

    fn token(sub: &str, exp_offset: i64, iss: Option<&str>, secret: &str) -> String {
        let claims = Claims {
            sub: sub.into(),
            exp: chrono::Utc::now().timestamp() + exp_offset,
            iss: iss.map(str::to_string),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn valid_token_yields_subject() {
        let headers = bearer(&token("user_1", 600, None, SECRET));
        assert_eq!(identity(None).caller_id(&headers).as_deref(), Some("user_1"));
    }

    #[test]
    fn missing_or_malformed_header_yields_none() {
        assert_eq!(identity(None).caller_id(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(identity(None).caller_id(&headers), None);
    }

    #[test]
    fn expired_or_foreign_tokens_are_ignored() {
        let expired = bearer(&token("user_1", -3600, None, SECRET));
        assert_eq!(identity(None).caller_id(&expired), None);

        let forged = bearer(&token("user_1", 600, None, "someone-else"));
        assert_eq!(identity(None).caller_id(&forged), None);
    }

    #[test]
    fn issuer_is_enforced_when_configured() {
        let id = identity(Some("https://issuer.test"));
        let good = bearer(&token("user_1", 600, Some("https://issuer.test"), SECRET));
        let bad = bearer(&token("user_1", 600, Some("https://other.test"), SECRET));
        assert_eq!(id.caller_id(&good).as_deref(), Some("user_1"));
        assert_eq!(id.caller_id(&bad), None);
    }
}
