//! Identity Provider: turns a bearer credential into the acting user.
//!
//! Tokens are issued elsewhere. This side only verifies them.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::UnknownVariant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role { Farmer, Consumer }

impl FromStr for Role {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "farmer" => Ok(Self::Farmer),
            "consumer" => Ok(Self::Consumer),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// The authenticated user behind a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
    pub name: String,
}

impl Caller {
    pub fn is_farmer(&self) -> bool { self.role == Role::Farmer }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken,
}

pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Caller, AuthError>;
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(rename = "userID")]
    user_id: Uuid,
    role: Role,
    #[serde(default)]
    name: String,
}

/// Verifies HS256 tokens carrying `{userID, role, name, exp}`.
pub struct JwtIdentity {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentity {
    pub fn new(secret: &str) -> Self {
        Self { key: DecodingKey::from_secret(secret.as_bytes()), validation: Validation::new(Algorithm::HS256) }
    }
}

impl IdentityProvider for JwtIdentity {
    fn resolve(&self, token: &str) -> Result<Caller, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            AuthError::InvalidToken
        })?;
        let Claims { user_id, role, name } = data.claims;
        Ok(Caller { user_id, role, name })
    }
}

/// Accepts both `Bearer <token>` and a bare token.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn sign(secret: &str, claims: serde_json::Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn exp_in(secs: i64) -> i64 { chrono::Utc::now().timestamp() + secs }

    #[test]
    fn test_resolves_valid_token() {
        let id = Uuid::now_v7();
        let token = sign("secret", json!({"userID": id, "role": "farmer", "name": "Asha", "exp": exp_in(600)}));
        let caller = JwtIdentity::new("secret").resolve(&token).unwrap();
        assert_eq!(caller.user_id, id);
        assert!(caller.is_farmer());
    }

    #[test]
    fn test_rejects_wrong_secret_and_expired() {
        let id = Uuid::now_v7();
        let provider = JwtIdentity::new("secret");
        let forged = sign("other", json!({"userID": id, "role": "consumer", "exp": exp_in(600)}));
        assert_eq!(provider.resolve(&forged), Err(AuthError::InvalidToken));
        let expired = sign("secret", json!({"userID": id, "role": "consumer", "exp": exp_in(-3600)}));
        assert_eq!(provider.resolve(&expired), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
    }
}
