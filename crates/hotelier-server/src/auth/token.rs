//! Stateless bearer tokens.
//!
//! Tokens are HS256 JWTs carrying the subject id and role. Nothing is stored
//! server-side, so a token stays valid until it expires; logging out does not
//! revoke it.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::Role;

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// The caller resolved from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins may act on anyone's resources, users only on their own.
    pub fn ensure_owner(&self, user_id: &str) -> AppResult<()> {
        if self.is_admin() || self.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Signature failure, expiry and malformed input are deliberately not told apart.
#[derive(Debug, thiserror::Error)]
#[error("invalid token")]
pub struct InvalidToken;

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user_id: &str, role: Role) -> AppResult<String> {
        self.issue_at(user_id, role, Utc::now())
    }

    fn issue_at(&self, user_id: &str, role: Role, issued_at: DateTime<Utc>) -> AppResult<String> {
        let claims = Claims {
            user_id: user_id.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Identity, InvalidToken> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| InvalidToken)?;
        Ok(Identity {
            user_id: data.claims.user_id,
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> TokenService {
        TokenService::new("test-secret-key-for-hotelier-tests")
    }

    #[test]
    fn test_issue_then_verify_round_trips_identity() {
        let tokens = service();
        let token = tokens.issue("user-1", Role::Admin).unwrap();
        let identity = tokens.verify(&token).unwrap();
        assert_eq!(
            identity,
            Identity {
                user_id: "user-1".into(),
                role: Role::Admin
            }
        );
    }

    #[test]
    fn test_token_is_valid_just_before_expiry() {
        let tokens = service();
        let issued = Utc::now() - Duration::hours(TOKEN_TTL_HOURS) + Duration::minutes(1);
        let token = tokens.issue_at("user-1", Role::User, issued).unwrap();
        assert!(tokens.verify(&token).is_ok());
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let tokens = service();
        let issued = Utc::now() - Duration::hours(TOKEN_TTL_HOURS) - Duration::minutes(1);
        let token = tokens.issue_at("user-1", Role::User, issued).unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_invalid() {
        let token = TokenService::new("some-other-secret")
            .issue("user-1", Role::Admin)
            .unwrap();
        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn test_malformed_token_is_invalid() {
        assert!(service().verify("not.a.token").is_err());
        assert!(service().verify("").is_err());
    }

    #[test]
    fn test_unknown_or_missing_role_claim_is_invalid() {
        let tokens = service();
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        for claims in [
            json!({"userId": "u1", "role": "Admin", "iat": 0, "exp": exp}),
            json!({"userId": "u1", "role": "ADMIN", "iat": 0, "exp": exp}),
            json!({"userId": "u1", "iat": 0, "exp": exp}),
        ] {
            let token = encode(&Header::default(), &claims, &tokens.encoding_key).unwrap();
            assert!(tokens.verify(&token).is_err(), "accepted {claims}");
        }
    }

    #[test]
    fn test_ensure_owner() {
        let user = Identity {
            user_id: "u1".into(),
            role: Role::User,
        };
        let admin = Identity {
            user_id: "a1".into(),
            role: Role::Admin,
        };
        assert!(user.ensure_owner("u1").is_ok());
        assert!(matches!(user.ensure_owner("u2"), Err(AppError::Forbidden)));
        assert!(admin.ensure_owner("u2").is_ok());
    }
}
