use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const TOKEN_TTL_HOURS: i64 = 8;
/// Tokens from other services sharing the secret are refused.
const ISSUER: &str = "pricing-admin";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: String,
    pub email: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    fn issue(user_id: i64, role: &str, email: &str, now: DateTime<Utc>) -> Self {
        Self {
            sub: user_id,
            role: role.to_string(),
            email: email.to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        }
    }
}

pub fn sign_token(user_id: i64, role: &str, email: &str, secret: &str) -> Result<String, AppError> {
    sign_at(Claims::issue(user_id, role, email, Utc::now()), secret)
}

fn sign_at(claims: Claims, secret: &str) -> Result<String, AppError> {
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::internal(format!("Token signing failed: {e}")))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss"]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|d| d.claims)
        .map_err(|e| AppError::validation(format!("Invalid or expired token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let token = sign_token(7, "admin", "ops@example.com", "secret").unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.email, "ops@example.com");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_HOURS * 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = sign_token(7, "staff", "a@b.c", "secret").unwrap();
        assert!(verify_token(&token, "other").is_err());
        assert!(verify_token("not-a-token", "secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let issued = Utc::now() - Duration::hours(TOKEN_TTL_HOURS + 1);
        let token = sign_at(Claims::issue(7, "staff", "a@b.c", issued), "secret").unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let mut claims = Claims::issue(7, "staff", "a@b.c", Utc::now());
        claims.iss = "someone-else".into();
        let token = sign_at(claims, "secret").unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }
}
