pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::types::{Identity, Principal, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    pub name: String,
    pub kind: TokenKind,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(principal: &Principal, kind: TokenKind, security: &SecurityConfig) -> Self {
        let now = Utc::now();
        let lifetime = match kind {
            TokenKind::Access => Duration::minutes(security.jwt_expiry_minutes),
            TokenKind::Refresh => Duration::hours(security.jwt_refresh_expiry_hours),
        };

        Self {
            sub: principal.id,
            role: principal.role.as_str().to_string(),
            name: principal.display_name.clone(),
            kind,
            iss: security.jwt_issuer.clone(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    /// The role claim must name one of the known roles.
    pub fn identity(&self) -> Result<Identity, JwtError> {
        let role = self.role.parse::<Role>().map_err(|e| JwtError::InvalidClaims(e.to_string()))?;
        Ok(Identity { user_id: self.sub, role })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Invalid JWT claims: {0}")]
    InvalidClaims(String),

    #[error("Expected a {expected:?} token")]
    WrongKind { expected: TokenKind },
}

pub fn generate_jwt(claims: &Claims, security: &SecurityConfig) -> Result<String, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    let header = Header::new(Algorithm::HS256);

    encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Validates signature, expiry, issuer and token kind.
pub fn verify_jwt(token: &str, expected: TokenKind, security: &SecurityConfig) -> Result<Claims, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[security.jwt_issuer.as_str()]);

    let claims = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?
        .claims;

    if claims.kind != expected {
        return Err(JwtError::WrongKind { expected });
    }
    Ok(claims)
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

pub fn issue_pair(principal: &Principal, security: &SecurityConfig) -> Result<TokenPair, JwtError> {
    Ok(TokenPair {
        access_token: generate_jwt(&Claims::new(principal, TokenKind::Access, security), security)?,
        refresh_token: generate_jwt(&Claims::new(principal, TokenKind::Refresh, security), security)?,
        token_type: "Bearer",
        expires_in: security.jwt_expiry_minutes * 60,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn security() -> SecurityConfig {
        let mut security = AppConfig::development().security;
        security.jwt_secret = "test-secret".to_string();
        security
    }

    #[test]
    fn access_token_round_trip_yields_identity() {
        let security = security();
        let principal = Principal::new(Uuid::new_v4(), Role::Moderator, "Mia");
        let token = generate_jwt(&Claims::new(&principal, TokenKind::Access, &security), &security).unwrap();

        let claims = verify_jwt(&token, TokenKind::Access, &security).unwrap();
        let identity = claims.identity().unwrap();
        assert_eq!(identity.user_id, principal.id);
        assert_eq!(identity.role, Role::Moderator);
    }

    #[test]
    fn refresh_token_is_not_accepted_as_access() {
        let security = security();
        let principal = Principal::new(Uuid::new_v4(), Role::User, "Leo");
        let pair = issue_pair(&principal, &security).unwrap();
        assert!(matches!(
            verify_jwt(&pair.refresh_token, TokenKind::Access, &security),
            Err(JwtError::WrongKind { .. })
        ));
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let security = security();
        let mut other = security.clone();
        other.jwt_issuer = "someone-else".to_string();
        let principal = Principal::new(Uuid::new_v4(), Role::User, "Leo");
        let token = generate_jwt(&Claims::new(&principal, TokenKind::Access, &other), &other).unwrap();
        assert!(verify_jwt(&token, TokenKind::Access, &security).is_err());
    }

    #[test]
    fn missing_secret_fails_generation() {
        let security = AppConfig::development().security;
        let principal = Principal::new(Uuid::new_v4(), Role::User, "Leo");
        assert!(matches!(
            generate_jwt(&Claims::new(&principal, TokenKind::Access, &security), &security),
            Err(JwtError::InvalidSecret)
        ));
    }
}
