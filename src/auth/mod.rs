/*!
 * # Authentication Module
 *
 * Issues and validates the access tokens handed out by the demo "login as"
 * flow. Tokens are HS256 JWTs; the demo service only sees the
 * [`TokenIssuer`] trait so tests can swap in their own issuer.
 */

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::entities::erp_user;

/// Role held by the user created alongside every demo
pub const SUPPLY_CHAIN_MANAGER_ROLE: &str = "supplychainmanager";
/// Role held by users created for a retail store
pub const RETAIL_STORE_MANAGER_ROLE: &str = "retailstoremanager";

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String,           // Subject (user ID)
    pub name: Option<String>,  // Username
    pub email: Option<String>, // User's email
    pub roles: Vec<String>,    // Assigned roles
    pub demo_id: i32,          // Demo the user is scoped to
    pub jti: String,           // JWT ID
    pub iat: i64,              // Issued at time
    pub nbf: i64,              // Not valid before time
    pub exp: i64,              // Expiration time
    pub iss: String,           // Issuer
    pub aud: String,           // Audience
}

/// Access token returned by `loginAs`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    /// Signed bearer token
    pub id: String,
    /// Lifetime in seconds
    pub ttl: u64,
    pub created: DateTime<Utc>,
    pub user_id: i32,
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_audience: String,
        jwt_issuer: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            access_token_expiration,
        }
    }

    pub fn from_app_config(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_audience.clone(),
            cfg.auth_issuer.clone(),
            Duration::from_secs(cfg.access_token_ttl_secs),
        )
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Something that can mint access tokens for demo users
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue_access_token(
        &self,
        user: &erp_user::Model,
        roles: &[String],
    ) -> Result<AccessToken, AuthError>;
}

/// Authentication service that handles token issuance and validation
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &self.validation(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }
}

#[async_trait]
impl TokenIssuer for AuthService {
    async fn issue_access_token(
        &self,
        user: &erp_user::Model,
        roles: &[String],
    ) -> Result<AccessToken, AuthError> {
        let now = Utc::now();
        let ttl = self.config.access_token_expiration;
        let exp = now
            + ChronoDuration::from_std(ttl)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user.id.to_string(),
            name: Some(user.username.clone()),
            email: Some(user.email.clone()),
            roles: roles.to_vec(),
            demo_id: user.demo_id,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        debug!(user_id = user.id, jti = %claims.jti, "Issued access token");

        Ok(AccessToken {
            id: token,
            ttl: ttl.as_secs(),
            created: now,
            user_id: user.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service(ttl_secs: u64) -> AuthService {
        AuthService::new(AuthConfig::new(
            "a_sufficiently_long_signing_secret_for_tests_0123456789".into(),
            "scm-erp".into(),
            "scm-demo".into(),
            Duration::from_secs(ttl_secs),
        ))
    }

    fn user() -> erp_user::Model {
        erp_user::Model {
            id: 7,
            email: "chris.abc@acme.com".into(),
            username: "Supply Chain Manager (abc)".into(),
            password: "hash".into(),
            demo_id: 3,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn issued_token_validates_and_names_user() {
        let auth = service(1_209_600);
        let token = auth
            .issue_access_token(&user(), &[SUPPLY_CHAIN_MANAGER_ROLE.to_string()])
            .await
            .unwrap();

        assert_eq!(token.user_id, 7);
        assert_eq!(token.ttl, 1_209_600);

        let claims = auth.validate_token(&token.id).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.demo_id, 3);
        assert_eq!(claims.roles, vec![SUPPLY_CHAIN_MANAGER_ROLE.to_string()]);
        assert_eq!(claims.exp - claims.iat, 1_209_600);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let token = service(60).issue_access_token(&user(), &[]).await.unwrap();

        let other = AuthService::new(AuthConfig::new(
            "another_sufficiently_long_signing_secret_0123456789".into(),
            "scm-erp".into(),
            "scm-demo".into(),
            Duration::from_secs(60),
        ));
        assert_matches!(other.validate_token(&token.id), Err(AuthError::InvalidToken));
    }

    #[test]
    fn garbage_token_is_invalid() {
        assert_matches!(
            service(60).validate_token("not-a-jwt"),
            Err(AuthError::InvalidToken)
        );
    }
}
