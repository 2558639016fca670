//! HS256 JWT adapter for session validation.
//!
//! Validates bearer tokens signed with a shared secret and maps their claims
//! to `AuthenticatedUser`. The privileged role comes from the boolean `admin`
//! claim.
//!
//! # Security
//!
//! - **Signature**: HS256 with the configured secret
//! - **Expiry (exp)**: required and enforced
//! - **Issuer (iss)**: enforced when configured

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Configuration for the JWT validator.
#[derive(Clone)]
pub struct JwtConfig {
    secret: SecretString,
    issuer: Option<String>,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
            issuer: None,
        }
    }

    /// Require tokens to carry this `iss` claim.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }
}

/// Claims carried by session tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - the user ID
    pub sub: String,

    /// Expiry timestamp (Unix epoch seconds)
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Privileged administrator claim.
    #[serde(default)]
    pub admin: bool,
}

/// Session validator for locally signed HS256 tokens.
pub struct JwtSessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionValidator {
    pub fn new(config: JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.expose_secret().as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding_key,
            validation,
        }
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!("Token expired");
                        AuthError::TokenExpired
                    }
                    ErrorKind::InvalidIssuer => {
                        tracing::warn!("Invalid issuer in token");
                        AuthError::InvalidToken
                    }
                    _ => {
                        tracing::debug!(error = %e, "Token validation failed");
                        AuthError::InvalidToken
                    }
                }
            },
        )?;
        let claims = data.claims;

        let user_id = UserId::new(&claims.sub).map_err(|_| {
            tracing::warn!("Token carries an empty subject");
            AuthError::InvalidToken
        })?;

        Ok(if claims.admin {
            AuthenticatedUser::admin(user_id, claims.email)
        } else {
            AuthenticatedUser::new(user_id, claims.email)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-session-secret";

    fn token(claims: &SessionClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(sub: &str, admin: bool) -> SessionClaims {
        SessionClaims {
            sub: sub.to_string(),
            exp: chrono::Utc::now().timestamp() + 3600,
            iss: None,
            email: Some(format!("{}@campus.test", sub)),
            admin,
        }
    }

    fn validator() -> JwtSessionValidator {
        JwtSessionValidator::new(JwtConfig::new(SECRET))
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Claim Mapping Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn valid_token_maps_to_regular_user() {
        let user = validator()
            .validate(&token(&claims("student-1", false), SECRET))
            .await
            .unwrap();

        assert_eq!(user.id.as_str(), "student-1");
        assert_eq!(user.email.as_deref(), Some("student-1@campus.test"));
        assert!(!user.is_admin);
    }

    #[tokio::test]
    async fn admin_claim_maps_to_admin_user() {
        let user = validator()
            .validate(&token(&claims("ops", true), SECRET))
            .await
            .unwrap();

        assert!(user.is_admin);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Rejection Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn wrong_secret_is_invalid() {
        let result = validator()
            .validate(&token(&claims("student-1", false), "other-secret"))
            .await;

        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let mut expired = claims("student-1", false);
        expired.exp = chrono::Utc::now().timestamp() - 3600;

        let result = validator().validate(&token(&expired, SECRET)).await;

        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let result = validator().validate("not-a-jwt").await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn issuer_is_enforced_when_configured() {
        let validator =
            JwtSessionValidator::new(JwtConfig::new(SECRET).with_issuer("https://campus.test"));

        let mut foreign = claims("student-1", false);
        foreign.iss = Some("https://elsewhere.test".to_string());
        assert!(matches!(
            validator.validate(&token(&foreign, SECRET)).await,
            Err(AuthError::InvalidToken)
        ));

        let mut ours = claims("student-1", false);
        ours.iss = Some("https://campus.test".to_string());
        assert!(validator.validate(&token(&ours, SECRET)).await.is_ok());
    }
}
