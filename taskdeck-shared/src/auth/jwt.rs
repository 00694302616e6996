/// JWT session tokens
///
/// Tokens are HS256-signed and carry the user id (`sub`) and email. There is
/// a single session token type with a configurable lifetime (7 days by
/// default); no refresh flow. The same secret also signs the short-lived OAuth
/// `state` values ([`StateClaims`]).
///
/// Authenticating a request means validating the token *and* re-fetching the
/// user, so a deleted account stops working immediately even though its token
/// has not expired.
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use taskdeck_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "test-secret-key-at-least-32-bytes-long";
/// let claims = Claims::new(Uuid::new_v4(), "ada@example.com", Duration::days(7));
/// let token = create_token(&claims, secret)?;
///
/// let decoded = validate_token(&token, secret)?;
/// assert_eq!(decoded.email, "ada@example.com");
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::user::PublicUser;
use crate::store::Store;

/// Issuer written to and required in every token
pub const ISSUER: &str = "taskdeck";

/// Issuer of OAuth `state` tokens
pub const STATE_ISSUER: &str = "taskdeck-oauth-state";

/// Default token lifetime in days
pub const DEFAULT_TTL_DAYS: i64 = 7;

/// Lifetime of an OAuth `state` token in minutes
pub const STATE_TTL_MINUTES: i64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid issuer")]
    InvalidIssuer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,

    pub email: String,

    pub iss: String,

    /// Issued at (unix seconds)
    pub iat: i64,

    /// Not before (unix seconds)
    pub nbf: i64,

    /// Expiration (unix seconds)
    pub exp: i64,
}

impl Claims {
    /// Claims issued now
    pub fn new(user_id: Uuid, email: impl Into<String>, ttl: Duration) -> Self {
        Self::issued_at(user_id, email, Utc::now(), ttl)
    }

    pub fn issued_at(
        user_id: Uuid,
        email: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: user_id,
            email: email.into(),
            iss: ISSUER.to_string(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

/// Claims of an OAuth `state` value
///
/// Signed with the session secret but under a different issuer, so neither
/// token kind validates as the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateClaims {
    pub nonce: Uuid,

    pub iss: String,

    pub iat: i64,

    pub exp: i64,
}

pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Checks signature, issuer, `exp` and `nbf`
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Session token service: issue, validate, authenticate
#[derive(Clone)]
pub struct SessionTokens {
    secret: String,
    ttl: Duration,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionTokens {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &PublicUser) -> CoreResult<String> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &PublicUser, issued_at: DateTime<Utc>) -> CoreResult<String> {
        let claims = Claims::issued_at(user.id, user.email.clone(), issued_at, self.ttl);
        create_token(&claims, &self.secret).map_err(|e| CoreError::Internal(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> CoreResult<Claims> {
        validate_token(token, &self.secret).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            CoreError::TokenInvalid
        })
    }

    /// Validates the token and loads its user
    ///
    /// # Errors
    ///
    /// [`CoreError::TokenInvalid`] for a bad token, [`CoreError::UserNotFound`]
    /// when the subject no longer exists.
    /// Signed `state` value for the OAuth redirect, valid for [`STATE_TTL_MINUTES`]
    pub fn issue_state(&self) -> CoreResult<String> {
        self.issue_state_at(Utc::now())
    }

    pub fn issue_state_at(&self, issued_at: DateTime<Utc>) -> CoreResult<String> {
        let claims = StateClaims {
            nonce: Uuid::new_v4(),
            iss: STATE_ISSUER.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::minutes(STATE_TTL_MINUTES)).timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| CoreError::Internal(format!("State encoding failed: {e}")))
    }

    /// Checks signature, issuer and expiry of a `state` value
    pub fn validate_state(&self, state: &str) -> CoreResult<StateClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[STATE_ISSUER]);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<StateClaims>(
            state,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected OAuth state");
            CoreError::TokenInvalid
        })
    }

    pub async fn authenticate(&self, store: &dyn Store, token: &str) -> CoreResult<PublicUser> {
        let claims = self.validate(token)?;

        store
            .find_user_by_id(claims.sub)
            .await?
            .map(PublicUser::from)
            .ok_or(CoreError::UserNotFound)
    }
}
