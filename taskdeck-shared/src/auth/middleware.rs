/// Request authentication context
///
/// The HTTP layer validates the bearer token, re-fetches the user and stores
/// an [`AuthContext`] in the request extensions. Handlers read it with
/// `Extension<AuthContext>`.
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::PublicUser;

/// Authenticated caller for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user: PublicUser,
}

impl AuthContext {
    pub fn new(user: PublicUser) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

/// Why a bearer token could not be read from the headers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("Missing authorization header")]
    Missing,

    #[error("Expected Bearer token")]
    InvalidFormat,
}

/// Pulls the token out of `Authorization: Bearer <token>`
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, BearerError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(BearerError::Missing)?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(BearerError::InvalidFormat)?;

    if token.is_empty() {
        return Err(BearerError::InvalidFormat);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), Err(BearerError::Missing));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer(&headers), Err(BearerError::InvalidFormat));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer(&headers), Err(BearerError::InvalidFormat));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers), Ok("abc.def"));
    }

    #[test]
    fn test_auth_context_user_id() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            email: "a@b.c".to_string(),
            name: "A".to_string(),
            avatar_url: None,
        };
        let ctx = AuthContext::new(user.clone());
        assert_eq!(ctx.user_id(), user.id);
    }
}
