//! Provider-neutral OAuth profile
//!
//! Provider payloads are converted into [`OAuthProfile`] at the boundary, so
//! the identity resolver never sees provider-specific field names.

use serde::Deserialize;

use crate::error::{CoreError, CoreResult, FieldError};
use crate::models::user::normalize_email;

/// Normalized identity asserted by an external provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    /// Stable subject id at the provider
    pub external_id: String,

    /// Normalized email
    pub email: String,

    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl OAuthProfile {
    /// Builds a profile, normalizing the email and defaulting the name
    ///
    /// # Errors
    ///
    /// Validation error when the external id or email is missing.
    pub fn new(
        external_id: impl Into<String>,
        email: Option<&str>,
        display_name: Option<&str>,
        avatar_url: Option<String>,
    ) -> CoreResult<Self> {
        let external_id = external_id.into().trim().to_string();
        let email = email.map(normalize_email).unwrap_or_default();

        let mut errors = Vec::new();
        if external_id.is_empty() {
            errors.push(FieldError::new("sub", "Provider did not return a subject id"));
        }
        if email.is_empty() {
            errors.push(FieldError::new("email", "Provider did not return an email"));
        }
        if !errors.is_empty() {
            return Err(CoreError::Validation(errors));
        }

        let display_name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        Ok(Self {
            external_id,
            email,
            display_name,
            avatar_url: avatar_url.filter(|u| !u.trim().is_empty()),
        })
    }
}

/// Google OpenID Connect userinfo response
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl TryFrom<GoogleUserInfo> for OAuthProfile {
    type Error = CoreError;

    fn try_from(info: GoogleUserInfo) -> Result<Self, Self::Error> {
        OAuthProfile::new(
            info.sub,
            info.email.as_deref(),
            info.name.as_deref(),
            info.picture,
        )
    }
}
