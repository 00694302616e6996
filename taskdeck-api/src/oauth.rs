/// Google OAuth 2.0 authorization-code flow
///
/// The routes only see the [`OAuthProvider`] trait: one call for the consent
/// URL, one call turning a callback code into an [`OAuthProfile`]. The
/// `state` value passed to the consent URL comes back on the callback and is
/// checked by the route, not the provider.
use crate::config::GoogleOAuthConfig;
use async_trait::async_trait;
use serde::Deserialize;
use taskdeck_shared::auth::oauth::{GoogleUserInfo, OAuthProfile};

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Errors talking to the identity provider
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("Provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered but the payload is unusable
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// External identity provider
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// URL of the provider consent page carrying `state`
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError>;

    /// Exchanges an authorization code for the caller's profile
    async fn fetch_profile(&self, code: &str) -> Result<OAuthProfile, OAuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google implementation over `reqwest`
#[derive(Clone)]
pub struct GoogleClient {
    config: GoogleOAuthConfig,
    http: reqwest::Client,
}

impl GoogleClient {
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let response: TokenResponse = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.access_token)
    }

    async fn userinfo(&self, access_token: &str) -> Result<GoogleUserInfo, OAuthError> {
        let info = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(info)
    }
}

#[async_trait]
impl OAuthProvider for GoogleClient {
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        let request = self
            .http
            .get(GOOGLE_AUTH_URL)
            .query(&[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("access_type", "online"),
                ("prompt", "select_account"),
                ("state", state),
            ])
            .build()?;

        Ok(request.url().to_string())
    }

    async fn fetch_profile(&self, code: &str) -> Result<OAuthProfile, OAuthError> {
        let access_token = self.exchange_code(code).await?;
        let info = self.userinfo(&access_token).await?;

        tracing::debug!(sub = %info.sub, "Fetched Google profile");

        OAuthProfile::try_from(info).map_err(|e| OAuthError::InvalidResponse(e.to_string()))
    }
}
