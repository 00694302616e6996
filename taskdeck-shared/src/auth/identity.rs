/// Identity resolution
///
/// Maps credentials (email + password) or an OAuth profile to a
/// [`PublicUser`]. The password hash never leaves this module.
///
/// # OAuth linking
///
/// 1. A user with the same provider id: refresh email, name and avatar.
/// 2. Otherwise a user with the same email: link the provider id and refresh
///    name and avatar. An existing password keeps working.
/// 3. Otherwise: create a password-less user.
///
/// The avatar is only refreshed when the provider sends one.
use std::sync::Arc;

use uuid::Uuid;

use super::oauth::OAuthProfile;
use super::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{CoreError, CoreResult, FieldError};
use crate::models::patch::Patch;
use crate::models::user::{normalize_email, CreateUser, PublicUser, UpdateUser, User};
use crate::store::{Store, StoreError};

/// Input for [`IdentityResolver::register`]
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Unique violations on user writes are caller conflicts, not storage faults
fn conflict_on_unique(err: StoreError) -> CoreError {
    match err {
        StoreError::UniqueViolation(constraint) if constraint.contains("provider") => {
            CoreError::Conflict("Provider account already linked".to_string())
        }
        StoreError::UniqueViolation(_) => {
            CoreError::Conflict("Email already registered".to_string())
        }
        other => CoreError::Storage(other),
    }
}

async fn hash_blocking(password: String) -> CoreResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| CoreError::Internal(format!("Hashing task failed: {e}")))?
        .map_err(|e| CoreError::Internal(e.to_string()))
}

async fn verify_blocking(password: String, hash: String) -> CoreResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| CoreError::Internal(format!("Verification task failed: {e}")))?
        .map_err(|e| CoreError::Internal(e.to_string()))
}

#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn Store>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Local email/password login
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidCredentials`] for an unknown email or wrong password
    /// - [`CoreError::PasswordLoginUnavailable`] for OAuth-only accounts
    pub async fn login(&self, email: &str, password: &str) -> CoreResult<PublicUser> {
        let email = normalize_email(email);

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(CoreError::InvalidCredentials)?;

        if !user.has_password() {
            return Err(CoreError::PasswordLoginUnavailable);
        }
        let hash = user.password_hash.clone().unwrap_or_default();

        if !verify_blocking(password.to_string(), hash).await? {
            tracing::info!(user_id = %user.id, "Failed login attempt");
            return Err(CoreError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(user.into())
    }

    /// Resolves (and if needed creates or links) the account for an OAuth profile
    pub async fn oauth_login(&self, profile: OAuthProfile) -> CoreResult<PublicUser> {
        let email = normalize_email(&profile.email);
        let avatar_url = match profile.avatar_url.clone() {
            Some(url) => Patch::Set(Some(url)),
            None => Patch::Unchanged,
        };

        if let Some(user) = self
            .store
            .find_user_by_provider_id(&profile.external_id)
            .await?
        {
            let update = UpdateUser {
                email: Patch::Set(email),
                name: Patch::Set(profile.display_name.clone()),
                avatar_url,
                ..Default::default()
            };
            return self.apply_update(user, update, "OAuth user refreshed").await;
        }

        if let Some(user) = self.store.find_user_by_email(&email).await? {
            let update = UpdateUser {
                provider_id: Patch::Set(Some(profile.external_id.clone())),
                name: Patch::Set(profile.display_name.clone()),
                avatar_url,
                ..Default::default()
            };
            return self.apply_update(user, update, "OAuth provider linked").await;
        }

        let user = self
            .store
            .create_user(CreateUser {
                email,
                password_hash: None,
                provider_id: Some(profile.external_id),
                name: profile.display_name,
                avatar_url: profile.avatar_url,
            })
            .await
            .map_err(conflict_on_unique)?;

        tracing::info!(user_id = %user.id, "User created from OAuth profile");
        Ok(user.into())
    }

    async fn apply_update(
        &self,
        user: User,
        update: UpdateUser,
        message: &'static str,
    ) -> CoreResult<PublicUser> {
        let id: Uuid = user.id;
        let user = self
            .store
            .update_user(id, update)
            .await
            .map_err(conflict_on_unique)?
            .ok_or(CoreError::UserNotFound)?;

        tracing::info!(user_id = %id, "{}", message);
        Ok(user.into())
    }

    /// Creates a password account
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] listing every bad field
    /// - [`CoreError::Conflict`] when the email is taken
    pub async fn register(&self, account: NewAccount) -> CoreResult<PublicUser> {
        let email = normalize_email(&account.email);
        let name = account.name.trim().to_string();

        let mut errors = Vec::new();
        if email.is_empty() || !email.contains('@') {
            errors.push(FieldError::new("email", "A valid email is required"));
        }
        if name.is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if let Err(password_errors) = validate_password_strength(&account.password) {
            errors.extend(password_errors);
        }
        if !errors.is_empty() {
            return Err(CoreError::Validation(errors));
        }

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(CoreError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_blocking(account.password).await?;

        let user = self
            .store
            .create_user(CreateUser {
                email,
                password_hash: Some(password_hash),
                provider_id: None,
                name,
                avatar_url: None,
            })
            .await
            .map_err(conflict_on_unique)?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.into())
    }
}
