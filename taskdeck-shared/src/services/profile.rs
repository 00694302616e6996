//! Account profile operations for the signed-in user

use std::sync::Arc;

use mockable::Clock;
use serde::Deserialize;
use uuid::Uuid;

use super::SharedClock;
use crate::error::{CoreError, CoreResult};
use crate::models::patch::Patch;
use crate::models::user::{PublicUser, UpdateUser, UserStats};
use crate::store::Store;

pub const MAX_NAME_LEN: usize = 255;

/// Fields a user may change on their own profile
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub avatar_url: Patch<Option<String>>,
}

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn Store>,
    clock: SharedClock,
}

impl ProfileService {
    pub fn new(store: Arc<dyn Store>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> CoreResult<PublicUser> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .map(PublicUser::from)
            .ok_or(CoreError::UserNotFound)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> CoreResult<PublicUser> {
        let name = match update.name {
            Patch::Set(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(CoreError::invalid("name", "Name is required"));
                }
                if name.chars().count() > MAX_NAME_LEN {
                    return Err(CoreError::invalid(
                        "name",
                        format!("Name must be at most {MAX_NAME_LEN} characters"),
                    ));
                }
                Patch::Set(name)
            }
            Patch::Unchanged => Patch::Unchanged,
        };

        let avatar_url = update
            .avatar_url
            .map(|url| url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()));

        let user = self
            .store
            .update_user(
                user_id,
                UpdateUser {
                    name,
                    avatar_url,
                    ..Default::default()
                },
            )
            .await?
            .ok_or(CoreError::UserNotFound)?;

        tracing::info!(user_id = %user_id, "Profile updated");
        Ok(user.into())
    }

    /// Removes the account along with all of its projects and tasks
    pub async fn delete_account(&self, user_id: Uuid) -> CoreResult<()> {
        if !self.store.delete_user(user_id).await? {
            return Err(CoreError::UserNotFound);
        }
        tracing::info!(user_id = %user_id, "Account deleted");
        Ok(())
    }

    pub async fn stats(&self, user_id: Uuid) -> CoreResult<UserStats> {
        Ok(self.store.user_stats(user_id, self.clock.utc()).await?)
    }
}
