/// Account endpoints for the signed-in user
///
/// - `GET /v1/users/me` - Profile with task/project statistics
/// - `PUT /v1/users/me` - Update name and/or avatar
/// - `DELETE /v1/users/me` - Delete the account and everything it owns
use crate::{app::AppState, error::ApiResult, extract::AppJson};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;
use taskdeck_shared::{
    auth::middleware::AuthContext,
    models::user::{PublicUser, UserStats},
    services::profile::ProfileUpdate,
};

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: PublicUser,
    pub stats: UserStats,
}

pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state.profile.get_profile(auth.user_id()).await?;
    let stats = state.profile.stats(auth.user_id()).await?;

    Ok(Json(ProfileResponse { user, stats }))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(update): AppJson<ProfileUpdate>,
) -> ApiResult<Json<PublicUser>> {
    let user = state.profile.update_profile(auth.user_id(), update).await?;
    Ok(Json(user))
}

pub async fn delete_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    state.profile.delete_account(auth.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
