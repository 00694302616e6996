/// Project endpoints
///
/// All routes require authentication and only ever touch the caller's own
/// projects; someone else's id answers `404`.
use crate::{
    app::AppState,
    error::ApiResult,
    extract::{AppJson, AppPath, ValidatedJson},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use taskdeck_shared::{
    auth::middleware::AuthContext,
    models::project::{is_valid_color, Project, ProjectWithCount, UpdateProject},
    services::lifecycle::NewProject,
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_color(color: &str) -> Result<(), ValidationError> {
    if is_valid_color(color.trim()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("color");
        error.message = Some("Color must be a hex value like #RGB or #RRGGBB".into());
        Err(error)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(custom(function = "validate_color"))]
    pub color: Option<String>,
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProjectWithCount>>> {
    let projects = state.lifecycle.list_projects(auth.user_id()).await?;
    Ok(Json(projects))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = state
        .lifecycle
        .create_project(
            auth.user_id(),
            NewProject {
                name: req.name,
                color: req.color,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = state.lifecycle.get_project(auth.user_id(), id).await?;
    Ok(Json(project))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(update): AppJson<UpdateProject>,
) -> ApiResult<Json<Project>> {
    let project = state
        .lifecycle
        .update_project(auth.user_id(), id, update)
        .await?;
    Ok(Json(project))
}

/// Deletes the project; its tasks stay, detached
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.lifecycle.delete_project(auth.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
