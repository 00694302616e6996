/// Task endpoints
///
/// # Endpoints
///
/// - `GET /v1/tasks?view&status&priority&projectId&search` - Filtered listing
/// - `POST /v1/tasks` - Create task
/// - `GET /v1/tasks/:id` - Task with its project summary
/// - `PUT /v1/tasks/:id` - Partial update
/// - `PATCH /v1/tasks/:id/toggle` - Flip completion
/// - `DELETE /v1/tasks/:id` - Move to trash
/// - `POST /v1/tasks/:id/restore` - Take out of trash
/// - `DELETE /v1/tasks/:id/permanent` - Purge from trash
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery, ValidatedJson},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;
use taskdeck_shared::{
    auth::middleware::AuthContext,
    models::task::{Priority, Task, TaskWithProject, UpdateTask},
    services::{
        filter::{StatusFilter, View},
        lifecycle::NewTask,
        TaskCriteria,
    },
    FieldError,
};
use uuid::Uuid;
use validator::Validate;

/// Raw listing query; every parameter is optional and parsed by hand so all
/// bad values are reported together
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListParams {
    pub view: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub project_id: Option<String>,
    pub search: Option<String>,
}

fn parse_param<T>(
    value: Option<String>,
    field: &str,
    errors: &mut Vec<FieldError>,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Option<T> {
    let value = value.filter(|v| !v.trim().is_empty())?;
    let parsed = parse(value.trim());
    if parsed.is_none() {
        errors.push(FieldError::new(field, format!("Invalid {field}: {value}")));
    }
    parsed
}

impl TryFrom<TaskListParams> for TaskCriteria {
    type Error = ApiError;

    fn try_from(params: TaskListParams) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();

        let view = parse_param(params.view, "view", &mut errors, |v| View::from_str(v).ok());
        let status = parse_param(params.status, "status", &mut errors, |v| {
            StatusFilter::from_str(v).ok()
        });
        let priority = parse_param(params.priority, "priority", &mut errors, Priority::parse);
        let project_id = parse_param(params.project_id, "projectId", &mut errors, |v| {
            Uuid::parse_str(v).ok()
        });

        if !errors.is_empty() {
            return Err(ApiError::ValidationError(errors));
        }

        Ok(TaskCriteria {
            view,
            status,
            priority,
            project_id,
            search: params.search,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub project_id: Option<Uuid>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(params): AppQuery<TaskListParams>,
) -> ApiResult<Json<Vec<TaskWithProject>>> {
    let criteria = TaskCriteria::try_from(params)?;
    let tasks = state.tasks.list(auth.user_id(), &criteria).await?;
    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state
        .lifecycle
        .create_task(
            auth.user_id(),
            NewTask {
                title: req.title,
                description: req.description,
                due_date: req.due_date,
                priority: req.priority,
                project_id: req.project_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<TaskWithProject>> {
    let task = state.lifecycle.get_task(auth.user_id(), id).await?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(update): AppJson<UpdateTask>,
) -> ApiResult<Json<Task>> {
    let task = state.lifecycle.update_task(auth.user_id(), id, update).await?;
    Ok(Json(task))
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = state.lifecycle.toggle_complete(auth.user_id(), id).await?;
    Ok(Json(task))
}

/// Soft delete; the task moves to the trash view
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = state.lifecycle.soft_delete(auth.user_id(), id).await?;
    Ok(Json(task))
}

pub async fn restore_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = state.lifecycle.restore(auth.user_id(), id).await?;
    Ok(Json(task))
}

/// Permanent delete; only trashed tasks qualify
pub async fn purge_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.lifecycle.purge(auth.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
