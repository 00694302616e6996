/// Task model and database operations
///
/// Tasks belong to exactly one user and optionally to one of that user's
/// projects. Deletion is soft by default: the row stays in the trash until it
/// is restored or purged.
///
/// # State Machine
///
/// ```text
/// Active(complete) ──soft delete──▶ Trashed ──restore──▶ Active(complete)
///        ▲    │                        │
///        └────┘ toggle                 └──purge──▶ (row removed)
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('LOW', 'MEDIUM', 'HIGH');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description TEXT,
///     due_date TIMESTAMPTZ,
///     priority task_priority NOT NULL DEFAULT 'MEDIUM',
///     is_complete BOOLEAN NOT NULL DEFAULT FALSE,
///     is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
///     deleted_at TIMESTAMPTZ,
///     project_id UUID REFERENCES projects(id) ON DELETE SET NULL,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CHECK (is_deleted = (deleted_at IS NOT NULL))
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::patch::Patch;
use super::project::ProjectSummary;
use crate::services::filter::{Condition, TaskQuery};

const TASK_COLUMNS: &str = "id, title, description, due_date, priority, is_complete, \
                            is_deleted, deleted_at, project_id, user_id, created_at, updated_at";

/// Task priority
///
/// Variant order is significant: `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    sqlx::Type,
)]
#[sqlx(type_name = "task_priority", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }

    /// Parses the wire representation (case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "LOW" => Some(Priority::Low),
            "MEDIUM" => Some(Priority::Medium),
            "HIGH" => Some(Priority::High),
            _ => None,
        }
    }
}

/// Lifecycle state derived from the soft-delete flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Active { complete: bool },
    Trashed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    /// Non-empty after trimming
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub is_complete: bool,

    /// Soft-delete flag; always agrees with `deleted_at`
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,

    pub project_id: Option<Uuid>,

    /// Owner, immutable after creation
    pub user_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn state(&self) -> TaskState {
        if self.is_deleted {
            TaskState::Trashed
        } else {
            TaskState::Active {
                complete: self.is_complete,
            }
        }
    }

    pub fn is_trashed(&self) -> bool {
        matches!(self.state(), TaskState::Trashed)
    }
}

/// Task plus a shallow summary of its project, as returned by listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWithProject {
    #[serde(flatten)]
    pub task: Task,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSummary>,
}

#[derive(Debug, Clone)]
pub struct CreateTask {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub project_id: Option<Uuid>,
}

/// Partial update of the user-editable task fields
///
/// The soft-delete fields are not here; they only change through the
/// lifecycle operations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub description: Patch<Option<String>>,
    #[serde(default)]
    pub due_date: Patch<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub priority: Patch<Priority>,
    #[serde(default)]
    pub is_complete: Patch<bool>,
    #[serde(default)]
    pub project_id: Patch<Option<Uuid>>,
}

impl UpdateTask {
    pub fn apply(self, task: &mut Task) {
        self.title.apply_to(&mut task.title);
        self.description.apply_to(&mut task.description);
        self.due_date.apply_to(&mut task.due_date);
        self.priority.apply_to(&mut task.priority);
        self.is_complete.apply_to(&mut task.is_complete);
        self.project_id.apply_to(&mut task.project_id);
    }
}

/// Escapes LIKE wildcards so user input matches literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl Task {
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, due_date, priority, project_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.due_date)
        .bind(data.priority)
        .bind(data.project_id)
        .bind(data.user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Runs a resolved filter query
    ///
    /// Every condition is ANDed after the mandatory owner match.
    pub async fn find_matching(pool: &PgPool, query: &TaskQuery) -> Result<Vec<Self>, sqlx::Error> {
        let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = "
        ));
        builder.push_bind(query.user_id);

        for condition in &query.conditions {
            match condition {
                Condition::Deleted(deleted) => {
                    builder.push(" AND is_deleted = ").push_bind(*deleted);
                }
                Condition::Complete(complete) => {
                    builder.push(" AND is_complete = ").push_bind(*complete);
                }
                Condition::DueOnOrAfter(from) => {
                    builder.push(" AND due_date >= ").push_bind(*from);
                }
                Condition::DueBefore(until) => {
                    builder.push(" AND due_date < ").push_bind(*until);
                }
                Condition::Priority(priority) => {
                    builder.push(" AND priority = ").push_bind(*priority);
                }
                Condition::Project(project_id) => {
                    builder.push(" AND project_id = ").push_bind(*project_id);
                }
                Condition::Search(term) => {
                    let pattern = like_pattern(term);
                    builder
                        .push(" AND (title ILIKE ")
                        .push_bind(pattern.clone())
                        .push(" OR description ILIKE ")
                        .push_bind(pattern)
                        .push(")");
                }
            }
        }

        builder.push(" ORDER BY due_date ASC NULLS LAST, priority DESC, created_at DESC, id ASC");

        builder.build_query_as::<Task>().fetch_all(pool).await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut builder =
            sqlx::QueryBuilder::<sqlx::Postgres>::new("UPDATE tasks SET updated_at = NOW()");

        if let Patch::Set(title) = data.title {
            builder.push(", title = ").push_bind(title);
        }
        if let Patch::Set(description) = data.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Patch::Set(due_date) = data.due_date {
            builder.push(", due_date = ").push_bind(due_date);
        }
        if let Patch::Set(priority) = data.priority {
            builder.push(", priority = ").push_bind(priority);
        }
        if let Patch::Set(is_complete) = data.is_complete {
            builder.push(", is_complete = ").push_bind(is_complete);
        }
        if let Patch::Set(project_id) = data.project_id {
            builder.push(", project_id = ").push_bind(project_id);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(format!(" RETURNING {TASK_COLUMNS}"));

        builder.build_query_as::<Task>().fetch_optional(pool).await
    }

    /// Moves a task into (`Some(at)`) or out of (`None`) the trash
    ///
    /// The flag and timestamp are written together so they can never
    /// disagree.
    pub async fn set_trashed(
        pool: &PgPool,
        id: Uuid,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET is_deleted = $2,
                deleted_at = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(deleted_at.is_some())
        .bind(deleted_at)
        .fetch_optional(pool)
        .await
    }

    /// Permanently removes a task row
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
