/// Project model and database operations
///
/// Projects group tasks for a single owner. Deleting a project never deletes
/// its tasks: their `project_id` is cleared in the same transaction that
/// removes the project row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     color VARCHAR(7) NOT NULL DEFAULT '#6366F1',
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::patch::Patch;

const PROJECT_COLUMNS: &str = "id, name, color, user_id, created_at, updated_at";

/// Color used when a project is created without one
pub const DEFAULT_PROJECT_COLOR: &str = "#6366F1";

/// Checks for `#RGB` or `#RRGGBB`
pub fn is_valid_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(hex) => {
            (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,

    /// Hex display color
    pub color: String,

    /// Owner
    pub user_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project with its number of active (not deleted) tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithCount {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub project: Project,
    pub task_count: i64,
}

/// Shallow project reference embedded in task listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            color: project.color.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateProject {
    pub user_id: Uuid,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub color: Patch<String>,
}

impl UpdateProject {
    pub fn apply(self, project: &mut Project) {
        self.name.apply_to(&mut project.name);
        self.color.apply_to(&mut project.color);
    }
}

impl Project {
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (name, color, user_id)
            VALUES ($1, $2, $3)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.color)
        .bind(data.user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists a user's projects, oldest first, with active task counts
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ProjectWithCount>, sqlx::Error> {
        sqlx::query_as::<_, ProjectWithCount>(
            r#"
            SELECT p.id, p.name, p.color, p.user_id, p.created_at, p.updated_at,
                   COUNT(t.id) FILTER (WHERE NOT t.is_deleted) AS task_count
            FROM projects p
            LEFT JOIN tasks t ON t.project_id = p.id
            WHERE p.user_id = $1
            GROUP BY p.id
            ORDER BY p.created_at ASC, p.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Fetches summaries for the given ids
    pub async fn summaries(
        pool: &PgPool,
        ids: &[Uuid],
    ) -> Result<Vec<ProjectSummary>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(Uuid, String, String)> =
            sqlx::query_as("SELECT id, name, color FROM projects WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, color)| ProjectSummary { id, name, color })
            .collect())
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut builder =
            sqlx::QueryBuilder::<sqlx::Postgres>::new("UPDATE projects SET updated_at = NOW()");

        if let Patch::Set(name) = data.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Patch::Set(color) = data.color {
            builder.push(", color = ").push_bind(color);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(format!(" RETURNING {PROJECT_COLUMNS}"));

        builder
            .build_query_as::<Project>()
            .fetch_optional(pool)
            .await
    }

    /// Deletes a project after detaching its tasks, atomically
    ///
    /// Returns `false` if the project did not exist (the transaction is
    /// rolled back in that case).
    pub async fn delete_detaching_tasks(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let detached = sqlx::query(
            "UPDATE tasks SET project_id = NULL, updated_at = NOW() WHERE project_id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        tracing::debug!(project_id = %id, detached_tasks = detached, "Project deleted");
        Ok(true)
    }
}
