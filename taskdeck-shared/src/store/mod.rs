//! Storage port
//!
//! Services talk to persistence only through [`Store`]. Two adapters ship
//! with the crate:
//!
//! - [`PgStore`]: PostgreSQL via sqlx, delegating to the model methods
//! - [`InMemoryStore`]: a lock-guarded map used by tests and local demos
//!
//! Operations that touch several rows (`delete_project_detaching_tasks`,
//! `user_stats`) are atomic in both adapters.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::project::{CreateProject, Project, ProjectSummary, ProjectWithCount, UpdateProject};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User, UserStats};
use crate::services::filter::TaskQuery;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for users, projects and tasks
///
/// Lookups return `Ok(None)` for missing rows; updates return `Ok(None)` when
/// the target vanished. Ownership is not checked here.
#[async_trait]
pub trait Store: Send + Sync {
    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Lookup by normalized email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_provider_id(&self, provider_id: &str) -> StoreResult<Option<User>>;

    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] when the email or provider id
    /// is already taken.
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>>;

    /// Removes the user together with every project and task they own
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    /// Counts computed against a single consistent snapshot
    async fn user_stats(&self, id: Uuid, now: DateTime<Utc>) -> StoreResult<UserStats>;

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project>;

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    /// A user's projects with their active task counts, oldest first
    async fn list_projects(&self, user_id: Uuid) -> StoreResult<Vec<ProjectWithCount>>;

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>>;

    /// Clears `project_id` on every referencing task, then deletes the project
    async fn delete_project_detaching_tasks(&self, id: Uuid) -> StoreResult<bool>;

    async fn project_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<ProjectSummary>>;

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Tasks matching every condition of the query
    ///
    /// Ordering is backend-defined; callers sort.
    async fn find_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>>;

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>>;

    /// Sole writer of `is_deleted`/`deleted_at`
    async fn set_task_trashed(
        &self,
        id: Uuid,
        deleted_at: Option<DateTime<Utc>>,
    ) -> StoreResult<Option<Task>>;

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;
}

/// Errors returned by store adapters
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Persistence-layer failure
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a persistence error
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return StoreError::UniqueViolation(constraint);
            }
        }
        StoreError::persistence(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_wraps_source() {
        let err = StoreError::persistence(std::io::Error::other("disk on fire"));
        assert_eq!(err.to_string(), "persistence error: disk on fire");
    }

    #[test]
    fn test_non_database_sqlx_error_is_persistence() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Persistence(_)));
    }
}
