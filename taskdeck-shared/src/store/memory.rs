//! In-memory store for service tests and local demos.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::project::{CreateProject, Project, ProjectSummary, ProjectWithCount, UpdateProject};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User, UserStats};
use crate::services::filter::TaskQuery;

/// Thread-safe in-memory store
///
/// A single lock guards all three tables, so multi-row operations see and
/// leave a consistent state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<InMemoryState>>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    users: HashMap<Uuid, User>,
    projects: HashMap<Uuid, Project>,
    tasks: HashMap<Uuid, Task>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, InMemoryState>> {
        self.state
            .read()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, InMemoryState>> {
        self.state
            .write()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))
    }
}

impl InMemoryState {
    /// Mirrors the `users_email_key` / `users_provider_id_key` constraints
    fn check_user_unique(
        &self,
        skip: Option<Uuid>,
        email: Option<&str>,
        provider_id: Option<&str>,
    ) -> StoreResult<()> {
        for user in self.users.values().filter(|u| Some(u.id) != skip) {
            if email.is_some_and(|e| user.email == e) {
                return Err(StoreError::UniqueViolation("users_email_key".to_string()));
            }
            if provider_id.is_some_and(|p| user.provider_id.as_deref() == Some(p)) {
                return Err(StoreError::UniqueViolation(
                    "users_provider_id_key".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_provider_id(&self, provider_id: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.provider_id.as_deref() == Some(provider_id))
            .cloned())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.write()?;
        state.check_user_unique(None, Some(&data.email), data.provider_id.as_deref())?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            password_hash: data.password_hash,
            provider_id: data.provider_id,
            name: data.name,
            avatar_url: data.avatar_url,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        let mut state = self.write()?;
        let Some(mut user) = state.users.get(&id).cloned() else {
            return Ok(None);
        };

        let email = data.email.as_set().map(String::as_str);
        let provider_id = data.provider_id.as_set().and_then(|p| p.as_deref());
        state.check_user_unique(Some(id), email, provider_id)?;

        data.apply(&mut user);
        user.updated_at = Utc::now();
        state.users.insert(id, user.clone());
        Ok(Some(user))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.write()?;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.projects.retain(|_, p| p.user_id != id);
        state.tasks.retain(|_, t| t.user_id != id);
        Ok(true)
    }

    async fn user_stats(&self, id: Uuid, now: DateTime<Utc>) -> StoreResult<UserStats> {
        let state = self.read()?;
        let mut stats = UserStats::default();

        for task in state.tasks.values().filter(|t| t.user_id == id) {
            if task.is_deleted {
                stats.trashed_tasks += 1;
                continue;
            }
            stats.total_tasks += 1;
            if task.is_complete {
                stats.completed_tasks += 1;
            } else if task.due_date.is_some_and(|due| due < now) {
                stats.overdue_tasks += 1;
            }
        }
        stats.pending_tasks = stats.total_tasks - stats.completed_tasks;
        stats.total_projects = state.projects.values().filter(|p| p.user_id == id).count() as i64;

        Ok(stats)
    }

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: data.name,
            color: data.color,
            user_id: data.user_id,
            created_at: now,
            updated_at: now,
        };
        self.write()?.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self.read()?.projects.get(&id).cloned())
    }

    async fn list_projects(&self, user_id: Uuid) -> StoreResult<Vec<ProjectWithCount>> {
        let state = self.read()?;
        let mut projects: Vec<ProjectWithCount> = state
            .projects
            .values()
            .filter(|p| p.user_id == user_id)
            .map(|p| ProjectWithCount {
                project: p.clone(),
                task_count: state
                    .tasks
                    .values()
                    .filter(|t| t.project_id == Some(p.id) && !t.is_deleted)
                    .count() as i64,
            })
            .collect();

        projects.sort_by(|a, b| {
            a.project
                .created_at
                .cmp(&b.project.created_at)
                .then_with(|| a.project.id.cmp(&b.project.id))
        });
        Ok(projects)
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>> {
        let mut state = self.write()?;
        let Some(project) = state.projects.get_mut(&id) else {
            return Ok(None);
        };
        data.apply(project);
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }

    async fn delete_project_detaching_tasks(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.write()?;
        if state.projects.remove(&id).is_none() {
            return Ok(false);
        }

        let now = Utc::now();
        for task in state.tasks.values_mut().filter(|t| t.project_id == Some(id)) {
            task.project_id = None;
            task.updated_at = now;
        }
        Ok(true)
    }

    async fn project_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<ProjectSummary>> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.projects.get(id))
            .map(ProjectSummary::from)
            .collect())
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            due_date: data.due_date,
            priority: data.priority,
            is_complete: false,
            is_deleted: false,
            deleted_at: None,
            project_id: data.project_id,
            user_id: data.user_id,
            created_at: now,
            updated_at: now,
        };
        self.write()?.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn find_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        Ok(self
            .read()?
            .tasks
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        let mut state = self.write()?;
        let Some(task) = state.tasks.get_mut(&id) else {
            return Ok(None);
        };
        data.apply(task);
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn set_task_trashed(
        &self,
        id: Uuid,
        deleted_at: Option<DateTime<Utc>>,
    ) -> StoreResult<Option<Task>> {
        let mut state = self.write()?;
        let Some(task) = state.tasks.get_mut(&id) else {
            return Ok(None);
        };
        task.is_deleted = deleted_at.is_some();
        task.deleted_at = deleted_at;
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.write()?.tasks.remove(&id).is_some())
    }
}
