//! Task and project lifecycle
//!
//! All single-entity mutations follow the same shape: fetch, pass through
//! [`assert_owned`], check the state transition, then write.
//!
//! ```text
//! Active(complete) ──soft_delete──▶ Trashed ──restore──▶ Active(complete)
//!   toggle ⟲                          └──purge──▶ gone
//! ```
//!
//! Toggling or soft-deleting a trashed task is a no-op that returns the task
//! unchanged. Restoring or purging an active task fails with
//! [`CoreError::NotInTrash`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use uuid::Uuid;

use super::SharedClock;
use crate::auth::authorization::{assert_owned, assert_reference_owned};
use crate::error::{CoreError, CoreResult};
use crate::models::patch::Patch;
use crate::models::project::{
    is_valid_color, CreateProject, Project, ProjectSummary, ProjectWithCount, UpdateProject,
    DEFAULT_PROJECT_COLOR,
};
use crate::models::task::{CreateTask, Priority, Task, TaskWithProject, UpdateTask};
use crate::store::Store;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_PROJECT_NAME_LEN: usize = 100;

/// Input for [`LifecycleManager::create_task`]
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub project_id: Option<Uuid>,
}

/// Input for [`LifecycleManager::create_project`]
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub color: Option<String>,
}

fn clean_title(title: &str) -> CoreResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoreError::invalid("title", "Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::invalid(
            "title",
            format!("Title must be at most {MAX_TITLE_LEN} characters"),
        ));
    }
    Ok(title.to_string())
}

/// Blank descriptions are stored as absent
fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn clean_project_name(name: &str) -> CoreResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::invalid("name", "Project name is required"));
    }
    if name.chars().count() > MAX_PROJECT_NAME_LEN {
        return Err(CoreError::invalid(
            "name",
            format!("Project name must be at most {MAX_PROJECT_NAME_LEN} characters"),
        ));
    }
    Ok(name.to_string())
}

fn check_color(color: &str) -> CoreResult<()> {
    if is_valid_color(color) {
        Ok(())
    } else {
        Err(CoreError::invalid(
            "color",
            "Color must be a hex value like #RGB or #RRGGBB",
        ))
    }
}

/// Task and project mutations scoped to one acting user
#[derive(Clone)]
pub struct LifecycleManager {
    store: Arc<dyn Store>,
    clock: SharedClock,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn Store>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    async fn owned_task(&self, actor: Uuid, id: Uuid) -> CoreResult<Task> {
        assert_owned(self.store.find_task(id).await?, actor)
    }

    async fn owned_project(&self, actor: Uuid, id: Uuid) -> CoreResult<Project> {
        assert_owned(self.store.find_project(id).await?, actor)
    }

    /// Fails with `InvalidReference` unless `project_id` belongs to `actor`
    async fn check_project_reference(&self, actor: Uuid, project_id: Uuid) -> CoreResult<Project> {
        assert_reference_owned(self.store.find_project(project_id).await?, actor)
    }

    pub async fn create_task(&self, actor: Uuid, input: NewTask) -> CoreResult<Task> {
        let title = clean_title(&input.title)?;

        if let Some(project_id) = input.project_id {
            self.check_project_reference(actor, project_id).await?;
        }

        let task = self
            .store
            .create_task(CreateTask {
                user_id: actor,
                title,
                description: clean_description(input.description),
                due_date: input.due_date,
                priority: input.priority.unwrap_or_default(),
                project_id: input.project_id,
            })
            .await?;

        tracing::info!(user_id = %actor, task_id = %task.id, "Task created");
        Ok(task)
    }

    /// Reads one task with its project summary
    pub async fn get_task(&self, actor: Uuid, id: Uuid) -> CoreResult<TaskWithProject> {
        let task = self.owned_task(actor, id).await?;

        let project = match task.project_id {
            Some(project_id) => self
                .store
                .find_project(project_id)
                .await?
                .map(|p| ProjectSummary::from(&p)),
            None => None,
        };

        Ok(TaskWithProject { task, project })
    }

    /// Applies a partial update
    ///
    /// A new project reference is re-validated against the actor; clearing
    /// it is always allowed. Completion of a trashed task is frozen, as with
    /// [`Self::toggle_complete`].
    pub async fn update_task(
        &self,
        actor: Uuid,
        id: Uuid,
        mut update: UpdateTask,
    ) -> CoreResult<Task> {
        let task = self.owned_task(actor, id).await?;
        if task.is_trashed() {
            update.is_complete = Patch::Unchanged;
        }

        if let Patch::Set(title) = &update.title {
            update.title = Patch::Set(clean_title(title)?);
        }
        update.description = update.description.map(clean_description);

        if let Patch::Set(Some(project_id)) = update.project_id {
            self.check_project_reference(actor, project_id).await?;
        }

        self.store
            .update_task(id, update)
            .await?
            .ok_or(CoreError::NotFound("Task"))
    }

    /// Flips completion on an active task; trashed tasks come back unchanged
    pub async fn toggle_complete(&self, actor: Uuid, id: Uuid) -> CoreResult<Task> {
        let task = self.owned_task(actor, id).await?;
        if task.is_trashed() {
            return Ok(task);
        }

        let update = UpdateTask {
            is_complete: Patch::Set(!task.is_complete),
            ..Default::default()
        };
        self.store
            .update_task(id, update)
            .await?
            .ok_or(CoreError::NotFound("Task"))
    }

    /// Moves an active task to the trash; already trashed tasks are unchanged
    pub async fn soft_delete(&self, actor: Uuid, id: Uuid) -> CoreResult<Task> {
        let task = self.owned_task(actor, id).await?;
        if task.is_trashed() {
            return Ok(task);
        }

        let task = self
            .store
            .set_task_trashed(id, Some(self.clock.utc()))
            .await?
            .ok_or(CoreError::NotFound("Task"))?;

        tracing::info!(user_id = %actor, task_id = %id, "Task moved to trash");
        Ok(task)
    }

    /// Brings a trashed task back, keeping its completion flag
    pub async fn restore(&self, actor: Uuid, id: Uuid) -> CoreResult<Task> {
        let task = self.owned_task(actor, id).await?;
        if !task.is_trashed() {
            return Err(CoreError::NotInTrash);
        }

        let task = self
            .store
            .set_task_trashed(id, None)
            .await?
            .ok_or(CoreError::NotFound("Task"))?;

        tracing::info!(user_id = %actor, task_id = %id, "Task restored");
        Ok(task)
    }

    /// Permanently removes a trashed task
    pub async fn purge(&self, actor: Uuid, id: Uuid) -> CoreResult<()> {
        let task = self.owned_task(actor, id).await?;
        if !task.is_trashed() {
            return Err(CoreError::NotInTrash);
        }

        if !self.store.delete_task(id).await? {
            return Err(CoreError::NotFound("Task"));
        }

        tracing::info!(user_id = %actor, task_id = %id, "Task purged");
        Ok(())
    }

    pub async fn create_project(&self, actor: Uuid, input: NewProject) -> CoreResult<Project> {
        let name = clean_project_name(&input.name)?;
        let color = input
            .color
            .map(|c| c.trim().to_string())
            .unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string());
        check_color(&color)?;

        let project = self
            .store
            .create_project(CreateProject {
                user_id: actor,
                name,
                color,
            })
            .await?;

        tracing::info!(user_id = %actor, project_id = %project.id, "Project created");
        Ok(project)
    }

    pub async fn list_projects(&self, actor: Uuid) -> CoreResult<Vec<ProjectWithCount>> {
        Ok(self.store.list_projects(actor).await?)
    }

    pub async fn get_project(&self, actor: Uuid, id: Uuid) -> CoreResult<Project> {
        self.owned_project(actor, id).await
    }

    pub async fn update_project(
        &self,
        actor: Uuid,
        id: Uuid,
        mut update: UpdateProject,
    ) -> CoreResult<Project> {
        self.owned_project(actor, id).await?;

        if let Patch::Set(name) = &update.name {
            update.name = Patch::Set(clean_project_name(name)?);
        }
        if let Patch::Set(color) = &update.color {
            let color = color.trim().to_string();
            check_color(&color)?;
            update.color = Patch::Set(color);
        }

        self.store
            .update_project(id, update)
            .await?
            .ok_or(CoreError::NotFound("Project"))
    }

    /// Deletes a project; its tasks survive with no project
    pub async fn delete_project(&self, actor: Uuid, id: Uuid) -> CoreResult<()> {
        self.owned_project(actor, id).await?;

        if !self.store.delete_project_detaching_tasks(id).await? {
            return Err(CoreError::NotFound("Project"));
        }

        tracing::info!(user_id = %actor, project_id = %id, "Project deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("  Buy milk ").unwrap(), "Buy milk");
        assert!(matches!(clean_title("   "), Err(CoreError::Validation(_))));
        assert!(clean_title(&"x".repeat(MAX_TITLE_LEN)).is_ok());
        assert!(clean_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(clean_description(Some("  ".to_string())), None);
        assert_eq!(clean_description(Some(" a ".to_string())), Some("a".to_string()));
        assert_eq!(clean_description(None), None);
    }

    #[test]
    fn test_check_color() {
        assert!(check_color("#abc").is_ok());
        assert!(check_color("red").is_err());
    }
}
