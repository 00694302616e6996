/// Ownership checks
///
/// Every task and project belongs to exactly one user. All reads and
/// mutations of a single entity pass through [`assert_owned`], which treats
/// "exists but belongs to someone else" exactly like "does not exist". Callers
/// can therefore never learn whether a foreign id is valid.
///
/// # Example
///
/// ```ignore
/// let task = assert_owned(store.find_task(id).await?, actor)?;
/// ```
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::project::Project;
use crate::models::task::Task;

/// An entity with a single owning user
pub trait Owned {
    /// Name used in "not found" errors
    const KIND: &'static str;

    fn owner_id(&self) -> Uuid;
}

impl Owned for Task {
    const KIND: &'static str = "Task";

    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for Project {
    const KIND: &'static str = "Project";

    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// Returns the entity if it exists and belongs to `actor`
///
/// # Errors
///
/// [`CoreError::NotFound`] when the entity is absent or owned by another user.
pub fn assert_owned<T: Owned>(entity: Option<T>, actor: Uuid) -> CoreResult<T> {
    match entity {
        Some(entity) if entity.owner_id() == actor => Ok(entity),
        Some(_) => {
            tracing::debug!(actor = %actor, kind = T::KIND, "Ownership check failed");
            Err(CoreError::NotFound(T::KIND))
        }
        None => Err(CoreError::NotFound(T::KIND)),
    }
}

/// Like [`assert_owned`] but for cross references
///
/// A task pointing at a project the actor does not own is a bad request, not
/// a missing task.
pub fn assert_reference_owned<T: Owned>(entity: Option<T>, actor: Uuid) -> CoreResult<T> {
    assert_owned(entity, actor).map_err(|_| {
        CoreError::InvalidReference(format!("{} does not exist", T::KIND))
    })
}
