//! Task filter engine
//!
//! Turns user-facing criteria (view, status, priority, project, search) into a
//! [`TaskQuery`], runs it against the store, sorts the result and attaches
//! project summaries.
//!
//! # Views
//!
//! | View       | Constraint                                          |
//! |------------|-----------------------------------------------------|
//! | (none)     | not deleted                                         |
//! | `today`    | not deleted, due in `[start of today, tomorrow)`    |
//! | `upcoming` | not deleted, due on or after start of today         |
//! | `completed`| not deleted, complete                               |
//! | `trash`    | deleted                                             |
//!
//! Day boundaries are UTC. Status narrows any view, trash included.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use mockable::Clock;
use serde::Deserialize;
use uuid::Uuid;

use super::SharedClock;
use crate::error::CoreResult;
use crate::models::task::{Priority, Task, TaskWithProject};
use crate::store::Store;

/// Named task view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    All,
    Today,
    Upcoming,
    Completed,
    Trash,
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(View::All),
            "today" => Ok(View::Today),
            "upcoming" => Ok(View::Upcoming),
            "completed" => Ok(View::Completed),
            "trash" => Ok(View::Trash),
            other => Err(format!("Unknown view: {other}")),
        }
    }
}

/// Completion filter layered on top of the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Complete,
    Incomplete,
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complete" => Ok(StatusFilter::Complete),
            "incomplete" => Ok(StatusFilter::Incomplete),
            other => Err(format!("Unknown status: {other}")),
        }
    }
}

/// Caller-supplied filter criteria; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCriteria {
    pub view: Option<View>,
    pub status: Option<StatusFilter>,
    pub priority: Option<Priority>,
    pub project_id: Option<Uuid>,
    pub search: Option<String>,
}

/// A single predicate over a task row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Deleted(bool),
    Complete(bool),
    /// `due_date >= t`; tasks without a due date never match
    DueOnOrAfter(DateTime<Utc>),
    /// `due_date < t`; tasks without a due date never match
    DueBefore(DateTime<Utc>),
    Priority(Priority),
    Project(Uuid),
    /// Case-insensitive substring of title or description
    Search(String),
}

impl Condition {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Condition::Deleted(deleted) => task.is_deleted == *deleted,
            Condition::Complete(complete) => task.is_complete == *complete,
            Condition::DueOnOrAfter(from) => task.due_date.is_some_and(|due| due >= *from),
            Condition::DueBefore(until) => task.due_date.is_some_and(|due| due < *until),
            Condition::Priority(priority) => task.priority == *priority,
            Condition::Project(project_id) => task.project_id == Some(*project_id),
            Condition::Search(term) => {
                let needle = term.to_lowercase();
                task.title.to_lowercase().contains(&needle)
                    || task
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Resolved query: owner match plus a conjunction of conditions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub user_id: Uuid,
    pub conditions: Vec<Condition>,
}

impl TaskQuery {
    /// Resolves criteria against a fixed instant
    pub fn resolve(user_id: Uuid, criteria: &TaskCriteria, now: DateTime<Utc>) -> Self {
        let today = start_of_day(now);
        let tomorrow = today + Duration::days(1);

        let mut conditions = match criteria.view.unwrap_or(View::All) {
            View::All => vec![Condition::Deleted(false)],
            View::Today => vec![
                Condition::Deleted(false),
                Condition::DueOnOrAfter(today),
                Condition::DueBefore(tomorrow),
            ],
            View::Upcoming => vec![Condition::Deleted(false), Condition::DueOnOrAfter(today)],
            View::Completed => vec![Condition::Deleted(false), Condition::Complete(true)],
            View::Trash => vec![Condition::Deleted(true)],
        };

        match criteria.status {
            Some(StatusFilter::Complete) => conditions.push(Condition::Complete(true)),
            Some(StatusFilter::Incomplete) => conditions.push(Condition::Complete(false)),
            None => {}
        }

        if let Some(priority) = criteria.priority {
            conditions.push(Condition::Priority(priority));
        }

        if let Some(project_id) = criteria.project_id {
            conditions.push(Condition::Project(project_id));
        }

        if let Some(term) = criteria.search.as_deref().map(str::trim) {
            if !term.is_empty() {
                conditions.push(Condition::Search(term.to_string()));
            }
        }

        Self {
            user_id,
            conditions,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        task.user_id == self.user_id && self.conditions.iter().all(|c| c.matches(task))
    }
}

/// Midnight UTC of the day containing `now`
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

/// Listing order: due date ascending with undated tasks last, then priority
/// descending, newest first, and finally id
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    let by_due = match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_due
        .then_with(|| b.priority.cmp(&a.priority))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Runs filtered task listings for one owner at a time
#[derive(Clone)]
pub struct TaskFilterEngine {
    store: Arc<dyn Store>,
    clock: SharedClock,
}

impl TaskFilterEngine {
    pub fn new(store: Arc<dyn Store>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    /// Lists the owner's tasks matching `criteria`, sorted, with summaries
    ///
    /// # Errors
    ///
    /// Only storage failures.
    pub async fn list(
        &self,
        user_id: Uuid,
        criteria: &TaskCriteria,
    ) -> CoreResult<Vec<TaskWithProject>> {
        self.list_at(user_id, criteria, self.clock.utc()).await
    }

    /// Same as [`list`](Self::list) with an explicit "now"
    pub async fn list_at(
        &self,
        user_id: Uuid,
        criteria: &TaskCriteria,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<TaskWithProject>> {
        let query = TaskQuery::resolve(user_id, criteria, now);
        let mut tasks = self.store.find_tasks(&query).await?;
        tasks.sort_by(compare_tasks);

        let project_ids: Vec<Uuid> = tasks
            .iter()
            .filter_map(|t| t.project_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let summaries: HashMap<Uuid, _> = self
            .store
            .project_summaries(&project_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        tracing::debug!(
            user_id = %user_id,
            conditions = query.conditions.len(),
            results = tasks.len(),
            "Task listing resolved"
        );

        Ok(tasks
            .into_iter()
            .map(|task| {
                let project = task.project_id.and_then(|id| summaries.get(&id).cloned());
                TaskWithProject { task, project }
            })
            .collect())
    }
}
