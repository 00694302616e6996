/// Service-level tests for the filter engine, lifecycle manager and profile
/// service, run against the in-memory store.
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use mockable::DefaultClock;
use taskdeck_shared::error::CoreError;
use taskdeck_shared::models::patch::Patch;
use taskdeck_shared::models::project::{UpdateProject, DEFAULT_PROJECT_COLOR};
use taskdeck_shared::models::task::{Priority, Task, UpdateTask};
use taskdeck_shared::models::user::CreateUser;
use taskdeck_shared::services::filter::{StatusFilter, TaskCriteria, TaskFilterEngine, View};
use taskdeck_shared::services::lifecycle::{LifecycleManager, NewProject, NewTask};
use taskdeck_shared::services::profile::{ProfileService, ProfileUpdate};
use taskdeck_shared::services::SharedClock;
use taskdeck_shared::store::{InMemoryStore, Store};
use uuid::Uuid;

struct Harness {
    store: Arc<dyn Store>,
    engine: TaskFilterEngine,
    lifecycle: LifecycleManager,
    profile: ProfileService,
}

fn harness() -> Harness {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let clock: SharedClock = Arc::new(DefaultClock);
    Harness {
        engine: TaskFilterEngine::new(store.clone(), clock.clone()),
        lifecycle: LifecycleManager::new(store.clone(), clock.clone()),
        profile: ProfileService::new(store.clone(), clock),
        store,
    }
}

async fn user(h: &Harness, email: &str) -> Uuid {
    h.store
        .create_user(CreateUser {
            email: email.to_string(),
            password_hash: None,
            provider_id: None,
            name: "Tester".to_string(),
            avatar_url: None,
        })
        .await
        .unwrap()
        .id
}

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

async fn task(
    h: &Harness,
    owner: Uuid,
    title: &str,
    due: Option<DateTime<Utc>>,
    priority: Priority,
) -> Task {
    h.lifecycle
        .create_task(
            owner,
            NewTask {
                title: title.to_string(),
                due_date: due,
                priority: Some(priority),
                ..Default::default()
            },
        )
        .await
        .unwrap()
}

fn titles(tasks: &[taskdeck_shared::models::task::TaskWithProject]) -> Vec<&str> {
    tasks.iter().map(|t| t.task.title.as_str()).collect()
}

fn view(view: View) -> TaskCriteria {
    TaskCriteria {
        view: Some(view),
        ..Default::default()
    }
}

// Filter engine

#[tokio::test]
async fn test_ordering_due_ascending_nulls_last() {
    let h = harness();
    let owner = user(&h, "a@example.com").await;

    task(&h, owner, "third", Some(day(2024, 1, 3)), Priority::Low).await;
    task(&h, owner, "undated", None, Priority::High).await;
    task(&h, owner, "first", Some(day(2024, 1, 1)), Priority::High).await;

    let now = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();

    let all = h.engine.list_at(owner, &TaskCriteria::default(), now).await.unwrap();
    assert_eq!(titles(&all), vec!["first", "third", "undated"]);

    // Undated tasks have no place in a date window
    let upcoming = h.engine.list_at(owner, &view(View::Upcoming), now).await.unwrap();
    assert_eq!(titles(&upcoming), vec!["first", "third"]);
}

#[tokio::test]
async fn test_same_due_date_orders_by_priority() {
    let h = harness();
    let owner = user(&h, "a@example.com").await;
    let due = Some(day(2024, 5, 5));

    task(&h, owner, "low", due, Priority::Low).await;
    task(&h, owner, "high", due, Priority::High).await;
    task(&h, owner, "medium", due, Priority::Medium).await;

    let all = h
        .engine
        .list_at(owner, &TaskCriteria::default(), day(2024, 5, 1))
        .await
        .unwrap();
    assert_eq!(titles(&all), vec!["high", "medium", "low"]);
}

#[tokio::test]
async fn test_today_excludes_tomorrow_and_trash() {
    let h = harness();
    let owner = user(&h, "a@example.com").await;
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();

    task(&h, owner, "today", Some(day(2024, 3, 10)), Priority::Medium).await;
    task(&h, owner, "tomorrow", Some(day(2024, 3, 11)), Priority::Medium).await;
    let trashed = task(&h, owner, "trashed today", Some(day(2024, 3, 10)), Priority::High).await;
    h.lifecycle.soft_delete(owner, trashed.id).await.unwrap();

    let today = h.engine.list_at(owner, &view(View::Today), now).await.unwrap();
    assert_eq!(titles(&today), vec!["today"]);
}

#[tokio::test]
async fn test_completed_and_trash_views() {
    let h = harness();
    let owner = user(&h, "a@example.com").await;

    let done = task(&h, owner, "done", None, Priority::Medium).await;
    h.lifecycle.toggle_complete(owner, done.id).await.unwrap();
    task(&h, owner, "open", None, Priority::Medium).await;
    let gone = task(&h, owner, "gone", None, Priority::Medium).await;
    h.lifecycle.soft_delete(owner, gone.id).await.unwrap();

    let now = Utc::now();
    let completed = h.engine.list_at(owner, &view(View::Completed), now).await.unwrap();
    assert_eq!(titles(&completed), vec!["done"]);

    let trash = h.engine.list_at(owner, &view(View::Trash), now).await.unwrap();
    assert_eq!(titles(&trash), vec!["gone"]);

    let all = h.engine.list_at(owner, &TaskCriteria::default(), now).await.unwrap();
    assert_eq!(all.len(), 2, "default view hides the trash");

    let incomplete_trash = h
        .engine
        .list_at(
            owner,
            &TaskCriteria {
                view: Some(View::Trash),
                status: Some(StatusFilter::Complete),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
    assert!(incomplete_trash.is_empty(), "status narrows the trash view too");
}

#[tokio::test]
async fn test_priority_project_and_search_filters() {
    let h = harness();
    let owner = user(&h, "a@example.com").await;
    let project = h
        .lifecycle
        .create_project(
            owner,
            NewProject {
                name: "Garden".to_string(),
                color: Some("#0f0".to_string()),
            },
        )
        .await
        .unwrap();

    h.lifecycle
        .create_task(
            owner,
            NewTask {
                title: "Water tomatoes".to_string(),
                description: Some("Use the 50% FERTILIZER mix".to_string()),
                priority: Some(Priority::High),
                project_id: Some(project.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    task(&h, owner, "Call plumber", None, Priority::Low).await;

    let now = Utc::now();

    let by_priority = h
        .engine
        .list_at(
            owner,
            &TaskCriteria {
                priority: Some(Priority::Low),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(titles(&by_priority), vec!["Call plumber"]);

    let by_project = h
        .engine
        .list_at(
            owner,
            &TaskCriteria {
                project_id: Some(project.id),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(titles(&by_project), vec!["Water tomatoes"]);
    let summary = by_project[0].project.as_ref().expect("project summary attached");
    assert_eq!(summary.name, "Garden");
    assert_eq!(summary.color, "#0f0");

    let by_description = h
        .engine
        .list_at(
            owner,
            &TaskCriteria {
                search: Some("fertilizer".to_string()),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(titles(&by_description), vec!["Water tomatoes"]);

    let blank = h
        .engine
        .list_at(
            owner,
            &TaskCriteria {
                search: Some("  ".to_string()),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(blank.len(), 2);
}

#[tokio::test]
async fn test_listing_never_crosses_owners() {
    let h = harness();
    let alice = user(&h, "alice@example.com").await;
    let bob = user(&h, "bob@example.com").await;

    task(&h, alice, "alice task", None, Priority::Medium).await;
    let bob_project = h
        .lifecycle
        .create_project(
            bob,
            NewProject {
                name: "Bob".to_string(),
                color: None,
            },
        )
        .await
        .unwrap();
    h.lifecycle
        .create_task(
            bob,
            NewTask {
                title: "bob task".to_string(),
                project_id: Some(bob_project.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Filtering by a foreign project id simply matches nothing
    let foreign = h
        .engine
        .list(
            alice,
            &TaskCriteria {
                project_id: Some(bob_project.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(foreign.is_empty());

    let mine = h.engine.list(alice, &TaskCriteria::default()).await.unwrap();
    assert_eq!(titles(&mine), vec!["alice task"]);
}

// Lifecycle

#[tokio::test]
async fn test_create_task_defaults_and_trimming() {
    let h = harness();
    let owner = user(&h, "a@example.com").await;

    let created = h
        .lifecycle
        .create_task(
            owner,
            NewTask {
                title: "  Trim me  ".to_string(),
                description: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(created.title, "Trim me");
    assert_eq!(created.description, None);
    assert_eq!(created.priority, Priority::Medium);
    assert!(!created.is_complete);
    assert!(!created.is_deleted);
    assert_eq!(created.deleted_at, None);

    let err = h
        .lifecycle
        .create_task(
            owner,
            NewTask {
                title: "   ".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(ref e) if e[0].field == "title"));
}

#[tokio::test]
async fn test_soft_delete_restore_round_trip_keeps_completion() {
    let h = harness();
    let owner = user(&h, "a@example.com").await;
    let t = task(&h, owner, "round trip", None, Priority::Medium).await;

    let completed = h.lifecycle.toggle_complete(owner, t.id).await.unwrap();
    assert!(completed.is_complete);

    let trashed = h.lifecycle.soft_delete(owner, t.id).await.unwrap();
    assert!(trashed.is_deleted);
    assert!(trashed.deleted_at.is_some());
    assert!(trashed.is_complete, "soft delete preserves other fields");

    let restored = h.lifecycle.restore(owner, t.id).await.unwrap();
    assert!(!restored.is_deleted);
    assert_eq!(restored.deleted_at, None);
    assert!(restored.is_complete);
}

#[tokio::test]
async fn test_purge_requires_trash() {
    let h = harness();
    let owner = user(&h, "a@example.com").await;
    let t = task(&h, owner, "purge me", None, Priority::Medium).await;

    assert!(matches!(
        h.lifecycle.purge(owner, t.id).await,
        Err(CoreError::NotInTrash)
    ));
    assert!(matches!(
        h.lifecycle.restore(owner, t.id).await,
        Err(CoreError::NotInTrash)
    ));

    h.lifecycle.soft_delete(owner, t.id).await.unwrap();
    h.lifecycle.purge(owner, t.id).await.unwrap();

    assert!(matches!(
        h.lifecycle.get_task(owner, t.id).await,
        Err(CoreError::NotFound("Task"))
    ));
}

#[tokio::test]
async fn test_trashed_task_toggle_and_delete_are_noops() {
    let h = harness();
    let owner = user(&h, "a@example.com").await;
    let t = task(&h, owner, "idle", None, Priority::Medium).await;

    let trashed = h.lifecycle.soft_delete(owner, t.id).await.unwrap();

    let toggled = h.lifecycle.toggle_complete(owner, t.id).await.unwrap();
    assert_eq!(toggled, trashed);

    let again = h.lifecycle.soft_delete(owner, t.id).await.unwrap();
    assert_eq!(again.deleted_at, trashed.deleted_at);
}

#[tokio::test]
async fn test_update_keeps_completion_of_trashed_task() {
    let h = harness();
    let owner = user(&h, "a@example.com").await;
    let t = task(&h, owner, "idle", None, Priority::Medium).await;
    h.lifecycle.soft_delete(owner, t.id).await.unwrap();

    let updated = h
        .lifecycle
        .update_task(
            owner,
            t.id,
            UpdateTask {
                title: Patch::Set("renamed".to_string()),
                is_complete: Patch::Set(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "renamed");
    assert!(!updated.is_complete);
    assert!(updated.is_trashed());
}

#[tokio::test]
async fn test_update_task_patch_semantics() {
    let h = harness();
    let owner = user(&h, "a@example.com").await;
    let due = Some(day(2024, 9, 1));
    let t = h
        .lifecycle
        .create_task(
            owner,
            NewTask {
                title: "Patch me".to_string(),
                description: Some("keep".to_string()),
                due_date: due,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let updated = h
        .lifecycle
        .update_task(
            owner,
            t.id,
            UpdateTask {
                due_date: Patch::Set(None),
                priority: Patch::Set(Priority::High),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.due_date, None, "explicit null clears");
    assert_eq!(updated.description.as_deref(), Some("keep"), "unset keeps");
    assert_eq!(updated.priority, Priority::High);
    assert_eq!(updated.title, "Patch me");
}

#[tokio::test]
async fn test_project_reference_is_revalidated() {
    let h = harness();
    let alice = user(&h, "alice@example.com").await;
    let bob = user(&h, "bob@example.com").await;

    let bobs = h
        .lifecycle
        .create_project(
            bob,
            NewProject {
                name: "Private".to_string(),
                color: None,
            },
        )
        .await
        .unwrap();

    let err = h
        .lifecycle
        .create_task(
            alice,
            NewTask {
                title: "sneaky".to_string(),
                project_id: Some(bobs.id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidReference(_)));

    let t = task(&h, alice, "mine", None, Priority::Medium).await;
    let err = h
        .lifecycle
        .update_task(
            alice,
            t.id,
            UpdateTask {
                project_id: Patch::Set(Some(bobs.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidReference(_)));

    let cleared = h
        .lifecycle
        .update_task(
            alice,
            t.id,
            UpdateTask {
                project_id: Patch::Set(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.project_id, None);
}

#[tokio::test]
async fn test_cross_owner_access_looks_like_missing() {
    let h = harness();
    let alice = user(&h, "alice@example.com").await;
    let bob = user(&h, "bob@example.com").await;

    let bobs_task = task(&h, bob, "bob's", None, Priority::Medium).await;
    let bobs_project = h
        .lifecycle
        .create_project(
            bob,
            NewProject {
                name: "Bob".to_string(),
                color: None,
            },
        )
        .await
        .unwrap();

    let foreign = h.lifecycle.get_task(alice, bobs_task.id).await.unwrap_err();
    let missing = h.lifecycle.get_task(alice, Uuid::new_v4()).await.unwrap_err();
    assert_eq!(foreign.to_string(), missing.to_string());
    assert!(matches!(foreign, CoreError::NotFound("Task")));

    for result in [
        h.lifecycle.toggle_complete(alice, bobs_task.id).await,
        h.lifecycle.soft_delete(alice, bobs_task.id).await,
        h.lifecycle.restore(alice, bobs_task.id).await,
        h.lifecycle
            .update_task(alice, bobs_task.id, UpdateTask::default())
            .await,
    ] {
        assert!(matches!(result, Err(CoreError::NotFound("Task"))));
    }
    assert!(matches!(
        h.lifecycle.purge(alice, bobs_task.id).await,
        Err(CoreError::NotFound("Task"))
    ));

    assert!(matches!(
        h.lifecycle.get_project(alice, bobs_project.id).await,
        Err(CoreError::NotFound("Project"))
    ));
    assert!(matches!(
        h.lifecycle.delete_project(alice, bobs_project.id).await,
        Err(CoreError::NotFound("Project"))
    ));

    // Bob's data is untouched
    let still_there = h.lifecycle.get_task(bob, bobs_task.id).await.unwrap();
    assert!(!still_there.task.is_deleted);
}

#[tokio::test]
async fn test_project_crud_and_detaching_delete() {
    let h = harness();
    let owner = user(&h, "a@example.com").await;

    let project = h
        .lifecycle
        .create_project(
            owner,
            NewProject {
                name: "  Work ".to_string(),
                color: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(project.name, "Work");
    assert_eq!(project.color, DEFAULT_PROJECT_COLOR);

    let err = h
        .lifecycle
        .create_project(
            owner,
            NewProject {
                name: "Bad".to_string(),
                color: Some("blue".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(ref e) if e[0].field == "color"));

    let renamed = h
        .lifecycle
        .update_project(
            owner,
            project.id,
            UpdateProject {
                name: Patch::Set("Office".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Office");
    assert_eq!(renamed.color, DEFAULT_PROJECT_COLOR);

    let mut linked = Vec::new();
    for title in ["a", "b"] {
        linked.push(
            h.lifecycle
                .create_task(
                    owner,
                    NewTask {
                        title: title.to_string(),
                        project_id: Some(project.id),
                        ..Default::default()
                    },
                )
                .await
                .unwrap(),
        );
    }
    let trashed = &linked[1];
    h.lifecycle.soft_delete(owner, trashed.id).await.unwrap();

    let listed = h.lifecycle.list_projects(owner).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].task_count, 1, "trashed tasks are not counted");

    h.lifecycle.delete_project(owner, project.id).await.unwrap();

    for t in &linked {
        let after = h.store.find_task(t.id).await.unwrap().expect("task survives");
        assert_eq!(after.project_id, None);
    }
    assert!(h.lifecycle.list_projects(owner).await.unwrap().is_empty());
    assert!(matches!(
        h.lifecycle.get_project(owner, project.id).await,
        Err(CoreError::NotFound("Project"))
    ));
}

// Profile

#[tokio::test]
async fn test_profile_stats() {
    let h = harness();
    let owner = user(&h, "a@example.com").await;
    let yesterday = Utc::now() - Duration::days(1);

    task(&h, owner, "overdue", Some(yesterday), Priority::Medium).await;
    let done = task(&h, owner, "done late", Some(yesterday), Priority::Medium).await;
    h.lifecycle.toggle_complete(owner, done.id).await.unwrap();
    task(&h, owner, "future", Some(Utc::now() + Duration::days(3)), Priority::Medium).await;
    let binned = task(&h, owner, "binned", Some(yesterday), Priority::Medium).await;
    h.lifecycle.soft_delete(owner, binned.id).await.unwrap();
    h.lifecycle
        .create_project(
            owner,
            NewProject {
                name: "P".to_string(),
                color: None,
            },
        )
        .await
        .unwrap();

    let stats = h.profile.stats(owner).await.unwrap();
    assert_eq!(stats.total_tasks, 3);
    assert_eq!(stats.completed_tasks, 1);
    assert_eq!(stats.pending_tasks, 2);
    assert_eq!(stats.overdue_tasks, 1);
    assert_eq!(stats.trashed_tasks, 1);
    assert_eq!(stats.total_projects, 1);
}

#[tokio::test]
async fn test_profile_update_and_delete_account() {
    let h = harness();
    let owner = user(&h, "a@example.com").await;
    let t = task(&h, owner, "doomed", None, Priority::Medium).await;

    let updated = h
        .profile
        .update_profile(
            owner,
            ProfileUpdate {
                name: Patch::Set(" New Name ".to_string()),
                avatar_url: Patch::Set(Some("https://img/x.png".to_string())),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "New Name");
    assert_eq!(updated.avatar_url.as_deref(), Some("https://img/x.png"));

    let err = h
        .profile
        .update_profile(
            owner,
            ProfileUpdate {
                name: Patch::Set("   ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    h.profile.delete_account(owner).await.unwrap();
    assert!(matches!(
        h.profile.get_profile(owner).await,
        Err(CoreError::UserNotFound)
    ));
    assert!(h.store.find_task(t.id).await.unwrap().is_none());
}
