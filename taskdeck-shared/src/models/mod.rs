/// Database models for Taskdeck
///
/// Each model owns its SQL (sqlx, PostgreSQL). Services never call these
/// directly; they go through the [`crate::store::Store`] port, whose Postgres
/// adapter delegates here.
///
/// # Models
///
/// - `user`: accounts, local and OAuth-linked
/// - `project`: per-user task groups
/// - `task`: tasks with soft-delete lifecycle
/// - `patch`: the explicit partial-update wrapper shared by all update inputs
pub mod patch;
pub mod project;
pub mod task;
pub mod user;

pub use patch::Patch;
