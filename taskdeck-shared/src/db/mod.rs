/// Database layer for Taskdeck
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health check
/// - `migrations`: embedded migration runner and database bootstrap
///
/// Models live in the `models` module at crate root level.
pub mod migrations;
pub mod pool;
