//! # Taskdeck Shared Library
//!
//! Core of the Taskdeck task tracker: identity resolution, session tokens,
//! the task filter engine and the task/project lifecycle. The HTTP server in
//! `taskdeck-api` is a thin layer over this crate.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, JWT sessions, identity resolution, ownership
//! - `services`: filter engine, lifecycle manager, profile service
//! - `store`: storage port with PostgreSQL and in-memory adapters
//! - `models`: database models and partial-update types
//! - `db`: connection pool and migrations
//! - `error`: the core error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::{CoreError, CoreResult, FieldError};

/// Current version of the Taskdeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
