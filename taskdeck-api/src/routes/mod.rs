/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, Google sign-in and the session user
/// - `users`: Profile, statistics and account deletion
/// - `projects`: Project CRUD
/// - `tasks`: Task listings and the trash lifecycle
pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;
