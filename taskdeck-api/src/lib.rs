//! # Taskdeck API Server Library
//!
//! HTTP surface of the Taskdeck task tracker, built on `taskdeck-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors that reject with JSON errors
//! - `oauth`: Google authorization-code client
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod oauth;
pub mod routes;
