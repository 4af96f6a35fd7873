//! # Taskboard API Server Library
//!
//! HTTP surface of the Taskboard kanban service: accounts, projects with
//! invite links, and per-project boards of tasks and comments.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from environment variables
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Response security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
