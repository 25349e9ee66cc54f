//! Library entrypoint for Stock Watch.
//!
//! The binary in `main.rs` wires these pieces together; integration tests
//! under `tests/` build routers and pipelines from the same modules.

use std::sync::Arc;

pub mod config;
pub mod errors;
pub mod models;

#[path = "middleware/auth.rs"]
pub mod auth;

pub mod services;

#[path = "views/render.rs"]
pub mod render;
#[path = "views/templates.rs"]
pub mod templates;

pub mod controllers;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub store: Arc<dyn services::store::Store>,
    pub jobs: services::jobs::JobTrigger,
}
