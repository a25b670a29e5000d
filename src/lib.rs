//! dcm - Docker Compose Manager
//!
//! Finds every compose project below a directory and brings them up in
//! one go. It supports:
//!
//! - Recursive discovery of `docker-compose.yml` / `docker-compose.yaml`
//! - Per-directory `.dcmeta.yml` overrides for project name and file
//! - Scaling, service selection, attach and wait options per run
//! - A pluggable orchestration backend (`docker compose` by default)

pub mod backend;
pub mod compose;
pub mod discovery;
pub mod error;
pub mod orchestrator;
pub mod settings;

pub use error::{DcmError, Result};
