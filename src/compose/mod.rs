//! Docker Compose project model
//!
//! Loads compose descriptors into [`Project`]s and answers the service
//! lookups and dependency queries the orchestrator needs.

pub mod config;
pub mod parser;
pub mod project;

pub use config::{ComposeConfig, ServiceConfig};
pub use parser::{ComposeLoader, ComposeParser, ProjectLoader, DEFAULT_COMPOSE_FILES, PROFILES_ENV};
pub use project::{Project, ProjectView, Service};
