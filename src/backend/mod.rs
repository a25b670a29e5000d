//! Orchestration backend boundary
//!
//! The manager never touches containers itself; it hands a filtered
//! [`ProjectView`] and lifecycle options to a [`Backend`].

pub mod docker;
pub mod logs;

pub use docker::DockerComposeBackend;
pub use logs::{ConsoleLogConsumer, LogConsumer};

use crate::compose::ProjectView;
use crate::error::Result;

/// When existing containers are torn down and rebuilt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecreatePolicy {
    /// Recreate containers whose configuration diverged from the last applied one
    #[default]
    Diverged,
    /// Always recreate
    Force,
    /// Never recreate
    Never,
}

/// Options for creating a project's containers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOptions {
    /// Services to create; empty means all enabled services
    pub services: Vec<String>,
    /// Recreate policy for the services themselves
    pub recreate: RecreatePolicy,
    /// Recreate policy for their dependencies
    pub recreate_dependencies: RecreatePolicy,
    /// Remove containers for services not in the project
    pub remove_orphans: bool,
    /// Ignore containers for services not in the project
    pub ignore_orphans: bool,
    /// Inherit anonymous volumes from previous containers
    pub inherit: bool,
    /// Pull without progress output
    pub quiet_pull: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            services: Vec::new(),
            recreate: RecreatePolicy::Diverged,
            recreate_dependencies: RecreatePolicy::Diverged,
            remove_orphans: false,
            ignore_orphans: false,
            inherit: true,
            quiet_pull: false,
        }
    }
}

/// Options for starting a project once created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartOptions {
    /// Services whose output is attached; empty means all
    pub attach_to: Vec<String>,
    /// Service whose exit code becomes the run's exit code
    pub exit_code_from: Option<String>,
    /// Stop everything when one container exits
    pub cascade_stop: bool,
    /// Wait for services to be running and healthy
    pub wait: bool,
}

/// Everything an `up` call needs
pub struct UpRequest<'a> {
    pub create: &'a CreateOptions,
    pub start: &'a StartOptions,
    /// Receives container output; `None` runs detached
    pub consumer: Option<&'a dyn LogConsumer>,
}

/// An orchestration backend
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// Create containers without starting them
    async fn create(&self, project: &ProjectView, options: &CreateOptions) -> Result<()>;

    /// Create and start containers
    async fn up(&self, project: &ProjectView, request: UpRequest<'_>) -> Result<()>;
}
