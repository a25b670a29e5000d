//! Bringing discovered projects up

use super::options::{translate, UpFlags};
use crate::backend::{Backend, LogConsumer, UpRequest};
use crate::compose::ProjectLoader;
use crate::discovery::{DiscoveryOutcome, EffectiveProjectConfig, ProjectLocator};
use crate::error::{DcmError, Result};
use crate::settings::RuntimeConfig;
use std::collections::HashMap;
use std::path::PathBuf;

/// Per-project orchestration state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectState {
    /// Found by the locator
    Discovered,
    /// Loaded and options translated
    Validated,
    /// Containers created, not started
    Created,
    /// Containers started
    Started,
    /// Loading, validation or the backend call failed
    Failed,
}

/// What to do when one project fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the walk at the first failure
    #[default]
    FailFast,
    /// Carry on and report every failure at the end
    KeepGoing,
}

/// A project that could not be brought up
#[derive(Debug)]
pub struct ProjectFailure {
    /// Directory the project was discovered in
    pub directory: PathBuf,
    pub error: DcmError,
}

/// Result of a full `up` walk
#[derive(Debug, Default)]
pub struct UpReport {
    /// Projects whose containers were created only
    pub created: Vec<String>,
    /// Projects started
    pub started: Vec<String>,
    /// Directories with nothing to do
    pub skipped: usize,
    /// Failures collected under [`FailurePolicy::KeepGoing`]
    pub failures: Vec<ProjectFailure>,
}

impl UpReport {
    /// Whether every project came up
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Discovers projects under the configured root and brings each one up
pub struct UpOrchestrator<L, B> {
    config: RuntimeConfig,
    flags: UpFlags,
    policy: FailurePolicy,
    loader: L,
    backend: B,
    consumer: Option<Box<dyn LogConsumer>>,
    environment: HashMap<String, String>,
}

impl<L: ProjectLoader, B: Backend> UpOrchestrator<L, B> {
    /// Create an orchestrator
    pub fn new(config: RuntimeConfig, flags: UpFlags, loader: L, backend: B) -> Self {
        Self {
            config,
            flags,
            policy: FailurePolicy::default(),
            loader,
            backend,
            consumer: None,
            environment: std::env::vars().collect(),
        }
    }

    /// Set the failure policy
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Receive container output when running attached
    pub fn with_log_consumer(mut self, consumer: Box<dyn LogConsumer>) -> Self {
        self.consumer = Some(consumer);
        self
    }

    /// Environment used for descriptor interpolation
    pub fn with_environment(mut self, environment: HashMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    /// The backend in use
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Walk the root and bring up every discovered project
    pub async fn run(&self) -> Result<UpReport> {
        let locator = ProjectLocator::new(&self.config.root);
        let mut report = UpReport::default();

        tracing::debug!("Discovering projects under {}", self.config.root.display());

        for outcome in locator.discover() {
            let (directory, result) = match outcome {
                DiscoveryOutcome::Skip { .. } => {
                    report.skipped += 1;
                    continue;
                }
                DiscoveryOutcome::Error { directory, error } => (directory, Err(error)),
                DiscoveryOutcome::Project(project) => {
                    let directory = project.root_directory.clone();
                    (directory, self.up_project(&project).await)
                }
            };

            match result {
                Ok((name, ProjectState::Created)) => report.created.push(name),
                Ok((name, _)) => report.started.push(name),
                Err(error) => match self.policy {
                    FailurePolicy::FailFast => return Err(error.in_directory(directory)),
                    FailurePolicy::KeepGoing => {
                        tracing::debug!("Continuing after failure in {}", directory.display());
                        report.failures.push(ProjectFailure { directory, error });
                    }
                },
            }
        }

        Ok(report)
    }

    /// Load, validate and bring up a single project
    pub async fn up_project(&self, config: &EffectiveProjectConfig) -> Result<(String, ProjectState)> {
        let name = config.name.clone();
        transition(&name, ProjectState::Discovered);

        let project = self
            .loader
            .load(&name, &[config.descriptor_path.clone()], &self.environment)
            .map_err(|e| DcmError::ProjectBuild {
                name: name.clone(),
                path: config.descriptor_path.clone(),
                message: e.to_string(),
            })
            .inspect_err(|_| transition(&name, ProjectState::Failed))?;
        tracing::debug!("Project: {:?}", project);

        let options = translate(&project, &self.flags)
            .inspect_err(|_| transition(&name, ProjectState::Failed))?;

        if options.view.enabled.is_empty() {
            transition(&name, ProjectState::Failed);
            return Err(DcmError::NoServiceSelected(name));
        }
        transition(&name, ProjectState::Validated);

        let result = if self.flags.no_start {
            tracing::info!("Creating project {}", name);
            self.backend
                .create(&options.view, &options.create)
                .await
                .map(|_| ProjectState::Created)
        } else {
            tracing::info!("Starting project {}", name);
            let consumer = if options.detach {
                None
            } else {
                self.consumer.as_deref()
            };
            let request = UpRequest {
                create: &options.create,
                start: &options.start,
                consumer,
            };
            self.backend
                .up(&options.view, request)
                .await
                .map(|_| ProjectState::Started)
        };

        let state = result.inspect_err(|_| transition(&name, ProjectState::Failed))?;
        transition(&name, state);
        Ok((name, state))
    }
}

fn transition(project: &str, state: ProjectState) {
    tracing::debug!("Project {} -> {:?}", project, state);
}
