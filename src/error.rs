//! Error types for dcm

use std::path::PathBuf;
use thiserror::Error;

/// Result type for dcm operations
pub type Result<T> = std::result::Result<T, DcmError>;

/// dcm error types
#[derive(Error, Debug)]
pub enum DcmError {
    #[error("Error reading '{}': {source}", path.display())]
    DiscoveryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parsing '{}' failed: {message}", path.display())]
    OverlayDecode { path: PathBuf, message: String },

    #[error("No compose file found in '{}' and its metadata names none", directory.display())]
    NoDescriptor { directory: PathBuf },

    #[error("Could not create compose project '{name}' stored in '{}': {message}", path.display())]
    ProjectBuild {
        name: String,
        path: PathBuf,
        message: String,
    },

    #[error("Compose file parse error: {0}")]
    ComposeParse(String),

    #[error("No such service: {0}")]
    UnknownService(String),

    #[error("Invalid --scale option {0:?}. Should be SERVICE=NUM")]
    MalformedScaleSpec(String),

    #[error("Invalid replica count in --scale option {spec:?}: {message}")]
    InvalidReplicaCount { spec: String, message: String },

    #[error("No service selected in project '{0}'")]
    NoServiceSelected(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Project in '{}' failed: {source}", directory.display())]
    ProjectFailed {
        directory: PathBuf,
        #[source]
        source: Box<DcmError>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DcmError {
    /// Attach the directory a project was discovered in
    pub fn in_directory(self, directory: impl Into<PathBuf>) -> Self {
        DcmError::ProjectFailed {
            directory: directory.into(),
            source: Box::new(self),
        }
    }
}
