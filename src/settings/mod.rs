//! Invocation settings
//!
//! [`RuntimeConfig`] carries the global flags of one invocation and is
//! passed explicitly to whatever needs it. [`SettingsStore`] persists the
//! project file, and [`Confirm`] asks the user before it is overwritten.

pub mod prompt;
pub mod store;

pub use prompt::{Confirm, TerminalConfirm};
pub use store::{SettingsStore, DEFAULT_CONFIG_NAME, ENV_PREFIX};

use std::path::{Component, Path, PathBuf};

/// Default docker daemon address
pub const DEFAULT_DOCKER_ADDR: &str = "unix:///var/run/docker.sock";

/// Global options for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Project settings file
    pub config_file: PathBuf,
    /// Verbose logging
    pub verbose: bool,
    /// Docker daemon address handed to the backend
    pub docker_addr: String,
    /// Directory the discovery walk starts from
    pub root: PathBuf,
}

impl RuntimeConfig {
    /// Config rooted at `root` with the settings file in its default place
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_file: root.join(DEFAULT_CONFIG_NAME),
            verbose: false,
            docker_addr: DEFAULT_DOCKER_ADDR.to_string(),
            root,
        }
    }
}

/// Resolve `path` against `cwd` and drop `.` and `..` components, so the
/// last component is the directory's real base name.
pub fn absolute_root(cwd: &Path, path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in cwd.join(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    resolved
}
