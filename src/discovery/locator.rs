//! Recursive compose project discovery

use super::metadata::MetadataOverlay;
use super::resolver::{resolve, EffectiveProjectConfig};
use crate::compose::DEFAULT_COMPOSE_FILES;
use crate::error::DcmError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What discovery decided for one directory
#[derive(Debug)]
pub enum DiscoveryOutcome {
    /// Neither a compose file nor an overlay
    Skip { directory: PathBuf },
    /// A project to bring up
    Project(EffectiveProjectConfig),
    /// Something in the directory is broken
    Error { directory: PathBuf, error: DcmError },
}

/// Walks a directory tree looking for compose projects
#[derive(Debug, Clone)]
pub struct ProjectLocator {
    root: PathBuf,
    descriptor_names: Vec<String>,
}

impl ProjectLocator {
    /// Create a locator using the default compose file names
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            descriptor_names: DEFAULT_COMPOSE_FILES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Override the descriptor names, in priority order
    pub fn with_descriptor_names(mut self, names: Vec<String>) -> Self {
        self.descriptor_names = names;
        self
    }

    /// Root of the walk
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Visit every directory under the root, the root included.
    ///
    /// Directories are visited top-down with siblings in lexical order. A
    /// directory's outcome never stops the walk from entering its children.
    pub fn discover(&self) -> impl Iterator<Item = DiscoveryOutcome> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_dir() => Some(self.inspect(entry.path())),
                Ok(_) => None,
                Err(err) => {
                    let directory = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    let source = std::io::Error::from(err);
                    Some(DiscoveryOutcome::Error {
                        error: DcmError::DiscoveryIo {
                            path: directory.clone(),
                            source,
                        },
                        directory,
                    })
                }
            })
    }

    /// Decide what to do with a single directory
    pub fn inspect(&self, directory: &Path) -> DiscoveryOutcome {
        let matched = self
            .descriptor_names
            .iter()
            .find(|name| directory.join(name).is_file())
            .map(String::as_str);

        let overlay = match MetadataOverlay::read(directory) {
            Ok(overlay) => overlay,
            Err(error) => {
                return DiscoveryOutcome::Error {
                    directory: directory.to_path_buf(),
                    error,
                }
            }
        };

        if matched.is_none() && overlay.is_none() {
            tracing::debug!(
                "No compose or metadata file found in {}, skipping...",
                directory.display()
            );
            return DiscoveryOutcome::Skip {
                directory: directory.to_path_buf(),
            };
        }

        match resolve(directory, matched, overlay.as_ref()) {
            Some(config) => {
                tracing::debug!("Loaded config: {:?}", config);
                DiscoveryOutcome::Project(config)
            }
            None => DiscoveryOutcome::Error {
                directory: directory.to_path_buf(),
                error: DcmError::NoDescriptor {
                    directory: directory.to_path_buf(),
                },
            },
        }
    }
}
