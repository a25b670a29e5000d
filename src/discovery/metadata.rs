//! Per-directory metadata overlays (`.dcmeta.yml`)

use crate::error::{DcmError, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

/// File name of the metadata overlay
pub const METADATA_FILE: &str = ".dcmeta.yml";

/// Overrides a user can place next to a compose project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataOverlay {
    /// Descriptor file name, relative to the directory
    #[serde(default)]
    pub file: Option<String>,
    /// Project name override
    #[serde(default)]
    pub name: Option<String>,
}

impl MetadataOverlay {
    /// Decode overlay contents; an empty or null document sets nothing
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str::<Option<Self>>(content)
            .map(Option::unwrap_or_default)
            .map_err(|e| DcmError::OverlayDecode {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// Read the overlay in `dir`.
    ///
    /// Returns `Ok(None)` when there is no overlay file.
    pub fn read(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(METADATA_FILE);
        tracing::debug!("Trying to read {}...", path.display());

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(DcmError::DiscoveryIo { path, source }),
        };

        let overlay = Self::parse(&content, &path)?;
        tracing::debug!("Parsed metadata from {}: {:?}", path.display(), overlay);
        Ok(Some(overlay))
    }
}
