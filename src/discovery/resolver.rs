//! Effective project identity

use super::metadata::MetadataOverlay;
use std::path::{Path, PathBuf};

/// Name used when a directory has no base name (e.g. `/`)
const FALLBACK_NAME: &str = "default";

/// The resolved identity of one discovered project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveProjectConfig {
    /// Project name, never empty
    pub name: String,
    /// Descriptor file to load
    pub descriptor_path: PathBuf,
    /// Directory the project was found in
    pub root_directory: PathBuf,
}

/// Merge discovery defaults with the overlay.
///
/// Returns `None` when neither a matched descriptor nor an overlay `file`
/// is available. The descriptor is not checked for existence here.
pub fn resolve(
    directory: &Path,
    matched: Option<&str>,
    overlay: Option<&MetadataOverlay>,
) -> Option<EffectiveProjectConfig> {
    let name = overlay
        .and_then(|o| non_empty(o.name.as_deref()))
        .map(str::to_string)
        .unwrap_or_else(|| base_name(directory));

    let file = overlay
        .and_then(|o| non_empty(o.file.as_deref()))
        .or_else(|| non_empty(matched))?;

    Some(EffectiveProjectConfig {
        name,
        descriptor_path: directory.join(file),
        root_directory: directory.to_path_buf(),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn base_name(directory: &Path) -> String {
    directory
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(file: Option<&str>, name: Option<&str>) -> MetadataOverlay {
        MetadataOverlay {
            file: file.map(str::to_string),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults_without_overlay() {
        let config = resolve(Path::new("/srv/shop"), Some("docker-compose.yml"), None).unwrap();
        assert_eq!(config.name, "shop");
        assert_eq!(config.descriptor_path, PathBuf::from("/srv/shop/docker-compose.yml"));
        assert_eq!(config.root_directory, PathBuf::from("/srv/shop"));
    }

    #[test]
    fn test_overlay_overrides_both() {
        let o = overlay(Some("app.yml"), Some("custom"));
        let config = resolve(Path::new("/srv/shop"), Some("docker-compose.yml"), Some(&o)).unwrap();
        assert_eq!(config.name, "custom");
        assert_eq!(config.descriptor_path, PathBuf::from("/srv/shop/app.yml"));
    }

    #[test]
    fn test_empty_overlay_values_fall_back() {
        let o = overlay(Some(""), Some(""));
        let config = resolve(Path::new("/srv/shop"), Some("docker-compose.yaml"), Some(&o)).unwrap();
        assert_eq!(config.name, "shop");
        assert_eq!(config.descriptor_path, PathBuf::from("/srv/shop/docker-compose.yaml"));
    }

    #[test]
    fn test_nothing_to_load() {
        let o = overlay(None, Some("custom"));
        assert_eq!(resolve(Path::new("/srv/shop"), None, Some(&o)), None);
        assert_eq!(resolve(Path::new("/srv/shop"), None, None), None);
    }

    #[test]
    fn test_root_path_uses_fallback_name() {
        let config = resolve(Path::new("/"), Some("docker-compose.yml"), None).unwrap();
        assert_eq!(config.name, "default");
    }
}
