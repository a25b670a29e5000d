//! Compose project discovery
//!
//! Finds compose projects in a directory tree and resolves each one's
//! effective name and descriptor path from defaults and the optional
//! `.dcmeta.yml` overlay.

pub mod locator;
pub mod metadata;
pub mod resolver;

pub use locator::{DiscoveryOutcome, ProjectLocator};
pub use metadata::{MetadataOverlay, METADATA_FILE};
pub use resolver::{resolve, EffectiveProjectConfig};
