//! Docker Compose configuration types
//!
//! Only the parts of a descriptor the manager reasons about are modelled;
//! everything else is left for the backend to read from the file itself.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Docker Compose file configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposeConfig {
    /// Top-level project name
    #[serde(default)]
    pub name: Option<String>,
    /// Services, in declaration order
    #[serde(default, deserialize_with = "ordered_services")]
    pub services: Vec<(String, ServiceConfig)>,
}

impl ComposeConfig {
    /// Look up a service by name
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    /// Check whether a service is declared
    pub fn contains_service(&self, name: &str) -> bool {
        self.service(name).is_some()
    }
}

/// serde_yaml mappings keep insertion order, so going through one preserves
/// the order services were written in.
fn ordered_services<'de, D>(deserializer: D) -> Result<Vec<(String, ServiceConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    let mapping = Option::<serde_yaml::Mapping>::deserialize(deserializer)?.unwrap_or_default();

    mapping
        .into_iter()
        .map(|(key, value)| {
            let name = key
                .as_str()
                .ok_or_else(|| D::Error::custom("service names must be strings"))?
                .to_string();
            let service = if value.is_null() {
                ServiceConfig::default()
            } else {
                serde_yaml::from_value(value)
                    .map_err(|e| D::Error::custom(format!("service '{}': {}", name, e)))?
            };
            Ok((name, service))
        })
        .collect()
}

/// Service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Image name
    #[serde(default)]
    pub image: Option<String>,
    /// Build configuration; only its presence is checked
    #[serde(default)]
    pub build: Option<serde_yaml::Value>,
    /// Service dependencies
    #[serde(default)]
    pub depends_on: Option<DependsOnConfig>,
    /// Deploy configuration
    #[serde(default)]
    pub deploy: Option<DeployConfig>,
    /// Legacy replica count
    #[serde(default)]
    pub scale: Option<u32>,
    /// Profiles gating the service
    #[serde(default)]
    pub profiles: Vec<String>,
}

impl ServiceConfig {
    /// Names of the services this one depends on
    pub fn dependencies(&self) -> Vec<String> {
        match &self.depends_on {
            Some(DependsOnConfig::Array(arr)) => arr.clone(),
            Some(DependsOnConfig::Map(map)) => {
                let mut deps: Vec<String> = map.keys().cloned().collect();
                deps.sort();
                deps
            }
            None => Vec::new(),
        }
    }

    /// Whether the service runs with the given profiles active.
    ///
    /// Services without profiles always run; `*` activates every profile.
    pub fn is_active(&self, active_profiles: &[String]) -> bool {
        self.profiles.is_empty()
            || active_profiles
                .iter()
                .any(|p| p == "*" || self.profiles.contains(p))
    }

    /// Replica count declared in the descriptor, if any
    pub fn declared_replicas(&self) -> Option<u32> {
        self.scale
            .or_else(|| self.deploy.as_ref().and_then(|d| d.replicas))
    }
}

/// Depends on configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependsOnConfig {
    /// Array of service names
    Array(Vec<String>),
    /// Map of service to condition
    Map(HashMap<String, serde_yaml::Value>),
}

/// Deploy configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Number of replicas
    pub replicas: Option<u32>,
}
