//! Docker Compose file parser and project loader

use super::config::{ComposeConfig, ServiceConfig};
use super::project::{Project, Service};
use crate::error::{DcmError, Result};
use regex::{Captures, Regex};
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default compose file names, in lookup priority
pub const DEFAULT_COMPOSE_FILES: &[&str] = &["docker-compose.yml", "docker-compose.yaml"];

/// Environment variable naming the active profiles
pub const PROFILES_ENV: &str = "COMPOSE_PROFILES";

const INTERPOLATION_PATTERN: &str =
    r"\$(?:(\$)|\{([A-Za-z_][A-Za-z0-9_]*)(?:(:?-)([^}]*))?\}|([A-Za-z_][A-Za-z0-9_]*))";

/// Builds a [`Project`] from a name, descriptor files and an environment.
pub trait ProjectLoader {
    fn load(&self, name: &str, paths: &[PathBuf], env: &HashMap<String, String>)
        -> Result<Project>;
}

/// Loader backed by [`ComposeParser`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeLoader;

impl ProjectLoader for ComposeLoader {
    fn load(
        &self,
        name: &str,
        paths: &[PathBuf],
        env: &HashMap<String, String>,
    ) -> Result<Project> {
        let first = paths
            .first()
            .ok_or_else(|| DcmError::ComposeParse("No compose file given".to_string()))?;

        let mut config = ComposeConfig::default();
        for path in paths {
            let file_config = ComposeParser::parse_file(path, env)?;
            config = ComposeParser::merge_configs(config, file_config);
        }

        ComposeParser::validate(&config)?;

        if let Some(declared) = config.name.as_deref() {
            if declared != name {
                tracing::debug!("Descriptor declares name '{}', using '{}'", declared, name);
            }
        }

        let profiles = active_profiles(env);
        let (services, disabled_services): (Vec<Service>, Vec<Service>) = config
            .services
            .into_iter()
            .map(|(name, service)| Service::new(&name, service))
            .partition(|service| service.config.is_active(&profiles));

        for service in &services {
            for dep in service.config.dependencies() {
                if disabled_services.iter().any(|s| s.name == dep) {
                    return Err(DcmError::ComposeParse(format!(
                        "Service '{}' depends on service '{}' whose profile is not active",
                        service.name, dep
                    )));
                }
            }
        }
        for service in &disabled_services {
            tracing::debug!("Service '{}' disabled by profile", service.name);
        }

        let project = Project {
            name: name.to_string(),
            working_dir: first
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
            config_paths: paths.to_vec(),
            services,
            disabled_services,
        };

        project.start_order()?;

        Ok(project)
    }
}

/// Compose file parser
pub struct ComposeParser;

impl ComposeParser {
    /// Parse compose file from path
    pub fn parse_file(path: &Path, env: &HashMap<String, String>) -> Result<ComposeConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DcmError::ComposeParse(format!("Failed to read file: {}", e)))?;

        Self::parse_str(&content, env)
    }

    /// Parse compose file from string, interpolating variables from `env`
    pub fn parse_str(content: &str, env: &HashMap<String, String>) -> Result<ComposeConfig> {
        if content.trim().is_empty() {
            return Ok(ComposeConfig::default());
        }

        let mut value: Value = serde_yaml::from_str(content)
            .map_err(|e| DcmError::ComposeParse(format!("Failed to parse YAML: {}", e)))?;

        if value.is_null() {
            return Ok(ComposeConfig::default());
        }

        let pattern = Regex::new(INTERPOLATION_PATTERN)
            .map_err(|e| DcmError::ComposeParse(format!("Invalid interpolation pattern: {}", e)))?;
        interpolate_value(&mut value, env, &pattern);

        serde_yaml::from_value(value)
            .map_err(|e| DcmError::ComposeParse(format!("Failed to parse YAML: {}", e)))
    }

    /// Merge two compose configurations
    pub fn merge_configs(base: ComposeConfig, overlay: ComposeConfig) -> ComposeConfig {
        let mut result = base;

        // Merge name (overlay wins)
        if overlay.name.is_some() {
            result.name = overlay.name;
        }

        for (name, service) in overlay.services {
            match result.services.iter_mut().find(|(n, _)| *n == name) {
                Some((_, existing)) => merge_service(existing, service),
                None => result.services.push((name, service)),
            }
        }

        result
    }

    /// Validate compose configuration
    pub fn validate(config: &ComposeConfig) -> Result<()> {
        for (name, service) in &config.services {
            // Service must have either image or build
            if service.image.is_none() && service.build.is_none() {
                return Err(DcmError::ComposeParse(format!(
                    "Service '{}' must have either 'image' or 'build' specified",
                    name
                )));
            }

            for dep in service.dependencies() {
                if !config.contains_service(&dep) {
                    return Err(DcmError::ComposeParse(format!(
                        "Service '{}' depends on unknown service '{}'",
                        name, dep
                    )));
                }
            }
        }

        Ok(())
    }
}

fn merge_service(existing: &mut ServiceConfig, overlay: ServiceConfig) {
    if overlay.image.is_some() {
        existing.image = overlay.image;
    }
    if overlay.build.is_some() {
        existing.build = overlay.build;
    }
    if overlay.depends_on.is_some() {
        existing.depends_on = overlay.depends_on;
    }
    if overlay.deploy.is_some() {
        existing.deploy = overlay.deploy;
    }
    if overlay.scale.is_some() {
        existing.scale = overlay.scale;
    }
    if !overlay.profiles.is_empty() {
        existing.profiles = overlay.profiles;
    }
}

/// Profiles listed in `COMPOSE_PROFILES`, comma separated
fn active_profiles(env: &HashMap<String, String>) -> Vec<String> {
    env.get(PROFILES_ENV)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Interpolate every string scalar in a YAML tree. Keys are left alone.
fn interpolate_value(value: &mut Value, env: &HashMap<String, String>, pattern: &Regex) {
    match value {
        Value::String(s) => *s = interpolate_string(s, env, pattern),
        Value::Sequence(seq) => {
            for item in seq.iter_mut() {
                interpolate_value(item, env, pattern);
            }
        }
        Value::Mapping(map) => {
            for (_, item) in map.iter_mut() {
                interpolate_value(item, env, pattern);
            }
        }
        Value::Tagged(tagged) => interpolate_value(&mut tagged.value, env, pattern),
        _ => {}
    }
}

/// Interpolate `$$`, `${VAR}`, `${VAR:-default}`, `${VAR-default}` and `$VAR`
fn interpolate_string(s: &str, env: &HashMap<String, String>, pattern: &Regex) -> String {
    pattern
        .replace_all(s, |caps: &Captures| {
            if caps.get(1).is_some() {
                return "$".to_string();
            }

            let var = caps
                .get(2)
                .or_else(|| caps.get(5))
                .map(|m| m.as_str())
                .unwrap_or_default();
            let value = env.get(var);

            match (caps.get(3).map(|m| m.as_str()), caps.get(4)) {
                (Some(":-"), Some(default)) => match value {
                    Some(v) if !v.is_empty() => v.clone(),
                    _ => default.as_str().to_string(),
                },
                (Some("-"), Some(default)) => value
                    .cloned()
                    .unwrap_or_else(|| default.as_str().to_string()),
                _ => value.cloned().unwrap_or_else(|| {
                    tracing::warn!("The \"{}\" variable is not set. Defaulting to a blank string.", var);
                    String::new()
                }),
            }
        })
        .into_owned()
}
