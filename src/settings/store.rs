//! Persisted project settings (`.dcm.yml`)

use crate::error::{DcmError, Result};
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default settings file name, looked up in the working directory
pub const DEFAULT_CONFIG_NAME: &str = ".dcm.yml";

/// Prefix of environment variables that override stored keys
pub const ENV_PREFIX: &str = "DCM";

/// Key-value settings backed by a YAML file with an environment overlay
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    values: Mapping,
    env: HashMap<String, String>,
}

impl SettingsStore {
    /// Store for `path`, overlaid with the process environment.
    ///
    /// `.ini` files are rejected.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_env(path, std::env::vars().collect())
    }

    /// Store for `path` with an explicit environment
    pub fn with_env(path: impl Into<PathBuf>, env: HashMap<String, String>) -> Result<Self> {
        let path = path.into();
        if path.extension().is_some_and(|ext| ext == "ini") {
            return Err(DcmError::InvalidConfig(format!(
                "'{}': ini files are not supported, use yaml",
                path.display()
            )));
        }

        Ok(Self {
            path,
            values: Mapping::new(),
            env,
        })
    }

    /// Settings file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the settings file exists on disk
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the settings file. Returns `false` when it does not exist.
    pub fn load(&mut self) -> Result<bool> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        self.values = if content.trim().is_empty() {
            Mapping::new()
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(true)
    }

    /// Look up a key; `DCM_<KEY>` in the environment takes precedence
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.env.get(&env_key(key)) {
            return Some(value.clone());
        }

        match self.values.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Set a key in memory
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values
            .insert(Value::String(key.to_string()), Value::String(value.into()));
    }

    /// Write the settings file, creating parent directories
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(&self.path, serde_yaml::to_string(&self.values)?)?;
        Ok(())
    }
}

fn env_key(key: &str) -> String {
    format!("{}_{}", ENV_PREFIX, key.replace('-', "_").to_uppercase())
}
