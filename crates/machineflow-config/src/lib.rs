pub mod error;

pub use error::*;

use machineflow_cloud::{CreationPolicy, ImageLookup};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable pointing directly at a config file
pub const CONFIG_PATH_ENV: &str = "MACHINEFLOW_CONFIG_PATH";

const CANDIDATES: [&str; 2] = ["machineflow.local.yaml", "machineflow.yaml"];

/// Reconciler settings read from `machineflow.yaml`
///
/// ```yaml
/// images:
///   us-east-1: ami-0123456789abcdef0
///   eu-west-1: ami-0fedcba9876543210
/// controlPlaneUserData: |
///   #!/usr/bin/env bash
///   kubeadm init
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReconcilerConfig {
    /// Default image per region
    #[serde(default)]
    pub images: ImageLookup,

    /// Replaces the built-in control-plane bootstrap script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane_user_data: Option<String>,
}

impl ReconcilerConfig {
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content, path)
    }

    /// Load the first config file found by [`find_config_file`]
    pub fn discover() -> Result<Self> {
        Self::load(find_config_file()?)
    }

    /// Build the creation policy these settings describe
    pub fn creation_policy(&self) -> CreationPolicy {
        let policy = CreationPolicy::new(self.images.clone());
        match &self.control_plane_user_data {
            Some(user_data) => policy.with_control_plane_user_data(user_data.clone()),
            None => policy,
        }
    }
}

/// machineflow's global config directory (~/.config/machineflow)
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("machineflow"))
}

/// Find the reconciler config file
///
/// Search order:
/// 1. `MACHINEFLOW_CONFIG_PATH` (direct path)
/// 2. current directory: machineflow.local.yaml, machineflow.yaml
/// 3. `./.machineflow/`, same order
/// 4. ~/.config/machineflow/machineflow.yaml
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let local_dir = current_dir.join(".machineflow");
    if local_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = local_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("machineflow").join("machineflow.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}
