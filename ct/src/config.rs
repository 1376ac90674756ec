//! Configuration for chattemplate

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::registry;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Template used when a request names none and no model pattern matches
    #[serde(rename = "default-template")]
    pub default_template: Option<String>,

    /// Extra YAML template files registered at startup, in order
    #[serde(rename = "template-files")]
    pub template_files: Vec<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: chattemplate.yml
        let local_config = PathBuf::from("chattemplate.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/chattemplate/chattemplate.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("chattemplate").join("chattemplate.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Register every configured template file into the process-wide registry
    pub fn register_templates(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for path in &self.template_files {
            names.extend(registry::load_template_file(path)?);
        }
        Ok(names)
    }
}
