use super::DemoConfig;
use crate::error::{DemoError, ErrorCode, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Location of the user-level config file, when the platform has one
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "realign-demos", "realign-demos")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub struct ConfigLoader {
    explicit: Option<PathBuf>,
    fallback: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader for an explicit `-c` path, falling back to the user config file
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            fallback: default_config_path(),
        }
    }

    /// Loader that never looks outside the given path
    pub fn with_fallback(explicit: Option<PathBuf>, fallback: Option<PathBuf>) -> Self {
        Self { explicit, fallback }
    }

    /// Read the file, apply environment overrides and validate
    pub async fn load(&self) -> Result<DemoConfig> {
        let mut config = self.load_file().await?;
        config.merge_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Read the config file without environment overrides
    pub async fn load_file(&self) -> Result<DemoConfig> {
        if let Some(path) = &self.explicit {
            if !fs::try_exists(path).await.unwrap_or(false) {
                return Err(DemoError::config_with_code(
                    ErrorCode::CONFIG_NOT_FOUND,
                    format!("config file {} does not exist", path.display()),
                ));
            }
            return Self::parse_file(path).await;
        }

        match &self.fallback {
            Some(path) if fs::try_exists(path).await.unwrap_or(false) => {
                Self::parse_file(path).await
            }
            _ => {
                debug!("No config file found, using defaults");
                Ok(DemoConfig::default())
            }
        }
    }

    async fn parse_file(path: &Path) -> Result<DemoConfig> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path).await.map_err(|e| {
            DemoError::config_with_code(
                ErrorCode::CONFIG_NOT_FOUND,
                format!("cannot read {}", path.display()),
            )
            .with_source(e)
        })?;

        toml::from_str(&content).map_err(|e| {
            DemoError::config_with_code(
                ErrorCode::CONFIG_PARSE_ERROR,
                format!("invalid TOML in {}", path.display()),
            )
            .with_source(e)
        })
    }
}
