use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::params::CheckParams;
use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "CONTENT_CHECK_CONFIG";

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Output format used when `--format` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    /// Instance defaults every check request is layered onto.
    #[serde(default)]
    pub defaults: CheckParams,
}

impl Config {
    pub fn load() -> Result<Self, CliError> {
        Self::load_from_path(&Self::path()?)
    }

    pub fn path() -> Result<PathBuf, CliError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        let dirs = ProjectDirs::from("io", "content-check", "content-check")
            .ok_or_else(|| CliError::Other("Could not determine config directory".to_string()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load config from a specific path. A missing file means built-in defaults.
    pub fn load_from_path(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(CliError::ConfigRead)?;
        let config: Config = toml::from_str(&content)?;
        config.check_defaults()?;
        Ok(config)
    }

    /// Port and timeout in `[defaults]` must be positive, as for request params.
    fn check_defaults(&self) -> Result<(), CliError> {
        if self.defaults.port == 0 {
            return Err(CliError::ConfigInvalid(
                "defaults.port must be between 1 and 65535".to_string(),
            ));
        }
        if self.defaults.timeout == 0 {
            return Err(CliError::ConfigInvalid(
                "defaults.timeout must be a positive number of seconds".to_string(),
            ));
        }
        Ok(())
    }

    /// Save config to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(CliError::ConfigWrite)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(CliError::ConfigWrite)?;
        Ok(())
    }
}

/// Runtime context that combines config and CLI overrides
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    format_override: Option<OutputFormat>,
}

impl Context {
    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Config::load_from_path(path)?,
            None => Config::load()?,
        };
        Ok(Self::with_config(config))
    }

    /// Create context with a specific config (for testing)
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            format_override: None,
        }
    }

    pub fn set_format(&mut self, format: OutputFormat) {
        self.format_override = Some(format);
    }

    /// `--format`, then the config file, then table on a terminal and JSON otherwise.
    pub fn output_format(&self) -> OutputFormat {
        self.format_override
            .or(self.config.format)
            .unwrap_or_else(|| {
                if atty::is(atty::Stream::Stdout) {
                    OutputFormat::Table
                } else {
                    OutputFormat::Json
                }
            })
    }

    pub fn defaults(&self) -> &CheckParams {
        &self.config.defaults
    }
}
