use super::Config;
use super::schema::LOG_LEVELS;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::Path;

impl Config {
    /// Load `~/.stepwise/config.toml`, writing defaults on first use.
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let stepwise_dir = home.join(".stepwise");

        if !stepwise_dir.exists() {
            fs::create_dir_all(&stepwise_dir).context("Failed to create .stepwise directory")?;
        }

        Self::load_from_path(stepwise_dir.join("config.toml"))
    }

    /// Load a config file, creating it with defaults when missing. `~` is
    /// expanded.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = path.as_ref().to_string_lossy();
        let config_path = std::path::PathBuf::from(shellexpand::tilde(&raw).into_owned());

        let mut config = if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path.clone_from(&config_path);
            config
        } else {
            let config = Self {
                config_path: config_path.clone(),
                ..Self::default()
            };
            config.save()?;
            config
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.browser.command_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "browser.command_timeout_ms must be > 0".into(),
            ));
        }

        if self.gate.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "gate.timeout_secs must be > 0".into(),
            ));
        }

        if self.gate.enabled {
            url::Url::parse(&self.gate.endpoint).map_err(|e| {
                ConfigError::Validation(format!(
                    "gate.endpoint is not a valid URL ({}): {e}",
                    self.gate.endpoint
                ))
            })?;
        }

        let level = self.observability.log_level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "observability.log_level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.observability.log_level
            )));
        }

        Ok(())
    }
}
