//! Help-screen templates and the labels used when assembling them

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;
use thiserror::Error;

/// Errors that can occur while changing or loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
    #[error("Unable to read config file: {0}")]
    NotFound(PathBuf),
    #[error("Unable to parse YAML config file {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON config file {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
}

/// The closed set of recognised configuration keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// Description of the synthesized help option; unset to drop the option
    TextHelp,
    /// Suffix appended to the description of required options
    TextRequired,
    /// Usage line template, `%0`, `%command` and `%params` are substituted
    TextHeaderUsage,
    TextHeaderSubcommands,
    TextHeaderTopcommands,
    TextHeaderOptions,
    /// Params placeholder forced onto nodes that have subcommands
    TextParamSubcommand,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 7] = [
        ConfigKey::TextHelp,
        ConfigKey::TextRequired,
        ConfigKey::TextHeaderUsage,
        ConfigKey::TextHeaderSubcommands,
        ConfigKey::TextHeaderTopcommands,
        ConfigKey::TextHeaderOptions,
        ConfigKey::TextParamSubcommand,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::TextHelp => "text_help",
            ConfigKey::TextRequired => "text_required",
            ConfigKey::TextHeaderUsage => "text_header_usage",
            ConfigKey::TextHeaderSubcommands => "text_header_subcommands",
            ConfigKey::TextHeaderTopcommands => "text_header_topcommands",
            ConfigKey::TextHeaderOptions => "text_header_options",
            ConfigKey::TextParamSubcommand => "text_param_subcommand",
        }
    }

    fn default_value(self) -> &'static str {
        match self {
            ConfigKey::TextHelp => "Show this message",
            ConfigKey::TextRequired => " (required)",
            ConfigKey::TextHeaderUsage => "Usage: %0 %command %params",
            ConfigKey::TextHeaderSubcommands => "Subcommands:",
            ConfigKey::TextHeaderTopcommands => "Commands:",
            ConfigKey::TextHeaderOptions => "Options:",
            ConfigKey::TextParamSubcommand => "<command>",
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template values consulted while resolving commands and assembling help
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpConfig {
    values: BTreeMap<&'static str, Option<String>>,
}

impl Default for HelpConfig {
    fn default() -> Self {
        let values = ConfigKey::ALL
            .into_iter()
            .map(|key| (key.as_str(), Some(key.default_value().to_string())))
            .collect();
        HelpConfig { values }
    }
}

impl HelpConfig {
    /// Assign a value by key name. `None` clears the value, which for
    /// `text_help` removes the help option altogether.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownKey` if `key` is not one of the recognised keys.
    pub fn set(&mut self, key: &str, value: Option<&str>) -> Result<(), ConfigError> {
        let key: ConfigKey = key.parse()?;
        self.assign(key, value.map(str::to_string));
        Ok(())
    }

    /// Typed counterpart of [`HelpConfig::set`].
    pub fn assign(&mut self, key: ConfigKey, value: Option<String>) {
        debug!("Config {key} = {value:?}");
        self.values.insert(key.as_str(), value);
    }

    /// The configured value, `None` if it was explicitly cleared.
    #[must_use]
    pub fn get(&self, key: ConfigKey) -> Option<&str> {
        self.values.get(key.as_str()).and_then(|v| v.as_deref())
    }

    /// The configured value, cleared values read as empty text.
    #[must_use]
    pub fn text(&self, key: ConfigKey) -> &str {
        self.get(key).unwrap_or_default()
    }

    /// Load overrides from a YAML or JSON file on top of the defaults.
    ///
    /// A `null` value clears the key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file cannot be read,
    /// `ConfigError::Yaml`/`ConfigError::Json` if parsing fails and
    /// `ConfigError::UnknownKey` for keys outside the recognised set.
    pub fn from_file(file: &Path) -> Result<HelpConfig, ConfigError> {
        let mut config = HelpConfig::default();
        config.merge_file(file)?;
        Ok(config)
    }

    /// Apply the overrides of a YAML or JSON file to this configuration.
    ///
    /// # Errors
    ///
    /// See [`HelpConfig::from_file`].
    pub fn merge_file(&mut self, file: &Path) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(file)
            .map_err(|_| ConfigError::NotFound(file.to_path_buf()))?;
        let entries: BTreeMap<String, Option<String>> =
            if file.extension().is_some_and(|ext| ext == "json") {
                serde_json::from_str(&contents).map_err(|e| ConfigError::Json {
                    source: e,
                    path: file.to_path_buf(),
                })?
            } else {
                serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml {
                    source: e,
                    path: file.to_path_buf(),
                })?
            };
        debug!(
            "Loaded {} config overrides from {}",
            entries.len(),
            file.display()
        );
        let mut staged = self.clone();
        for (key, value) in entries {
            staged.set(&key, value.as_deref())?;
        }
        *self = staged;
        Ok(())
    }
}
