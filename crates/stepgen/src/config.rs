//! Generator configuration.
//!
//! Settings are layered: built-in defaults, then the optional project file
//! (`stepgen.json`), then environment variables prefixed with `STEPGEN_`,
//! then command-line overrides.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::scope::normalise_tag;

/// Default location of the project configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "stepgen.json";

const DEFAULT_ROOT: &str = "./src/__features__";
const DEFAULT_HASH_FILE: &str = "stepgen.hash.json";
const DEFAULT_PACKAGE_NAME: &str = "@charlesgilles/bdd-generator";
const DEFAULT_RUNNER_MODULE: &str = "jest-cucumber";
const DEFAULT_CONTEXT_IDENTIFIER: &str = "scenarioContext";

/// Errors raised while assembling the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value was present but unusable.
    #[error("invalid configuration: {0}")]
    InvalidValue(String),

    /// The configuration file exists but could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for this schema.
    #[error("failed to parse configuration file {path}: {source}")]
    Parse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },

    /// A source root does not exist or is not a directory.
    #[error("{role} root {path} is not a directory")]
    MissingRoot {
        /// Which root failed (`steps` or `features`).
        role: &'static str,
        /// The configured path.
        path: PathBuf,
    },
}

/// Log level enumeration matching tracing crate levels.
///
/// Defaults to `Info` when not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Most verbose logging, includes all trace spans.
    Trace,
    /// Debug-level information for development.
    Debug,
    /// Standard informational messages.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for failures.
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::InvalidValue(format!(
                "unknown log level '{s}', expected one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// An ignore/only tag pair, stored normalised (`@`-prefixed, lower-case).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPair {
    /// Documents or scenarios carrying this tag are left out.
    pub ignore: String,
    /// When any document or scenario carries this tag, it is singled out.
    pub only: String,
}

impl TagPair {
    /// Build a pair, normalising both tags.
    #[must_use]
    pub fn new(ignore: &str, only: &str) -> Self {
        Self {
            ignore: normalise_tag(ignore),
            only: normalise_tag(only),
        }
    }
}

/// Shape of `stepgen.json`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigFile {
    steps: Option<PathBuf>,
    features: Option<PathBuf>,
    #[serde(alias = "ignoreTag")]
    ignore_generation_tag: Option<String>,
    #[serde(alias = "onlyTag")]
    only_generation_tag: Option<String>,
    ignore_execution_tag: Option<String>,
    only_execution_tag: Option<String>,
    hash_file: Option<PathBuf>,
    package_name: Option<String>,
    runner_module: Option<String>,
    context_identifier: Option<String>,
    log_level: Option<String>,
}

/// Command-line overrides. `None` keeps the value from lower layers.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Root searched for implementation files.
    pub steps: Option<PathBuf>,
    /// Root searched for scenario documents.
    pub features: Option<PathBuf>,
    /// Location of the persisted hash record.
    pub hash_file: Option<PathBuf>,
    /// Regenerate every suite and leave the hash record untouched.
    pub force: bool,
    /// Log verbosity.
    pub log_level: Option<LogLevel>,
}

/// Configuration for a generation run.
///
/// # Environment Variables
///
/// - `STEPGEN_LOG_LEVEL`: Sets the log level (trace, debug, info, warn,
///   error)
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Root searched for `*.stepdefinitions.*` files.
    pub steps_root: PathBuf,
    /// Root searched for `.feature` documents.
    pub features_root: PathBuf,
    /// Tags filtering which documents are generated at all.
    pub generation_tags: TagPair,
    /// Tags turning scenarios into `.skip` or `.only` blocks.
    pub execution_tags: TagPair,
    /// Location of the persisted hash record.
    pub hash_file: PathBuf,
    /// Module the declarative surface is imported from.
    pub package_name: String,
    /// Module generated suites import `defineFeature` and `loadFeature` from.
    pub runner_module: String,
    /// Name of the per-scenario state object.
    pub context_identifier: String,
    /// Regenerate every suite and leave the hash record untouched.
    pub force: bool,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: LogLevel,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            steps_root: PathBuf::from(DEFAULT_ROOT),
            features_root: PathBuf::from(DEFAULT_ROOT),
            generation_tags: TagPair::new("ignore-generation", "only-generation"),
            execution_tags: TagPair::new("skip", "only"),
            hash_file: PathBuf::from(DEFAULT_HASH_FILE),
            package_name: DEFAULT_PACKAGE_NAME.to_string(),
            runner_module: DEFAULT_RUNNER_MODULE.to_string(),
            context_identifier: DEFAULT_CONTEXT_IDENTIFIER.to_string(),
            force: false,
            log_level: LogLevel::default(),
        }
    }
}

impl GeneratorConfig {
    /// Build the configuration from the project file and the environment.
    ///
    /// With `path` unset, [`DEFAULT_CONFIG_FILE`] is read when it exists.
    /// An explicitly requested file must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or
    /// when a value (including `STEPGEN_LOG_LEVEL`) is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(explicit) => Some(read_config_file(explicit)?),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Some(read_config_file(fallback)?)
                } else {
                    debug!(path = DEFAULT_CONFIG_FILE, "no configuration file, using defaults");
                    None
                }
            }
        };

        let mut config = Self::default();
        if let Some(file) = file {
            config = config.merge_file(file)?;
        }
        config.apply_env()
    }

    /// Parse configuration from JSON text layered over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the text is not a valid configuration.
    pub fn from_json(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::default().merge_file(file)
    }

    fn merge_file(mut self, file: ConfigFile) -> Result<Self, ConfigError> {
        if let Some(steps) = file.steps {
            self.steps_root = steps;
        }
        if let Some(features) = file.features {
            self.features_root = features;
        }
        if let Some(tag) = file.ignore_generation_tag {
            self.generation_tags.ignore = checked_tag("ignoreGenerationTag", &tag)?;
        }
        if let Some(tag) = file.only_generation_tag {
            self.generation_tags.only = checked_tag("onlyGenerationTag", &tag)?;
        }
        if let Some(tag) = file.ignore_execution_tag {
            self.execution_tags.ignore = checked_tag("ignoreExecutionTag", &tag)?;
        }
        if let Some(tag) = file.only_execution_tag {
            self.execution_tags.only = checked_tag("onlyExecutionTag", &tag)?;
        }
        if let Some(hash_file) = file.hash_file {
            self.hash_file = hash_file;
        }
        if let Some(name) = file.package_name {
            self.package_name = non_empty("packageName", name)?;
        }
        if let Some(module) = file.runner_module {
            self.runner_module = non_empty("runnerModule", module)?;
        }
        if let Some(ident) = file.context_identifier {
            self.context_identifier = non_empty("contextIdentifier", ident)?;
        }
        if let Some(level) = file.log_level {
            self.log_level = level.parse()?;
        }
        Ok(self)
    }

    fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(val) = env::var("STEPGEN_LOG_LEVEL") {
            self.log_level = val.parse()?;
        }
        Ok(self)
    }

    /// Apply optional overrides to an existing configuration.
    ///
    /// This is intended for CLI overrides that should take precedence over
    /// file and environment values.
    #[must_use]
    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(steps) = overrides.steps {
            self.steps_root = steps;
        }
        if let Some(features) = overrides.features {
            self.features_root = features;
        }
        if let Some(hash_file) = overrides.hash_file {
            self.hash_file = hash_file;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        self.force |= overrides.force;
        self
    }

    /// Create a new configuration with the specified log level.
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Create a new configuration reading implementation files and scenario
    /// documents from the same root.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.steps_root.clone_from(&root);
        self.features_root = root;
        self
    }

    /// Check that both source roots are directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRoot`] naming the first missing root.
    pub fn validate_roots(&self) -> Result<(), ConfigError> {
        for (role, path) in [("steps", &self.steps_root), ("features", &self.features_root)] {
            if !path.is_dir() {
                return Err(ConfigError::MissingRoot {
                    role,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded configuration file");
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn checked_tag(key: &str, tag: &str) -> Result<String, ConfigError> {
    let normalised = normalise_tag(tag);
    if normalised.len() < 2 {
        return Err(ConfigError::InvalidValue(format!(
            "'{key}' must name a tag"
        )));
    }
    Ok(normalised)
}

fn non_empty(key: &str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidValue(format!("'{key}' must not be empty")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(text: &str) -> Result<GeneratorConfig, ConfigError> {
        GeneratorConfig::from_json(Path::new(DEFAULT_CONFIG_FILE), text)
    }

    #[test]
    fn default_config_matches_documented_values() {
        let config = GeneratorConfig::default();
        assert_eq!(config.steps_root, PathBuf::from("./src/__features__"));
        assert_eq!(config.features_root, PathBuf::from("./src/__features__"));
        assert_eq!(config.generation_tags.ignore, "@ignore-generation");
        assert_eq!(config.generation_tags.only, "@only-generation");
        assert_eq!(config.execution_tags.ignore, "@skip");
        assert_eq!(config.execution_tags.only, "@only");
        assert_eq!(config.hash_file, PathBuf::from("stepgen.hash.json"));
        assert_eq!(config.runner_module, "jest-cucumber");
        assert!(!config.force);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[rstest]
    #[case("trace", LogLevel::Trace)]
    #[case("DEBUG", LogLevel::Debug)]
    #[case("Info", LogLevel::Info)]
    #[case("warn", LogLevel::Warn)]
    #[case("warning", LogLevel::Warn)]
    #[case("error", LogLevel::Error)]
    fn parses_log_levels(#[case] input: &str, #[case] expected: LogLevel) {
        assert_eq!(input.parse::<LogLevel>().ok(), Some(expected));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let Err(err) = "loud".parse::<LogLevel>() else {
            panic!("level should be rejected");
        };
        assert!(err.to_string().contains("unknown log level 'loud'"));
    }

    #[test]
    fn file_values_replace_defaults() {
        let Ok(config) = parse(
            r#"{
                "steps": "specs",
                "features": "docs",
                "onlyExecutionTag": "Focus",
                "ignoreGenerationTag": "@draft",
                "runnerModule": "vitest-cucumber",
                "logLevel": "debug"
            }"#,
        ) else {
            panic!("configuration should parse");
        };
        assert_eq!(config.steps_root, PathBuf::from("specs"));
        assert_eq!(config.features_root, PathBuf::from("docs"));
        assert_eq!(config.execution_tags.only, "@focus");
        assert_eq!(config.execution_tags.ignore, "@skip");
        assert_eq!(config.generation_tags.ignore, "@draft");
        assert_eq!(config.runner_module, "vitest-cucumber");
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn legacy_tag_keys_set_generation_tags() {
        let Ok(config) = parse(r#"{ "ignoreTag": "wip", "onlyTag": "@Focus" }"#) else {
            panic!("legacy keys should parse");
        };
        assert_eq!(config.generation_tags.ignore, "@wip");
        assert_eq!(config.generation_tags.only, "@focus");
        assert_eq!(config.execution_tags.ignore, "@skip");
    }

    #[rstest]
    #[case(r#"{ "onlyExecutionTag": "  " }"#)]
    #[case(r#"{ "ignoreGenerationTag": "@" }"#)]
    #[case(r#"{ "contextIdentifier": "" }"#)]
    fn rejects_empty_values(#[case] text: &str) {
        assert!(matches!(parse(text), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            parse(r#"{ "stepz": "typo" }"#),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn overrides_take_precedence() {
        let config = GeneratorConfig::default().apply_overrides(ConfigOverrides {
            steps: Some(PathBuf::from("a")),
            features: None,
            hash_file: Some(PathBuf::from("h.json")),
            force: true,
            log_level: Some(LogLevel::Error),
        });
        assert_eq!(config.steps_root, PathBuf::from("a"));
        assert_eq!(config.features_root, PathBuf::from("./src/__features__"));
        assert_eq!(config.hash_file, PathBuf::from("h.json"));
        assert!(config.force);
        assert_eq!(config.log_level, LogLevel::Error);
    }

    #[test]
    fn missing_root_is_reported() {
        let config = GeneratorConfig::default().with_root("/definitely/not/here");
        let Err(err) = config.validate_roots() else {
            panic!("missing root should be rejected");
        };
        assert!(matches!(err, ConfigError::MissingRoot { role: "steps", .. }));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = GeneratorConfig::load(Some(Path::new("/definitely/not/stepgen.json")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
