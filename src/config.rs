//! Configuration management for dossierhelper.
//!
//! A single [`Config`] object is loaded once by the entry point and passed
//! by reference into the pipeline; there is no process-wide singleton.
//! Files are discovered next to the working directory or under the OS
//! config directory, with `--config` as an explicit override.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::{RulesConfig, ScoringConfig};
use crate::drive::DriveSourceConfig;
use crate::metadata::TaggingConfig;

/// Default directory names pruned from every local walk.
fn default_ignored_directories() -> Vec<String> {
    [".git", ".Trash", "node_modules", "Library", ".cache"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Effort-estimation tunables.
///
/// Estimation only runs when the metadata snapshot carries one of the
/// author keys; the marker is searched for inside extracted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffortConfig {
    #[serde(default = "default_author_keys")]
    pub author_keys: Vec<String>,
    #[serde(default = "default_effort_marker")]
    pub marker: String,
}

fn default_author_keys() -> Vec<String> {
    vec!["kMDItemAuthors".to_string(), "author".to_string()]
}

fn default_effort_marker() -> String {
    "HoursSpent:".to_string()
}

impl Default for EffortConfig {
    fn default() -> Self {
        Self {
            author_keys: default_author_keys(),
            marker: default_effort_marker(),
        }
    }
}

impl EffortConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Report output destination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Directory the report file is written into.
    pub output_dir: String,
}

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Filesystem roots to scan. Tilde and env vars are expanded on resolve.
    #[serde(default)]
    pub search_roots: Vec<String>,

    /// Directory names excluded from the walk by path-segment match.
    #[serde(default = "default_ignored_directories")]
    pub ignored_directories: Vec<String>,

    /// Named extension groups, e.g. `documents: [pdf, docx]`. The scanner
    /// uses the union of all groups; no groups means every file qualifies.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extensions: HashMap<String, Vec<String>>,

    /// Classification rule set. Empty legacy table falls back to defaults.
    #[serde(default, skip_serializing_if = "RulesConfig::is_default")]
    pub rules: RulesConfig,

    #[serde(default, skip_serializing_if = "ScoringConfig::is_default")]
    pub scoring: ScoringConfig,

    #[serde(default, skip_serializing_if = "EffortConfig::is_default")]
    pub effort: EffortConfig,

    #[serde(default, skip_serializing_if = "TaggingConfig::is_default")]
    pub tagging: TaggingConfig,

    /// Remote drive sources, each with its own credential file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drives: Vec<DriveSourceConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting: Option<ReportingConfig>,

    /// Where this config was loaded from, for relative-path resolution.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// Configuration loading and validation errors. All of these are fatal
/// and reported before any pass runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load from an explicit path, dispatching on extension.
    /// YAML is the primary format; JSON and TOML are accepted.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("yaml")
            .to_lowercase();

        let parse_err = |e: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e,
        };
        let mut config: Config = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&raw).map_err(|e| parse_err(e.to_string()))?,
            "json" => serde_json::from_str(&raw).map_err(|e| parse_err(e.to_string()))?,
            "toml" => toml::from_str(&raw).map_err(|e| parse_err(e.to_string()))?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Auto-discover a config file: `dossierhelper.{yaml,yml,json,toml}` or
    /// `config.*` in the working directory, then the OS config directory.
    /// Falls back to defaults when nothing is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = discover_config_file() {
            tracing::debug!("loading config from {}", path.display());
            return Self::load_from_path(&path);
        }
        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Union of all configured extension groups, lowercased.
    pub fn allowed_extensions(&self) -> std::collections::HashSet<String> {
        self.extensions
            .values()
            .flatten()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect()
    }

    pub fn enabled_drives(&self) -> impl Iterator<Item = &DriveSourceConfig> {
        self.drives.iter().filter(|d| d.enabled)
    }

    /// Validate before any pass runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_roots.is_empty() && self.enabled_drives().next().is_none() {
            return Err(ConfigError::Invalid(
                "no sources configured: set search_roots or enable a drive".to_string(),
            ));
        }
        if self.scoring.cap_per_file <= 0.0 {
            return Err(ConfigError::Invalid(
                "scoring.cap_per_file must be positive".to_string(),
            ));
        }
        for rule in &self.rules.legacy {
            if rule.keywords.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "legacy rule for category '{}' has no keywords",
                    rule.category
                )));
            }
        }
        for category in &self.rules.categories {
            if category.name.is_empty() {
                return Err(ConfigError::Invalid(
                    "category rule with empty name".to_string(),
                ));
            }
        }
        for drive in self.enabled_drives() {
            if drive.name.is_empty() {
                return Err(ConfigError::Invalid("drive with empty name".to_string()));
            }
        }
        Ok(())
    }

    fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent())
            .map(|p| p.to_path_buf())
    }
}

fn discover_config_file() -> Option<PathBuf> {
    let extensions = ["yaml", "yml", "json", "toml"];
    let basenames = ["dossierhelper", "config"];

    let mut dirs: Vec<PathBuf> = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(config_dir) = dirs::config_dir() {
        dirs.push(config_dir.join("dossierhelper"));
    }

    for dir in dirs {
        for basename in basenames {
            for ext in extensions {
                let path = dir.join(format!("{}.{}", basename, ext));
                if path.exists() {
                    return Some(path);
                }
            }
        }
    }
    None
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of the config file directory.
    pub use_cwd: bool,
}

/// Resolved runtime settings derived from [`Config`].
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base directory relative paths were resolved against.
    pub base_dir: PathBuf,
    /// Expanded, absolute search roots.
    pub search_roots: Vec<PathBuf>,
    /// Resolved report output directory, when configured.
    pub report_dir: Option<PathBuf>,
}

impl Settings {
    fn resolve(config: &Config, base_dir: PathBuf) -> Self {
        let search_roots = config
            .search_roots
            .iter()
            .map(|root| {
                let expanded = shellexpand::full(root)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| root.clone());
                let path = PathBuf::from(expanded);
                if path.is_absolute() {
                    path
                } else {
                    base_dir.join(path)
                }
            })
            .collect();

        let report_dir = config.reporting.as_ref().map(|r| {
            let expanded = shellexpand::full(&r.output_dir)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| r.output_dir.clone());
            let path = PathBuf::from(expanded);
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        });

        Self {
            base_dir,
            search_roots,
            report_dir,
        }
    }
}

/// Load settings with explicit options. Returns (Settings, Config).
pub fn load_settings_with_options(options: LoadOptions) -> Result<(Settings, Config), ConfigError> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    let base_dir = if options.use_cwd {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        config
            .base_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    };

    let settings = Settings::resolve(&config, base_dir);
    Ok((settings, config))
}

/// Render a starter configuration document for `dossier init`.
pub fn starter_config_yaml() -> String {
    let config = Config {
        search_roots: vec!["~/Documents/Portfolio".to_string()],
        ignored_directories: default_ignored_directories(),
        extensions: HashMap::from([(
            "documents".to_string(),
            vec!["pdf", "docx", "txt", "md"]
                .into_iter()
                .map(String::from)
                .collect(),
        )]),
        ..Config::default()
    };
    serde_yaml::to_string(&config).unwrap_or_default()
}
