//! Configuration file handling.
//!
//! This module provides loading and saving of depsentry configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/depsentry/config.toml`
//! - macOS: `~/Library/Application Support/depsentry/config.toml`
//! - Windows: `%APPDATA%\depsentry\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! known_bad_path = "/etc/depsentry/known-bad.csv"
//! default_format = "table"
//! include_optional = true
//! skip_dirs = ["node_modules", ".git", "dist"]
//!
//! [ignore]
//! packages = ["@internal/*"]
//! versions = ["posthog-js@1.297.3"]
//! ```

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::model::BadVersionEntry;

/// Application configuration.
///
/// Command-line flags override these values.
///
/// # Example
///
/// ```no_run
/// use depsentry::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Format: {}", config.default_format);
/// println!("Skipping: {:?}", config.skip_dirs);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Known-bad list used when `--known-bad` is not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_bad_path: Option<PathBuf>,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    /// Default: "table"
    pub default_format: String,

    /// Whether `optionalDependencies` count as declared dependencies.
    ///
    /// Default: true
    pub include_optional: bool,

    /// Directory names never descended into while looking for projects.
    ///
    /// Default: `node_modules`, `.git`
    pub skip_dirs: Vec<String>,

    /// Ignore list configuration for suppressing known issues.
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

/// Configuration for ignoring specific packages or findings.
///
/// Use this to suppress known false positives or accepted risks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Package names to drop from results.
    ///
    /// Supports glob patterns (e.g., "posthog-*", "@internal/*").
    pub packages: Vec<String>,

    /// Known-bad versions to disregard, written `name@version`
    /// (e.g., "posthog-node@5.11.3").
    pub versions: Vec<String>,
}

impl IgnoreConfig {
    /// Check if a package should be ignored.
    pub fn should_ignore_package(&self, package: &str) -> bool {
        self.package_patterns().iter().any(|re| re.is_match(package))
    }

    /// Check if a specific known-bad version should be disregarded.
    pub fn should_ignore_version(&self, package: &str, version: &str) -> bool {
        self.versions.iter().any(|spec| {
            // Split at the last `@` so scoped names keep their leading one.
            spec.rsplit_once('@')
                .is_some_and(|(name, v)| name == package && v == version)
        })
    }

    /// Removes ignored entries from a known-bad list.
    pub fn filter_known_bad(&self, entries: Vec<BadVersionEntry>) -> Vec<BadVersionEntry> {
        let patterns = self.package_patterns();
        let before = entries.len();
        let kept: Vec<BadVersionEntry> = entries
            .into_iter()
            .filter(|e| {
                !patterns.iter().any(|re| re.is_match(&e.package))
                    && !self.should_ignore_version(&e.package, &e.version)
            })
            .collect();
        if kept.len() < before {
            tracing::debug!(ignored = before - kept.len(), "dropped ignored known-bad entries");
        }
        kept
    }

    fn package_patterns(&self) -> Vec<Regex> {
        self.packages
            .iter()
            .filter_map(|pattern| package_glob(pattern))
            .collect()
    }
}

/// Compiles a package-name glob into an anchored regex. `*` matches any run
/// of characters, `/` included; everything else is literal.
fn package_glob(pattern: &str) -> Option<Regex> {
    let body: Vec<String> = pattern.split('*').map(regex::escape).collect();
    match Regex::new(&format!("^{}$", body.join(".*"))) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(pattern = %pattern, error = %e, "ignoring unusable package pattern");
            None
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            known_bad_path: None,
            default_format: "table".to_string(),
            include_optional: true,
            skip_dirs: vec!["node_modules".to_string(), ".git".to_string()],
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use depsentry::Config;
    ///
    /// let config = Config::load()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use depsentry::Config;
    ///
    /// let path = Config::config_path();
    /// assert!(path.ends_with("depsentry/config.toml"));
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depsentry")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
