//! Configuration resolution
//!
//! Settings come from (highest priority first):
//! 1. CLI flags
//! 2. `.catuprc.json` at the workspace root
//! 3. `registry=` in the workspace `.npmrc` (registry URL only)
//! 4. Built-in defaults

use crate::cli::CliArgs;
use crate::domain::TargetPolicy;
use crate::error::ConfigError;
use crate::registry::{DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT, NPM_REGISTRY_URL};
use crate::update::{DetectOptions, PackageFilter, DEFAULT_CONCURRENCY};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Config file name looked up at the workspace root
pub const CONFIG_FILE: &str = ".catuprc.json";

/// Contents of `.catuprc.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub target: Option<TargetPolicy>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub prerelease: Option<bool>,
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// Per-request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub retries: Option<u32>,
    #[serde(default)]
    pub registry: Option<String>,
    /// Per-catalog target policy overrides
    #[serde(default)]
    pub catalog_targets: HashMap<String, TargetPolicy>,
}

impl FileConfig {
    /// Read the config file from a directory; a missing file yields defaults
    pub fn from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::InvalidFile {
                    path,
                    message: e.to_string(),
                })
            }
        };

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFile {
            path,
            message: e.to_string(),
        })
    }
}

/// Read the `registry=` setting from `.npmrc`
pub fn read_npmrc_registry(dir: &Path) -> Option<String> {
    let content = std::fs::read_to_string(dir.join(".npmrc")).ok()?;

    for line in content.lines() {
        let line = line.trim();
        // Skip comments
        if line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(value) = line.strip_prefix("registry") {
            let Some(value) = value.trim_start().strip_prefix('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    None
}

/// Fully resolved settings for one command
#[derive(Debug, Clone)]
pub struct Settings {
    pub target: TargetPolicy,
    pub catalog_targets: HashMap<String, TargetPolicy>,
    pub catalogs: Vec<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub prerelease: bool,
    pub concurrency: usize,
    pub timeout: Duration,
    pub retries: u32,
    pub registry_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: TargetPolicy::default(),
            catalog_targets: HashMap::new(),
            catalogs: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            prerelease: false,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_MAX_RETRIES,
            registry_url: NPM_REGISTRY_URL.to_string(),
        }
    }
}

impl Settings {
    /// Merge CLI arguments over file config and `.npmrc`
    pub fn resolve(args: &CliArgs, file: FileConfig, npmrc_registry: Option<String>) -> Self {
        let defaults = Self::default();
        let detect = args.detect_args().cloned().unwrap_or_default();

        Self {
            target: detect.target.or(file.target).unwrap_or(defaults.target),
            catalog_targets: file.catalog_targets,
            catalogs: detect.catalog,
            include: pick_list(detect.include, file.include),
            exclude: pick_list(detect.exclude, file.exclude),
            prerelease: detect.prerelease || file.prerelease.unwrap_or(false),
            concurrency: args
                .concurrency
                .or(file.concurrency)
                .unwrap_or(defaults.concurrency)
                .max(1),
            timeout: args
                .timeout
                .or(file.timeout)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            retries: args.retries.or(file.retries).unwrap_or(defaults.retries),
            registry_url: args
                .registry
                .clone()
                .or(file.registry)
                .or(npmrc_registry)
                .unwrap_or(defaults.registry_url),
        }
    }

    /// Load file config and `.npmrc` from the workspace root and merge
    pub fn load(args: &CliArgs, root: &Path) -> Result<Self, ConfigError> {
        let file = FileConfig::from_dir(root)?;
        Ok(Self::resolve(args, file, read_npmrc_registry(root)))
    }

    /// Build the package filter
    pub fn filter(&self) -> Result<PackageFilter, ConfigError> {
        PackageFilter::new()
            .with_include(&self.include)?
            .with_exclude(&self.exclude)
    }

    /// Build detection options; `lookup_budget` bounds each package lookup
    pub fn detect_options(&self, lookup_budget: Duration) -> Result<DetectOptions, ConfigError> {
        let mut options = DetectOptions::new()
            .with_target(self.target)
            .with_prerelease(self.prerelease)
            .with_filter(self.filter()?)
            .with_concurrency(self.concurrency)
            .with_lookup_timeout(lookup_budget)
            .with_catalogs(self.catalogs.clone());
        for (catalog, target) in &self.catalog_targets {
            options = options.with_catalog_target(catalog, *target);
        }
        Ok(options)
    }
}

/// CLI list wins when given, otherwise the file list
fn pick_list(cli: Vec<String>, file: Vec<String>) -> Vec<String> {
    if cli.is_empty() {
        file
    } else {
        cli
    }
}
