//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result, WrapErr};
use tracing::{debug, warn};

use crate::schema::RegisteredSchemas;
use crate::yaml::parse_document;

/// Environment variable listing extra schema directories (path-separated)
pub const ENV_SCHEMA_DIRS: &str = "RECIPE_SCHEMA_DIRS";

/// Environment variable overriding the output format
pub const ENV_FORMAT: &str = "RECIPE_FORMAT";

/// recipekit configuration with layered hierarchy
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directories whose schema files are registered by `$id`
    pub schema_dirs: Vec<PathBuf>,

    /// Default output format (`text` or `json`)
    pub default_format: Option<String>,

    /// Disable `format` assertions during validation
    pub skip_formats: Option<bool>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // Global user config (~/.config/recipekit/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read(&global_path) {
                config.merge(global);
            }
        }

        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Read one config file; missing or unreadable files are skipped
    fn read(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded config");
                Some(config)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed config");
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "recipekit")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Overlay environment variables
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dirs) = var(ENV_SCHEMA_DIRS) {
            self.schema_dirs
                .extend(std::env::split_paths(&dirs).filter(|p| !p.as_os_str().is_empty()));
        }
        if let Some(format) = var(ENV_FORMAT) {
            self.default_format = Some(format);
        }
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        self.schema_dirs.extend(other.schema_dirs);
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.skip_formats.is_some() {
            self.skip_formats = other.skip_formats;
        }
    }

    /// Whether `format` keywords are asserted
    pub fn validate_formats(&self) -> bool {
        !self.skip_formats.unwrap_or(false)
    }

    /// Load every `*.schema.json` / `*.schema.yaml` / `*.schema.yml` file
    /// from the configured directories, keyed by `$id`
    pub fn registered_schemas(&self) -> Result<RegisteredSchemas> {
        let mut registered = RegisteredSchemas::new();
        for dir in &self.schema_dirs {
            let entries = std::fs::read_dir(dir)
                .into_diagnostic()
                .wrap_err_with(|| format!("cannot read schema directory {}", dir.display()))?;

            let mut paths: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| is_schema_file(path))
                .collect();
            paths.sort();

            for path in paths {
                let content = std::fs::read_to_string(&path).into_diagnostic()?;
                let name = path.display().to_string();
                let schema = parse_document(&content, &name)?;
                if !registered.insert_by_id(schema) {
                    warn!(path = %name, "schema has no $id, not registered");
                }
            }
        }
        debug!(count = registered.len(), "registered schemas");
        Ok(registered)
    }
}

fn is_schema_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| {
            n.ends_with(".schema.json") || n.ends_with(".schema.yaml") || n.ends_with(".schema.yml")
        })
        .unwrap_or(false)
}
