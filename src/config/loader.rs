//! Config source resolution and file loading

use crate::config::merge::merge_values;
use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_EXTENSIONS: &[&str] = &["yaml", "yml", "toml"];

/// Ordered configuration layers for one application, lowest to highest
/// precedence:
///
/// 1. package/application default (if supplied)
/// 2. `~/.{app}.{yaml|yml|toml}` in the user's home directory
/// 3. `{app}.{yaml|yml|toml}` in the working directory
/// 4. explicit path supplied by the caller
///
/// A layer whose file does not exist is skipped; a layer that exists but is
/// malformed fails the whole load.
#[derive(Debug, Clone)]
pub struct ConfigSources {
    app_name: String,
    default_path: Option<PathBuf>,
    explicit_path: Option<PathBuf>,
    home_dir: Option<PathBuf>,
    working_dir: Option<PathBuf>,
}

impl ConfigSources {
    /// Sources for `app_name`, discovering the home and working directories
    /// from the environment.
    pub fn for_app(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            default_path: None,
            explicit_path: None,
            home_dir: None,
            working_dir: None,
        }
    }

    /// Set the lowest-precedence package default file.
    pub fn default_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_path = Some(path.into());
        self
    }

    /// Set the highest-precedence explicit config file.
    pub fn explicit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    /// Override the directory searched for `.{app}.{ext}` (normally the
    /// user's home directory).
    pub fn home_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(path.into());
        self
    }

    /// Override the directory searched for `{app}.{ext}` (normally the
    /// current working directory).
    pub fn working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }

    /// Candidate files in precedence order, lowest first.
    fn layers(&self) -> Vec<PathBuf> {
        let mut layers = Vec::new();
        if let Some(path) = &self.default_path {
            layers.push(path.clone());
        }
        let home = self.home_dir.clone().or_else(dirs::home_dir);
        if let Some(home) = home {
            if let Some(found) = first_existing(&home, &format!(".{}", self.app_name)) {
                layers.push(found);
            }
        }
        let cwd = self.working_dir.clone().or_else(|| std::env::current_dir().ok());
        if let Some(cwd) = cwd {
            if let Some(found) = first_existing(&cwd, &self.app_name) {
                layers.push(found);
            }
        }
        if let Some(path) = &self.explicit_path {
            layers.push(path.clone());
        }
        layers
    }

    /// Load and merge all existing layers into one tree.
    ///
    /// Pure over filesystem reads: no source files are modified. When no
    /// layer exists the result is an empty mapping, not an error.
    pub fn load(&self) -> Result<Value> {
        let mut merged = Value::Mapping(Mapping::new());
        for path in self.layers() {
            if !path.exists() {
                continue;
            }
            merged = merge_values(merged, parse_file(&path)?);
        }
        Ok(merged)
    }
}

/// Parse a single YAML or TOML config file into the generic tree.
pub fn parse_file(path: &Path) -> Result<Value> {
    let parse_err = |message: String| Error::ConfigParse {
        path: path.to_path_buf(),
        message,
    };

    let content = fs::read_to_string(path).map_err(|e| parse_err(e.to_string()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let value = match ext.as_str() {
        "yaml" | "yml" => {
            serde_yaml::from_str(&content).map_err(|e| parse_err(e.to_string()))?
        }
        "toml" => {
            // Parse as TOML, then convert into the shared tree representation
            // so TOML and YAML layers merge uniformly.
            let raw: toml::Value =
                toml::from_str(&content).map_err(|e| parse_err(e.to_string()))?;
            serde_yaml::to_value(raw).map_err(|e| parse_err(e.to_string()))?
        }
        other => {
            return Err(parse_err(format!("unsupported config extension '.{other}'")));
        }
    };

    // An empty document parses as null; treat it as an empty mapping so it
    // merges as a no-op layer.
    Ok(match value {
        Value::Null => Value::Mapping(Mapping::new()),
        value => value,
    })
}

fn first_existing(dir: &Path, stem: &str) -> Option<PathBuf> {
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|path| path.exists())
}
