//! Layered tool configuration.
//!
//! Configuration is loaded from, in order:
//! 1. Global defaults (`<config_dir>/recipe-resolver/config.toml`)
//! 2. Project config (`.recipe/config.toml`)
//! 3. Local overrides (`.recipe/config.local.toml`)
//!
//! Later layers override earlier ones. Missing layers are skipped; invalid
//! TOML in any layer is an error.
//!
//! ```toml
//! recipe_paths = ["recipes"]
//! flag_style = "plain"
//!
//! [defaults]
//! legion = "+hwloc network=mpi"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::directive::FlagStyle;
use crate::error::{Error, Result};
use crate::request::Request;

/// Directory name under the platform config dir.
pub const GLOBAL_DIR_NAME: &str = "recipe-resolver";
/// Project-level config directory.
pub const PROJECT_DIR_NAME: &str = ".recipe";

/// Effective tool configuration after all layers are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Directories searched for `*.toml` recipe manifests. Relative paths
    /// in the global layer resolve against the global config directory;
    /// in the project and local layers, against the project root.
    pub recipe_paths: Vec<PathBuf>,
    pub flag_style: Option<FlagStyle>,
    /// Default request text per recipe, applied before the user's request.
    pub defaults: BTreeMap<String, String>,
}

impl ToolConfig {
    /// Parse one layer.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| Error::ManifestParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay `other` on top of `self`.
    ///
    /// Recipe paths accumulate (earlier layers are searched first), a set
    /// flag style replaces ours, and defaults are replaced per recipe.
    pub fn merge(&mut self, other: ToolConfig) {
        for path in other.recipe_paths {
            if !self.recipe_paths.contains(&path) {
                self.recipe_paths.push(path);
            }
        }
        if other.flag_style.is_some() {
            self.flag_style = other.flag_style;
        }
        self.defaults.extend(other.defaults);
    }

    /// The configured default request for `recipe`, or an empty request.
    pub fn default_request(&self, recipe: &str) -> Result<Request> {
        match self.defaults.get(recipe) {
            Some(text) => Request::parse(text),
            None => Ok(Request::new()),
        }
    }

    fn anchor_paths(&mut self, base: &Path) {
        for path in &mut self.recipe_paths {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Loads [`ToolConfig`] for a project root.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    root: PathBuf,

    /// Override for the global config directory (used for testing).
    /// When `None`, `dirs::config_dir()` is used.
    global_config_dir_override: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            global_config_dir_override: None,
        }
    }

    /// Use `global_config_dir` in place of the platform config directory.
    pub fn with_global_config_dir(root: impl Into<PathBuf>, global_config_dir: PathBuf) -> Self {
        Self {
            root: root.into(),
            global_config_dir_override: Some(global_config_dir),
        }
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref override_dir) = self.global_config_dir_override {
            return Some(override_dir.clone());
        }
        dirs::config_dir().map(|d| d.join(GLOBAL_DIR_NAME))
    }

    fn project_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR_NAME)
    }

    /// Merge all layers.
    pub fn load(&self) -> Result<ToolConfig> {
        let mut config = ToolConfig::default();

        if let Some(global_dir) = self.global_config_dir() {
            let path = global_dir.join("config.toml");
            Self::apply_layer(&mut config, &path, &global_dir, "global")?;
        }

        let project_dir = self.project_dir();
        Self::apply_layer(
            &mut config,
            &project_dir.join("config.toml"),
            &self.root,
            "project",
        )?;
        Self::apply_layer(
            &mut config,
            &project_dir.join("config.local.toml"),
            &self.root,
            "local",
        )?;

        Ok(config)
    }

    fn apply_layer(config: &mut ToolConfig, path: &Path, base: &Path, layer: &str) -> Result<()> {
        if !path.is_file() {
            tracing::debug!(?path, layer, "No config found, skipping");
            return Ok(());
        }
        tracing::debug!(?path, layer, "Loading config");
        let content = fs::read_to_string(path)?;
        let mut parsed = ToolConfig::parse(&content, path)?;
        parsed.anchor_paths(base);
        config.merge(parsed);
        Ok(())
    }
}
