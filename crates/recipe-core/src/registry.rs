//! Registry of known recipes: built-ins plus manifests found on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::builtin::builtin_recipes;
use crate::config::ToolConfig;
use crate::error::{Error, Result};
use crate::manifest::{MANIFEST_EXTENSION, Manifest};
use crate::recipe::Recipe;

/// Recipes by name. A later registration replaces an earlier one with the
/// same name, so on-disk manifests can shadow built-ins.
#[derive(Debug, Clone, Default)]
pub struct RecipeRegistry {
    recipes: BTreeMap<String, Recipe>,
}

impl RecipeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in recipe.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        for recipe in builtin_recipes()? {
            registry.register(recipe);
        }
        Ok(registry)
    }

    /// Built-ins, then every manifest under the configured recipe paths in
    /// order. Paths that do not exist are skipped.
    pub fn from_config(config: &ToolConfig) -> Result<Self> {
        let mut registry = Self::with_builtins()?;
        for dir in &config.recipe_paths {
            registry.load_dir(dir)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, recipe: Recipe) {
        if self.recipes.contains_key(&recipe.name) {
            tracing::debug!(recipe = %recipe.name, "replacing registered recipe");
        }
        self.recipes.insert(recipe.name.clone(), recipe);
    }

    /// Load every `*.toml` manifest in `dir`, in file name order. Returns
    /// how many recipes were registered.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        if !dir.is_dir() {
            tracing::debug!(?dir, "recipe path missing, skipping");
            return Ok(0);
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == MANIFEST_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let recipe = Manifest::load(path)?.into_recipe()?;
            tracing::debug!(?path, recipe = %recipe.name, "loaded recipe manifest");
            self.register(recipe);
        }
        Ok(paths.len())
    }

    pub fn get(&self, name: &str) -> Option<&Recipe> {
        self.recipes.get(name)
    }

    /// Like [`get`](Self::get), failing with `Error::UnknownRecipe`.
    pub fn require(&self, name: &str) -> Result<&Recipe> {
        self.get(name)
            .ok_or_else(|| Error::UnknownRecipe(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.recipes.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.recipes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}
