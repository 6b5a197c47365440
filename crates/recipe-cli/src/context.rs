//! Project context: merged configuration plus the recipe registry.

use std::path::{Path, PathBuf};

use recipe_core::{ConfigLoader, FlagStyle, Recipe, RecipeRegistry, Request, ToolConfig};

use crate::cli::RequestArgs;
use crate::error::Result;

pub struct Context {
    pub config: ToolConfig,
    pub registry: RecipeRegistry,
}

impl Context {
    /// Load configuration layers for `root` and every recipe they point at.
    pub fn load(root: &Path, global_config_dir: Option<PathBuf>) -> Result<Self> {
        let loader = match global_config_dir {
            Some(dir) => ConfigLoader::with_global_config_dir(root, dir),
            None => ConfigLoader::new(root),
        };
        let config = loader.load()?;
        let registry = RecipeRegistry::from_config(&config)?;
        tracing::debug!(
            root = %root.display(),
            recipes = registry.len(),
            "context loaded"
        );
        Ok(Self { config, registry })
    }

    pub fn recipe(&self, name: &str) -> Result<&Recipe> {
        Ok(self.registry.require(name)?)
    }

    /// Configured defaults for the recipe, then the user's terms, so
    /// explicit terms win.
    pub fn request(&self, args: &RequestArgs) -> Result<Request> {
        let mut request = if args.no_defaults {
            Request::new()
        } else {
            self.config.default_request(&args.recipe)?
        };
        request.extend(Request::parse_all(&args.terms)?);
        Ok(request)
    }

    /// `--style`, then configuration, then the recipe's own style.
    pub fn flag_style(&self, recipe: &Recipe, requested: Option<&str>) -> Result<FlagStyle> {
        match requested {
            Some(text) => Ok(text.parse()?),
            None => Ok(self.config.flag_style.unwrap_or(recipe.flag_style)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(terms: &[&str], no_defaults: bool) -> RequestArgs {
        RequestArgs {
            recipe: "legion".to_string(),
            terms: terms.iter().map(|t| t.to_string()).collect(),
            no_defaults,
        }
    }

    fn context_with_config(content: &str) -> (TempDir, Context) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".recipe")).unwrap();
        fs::write(temp.path().join(".recipe/config.toml"), content).unwrap();
        let context = Context::load(temp.path(), Some(temp.path().join("global"))).unwrap();
        (temp, context)
    }

    #[test]
    fn user_terms_override_config_defaults() {
        let (_temp, context) = context_with_config(
            r#"
[defaults]
legion = "+hwloc network=mpi"
"#,
        );

        let request = context.request(&args(&["network=gasnetex"], false)).unwrap();
        let recipe = context.recipe("legion").unwrap();
        let selection = recipe_core::Resolver::new(&recipe.schema)
            .validate(&request)
            .unwrap();
        assert!(selection.is_enabled("hwloc"));
        assert_eq!(selection.get("network").unwrap().to_string(), "gasnetex");

        let bare = context.request(&args(&[], true)).unwrap();
        assert!(bare.is_empty());
    }

    #[test]
    fn style_precedence() {
        let (_temp, context) = context_with_config(r#"flag_style = "plain""#);
        let recipe = context.recipe("legion").unwrap();

        assert_eq!(context.flag_style(recipe, None).unwrap(), FlagStyle::Plain);
        assert_eq!(
            context.flag_style(recipe, Some("cmake")).unwrap(),
            FlagStyle::Cmake
        );
        assert!(context.flag_style(recipe, Some("ninja")).is_err());
    }
}
