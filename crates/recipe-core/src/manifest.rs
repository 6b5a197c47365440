//! TOML recipe manifests.
//!
//! A manifest declares everything a [`Recipe`] holds except derived
//! projections, which only code-defined recipes can express.
//!
//! # Example TOML
//!
//! ```toml
//! [package]
//! name = "demo"
//! git = "https://example.com/demo.git"
//! flag_style = "cmake"
//!
//! [[version]]
//! name = "1.2.0"
//! tag = "demo-1.2.0"
//!
//! [[option]]
//! name = "gpu"
//! kind = "bool"
//! default = false
//! flag = { style = "toggle", key = "DEMO_USE_GPU", also = ["DEMO_GPU_REDUCTIONS=ON"] }
//!
//! [[option]]
//! name = "arch"
//! kind = "multi"
//! values = ["60", "70", "75"]
//! default = ["70"]
//! when = "+gpu"
//! flag = { style = "assign", key = "DEMO_ARCH" }
//!
//! [[constraint]]
//! kind = "conflicts"
//! subject = "+gpu_hijack"
//! when = "~gpu"
//!
//! [[constraint]]
//! kind = "requires"
//! when = "+gpu"
//! then = "arch=70"
//!
//! [[depends_on]]
//! spec = "cuda@10:"
//! when = "+gpu"
//! env = { CUDA_HOME = "${cuda.prefix}" }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constraint::Constraint;
use crate::dependency::{DependencyRule, DependencyType};
use crate::directive::{Flag, FlagStyle};
use crate::env::EnvValue;
use crate::error::{Error, Result};
use crate::predicate::Predicate;
use crate::projection::{Case, Projection};
use crate::recipe::{Recipe, VersionSource};
use crate::schema::{OptionSchema, OptionSpec};

/// The file extension recipe manifests use.
pub const MANIFEST_EXTENSION: &str = "toml";

/// A recipe manifest as it appears on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub package: PackageSection,
    #[serde(default, rename = "version")]
    pub versions: Vec<VersionDecl>,
    #[serde(default, rename = "option")]
    pub options: Vec<OptionDecl>,
    /// Checked in file order; the first violation is reported.
    #[serde(default, rename = "constraint")]
    pub constraints: Vec<ConstraintDecl>,
    #[serde(default)]
    pub depends_on: Vec<DependsOnDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageSection {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub homepage: Option<String>,
    pub url: Option<String>,
    pub git: Option<String>,
    #[serde(default)]
    pub flag_style: FlagStyle,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionDecl {
    pub name: String,
    pub tag: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindDecl {
    Bool,
    Choice,
    Multi,
    Int,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionDecl {
    pub name: String,
    pub kind: KindDecl,
    pub default: toml::Value,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub values: Vec<String>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    /// Gate predicate.
    pub when: Option<String>,
    pub flag: Option<FlagDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "style", rename_all = "lowercase")]
pub enum FlagDecl {
    Toggle {
        key: String,
        #[serde(default)]
        also: Vec<String>,
    },
    Switch {
        key: String,
        #[serde(default)]
        also: Vec<String>,
    },
    Assign {
        key: String,
        #[serde(default)]
        case: Case,
    },
    /// Values absent from `map` emit no flag.
    Map {
        key: String,
        map: BTreeMap<String, String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConstraintDecl {
    Conflicts {
        subject: String,
        #[serde(default)]
        when: String,
        id: Option<String>,
        message: Option<String>,
    },
    Requires {
        when: String,
        then: String,
        id: Option<String>,
        message: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependsOnDecl {
    pub spec: String,
    #[serde(default)]
    pub when: String,
    #[serde(rename = "type")]
    pub types: Option<Vec<DependencyType>>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    pub id: Option<String>,
}

impl Manifest {
    /// Parse manifest TOML held in memory.
    pub fn from_toml(content: &str) -> Result<Self> {
        Self::parse_at(content, Path::new("<inline>"))
    }

    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_at(&content, path)
    }

    fn parse_at(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| Error::ManifestParse {
            path: PathBuf::from(path),
            source,
        })
    }

    /// Convert into a checked [`Recipe`].
    pub fn into_recipe(self) -> Result<Recipe> {
        let mut builder = OptionSchema::builder();

        for decl in self.options {
            builder = builder.option(decl.into_spec()?);
        }
        for decl in self.constraints {
            builder = builder.constraint(decl.into_constraint()?);
        }
        for decl in self.depends_on {
            let mut rule = DependencyRule::new(&decl.spec, &decl.when)?;
            if let Some(types) = decl.types {
                rule = rule.with_types(types);
            }
            for (variable, value) in &decl.env {
                rule = rule.with_env(variable.as_str(), EnvValue::parse(value));
            }
            if let Some(id) = decl.id {
                rule = rule.with_id(id);
            }
            builder = builder.depends_on(rule);
        }

        let versions = self
            .versions
            .into_iter()
            .map(VersionDecl::into_source)
            .collect::<Result<Vec<_>>>()?;

        let package = self.package;
        let mut recipe = Recipe::new(package.name, builder.build()?);
        recipe.description = package.description;
        recipe.homepage = package.homepage;
        recipe.url = package.url;
        recipe.git = package.git;
        recipe.versions = versions;
        recipe.flag_style = package.flag_style;
        Ok(recipe)
    }
}

impl VersionDecl {
    fn into_source(self) -> Result<VersionSource> {
        match (self.tag, self.branch) {
            (Some(tag), None) => Ok(VersionSource::tag(self.name, tag)),
            (None, Some(branch)) => Ok(VersionSource::branch(self.name, branch)),
            _ => Err(Error::invalid_schema(format!(
                "version '{}' needs exactly one of tag or branch",
                self.name
            ))),
        }
    }
}

impl ConstraintDecl {
    fn into_constraint(self) -> Result<Constraint> {
        let (mut constraint, id, message) = match self {
            ConstraintDecl::Conflicts {
                subject,
                when,
                id,
                message,
            } => (
                Constraint::conflicts(Predicate::parse(&subject)?, Predicate::parse(&when)?),
                id,
                message,
            ),
            ConstraintDecl::Requires {
                when,
                then,
                id,
                message,
            } => (
                Constraint::requires(Predicate::parse(&when)?, Predicate::parse(&then)?),
                id,
                message,
            ),
        };
        if let Some(id) = id {
            constraint = constraint.with_id(id);
        }
        if let Some(message) = message {
            constraint = constraint.with_message(message);
        }
        Ok(constraint)
    }
}

impl OptionDecl {
    fn into_spec(self) -> Result<OptionSpec> {
        let name = self.name.as_str();
        let bad_default = |expected: &str| {
            Error::invalid_schema(format!(
                "option '{name}' default {} is not {expected}",
                self.default
            ))
        };

        let mut spec = match self.kind {
            KindDecl::Bool => {
                let default = self.default.as_bool().ok_or_else(|| bad_default("a boolean"))?;
                OptionSpec::bool(name, default, &self.description)
            }
            KindDecl::Choice => {
                let default = self.default.as_str().ok_or_else(|| bad_default("a string"))?;
                OptionSpec::choice(name, self.values.clone(), default, &self.description)
            }
            KindDecl::Multi => {
                let default: Vec<String> = match &self.default {
                    toml::Value::String(s) => s.split(',').map(|m| m.trim().to_string()).collect(),
                    toml::Value::Array(items) => items
                        .iter()
                        .map(|item| item.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| bad_default("a list of strings"))?,
                    _ => return Err(bad_default("a string or list of strings")),
                };
                OptionSpec::multi(name, self.values.clone(), default, &self.description)
            }
            KindDecl::Int => {
                let default = self.default.as_integer().ok_or_else(|| bad_default("an integer"))?;
                OptionSpec::int(name, default, &self.description).with_range(self.min, self.max)
            }
        };

        if let Some(when) = &self.when {
            spec = spec.gated(Predicate::parse(when)?);
        }
        if let Some(flag) = self.flag {
            spec.projection = flag.into_projection(&spec)?;
        }
        Ok(spec)
    }
}

impl FlagDecl {
    fn into_projection(self, spec: &OptionSpec) -> Result<Projection> {
        let parse_also = |also: Vec<String>| {
            also.iter()
                .map(|text| {
                    Flag::parse(text).ok_or_else(|| {
                        Error::invalid_schema(format!(
                            "option '{}': extra flag '{text}' is not KEY=VALUE",
                            spec.name
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()
        };

        Ok(match self {
            FlagDecl::Toggle { key, also } => Projection::toggle(key).with_also(parse_also(also)?),
            FlagDecl::Switch { key, also } => Projection::switch(key).with_also(parse_also(also)?),
            FlagDecl::Assign { key, case } => Projection::assign(key, case),
            FlagDecl::Map { key, map } => {
                if let Some(unknown) = map
                    .keys()
                    .find(|value| !spec.kind.legal_values().contains(value))
                {
                    return Err(Error::invalid_value(
                        spec.name.as_str(),
                        unknown.as_str(),
                        "mapped value is not a legal choice",
                    ));
                }
                let values = spec
                    .kind
                    .legal_values()
                    .iter()
                    .map(|value| (value.clone(), map.get(value).cloned()))
                    .collect();
                Projection::Map { key, values }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Placeholders;
    use crate::request::Request;
    use crate::resolver::Resolver;

    const DEMO: &str = r#"
[package]
name = "demo"
git = "https://example.com/demo.git"

[[version]]
name = "1.2.0"
tag = "demo-1.2.0"

[[version]]
name = "main"
branch = "main"

[[option]]
name = "gpu"
kind = "bool"
default = false
flag = { style = "toggle", key = "USE_GPU", also = ["GPU_REDUCTIONS=ON"] }

[[option]]
name = "gpu_hijack"
kind = "bool"
default = false
when = "+gpu"
flag = { style = "switch", key = "HIJACK" }

[[option]]
name = "arch"
kind = "multi"
values = ["60", "70", "75"]
default = ["70"]
when = "+gpu"
flag = { style = "assign", key = "ARCH" }

[[option]]
name = "network"
kind = "choice"
values = ["gasnetex", "mpi", "none"]
default = "none"
flag = { style = "map", key = "NETWORKS", map = { gasnetex = "gasnet1", mpi = "mpi" } }

[[option]]
name = "max_fields"
kind = "int"
default = 512
min = 32
flag = { style = "assign", key = "MAX_FIELDS" }

[[constraint]]
kind = "conflicts"
subject = "+gpu_hijack"
when = "~gpu"

[[depends_on]]
spec = "cmake@3.1:"
type = ["build"]

[[depends_on]]
spec = "toolkit@10:"
when = "+gpu"
env = { TOOLKIT_HOME = "${toolkit.prefix}" }
"#;

    #[test]
    fn demo_manifest_resolves() {
        let recipe = Manifest::from_toml(DEMO).unwrap().into_recipe().unwrap();
        assert_eq!(recipe.name, "demo");
        assert_eq!(recipe.flag_style, FlagStyle::Cmake);
        assert_eq!(recipe.versions.len(), 2);

        let request = Request::parse("+gpu arch=75,60 network=gasnetex").unwrap();
        let resolution = Resolver::new(&recipe.schema)
            .resolve(&request, &Placeholders)
            .unwrap();
        let args = resolution.directive.args(FlagStyle::Plain);
        assert_eq!(
            args,
            vec![
                "USE_GPU=ON",
                "GPU_REDUCTIONS=ON",
                "HIJACK=OFF",
                "ARCH=60,75",
                "NETWORKS=gasnet1",
                "MAX_FIELDS=512",
            ]
        );
        assert_eq!(
            resolution.directive.env.get("TOOLKIT_HOME").map(String::as_str),
            Some("${toolkit.prefix}")
        );
        assert_eq!(resolution.dependencies.names(), vec!["cmake", "toolkit"]);
    }

    #[test]
    fn bad_default_rejected() {
        let toml = r#"
[package]
name = "bad"

[[option]]
name = "max_fields"
kind = "int"
default = "many"
"#;
        let err = Manifest::from_toml(toml).unwrap().into_recipe().unwrap_err();
        assert!(matches!(err, Error::InvalidSchema { .. }));
    }

    #[test]
    fn version_needs_tag_or_branch() {
        let toml = r#"
[package]
name = "bad"

[[version]]
name = "1.0"
"#;
        let err = Manifest::from_toml(toml).unwrap().into_recipe().unwrap_err();
        assert!(matches!(err, Error::InvalidSchema { .. }));
    }

    #[test]
    fn unknown_fields_rejected() {
        let toml = r#"
[package]
name = "bad"
colour = "blue"
"#;
        assert!(matches!(
            Manifest::from_toml(toml),
            Err(Error::ManifestParse { .. })
        ));
    }

    #[test]
    fn constraints_keep_file_order() {
        let toml = r#"
[package]
name = "mixed"

[[option]]
name = "x"
kind = "bool"
default = false

[[option]]
name = "y"
kind = "bool"
default = false

[[constraint]]
kind = "requires"
id = "first"
when = "+x"
then = "+y"

[[constraint]]
kind = "conflicts"
id = "second"
subject = "+x"
when = "~y"
"#;
        let recipe = Manifest::from_toml(toml).unwrap().into_recipe().unwrap();
        let ids: Vec<&str> = recipe.schema.constraints().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);

        let err = Resolver::new(&recipe.schema)
            .validate(&Request::parse("+x").unwrap())
            .unwrap_err();
        match err {
            Error::ConstraintViolation { constraint, .. } => assert_eq!(constraint, "first"),
            other => panic!("expected ConstraintViolation, got {other:?}"),
        }
    }

    #[test]
    fn map_leaving_two_choices_flagless_rejected() {
        let toml = r#"
[package]
name = "bad"

[[option]]
name = "network"
kind = "choice"
values = ["gasnetex", "mpi", "none", "ucx"]
default = "none"
flag = { style = "map", key = "NETWORKS", map = { gasnetex = "gasnet1" } }
"#;
        let err = Manifest::from_toml(toml).unwrap().into_recipe().unwrap_err();
        assert!(matches!(err, Error::InvalidSchema { .. }), "{err}");
    }

    #[test]
    fn map_with_illegal_value_rejected() {
        let toml = r#"
[package]
name = "bad"

[[option]]
name = "network"
kind = "choice"
values = ["mpi", "none"]
default = "none"
flag = { style = "map", key = "NETWORKS", map = { ucx = "ucx" } }
"#;
        let err = Manifest::from_toml(toml).unwrap().into_recipe().unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }
}
