//! Build configuration resolution for package recipes.
//!
//! A [`Recipe`] declares an [`OptionSchema`]: typed options, constraints
//! between them, conditional dependency rules, and how each option
//! projects onto build-tool flags. The [`Resolver`] turns a user
//! [`Request`] into a validated [`Selection`], the merged
//! [`ResolvedDependencies`], and an ordered [`BuildDirective`].
//!
//! Recipes come from [`builtin`] or from TOML [`manifest`] files found
//! through the layered [`config`].

pub mod builtin;
pub mod config;
pub mod constraint;
pub mod dependency;
pub mod directive;
pub mod env;
pub mod error;
pub mod manifest;
pub mod predicate;
pub mod projection;
pub mod recipe;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod schema;
pub mod selection;
pub mod value;
pub mod version;

pub use config::{ConfigLoader, ToolConfig};
pub use constraint::{Constraint, ConstraintKind};
pub use dependency::{
    DependencyRule, DependencySpec, DependencyType, ResolvedDependencies, ResolvedDependency,
};
pub use directive::{BuildDirective, Flag, FlagStyle};
pub use env::{AttributeSource, EnvAssignment, EnvValue, Placeholders, StaticAttributes};
pub use error::{Error, Result};
pub use manifest::Manifest;
pub use predicate::Predicate;
pub use projection::{Case, Projection};
pub use recipe::{Recipe, SourceRef, VersionSource};
pub use registry::RecipeRegistry;
pub use request::Request;
pub use resolver::{Resolution, Resolver};
pub use schema::{OptionKind, OptionSchema, OptionSpec, SchemaBuilder};
pub use selection::Selection;
pub use value::{OptionValue, RawValue};
pub use version::VersionConstraint;
