//! The resolution pipeline: validate, resolve dependencies, emit
//! directives.
//!
//! Every stage is a pure function of the schema and its inputs. A failed
//! stage returns an error and nothing else; no partial directive is ever
//! produced.
//!
//! # Example
//!
//! ```
//! use recipe_core::{OptionSchema, OptionSpec, Placeholders, Projection, Request, Resolver};
//!
//! let schema = OptionSchema::builder()
//!     .option(OptionSpec::int("max_fields", 512, "").project(
//!         Projection::assign("MAX_FIELDS", Default::default()),
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let resolution = Resolver::new(&schema)
//!     .resolve(&Request::new(), &Placeholders)
//!     .unwrap();
//! assert_eq!(resolution.directive.flag("MAX_FIELDS"), Some("512"));
//! ```

use serde::Serialize;

use crate::dependency::ResolvedDependencies;
use crate::directive::{BuildDirective, Flag};
use crate::env::AttributeSource;
use crate::error::Result;
use crate::projection;
use crate::request::Request;
use crate::schema::OptionSchema;
use crate::selection::Selection;

/// Everything one resolution produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub selection: Selection,
    pub dependencies: ResolvedDependencies,
    pub directive: BuildDirective,
}

/// Resolves requests against a borrowed, read-only schema.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    schema: &'a OptionSchema,
}

impl<'a> Resolver<'a> {
    pub fn new(schema: &'a OptionSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &'a OptionSchema {
        self.schema
    }

    /// Merge the request over the defaults and check every constraint in
    /// declaration order.
    ///
    /// Constraints see the merged selection, so a conflict introduced by a
    /// default is caught as well as one introduced by the user.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownOption` / `Error::InvalidValue` from the merge
    /// - `Error::ConstraintViolation` for the first violated constraint
    pub fn validate(&self, request: &Request) -> Result<Selection> {
        let selection = Selection::merge(self.schema, request)?;
        for constraint in self.schema.constraints() {
            constraint.check(&selection)?;
        }
        tracing::debug!(
            assignments = request.assignments().len(),
            constraints = self.schema.constraints().len(),
            "selection validated"
        );
        Ok(selection)
    }

    /// Evaluate every dependency rule in declaration order and merge the
    /// satisfied ones.
    ///
    /// # Errors
    ///
    /// `Error::DependencyConflict` when two satisfied rules cannot both hold.
    pub fn resolve_dependencies(&self, selection: &Selection) -> Result<ResolvedDependencies> {
        let mut dependencies = ResolvedDependencies::default();
        for rule in self.schema.rules() {
            if rule.when.evaluate(selection) {
                tracing::trace!(rule = %rule.id, "dependency rule satisfied");
                dependencies.add(rule)?;
            }
        }
        tracing::debug!(count = dependencies.len(), "dependencies resolved");
        Ok(dependencies)
    }

    /// Project every option in declaration order, then render the
    /// environment the resolved dependencies require.
    ///
    /// # Errors
    ///
    /// `Error::MissingAttribute` when `attributes` cannot supply a value an
    /// environment assignment needs.
    pub fn emit_directives(
        &self,
        selection: &Selection,
        dependencies: &ResolvedDependencies,
        attributes: &dyn AttributeSource,
    ) -> Result<BuildDirective> {
        let mut directive = BuildDirective::default();

        for spec in self.schema.options() {
            if let Some(gate) = &spec.gate {
                if !gate.evaluate(selection) {
                    tracing::trace!(option = %spec.name, %gate, "gate closed, no flags");
                    continue;
                }
            }
            directive
                .flags
                .extend(spec.projection.project(spec, selection)?);
        }

        for dependency in dependencies.iter() {
            for assignment in &dependency.env {
                let value = assignment.value.render(attributes)?;
                directive.env.insert(assignment.variable.clone(), value);
            }
        }

        tracing::debug!(
            flags = directive.flags.len(),
            env = directive.env.len(),
            "directives emitted"
        );
        Ok(directive)
    }

    /// Run validation, dependency resolution and emission in sequence.
    pub fn resolve(
        &self,
        request: &Request,
        attributes: &dyn AttributeSource,
    ) -> Result<Resolution> {
        let selection = self.validate(request)?;
        let dependencies = self.resolve_dependencies(&selection)?;
        let directive = self.emit_directives(&selection, &dependencies, attributes)?;
        Ok(Resolution {
            selection,
            dependencies,
            directive,
        })
    }

    /// Recover a selection from emitted flags. See [`projection::reparse`].
    pub fn reparse(&self, flags: &[Flag]) -> Result<Selection> {
        projection::reparse(self.schema, flags)
    }
}
