//! Option schema: the declared options, constraints and dependency rules
//! of a recipe.
//!
//! A schema is built once through [`SchemaBuilder`] and is read-only
//! afterwards, so one schema can back any number of concurrent
//! resolutions.

use std::collections::{BTreeSet, HashMap};

use crate::constraint::Constraint;
use crate::dependency::DependencyRule;
use crate::error::{Error, Result};
use crate::predicate::Predicate;
use crate::projection::Projection;
use crate::value::{OptionValue, RawValue, parse_bool};

/// The kind of value an option holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKind {
    Bool,
    /// Exactly one of the legal values.
    Choice { values: Vec<String> },
    /// A non-empty subset of the legal values.
    Multi { values: Vec<String> },
    /// An integer within the optional inclusive bounds.
    Int { min: Option<i64>, max: Option<i64> },
}

impl OptionKind {
    pub fn label(&self) -> &'static str {
        match self {
            OptionKind::Bool => "boolean",
            OptionKind::Choice { .. } => "single-choice",
            OptionKind::Multi { .. } => "multi-choice",
            OptionKind::Int { .. } => "integer",
        }
    }

    /// Legal values for enumerations; empty for other kinds.
    pub fn legal_values(&self) -> &[String] {
        match self {
            OptionKind::Choice { values } | OptionKind::Multi { values } => values,
            OptionKind::Bool | OptionKind::Int { .. } => &[],
        }
    }
}

/// One declared option (a recipe "variant").
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    pub default: OptionValue,
    /// When set, the option only emits flags while the gate holds.
    pub gate: Option<Predicate>,
    pub projection: Projection,
}

impl OptionSpec {
    fn new(name: &str, kind: OptionKind, default: OptionValue, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            default,
            gate: None,
            projection: Projection::None,
        }
    }

    pub fn bool(name: &str, default: bool, description: &str) -> Self {
        Self::new(name, OptionKind::Bool, OptionValue::Bool(default), description)
    }

    pub fn choice<I, S>(name: &str, values: I, default: &str, description: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        Self::new(
            name,
            OptionKind::Choice { values },
            OptionValue::choice(default),
            description,
        )
    }

    pub fn multi<I, S, D, T>(name: &str, values: I, default: D, description: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        D: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        Self::new(
            name,
            OptionKind::Multi { values },
            OptionValue::multi(default),
            description,
        )
    }

    pub fn int(name: &str, default: i64, description: &str) -> Self {
        Self::new(
            name,
            OptionKind::Int {
                min: None,
                max: None,
            },
            OptionValue::Int(default),
            description,
        )
    }

    /// Bound an integer option. No effect on other kinds.
    pub fn with_range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        if let OptionKind::Int { .. } = self.kind {
            self.kind = OptionKind::Int { min, max };
        }
        self
    }

    pub fn project(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn gated(mut self, gate: Predicate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Convert a user-supplied value to this option's type.
    pub fn parse_value(&self, raw: &RawValue) -> Result<OptionValue> {
        match (&self.kind, raw) {
            (OptionKind::Bool, RawValue::Flag(b)) => Ok(OptionValue::Bool(*b)),
            (OptionKind::Bool, RawValue::Text(text)) => parse_bool(text)
                .map(OptionValue::Bool)
                .ok_or_else(|| Error::invalid_value(&self.name, text, "expected true or false")),
            (_, RawValue::Flag(b)) => Err(Error::invalid_value(
                &self.name,
                if *b { "+" } else { "~" },
                format!("a {} option needs name=value", self.kind.label()),
            )),
            (_, RawValue::Text(text)) => self.parse_text(text),
        }
    }

    fn parse_text(&self, text: &str) -> Result<OptionValue> {
        let text = text.trim();
        match &self.kind {
            OptionKind::Bool => parse_bool(text)
                .map(OptionValue::Bool)
                .ok_or_else(|| Error::invalid_value(&self.name, text, "expected true or false")),
            OptionKind::Choice { .. } => {
                self.check_member(text)?;
                Ok(OptionValue::choice(text))
            }
            OptionKind::Multi { .. } => {
                let members: BTreeSet<String> = text
                    .split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect();
                self.check_multi(&members, text)?;
                Ok(OptionValue::Multi(members))
            }
            OptionKind::Int { .. } => {
                let value = text.parse::<i64>().map_err(|e| {
                    Error::invalid_value(&self.name, text, format!("not an integer: {e}"))
                })?;
                self.check_int(value)?;
                Ok(OptionValue::Int(value))
            }
        }
    }

    /// Parse a value as it appears in an emitted flag. Enumeration values
    /// match legal values case-insensitively so case normalization inverts.
    pub(crate) fn parse_emitted(&self, text: &str) -> Result<OptionValue> {
        let canonical = |member: &str| {
            self.kind
                .legal_values()
                .iter()
                .find(|legal| legal.eq_ignore_ascii_case(member))
                .cloned()
                .ok_or_else(|| Error::invalid_value(&self.name, member, self.legal_text()))
        };
        match &self.kind {
            OptionKind::Choice { .. } => Ok(OptionValue::Choice(canonical(text.trim())?)),
            OptionKind::Multi { .. } => {
                let members = text
                    .split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(canonical)
                    .collect::<Result<BTreeSet<_>>>()?;
                self.check_multi(&members, text)?;
                Ok(OptionValue::Multi(members))
            }
            OptionKind::Bool | OptionKind::Int { .. } => self.parse_text(text),
        }
    }

    /// Check that `value` may appear in a predicate comparing this option.
    pub(crate) fn check_member(&self, value: &str) -> Result<()> {
        match &self.kind {
            OptionKind::Choice { values } | OptionKind::Multi { values } => {
                if values.iter().any(|v| v == value) {
                    Ok(())
                } else {
                    Err(Error::invalid_value(&self.name, value, self.legal_text()))
                }
            }
            OptionKind::Bool | OptionKind::Int { .. } => self.parse_text(value).map(|_| ()),
        }
    }

    fn check_multi(&self, members: &BTreeSet<String>, text: &str) -> Result<()> {
        if members.is_empty() {
            return Err(Error::invalid_value(
                &self.name,
                text,
                "at least one value is required",
            ));
        }
        members.iter().try_for_each(|m| self.check_member(m))
    }

    fn check_int(&self, value: i64) -> Result<()> {
        if let OptionKind::Int { min, max } = self.kind {
            if min.is_some_and(|lo| value < lo) || max.is_some_and(|hi| value > hi) {
                let lo = min.map(|v| v.to_string()).unwrap_or_default();
                let hi = max.map(|v| v.to_string()).unwrap_or_default();
                return Err(Error::invalid_value(
                    &self.name,
                    value.to_string(),
                    format!("outside the range {lo}..{hi}"),
                ));
            }
        }
        Ok(())
    }

    fn legal_text(&self) -> String {
        format!("not one of {}", self.kind.legal_values().join(", "))
    }

    /// Check that the default fits the kind.
    fn check_default(&self) -> Result<()> {
        match (&self.kind, &self.default) {
            (OptionKind::Bool, OptionValue::Bool(_)) => Ok(()),
            (OptionKind::Choice { .. }, OptionValue::Choice(c)) => self.check_member(c),
            (OptionKind::Multi { .. }, OptionValue::Multi(members)) => {
                self.check_multi(members, &self.default.to_string())
            }
            (OptionKind::Int { .. }, OptionValue::Int(i)) => self.check_int(*i),
            _ => Err(Error::invalid_schema(format!(
                "option '{}' has a default that is not a {} value",
                self.name,
                self.kind.label()
            ))),
        }
    }
}

/// Ordered options, constraints and dependency rules.
#[derive(Debug, Clone, Default)]
pub struct OptionSchema {
    options: Vec<OptionSpec>,
    index: HashMap<String, usize>,
    constraints: Vec<Constraint>,
    rules: Vec<DependencyRule>,
}

impl OptionSchema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Options in declaration order.
    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub fn option(&self, name: &str) -> Option<&OptionSpec> {
        self.index.get(name).map(|&i| &self.options[i])
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn rules(&self) -> &[DependencyRule] {
        &self.rules
    }
}

/// Collects schema entries and checks them on [`SchemaBuilder::build`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    options: Vec<OptionSpec>,
    constraints: Vec<Constraint>,
    rules: Vec<DependencyRule>,
}

impl SchemaBuilder {
    pub fn option(mut self, spec: OptionSpec) -> Self {
        self.options.push(spec);
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn depends_on(mut self, rule: DependencyRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Check names, defaults, projections and every predicate, then freeze
    /// the schema.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidSchema` for duplicate names, bad defaults or a
    ///   projection that does not fit its option
    /// - `Error::UnknownOption` / `Error::InvalidValue` /
    ///   `Error::InvalidPredicate` for predicates that reference missing
    ///   options or illegal values
    pub fn build(self) -> Result<OptionSchema> {
        let mut index = HashMap::with_capacity(self.options.len());
        for (i, spec) in self.options.iter().enumerate() {
            if index.insert(spec.name.clone(), i).is_some() {
                return Err(Error::invalid_schema(format!(
                    "option '{}' is declared twice",
                    spec.name
                )));
            }
            spec.check_default()?;
            spec.projection.check(spec)?;
        }

        let schema = OptionSchema {
            options: self.options,
            index,
            constraints: self.constraints,
            rules: self.rules,
        };

        for spec in &schema.options {
            if let Some(gate) = &spec.gate {
                gate.check(&schema)?;
            }
        }
        for constraint in &schema.constraints {
            constraint.check_references(&schema)?;
        }
        for rule in &schema.rules {
            rule.when.check(&schema)?;
        }

        tracing::debug!(
            options = schema.options.len(),
            constraints = schema.constraints.len(),
            rules = schema.rules.len(),
            "built option schema"
        );
        Ok(schema)
    }
}
