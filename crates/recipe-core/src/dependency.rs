//! Conditional dependency rules and the merged dependency set.
//!
//! A rule ties a predicate to an external package requirement:
//!
//! ```text
//! cuda@10:              when +cuda
//! kokkos+cuda cuda_arch=70  when +kokkos +cuda cuda_arch=70
//! ```
//!
//! Every satisfied rule contributes to one entry per package name. Two
//! contributions to the same package are merged: features and dependency
//! types are unioned, version constraints intersected. Contributions that
//! cannot both hold are a [`Error::DependencyConflict`].
//!
//! # Example
//!
//! ```
//! use recipe_core::dependency::{DependencyRule, ResolvedDependencies};
//!
//! let gpu = DependencyRule::new("toolkit@10:", "").unwrap();
//! let interop = DependencyRule::new("toolkit@10: with_feature=X", "").unwrap();
//!
//! let mut deps = ResolvedDependencies::default();
//! deps.add(&gpu).unwrap();
//! deps.add(&interop).unwrap();
//!
//! let toolkit = deps.get("toolkit").unwrap();
//! assert_eq!(toolkit.spec.to_string(), "toolkit >=10 with_feature=X");
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::env::{EnvAssignment, EnvValue};
use crate::error::{Error, Result};
use crate::predicate::Predicate;
use crate::request::split_terms;
use crate::version::VersionConstraint;

/// When a dependency is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    Build,
    Link,
    Run,
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DependencyType::Build => "build",
            DependencyType::Link => "link",
            DependencyType::Run => "run",
        })
    }
}

fn default_types() -> BTreeSet<DependencyType> {
    [DependencyType::Build, DependencyType::Link].into_iter().collect()
}

/// A package requirement: name, optional version range, required
/// features, and dependency types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencySpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionConstraint>,
    /// `+f` is stored as `f = "true"`, `~f` as `f = "false"`.
    pub features: BTreeMap<String, String>,
    pub types: BTreeSet<DependencyType>,
}

impl DependencySpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            features: BTreeMap::new(),
            types: default_types(),
        }
    }

    /// Parse `name[@range | <op>version][+f][~f] [k=v ...]`.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidDependencySpec {
            spec: text.to_string(),
            reason,
        };

        let trimmed = text.trim();
        let name_end = trimmed
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(trimmed.len());
        let (name, rest) = trimmed.split_at(name_end);
        if name.is_empty() {
            return Err(invalid("missing package name".to_string()));
        }

        let mut spec = Self::named(name);
        let mut rest = rest.trim_start();

        if rest.starts_with(['@', '<', '>', '=', '!']) {
            let end = rest
                .find(|c: char| c == '+' || c == '~' || c.is_whitespace())
                .unwrap_or(rest.len());
            spec.version = Some(VersionConstraint::parse(&rest[..end])?);
            rest = &rest[end..];
        }

        for term in split_terms(rest) {
            if let Some(feature) = term.strip_prefix('+') {
                spec.require_feature(feature, "true", &invalid)?;
            } else if let Some(feature) = term.strip_prefix('~') {
                spec.require_feature(feature, "false", &invalid)?;
            } else if let Some((key, value)) = term.split_once('=') {
                spec.require_feature(key, value, &invalid)?;
            } else {
                return Err(invalid(format!("unexpected term '{term}'")));
            }
        }

        Ok(spec)
    }

    fn require_feature(
        &mut self,
        key: &str,
        value: &str,
        invalid: &dyn Fn(String) -> Error,
    ) -> Result<()> {
        if key.is_empty() || value.is_empty() {
            return Err(invalid("empty feature".to_string()));
        }
        if let Some(existing) = self.features.get(key) {
            if existing != value {
                return Err(invalid(format!(
                    "feature '{key}' given as both '{existing}' and '{value}'"
                )));
            }
        }
        self.features.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Merge `other` into `self`, all or nothing.
    ///
    /// Returns the reason when the two specs cannot both hold.
    pub fn merge(&mut self, other: &DependencySpec) -> std::result::Result<(), String> {
        let version = match (&self.version, &other.version) {
            (Some(a), Some(b)) => {
                let merged = a.intersect(b);
                if !merged.is_satisfiable() {
                    return Err(format!(
                        "version constraints '{a}' and '{b}' cannot both hold"
                    ));
                }
                Some(merged)
            }
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        };

        let mut features = self.features.clone();
        for (key, value) in &other.features {
            match features.get(key) {
                Some(existing) if existing != value => {
                    return Err(format!(
                        "feature '{key}' required as both '{existing}' and '{value}'"
                    ));
                }
                _ => {
                    features.insert(key.clone(), value.clone());
                }
            }
        }

        self.version = version;
        self.features = features;
        self.types.extend(other.types.iter().copied());
        Ok(())
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(version) = &self.version {
            write!(f, " {version}")?;
        }
        for (key, value) in &self.features {
            match value.as_str() {
                "true" => write!(f, " +{key}")?,
                "false" => write!(f, " ~{key}")?,
                other => write!(f, " {key}={other}")?,
            }
        }
        Ok(())
    }
}

/// A predicate-gated requirement on an external package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRule {
    pub id: String,
    pub when: Predicate,
    pub spec: DependencySpec,
    pub env: Vec<EnvAssignment>,
}

impl DependencyRule {
    /// Build a rule from spec text and predicate text. Empty `when` text
    /// makes the dependency unconditional.
    pub fn new(spec: &str, when: &str) -> Result<Self> {
        let parsed = DependencySpec::parse(spec)?;
        let predicate = Predicate::parse(when)?;
        let id = if when.trim().is_empty() {
            spec.trim().to_string()
        } else {
            format!("{} when {}", spec.trim(), when.trim())
        };
        Ok(Self {
            id,
            when: predicate,
            spec: parsed,
            env: Vec::new(),
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_types(mut self, types: impl IntoIterator<Item = DependencyType>) -> Self {
        self.spec.types = types.into_iter().collect();
        self
    }

    pub fn with_env(mut self, variable: impl Into<String>, value: EnvValue) -> Self {
        self.env.push(EnvAssignment::new(variable, value));
        self
    }
}

/// One merged package requirement and the rules that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    pub spec: DependencySpec,
    /// Contributing rule ids in declaration order.
    pub rules: Vec<String>,
    pub env: Vec<EnvAssignment>,
}

/// The merged dependency set, keyed by package name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedDependencies {
    entries: BTreeMap<String, ResolvedDependency>,
}

impl ResolvedDependencies {
    /// Merge a satisfied rule into the set.
    ///
    /// # Errors
    ///
    /// `Error::DependencyConflict` when the rule's spec cannot be merged
    /// with what earlier rules required of the same package, or when it
    /// assigns an environment variable another rule already assigned to a
    /// different value.
    pub fn add(&mut self, rule: &DependencyRule) -> Result<()> {
        self.check_env(rule)?;

        let name = rule.spec.name.clone();
        match self.entries.get_mut(&name) {
            Some(existing) => {
                existing
                    .spec
                    .merge(&rule.spec)
                    .map_err(|reason| Error::DependencyConflict {
                        dependency: name.clone(),
                        first_rule: existing.rules.join(", "),
                        second_rule: rule.id.clone(),
                        reason,
                    })?;
                existing.rules.push(rule.id.clone());
                for assignment in &rule.env {
                    if !existing.env.contains(assignment) {
                        existing.env.push(assignment.clone());
                    }
                }
                tracing::trace!(dependency = %name, rule = %rule.id, "merged dependency rule");
            }
            None => {
                self.entries.insert(
                    name,
                    ResolvedDependency {
                        spec: rule.spec.clone(),
                        rules: vec![rule.id.clone()],
                        env: rule.env.clone(),
                    },
                );
            }
        }
        Ok(())
    }

    fn check_env(&self, rule: &DependencyRule) -> Result<()> {
        for assignment in &rule.env {
            for (name, entry) in &self.entries {
                let clash = entry
                    .env
                    .iter()
                    .find(|e| e.variable == assignment.variable && e.value != assignment.value);
                if let Some(previous) = clash {
                    return Err(Error::DependencyConflict {
                        dependency: name.clone(),
                        first_rule: entry.rules.join(", "),
                        second_rule: rule.id.clone(),
                        reason: format!(
                            "environment variable '{}' assigned both '{}' and '{}'",
                            assignment.variable, previous.value, assignment.value
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedDependency> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entries in package-name order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedDependency> {
        self.entries.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
