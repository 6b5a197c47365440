//! Environment assignments that accompany resolved dependencies.
//!
//! Some values are only known once the dependency itself is built, e.g.
//! the compiler wrapper a Kokkos install provides. Those are declared as
//! [`EnvValue::Attribute`] and looked up through an [`AttributeSource`]
//! supplied by the caller, so resolution never touches the process
//! environment.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvValue {
    Literal(String),
    /// An attribute of a resolved dependency, e.g. `kokkos.kokkos_cxx`.
    Attribute {
        dependency: String,
        attribute: String,
    },
}

impl EnvValue {
    pub fn literal(value: impl Into<String>) -> Self {
        EnvValue::Literal(value.into())
    }

    pub fn attribute(dependency: impl Into<String>, attribute: impl Into<String>) -> Self {
        EnvValue::Attribute {
            dependency: dependency.into(),
            attribute: attribute.into(),
        }
    }

    /// Parse `${dep.attr}` as an attribute reference; anything else is a
    /// literal.
    pub fn parse(text: &str) -> Self {
        text.strip_prefix("${")
            .and_then(|rest| rest.strip_suffix('}'))
            .and_then(|inner| inner.split_once('.'))
            .map(|(dep, attr)| EnvValue::attribute(dep, attr))
            .unwrap_or_else(|| EnvValue::literal(text))
    }

    pub fn render(&self, source: &dyn AttributeSource) -> Result<String> {
        match self {
            EnvValue::Literal(value) => Ok(value.clone()),
            EnvValue::Attribute {
                dependency,
                attribute,
            } => source
                .attribute(dependency, attribute)
                .ok_or_else(|| Error::MissingAttribute {
                    dependency: dependency.clone(),
                    attribute: attribute.clone(),
                }),
        }
    }
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Literal(value) => f.write_str(value),
            EnvValue::Attribute {
                dependency,
                attribute,
            } => write!(f, "${{{dependency}.{attribute}}}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvAssignment {
    pub variable: String,
    pub value: EnvValue,
}

impl EnvAssignment {
    pub fn new(variable: impl Into<String>, value: EnvValue) -> Self {
        Self {
            variable: variable.into(),
            value,
        }
    }
}

/// Supplies attributes of built dependencies.
pub trait AttributeSource {
    fn attribute(&self, dependency: &str, attribute: &str) -> Option<String>;
}

/// Renders every attribute as a `${dep.attr}` placeholder for a later
/// stage to substitute.
#[derive(Debug, Clone, Copy, Default)]
pub struct Placeholders;

impl AttributeSource for Placeholders {
    fn attribute(&self, dependency: &str, attribute: &str) -> Option<String> {
        Some(format!("${{{dependency}.{attribute}}}"))
    }
}

/// Attributes known up front, e.g. from `--attr kokkos.kokkos_cxx=...`.
#[derive(Debug, Clone, Default)]
pub struct StaticAttributes {
    values: BTreeMap<(String, String), String>,
}

impl StaticAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        dependency: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.values
            .insert((dependency.into(), attribute.into()), value.into());
    }

    /// Parse `dep.attr=value`.
    pub fn insert_parsed(&mut self, text: &str) -> Result<()> {
        let invalid = || Error::InvalidRequest {
            text: text.to_string(),
            reason: "expected dependency.attribute=value".to_string(),
        };
        let (path, value) = text.split_once('=').ok_or_else(invalid)?;
        let (dependency, attribute) = path.split_once('.').ok_or_else(invalid)?;
        if dependency.is_empty() || attribute.is_empty() {
            return Err(invalid());
        }
        self.insert(dependency, attribute, value);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl AttributeSource for StaticAttributes {
    fn attribute(&self, dependency: &str, attribute: &str) -> Option<String> {
        self.values
            .get(&(dependency.to_string(), attribute.to_string()))
            .cloned()
    }
}
