//! The fully merged, immutable option selection for one build invocation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::request::Request;
use crate::schema::OptionSchema;
use crate::value::OptionValue;

/// Every declared option paired with exactly one value, either supplied by
/// the user or taken from the option's default.
///
/// A `Selection` is only produced by [`Selection::merge`] or
/// [`Selection::defaults`] and is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    values: BTreeMap<String, OptionValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compiler: Option<String>,
}

impl Selection {
    /// A selection holding every option's default.
    pub fn defaults(schema: &OptionSchema) -> Self {
        let values = schema
            .options()
            .iter()
            .map(|spec| (spec.name.clone(), spec.default.clone()))
            .collect();
        Self {
            values,
            compiler: None,
        }
    }

    /// Layer the request's assignments over the schema defaults.
    ///
    /// Assignments apply in order, so a later assignment to the same option
    /// replaces an earlier one.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownOption` when the request names an undeclared option
    /// - `Error::InvalidValue` when a value is illegal for its option
    pub fn merge(schema: &OptionSchema, request: &Request) -> Result<Self> {
        let mut selection = Self::defaults(schema);

        for (name, raw) in request.assignments() {
            let spec = schema.option(name).ok_or_else(|| Error::UnknownOption {
                option: name.clone(),
            })?;
            let value = spec.parse_value(raw)?;
            tracing::trace!(option = %name, %value, "applying requested value");
            selection.values.insert(name.clone(), value);
        }

        selection.compiler = request.compiler().map(str::to_string);
        Ok(selection)
    }

    /// Assemble a selection from already-typed values, e.g. values recovered
    /// from emitted flags. Options missing from `values` take their default.
    pub(crate) fn from_values(
        schema: &OptionSchema,
        values: BTreeMap<String, OptionValue>,
    ) -> Self {
        let mut selection = Self::defaults(schema);
        selection.values.extend(values);
        selection
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    /// Whether a boolean option is set. Non-boolean and unknown options are
    /// never enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).and_then(OptionValue::as_bool) == Some(true)
    }

    /// The compiler named in the request (`%gcc`), if any.
    pub fn compiler(&self) -> Option<&str> {
        self.compiler.as_deref()
    }

    /// Iterate over option values in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value of `name` as display text, or `"<unset>"`.
    pub(crate) fn describe(&self, name: &str) -> String {
        self.get(name)
            .map(ToString::to_string)
            .unwrap_or_else(|| "<unset>".to_string())
    }
}
