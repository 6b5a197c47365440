//! Projection of option values onto build flags, and the inverse used to
//! recover a selection from emitted flags.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::directive::Flag;
use crate::error::{Error, Result};
use crate::schema::{OptionKind, OptionSchema, OptionSpec};
use crate::selection::Selection;
use crate::value::OptionValue;

/// Case normalization applied to a single-choice value before it is
/// emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Case {
    #[default]
    Preserve,
    Upper,
    Lower,
}

impl Case {
    pub fn apply(self, value: &str) -> String {
        match self {
            Case::Preserve => value.to_string(),
            Case::Upper => value.to_uppercase(),
            Case::Lower => value.to_lowercase(),
        }
    }
}

/// A projection computed from the full selection.
pub type DerivedFn = Arc<dyn Fn(&Selection) -> Vec<Flag> + Send + Sync>;

/// How one option turns into zero or more flags.
#[derive(Clone, Default)]
pub enum Projection {
    /// The option never emits a flag.
    #[default]
    None,
    /// Boolean: `key=ON` plus `also` when true; `key=OFF` when false only
    /// if `explicit_off`.
    Toggle {
        key: String,
        explicit_off: bool,
        also: Vec<Flag>,
    },
    /// `key=<value>` for choice, multi or integer options.
    Assign { key: String, case: Case },
    /// Choice: each value maps to a flag value, or to no flag at all.
    /// Legal values missing from `values` emit no flag. No two legal values
    /// may emit the same thing, so the mapping always inverts.
    Map {
        key: String,
        values: BTreeMap<String, Option<String>>,
    },
    /// Arbitrary flags computed from the whole selection.
    Derived(DerivedFn),
}

impl Projection {
    /// `key=ON` when set, nothing otherwise.
    pub fn toggle(key: impl Into<String>) -> Self {
        Projection::Toggle {
            key: key.into(),
            explicit_off: false,
            also: Vec::new(),
        }
    }

    /// `key=ON` or `key=OFF`.
    pub fn switch(key: impl Into<String>) -> Self {
        Projection::Toggle {
            key: key.into(),
            explicit_off: true,
            also: Vec::new(),
        }
    }

    /// Add flags emitted alongside a toggle's `ON` flag.
    pub fn with_also(self, extra: impl IntoIterator<Item = Flag>) -> Self {
        match self {
            Projection::Toggle {
                key,
                explicit_off,
                mut also,
            } => {
                also.extend(extra);
                Projection::Toggle {
                    key,
                    explicit_off,
                    also,
                }
            }
            other => other,
        }
    }

    pub fn assign(key: impl Into<String>, case: Case) -> Self {
        Projection::Assign {
            key: key.into(),
            case,
        }
    }

    pub fn map<I, V>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (V, Option<&'static str>)>,
        V: Into<String>,
    {
        Projection::Map {
            key: key.into(),
            values: values
                .into_iter()
                .map(|(v, flag)| (v.into(), flag.map(str::to_string)))
                .collect(),
        }
    }

    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&Selection) -> Vec<Flag> + Send + Sync + 'static,
    {
        Projection::Derived(Arc::new(f))
    }

    /// The flag key this projection writes, when it has exactly one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Projection::Toggle { key, .. }
            | Projection::Assign { key, .. }
            | Projection::Map { key, .. } => Some(key),
            Projection::None | Projection::Derived(_) => None,
        }
    }

    /// Check that the projection fits the option's kind.
    pub(crate) fn check(&self, spec: &OptionSpec) -> Result<()> {
        let mismatch = |what: &str| {
            Err(Error::invalid_schema(format!(
                "option '{}': {what} projection does not fit a {} option",
                spec.name,
                spec.kind.label()
            )))
        };
        match (self, &spec.kind) {
            (Projection::Toggle { .. }, OptionKind::Bool) => Ok(()),
            (Projection::Toggle { .. }, _) => mismatch("toggle"),
            (Projection::Assign { .. }, OptionKind::Bool) => mismatch("assign"),
            (Projection::Map { values, .. }, OptionKind::Choice { values: legal }) => {
                values.keys().try_for_each(|v| spec.check_member(v))?;
                let mut emitted: BTreeMap<Option<&str>, &str> = BTreeMap::new();
                for choice in legal {
                    let mapped = values.get(choice).and_then(Option::as_deref);
                    if let Some(other) = emitted.insert(mapped, choice.as_str()) {
                        return Err(Error::invalid_schema(format!(
                            "option '{}': choices '{other}' and '{choice}' both emit {}",
                            spec.name,
                            mapped.map_or_else(|| "no flag".to_string(), |v| format!("'{v}'"))
                        )));
                    }
                }
                Ok(())
            }
            (Projection::Map { .. }, _) => mismatch("map"),
            _ => Ok(()),
        }
    }

    /// Flags for `spec` under `selection`.
    pub(crate) fn project(&self, spec: &OptionSpec, selection: &Selection) -> Result<Vec<Flag>> {
        let value = selection.get(&spec.name).ok_or_else(|| Error::UnknownOption {
            option: spec.name.clone(),
        })?;

        let flags = match self {
            Projection::None => Vec::new(),
            Projection::Toggle {
                key,
                explicit_off,
                also,
            } => match value.as_bool() {
                Some(true) => std::iter::once(Flag::on(key.as_str()))
                    .chain(also.iter().cloned())
                    .collect(),
                Some(false) if *explicit_off => vec![Flag::off(key.as_str())],
                Some(false) => Vec::new(),
                None => return Err(kind_error(spec, value)),
            },
            Projection::Assign { key, case } => {
                let rendered = match value {
                    OptionValue::Choice(c) => case.apply(c),
                    OptionValue::Multi(_) | OptionValue::Int(_) => value.to_string(),
                    OptionValue::Bool(_) => return Err(kind_error(spec, value)),
                };
                vec![Flag::new(key.as_str(), rendered)]
            }
            Projection::Map { key, values } => match value {
                OptionValue::Choice(c) => values
                    .get(c)
                    .cloned()
                    .flatten()
                    .map(|mapped| vec![Flag::new(key.as_str(), mapped)])
                    .unwrap_or_default(),
                _ => return Err(kind_error(spec, value)),
            },
            Projection::Derived(f) => f(selection),
        };
        Ok(flags)
    }

    /// Recover the option's value from emitted flags. `None` means the
    /// projection cannot be inverted and the default applies.
    fn invert(
        &self,
        spec: &OptionSpec,
        flags: &BTreeMap<&str, &str>,
    ) -> Result<Option<OptionValue>> {
        let value = match self {
            Projection::Toggle { key, .. } => {
                let on = flags.get(key.as_str()).is_some_and(|v| v.eq_ignore_ascii_case("ON"));
                Some(OptionValue::Bool(on))
            }
            Projection::Assign { key, .. } => match flags.get(key.as_str()) {
                Some(text) => Some(spec.parse_emitted(text)?),
                None => None,
            },
            Projection::Map { key, values } => {
                let emitted = flags.get(key.as_str()).copied();
                spec.kind
                    .legal_values()
                    .iter()
                    .find(|choice| values.get(*choice).and_then(Option::as_deref) == emitted)
                    .map(|choice| OptionValue::Choice(choice.clone()))
            }
            Projection::None | Projection::Derived(_) => None,
        };
        Ok(value)
    }
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::None => f.write_str("None"),
            Projection::Toggle {
                key,
                explicit_off,
                also,
            } => f
                .debug_struct("Toggle")
                .field("key", key)
                .field("explicit_off", explicit_off)
                .field("also", also)
                .finish(),
            Projection::Assign { key, case } => f
                .debug_struct("Assign")
                .field("key", key)
                .field("case", case)
                .finish(),
            Projection::Map { key, values } => f
                .debug_struct("Map")
                .field("key", key)
                .field("values", values)
                .finish(),
            Projection::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

fn kind_error(spec: &OptionSpec, value: &OptionValue) -> Error {
    Error::invalid_value(
        spec.name.as_str(),
        value.to_string(),
        format!("expected a {} value", spec.kind.label()),
    )
}

/// Rebuild a selection from flags produced by
/// [`Resolver::emit_directives`](crate::Resolver::emit_directives).
///
/// Ungated toggle, assign and map projections invert exactly. Gated,
/// derived and flagless options take their defaults.
pub fn reparse(schema: &OptionSchema, flags: &[Flag]) -> Result<Selection> {
    let by_key: BTreeMap<&str, &str> = flags
        .iter()
        .map(|flag| (flag.key.as_str(), flag.value.as_str()))
        .collect();

    let mut values = BTreeMap::new();
    for spec in schema.options() {
        if spec.gate.is_some() {
            continue;
        }
        if let Some(value) = spec.projection.invert(spec, &by_key)? {
            values.insert(spec.name.clone(), value);
        }
    }
    Ok(Selection::from_values(schema, values))
}
