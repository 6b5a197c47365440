//! Option values and the unvalidated values a request carries.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// A typed value for one option in a [`Selection`](crate::Selection).
///
/// Multi-choice values are held in a sorted set, so two selections that
/// list the same members in a different order compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Choice(String),
    Multi(BTreeSet<String>),
    Int(i64),
}

impl OptionValue {
    /// Build a multi-choice value from any iterable of members.
    pub fn multi<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OptionValue::Multi(members.into_iter().map(Into::into).collect())
    }

    pub fn choice(value: impl Into<String>) -> Self {
        OptionValue::Choice(value.into())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Whether `candidate` names this value: choice equality, multi
    /// membership, or the textual form of a bool or integer.
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            OptionValue::Bool(b) => parse_bool(candidate) == Some(*b),
            OptionValue::Choice(c) => c == candidate,
            OptionValue::Multi(members) => members.contains(candidate),
            OptionValue::Int(i) => candidate.trim().parse::<i64>().ok() == Some(*i),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Choice(c) => f.write_str(c),
            OptionValue::Multi(members) => {
                let joined: Vec<&str> = members.iter().map(String::as_str).collect();
                f.write_str(&joined.join(","))
            }
            OptionValue::Int(i) => write!(f, "{i}"),
        }
    }
}

/// A value as supplied by the user, before it is checked against the
/// option's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// `+name` or `~name`.
    Flag(bool),
    /// `name=text`.
    Text(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Flag(b) => write!(f, "{b}"),
            RawValue::Text(t) => f.write_str(t),
        }
    }
}

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}
