//! User requests: the raw option assignments handed to the resolver.
//!
//! A request is written in the same terse syntax recipes use for
//! predicates:
//!
//! ```text
//! @20.12.0 +cuda ~zlib network=mpi cuda_arch=60,75 max_fields=1024 %gcc
//! ```
//!
//! `+name` and `~name` set boolean options, `name=value` sets any option
//! (multi-choice members are comma separated), `%name` names the compiler
//! and `@version` picks the recipe version. Parsing does not consult a
//! schema; values are checked when the request is validated.

use crate::error::{Error, Result};
use crate::value::RawValue;

/// An ordered list of option assignments plus the optional compiler and
/// version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    assignments: Vec<(String, RawValue)>,
    compiler: Option<String>,
    version: Option<String>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse request text. Whitespace separates terms and `+`, `~` or `%`
    /// start a new term, so `+kokkos+cuda` sets two options.
    pub fn parse(text: &str) -> Result<Self> {
        let mut request = Self::new();
        for term in split_terms(text) {
            request.apply_term(text, &term)?;
        }
        Ok(request)
    }

    /// Parse and concatenate several request fragments, as given on a
    /// command line.
    pub fn parse_all<I, S>(fragments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut request = Self::new();
        for fragment in fragments {
            request.extend(Self::parse(fragment.as_ref())?);
        }
        Ok(request)
    }

    fn apply_term(&mut self, text: &str, term: &str) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidRequest {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        if let Some(name) = term.strip_prefix('+') {
            check_name(name).map_err(|r| invalid(&r))?;
            self.set(name, RawValue::Flag(true));
        } else if let Some(name) = term.strip_prefix('~') {
            check_name(name).map_err(|r| invalid(&r))?;
            self.set(name, RawValue::Flag(false));
        } else if let Some(compiler) = term.strip_prefix('%') {
            if compiler.is_empty() {
                return Err(invalid("'%' must be followed by a compiler name"));
            }
            self.compiler = Some(compiler.to_string());
        } else if let Some(version) = term.strip_prefix('@') {
            if version.is_empty() {
                return Err(invalid("'@' must be followed by a version"));
            }
            self.version = Some(version.to_string());
        } else if let Some((name, value)) = term.split_once('=') {
            check_name(name).map_err(|r| invalid(&r))?;
            if value.is_empty() {
                return Err(invalid(&format!("option '{name}' has an empty value")));
            }
            self.set(name, RawValue::Text(value.to_string()));
        } else {
            return Err(invalid(&format!(
                "unexpected term '{term}'; use +name, ~name, name=value, %compiler or @version"
            )));
        }
        Ok(())
    }

    /// Append an assignment. It overrides any earlier one for the same name.
    pub fn set(&mut self, name: impl Into<String>, value: RawValue) -> &mut Self {
        self.assignments.push((name.into(), value));
        self
    }

    /// Append `other`'s assignments after ours; its compiler and version
    /// replace ours when present.
    pub fn extend(&mut self, other: Request) {
        self.assignments.extend(other.assignments);
        if other.compiler.is_some() {
            self.compiler = other.compiler;
        }
        if other.version.is_some() {
            self.version = other.version;
        }
    }

    pub fn assignments(&self) -> &[(String, RawValue)] {
        &self.assignments
    }

    pub fn compiler(&self) -> Option<&str> {
        self.compiler.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty() && self.compiler.is_none() && self.version.is_none()
    }
}

/// Split text into terms at whitespace and before each `+`, `~`, `%` or
/// `!`. A `!` stays attached to the term it negates.
pub(crate) fn split_terms(text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for word in text.split_whitespace() {
        let mut current = String::new();
        for ch in word.chars() {
            if matches!(ch, '+' | '~' | '%' | '!') && !current.is_empty() && current != "!" {
                terms.push(std::mem::take(&mut current));
            }
            current.push(ch);
        }
        if !current.is_empty() {
            terms.push(current);
        }
    }
    terms
}

pub(crate) fn check_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("empty option name".to_string());
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(format!("option name '{name}' contains '{bad}'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mixed_terms() {
        let request = Request::parse("@20.12.0 +cuda ~zlib cuda_arch=60,75 %gcc").unwrap();
        assert_eq!(
            request.assignments(),
            &[
                ("cuda".to_string(), RawValue::Flag(true)),
                ("zlib".to_string(), RawValue::Flag(false)),
                ("cuda_arch".to_string(), RawValue::Text("60,75".to_string())),
            ]
        );
        assert_eq!(request.compiler(), Some("gcc"));
        assert_eq!(request.version(), Some("20.12.0"));
    }

    #[test]
    fn parse_chained_flags() {
        let request = Request::parse("%gcc+kokkos+cuda").unwrap();
        assert_eq!(request.assignments().len(), 2);
        assert_eq!(request.compiler(), Some("gcc"));
    }

    #[test]
    fn parse_empty_is_empty() {
        assert!(Request::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_bare_word() {
        let err = Request::parse("cuda").unwrap_err();
        assert!(matches!(err, Error::InvalidRequest { .. }));
    }

    #[test]
    fn parse_rejects_empty_value() {
        assert!(Request::parse("network=").is_err());
        assert!(Request::parse("+").is_err());
    }

    #[test]
    fn parse_all_keeps_order() {
        let request = Request::parse_all(["+hwloc network=mpi", "network=none"]).unwrap();
        let last = request.assignments().last().unwrap();
        assert_eq!(last, &("network".to_string(), RawValue::Text("none".to_string())));
    }
}
