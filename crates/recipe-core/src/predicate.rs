//! Predicates over a [`Selection`].
//!
//! Gates, constraints and dependency rules all test the selection with the
//! same small language:
//!
//! | Text          | Meaning                                          |
//! |---------------|--------------------------------------------------|
//! | `+cuda`       | boolean option `cuda` is on                      |
//! | `~cuda`       | boolean option `cuda` is off                     |
//! | `network=mpi` | choice equals, multi contains, int/bool equals   |
//! | `%gcc`        | the request names compiler `gcc`                 |
//! | `!network=mpi`| negates the single term that follows             |
//!
//! Terms are conjunctive, so `%gcc+kokkos+cuda` holds only when all three
//! do. Empty text always holds.

use std::fmt;

use crate::error::{Error, Result};
use crate::request::split_terms;
use crate::schema::{OptionKind, OptionSchema};
use crate::selection::Selection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Always,
    Enabled(String),
    Disabled(String),
    Equals { option: String, value: String },
    Compiler(String),
    All(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn enabled(option: impl Into<String>) -> Self {
        Predicate::Enabled(option.into())
    }

    pub fn disabled(option: impl Into<String>) -> Self {
        Predicate::Disabled(option.into())
    }

    pub fn equals(option: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Equals {
            option: option.into(),
            value: value.into(),
        }
    }

    /// Parse predicate text. See the module docs for the syntax.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidPredicate {
            text: text.to_string(),
            reason,
        };

        let mut terms = Vec::new();
        for term in split_terms(text) {
            let predicate = if let Some(inner) = term.strip_prefix('!') {
                match Predicate::parse(inner)? {
                    Predicate::Always | Predicate::All(_) | Predicate::Not(_) => {
                        return Err(invalid(format!("'!' must negate a single term in '{term}'")));
                    }
                    single => Predicate::Not(Box::new(single)),
                }
            } else if let Some(name) = term.strip_prefix('+') {
                crate::request::check_name(name).map_err(invalid)?;
                Predicate::enabled(name)
            } else if let Some(name) = term.strip_prefix('~') {
                crate::request::check_name(name).map_err(invalid)?;
                Predicate::disabled(name)
            } else if let Some(compiler) = term.strip_prefix('%') {
                if compiler.is_empty() {
                    return Err(invalid("'%' must be followed by a compiler name".to_string()));
                }
                Predicate::Compiler(compiler.to_string())
            } else if let Some((name, value)) = term.split_once('=') {
                crate::request::check_name(name).map_err(invalid)?;
                if value.is_empty() {
                    return Err(invalid(format!("option '{name}' has an empty value")));
                }
                Predicate::equals(name, value)
            } else {
                return Err(invalid(format!("unexpected term '{term}'")));
            };
            terms.push(predicate);
        }

        Ok(match terms.len() {
            0 => Predicate::Always,
            1 => terms.remove(0),
            _ => Predicate::All(terms),
        })
    }

    /// Evaluate against a merged selection.
    pub fn evaluate(&self, selection: &Selection) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Enabled(name) => selection.is_enabled(name),
            Predicate::Disabled(name) => {
                selection.get(name).and_then(|v| v.as_bool()) == Some(false)
            }
            Predicate::Equals { option, value } => selection
                .get(option)
                .is_some_and(|current| current.matches(value)),
            Predicate::Compiler(name) => selection
                .compiler()
                .is_some_and(|c| compiler_name(c) == compiler_name(name)),
            Predicate::All(terms) => terms.iter().all(|p| p.evaluate(selection)),
            Predicate::Not(inner) => !inner.evaluate(selection),
        }
    }

    /// Option names referenced by this predicate, in first-seen order.
    pub fn options(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_options(&mut names);
        names
    }

    fn collect_options<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Predicate::Enabled(name) | Predicate::Disabled(name) => push_unique(names, name),
            Predicate::Equals { option, .. } => push_unique(names, option),
            Predicate::All(terms) => {
                for term in terms {
                    term.collect_options(names);
                }
            }
            Predicate::Not(inner) => inner.collect_options(names),
            Predicate::Always | Predicate::Compiler(_) => {}
        }
    }

    /// Check that every referenced option exists and that compared values
    /// are legal for it.
    pub(crate) fn check(&self, schema: &OptionSchema) -> Result<()> {
        match self {
            Predicate::Enabled(name) | Predicate::Disabled(name) => {
                let spec = schema.option(name).ok_or_else(|| Error::UnknownOption {
                    option: name.clone(),
                })?;
                if !matches!(spec.kind, OptionKind::Bool) {
                    return Err(Error::InvalidPredicate {
                        text: self.to_string(),
                        reason: format!("option '{name}' is not a boolean"),
                    });
                }
                Ok(())
            }
            Predicate::Equals { option, value } => {
                let spec = schema.option(option).ok_or_else(|| Error::UnknownOption {
                    option: option.clone(),
                })?;
                spec.check_member(value)
            }
            Predicate::All(terms) => {
                terms.iter().try_for_each(|term| term.check(schema))
            }
            Predicate::Not(inner) => inner.check(schema),
            Predicate::Always | Predicate::Compiler(_) => Ok(()),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Always => f.write_str("*"),
            Predicate::Enabled(name) => write!(f, "+{name}"),
            Predicate::Disabled(name) => write!(f, "~{name}"),
            Predicate::Equals { option, value } => write!(f, "{option}={value}"),
            Predicate::Compiler(name) => write!(f, "%{name}"),
            Predicate::All(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{term}")?;
                }
                Ok(())
            }
            Predicate::Not(inner) => write!(f, "!{inner}"),
        }
    }
}

fn push_unique<'a>(names: &mut Vec<&'a str>, name: &'a str) {
    if !names.contains(&name) {
        names.push(name);
    }
}

/// `gcc@9.3.0` and `gcc` name the same compiler.
fn compiler_name(spec: &str) -> &str {
    spec.split('@').next().unwrap_or(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use crate::schema::OptionSpec;

    fn schema() -> OptionSchema {
        OptionSchema::builder()
            .option(OptionSpec::bool("kokkos", false, ""))
            .option(OptionSpec::bool("cuda", false, ""))
            .option(OptionSpec::choice("network", ["gasnetex", "mpi", "none"], "none", ""))
            .option(OptionSpec::multi("cuda_arch", ["60", "70", "75"], ["70"], ""))
            .build()
            .unwrap()
    }

    fn select(text: &str) -> Selection {
        Selection::merge(&schema(), &Request::parse(text).unwrap()).unwrap()
    }

    #[test]
    fn parse_chain() {
        let p = Predicate::parse("%gcc+kokkos+cuda").unwrap();
        assert_eq!(
            p,
            Predicate::All(vec![
                Predicate::Compiler("gcc".to_string()),
                Predicate::enabled("kokkos"),
                Predicate::enabled("cuda"),
            ])
        );
        assert_eq!(p.to_string(), "%gcc +kokkos +cuda");
    }

    #[test]
    fn parse_empty_is_always() {
        assert_eq!(Predicate::parse("").unwrap(), Predicate::Always);
    }

    #[test]
    fn evaluate_terms() {
        let selection = select("+kokkos +cuda cuda_arch=60,75 network=mpi %gcc@9.3.0");
        assert!(Predicate::parse("%gcc+kokkos+cuda").unwrap().evaluate(&selection));
        assert!(Predicate::parse("cuda_arch=75").unwrap().evaluate(&selection));
        assert!(!Predicate::parse("cuda_arch=70").unwrap().evaluate(&selection));
        assert!(Predicate::parse("network=mpi").unwrap().evaluate(&selection));
        assert!(!Predicate::parse("%clang").unwrap().evaluate(&selection));
    }

    #[test]
    fn negated_terms() {
        let p = Predicate::parse("+kokkos!network=mpi !%gcc").unwrap();
        assert_eq!(
            p,
            Predicate::All(vec![
                Predicate::enabled("kokkos"),
                Predicate::Not(Box::new(Predicate::equals("network", "mpi"))),
                Predicate::Not(Box::new(Predicate::Compiler("gcc".to_string()))),
            ])
        );
        assert_eq!(p.to_string(), "+kokkos !network=mpi !%gcc");
        assert_eq!(p.options(), vec!["kokkos", "network"]);

        assert!(p.evaluate(&select("+kokkos network=gasnetex %clang")));
        assert!(!p.evaluate(&select("+kokkos network=mpi %clang")));
        assert!(!p.evaluate(&select("+kokkos %gcc")));
    }

    #[test]
    fn bare_negation_rejected() {
        assert!(matches!(
            Predicate::parse("!"),
            Err(Error::InvalidPredicate { .. })
        ));
        assert!(matches!(
            Predicate::parse("!!cuda_arch=60"),
            Err(Error::InvalidPredicate { .. })
        ));
    }

    #[test]
    fn disabled_only_matches_false_booleans() {
        let selection = select("");
        assert!(Predicate::disabled("cuda").evaluate(&selection));
        assert!(!Predicate::disabled("network").evaluate(&selection));
    }

    #[test]
    fn options_are_deduplicated() {
        let p = Predicate::parse("+cuda ~kokkos cuda_arch=60 +cuda").unwrap();
        assert_eq!(p.options(), vec!["cuda", "kokkos", "cuda_arch"]);
    }

    #[test]
    fn check_rejects_unknown_and_illegal() {
        let schema = schema();
        assert!(matches!(
            Predicate::parse("+fortran").unwrap().check(&schema),
            Err(Error::UnknownOption { .. })
        ));
        assert!(matches!(
            Predicate::parse("network=ucx").unwrap().check(&schema),
            Err(Error::InvalidValue { .. })
        ));
        assert!(matches!(
            Predicate::parse("+network").unwrap().check(&schema),
            Err(Error::InvalidPredicate { .. })
        ));
    }
}
