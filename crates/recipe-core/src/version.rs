//! Version constraint parsing, intersection, and satisfiability.
//!
//! Supports two constraint formats:
//!
//! - **Comparison lists** (e.g., `>=10`, `>=3.1,<4`, `==1.2.11`, `!=7.0`)
//! - **Range syntax** as written in recipe dependency specs (e.g., `@10:`,
//!   `@:4.2`, `@3.1:3.9`, `@7.1.0`)
//!
//! Version components can be `major`, `major.minor` or `major.minor.patch`;
//! missing components default to 0. A range upper bound covers every release
//! under the written prefix: `@:9` admits `9.2`, `@3.1:3.9` admits `3.9.4`.
//!
//! When two dependency rules constrain the same package, their constraints
//! are intersected rather than overwritten. An intersection whose bounds
//! cross is reported as unsatisfiable.
//!
//! # Examples
//!
//! ```
//! use recipe_core::version::VersionConstraint;
//!
//! let constraint = VersionConstraint::parse("@10:").unwrap();
//! assert!(constraint.satisfies("10.2"));
//! assert!(!constraint.satisfies("9.2.148"));
//!
//! let merged = constraint.intersect(&VersionConstraint::parse("<11").unwrap());
//! assert_eq!(merged.to_string(), ">=10,<11");
//! assert!(merged.is_satisfiable());
//! ```

use std::cmp::Ordering;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// A single version comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Gte,
    Gt,
    Lte,
    Lt,
    Eq,
    Ne,
    /// Range upper bound. Stores the first excluded version; renders as `<=`
    /// with the written text.
    Through,
}

impl CompareOp {
    fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gte => ">=",
            CompareOp::Gt => ">",
            CompareOp::Lte | CompareOp::Through => "<=",
            CompareOp::Lt => "<",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }
}

/// A single version specifier: an operator paired with a version.
///
/// `text` keeps the version as written so `10` does not render as `10.0.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Specifier {
    op: CompareOp,
    version: semver::Version,
    text: String,
}

impl Specifier {
    fn matches(&self, candidate: &semver::Version) -> bool {
        match self.op {
            CompareOp::Gte => candidate >= &self.version,
            CompareOp::Gt => candidate > &self.version,
            CompareOp::Lte => candidate <= &self.version,
            CompareOp::Lt | CompareOp::Through => candidate < &self.version,
            CompareOp::Eq => candidate == &self.version,
            CompareOp::Ne => candidate != &self.version,
        }
    }
}

impl std::fmt::Display for Specifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.op.symbol(), self.text)
    }
}

/// One end of a version interval.
#[derive(Debug, Clone, Copy)]
struct Bound<'a> {
    version: &'a semver::Version,
    inclusive: bool,
}

/// A parsed version constraint that can be checked against concrete versions.
///
/// All specifiers must match. Duplicate specifiers are dropped so repeated
/// intersections stay readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    specifiers: Vec<Specifier>,
}

impl VersionConstraint {
    /// Parse a version constraint string.
    pub fn parse(constraint: &str) -> Result<Self> {
        let trimmed = constraint.trim();
        if let Some(range) = trimmed.strip_prefix('@') {
            return parse_range(constraint, range);
        }

        let mut specifiers = Vec::new();
        for part in trimmed.split(',').map(str::trim) {
            if part.is_empty() {
                continue;
            }
            specifiers.push(parse_specifier(part)?);
        }

        if specifiers.is_empty() {
            return Err(Error::VersionConstraintParse {
                constraint: constraint.to_string(),
                reason: "empty constraint".to_string(),
            });
        }

        Ok(Self { specifiers })
    }

    /// Check if a version string satisfies this constraint.
    ///
    /// Returns `false` if the version string cannot be parsed.
    pub fn satisfies(&self, version: &str) -> bool {
        match normalize_version(version) {
            Ok(parsed) => self.satisfies_version(&parsed),
            Err(_) => false,
        }
    }

    /// Check if a `semver::Version` satisfies this constraint.
    pub fn satisfies_version(&self, version: &semver::Version) -> bool {
        self.specifiers.iter().all(|spec| spec.matches(version))
    }

    /// The conjunction of `self` and `other`.
    pub fn intersect(&self, other: &VersionConstraint) -> VersionConstraint {
        let mut specifiers = self.specifiers.clone();
        for spec in &other.specifiers {
            if !specifiers.contains(spec) {
                specifiers.push(spec.clone());
            }
        }
        VersionConstraint { specifiers }
    }

    /// Whether at least one version can satisfy every specifier.
    pub fn is_satisfiable(&self) -> bool {
        let mut lower: Option<Bound<'_>> = None;
        let mut upper: Option<Bound<'_>> = None;
        let mut exact: Option<&semver::Version> = None;

        for spec in &self.specifiers {
            let version = &spec.version;
            match spec.op {
                CompareOp::Gte | CompareOp::Gt => {
                    let inclusive = spec.op == CompareOp::Gte;
                    lower = Some(match lower {
                        Some(current) => tighter_lower(current, Bound { version, inclusive }),
                        None => Bound { version, inclusive },
                    });
                }
                CompareOp::Lte | CompareOp::Lt | CompareOp::Through => {
                    let inclusive = spec.op == CompareOp::Lte;
                    upper = Some(match upper {
                        Some(current) => tighter_upper(current, Bound { version, inclusive }),
                        None => Bound { version, inclusive },
                    });
                }
                CompareOp::Eq => match exact {
                    Some(pinned) if pinned != version => return false,
                    _ => exact = Some(version),
                },
                CompareOp::Ne => {}
            }
        }

        if let Some(pinned) = exact {
            return self.satisfies_version(pinned);
        }

        match (lower, upper) {
            (Some(lo), Some(hi)) => match lo.version.cmp(hi.version) {
                Ordering::Less => true,
                Ordering::Equal => {
                    lo.inclusive && hi.inclusive && self.satisfies_version(lo.version)
                }
                Ordering::Greater => false,
            },
            _ => true,
        }
    }
}

impl std::fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.specifiers.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join(","))
    }
}

impl Serialize for VersionConstraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn tighter_lower<'a>(a: Bound<'a>, b: Bound<'a>) -> Bound<'a> {
    match a.version.cmp(b.version) {
        Ordering::Greater => a,
        Ordering::Less => b,
        Ordering::Equal => Bound {
            version: a.version,
            inclusive: a.inclusive && b.inclusive,
        },
    }
}

fn tighter_upper<'a>(a: Bound<'a>, b: Bound<'a>) -> Bound<'a> {
    match a.version.cmp(b.version) {
        Ordering::Less => a,
        Ordering::Greater => b,
        Ordering::Equal => Bound {
            version: a.version,
            inclusive: a.inclusive && b.inclusive,
        },
    }
}

/// Parse range syntax (`10:`, `:4.2`, `3.1:3.9`, `7.1.0`) after the `@`.
fn parse_range(raw: &str, range: &str) -> Result<VersionConstraint> {
    let range = range.trim();
    let specifiers = match range.split_once(':') {
        Some((lo, hi)) => {
            let mut specs = Vec::with_capacity(2);
            if !lo.trim().is_empty() {
                specs.push(specifier(raw, CompareOp::Gte, lo)?);
            }
            if !hi.trim().is_empty() {
                specs.push(through(raw, hi)?);
            }
            specs
        }
        None => vec![specifier(raw, CompareOp::Eq, range)?],
    };

    if specifiers.is_empty() {
        return Err(Error::VersionConstraintParse {
            constraint: raw.to_string(),
            reason: "range has neither a lower nor an upper bound".to_string(),
        });
    }

    Ok(VersionConstraint { specifiers })
}

/// Upper range bound `hi`: everything below `hi` with its last written
/// component bumped (`9` -> `<10`, `3.9` -> `<3.10`).
fn through(raw: &str, hi: &str) -> Result<Specifier> {
    let text = hi.trim();
    let invalid = |reason: String| Error::VersionConstraintParse {
        constraint: raw.to_string(),
        reason,
    };
    normalize_version(text).map_err(invalid)?;

    let mut parts = text
        .split('.')
        .map(|part| {
            part.parse::<u64>()
                .map_err(|e| invalid(format!("invalid version '{text}': {e}")))
        })
        .collect::<Result<Vec<_>>>()?;
    if let Some(last) = parts.last_mut() {
        *last += 1;
    }
    parts.resize(3, 0);

    Ok(Specifier {
        op: CompareOp::Through,
        version: semver::Version::new(parts[0], parts[1], parts[2]),
        text: text.to_string(),
    })
}

/// Parse a single specifier like `>=3.12` or `<3.13.0`.
fn parse_specifier(s: &str) -> Result<Specifier> {
    let (op, version_str) = if let Some(rest) = s.strip_prefix(">=") {
        (CompareOp::Gte, rest)
    } else if let Some(rest) = s.strip_prefix("<=") {
        (CompareOp::Lte, rest)
    } else if let Some(rest) = s.strip_prefix("!=") {
        (CompareOp::Ne, rest)
    } else if let Some(rest) = s.strip_prefix("==") {
        (CompareOp::Eq, rest)
    } else if let Some(rest) = s.strip_prefix('>') {
        (CompareOp::Gt, rest)
    } else if let Some(rest) = s.strip_prefix('<') {
        (CompareOp::Lt, rest)
    } else {
        // Bare version implies ==
        (CompareOp::Eq, s)
    };

    specifier(s, op, version_str)
}

fn specifier(raw: &str, op: CompareOp, version_str: &str) -> Result<Specifier> {
    let text = version_str.trim();
    let version = normalize_version(text).map_err(|reason| Error::VersionConstraintParse {
        constraint: raw.to_string(),
        reason,
    })?;
    Ok(Specifier {
        op,
        version,
        text: text.to_string(),
    })
}

/// Normalize a version string to semver by padding missing components.
///
/// - `"10"` -> `10.0.0`
/// - `"3.12"` -> `3.12.0`
/// - `"20.09.0"` -> `20.9.0` (release names often zero-pad the minor)
pub fn normalize_version(s: &str) -> std::result::Result<semver::Version, String> {
    let s = s.trim();

    if let Ok(v) = semver::Version::parse(s) {
        return Ok(v);
    }

    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() > 3 {
        return Err(format!("invalid version '{s}': too many components"));
    }
    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part
            .parse::<u64>()
            .map_err(|e| format!("invalid version '{s}': {e}"))?;
    }
    Ok(semver::Version::new(numbers[0], numbers[1], numbers[2]))
}
