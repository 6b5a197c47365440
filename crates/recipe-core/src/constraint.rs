//! Validity rules over a merged selection.

use crate::error::{Error, Result};
use crate::predicate::Predicate;
use crate::schema::OptionSchema;
use crate::selection::Selection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Violated when `subject` and `when` both hold.
    Conflicts { subject: Predicate, when: Predicate },
    /// Violated when `when` holds and `then` does not.
    Requires { when: Predicate, then: Predicate },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub id: String,
    pub kind: ConstraintKind,
    pub message: String,
}

impl Constraint {
    /// `subject` may not hold while `when` does, e.g. `+gpu_hijack` when
    /// `~gpu`.
    pub fn conflicts(subject: Predicate, when: Predicate) -> Self {
        let id = format!("{subject} when {when}");
        let message = format!("'{subject}' conflicts with '{when}'");
        Self {
            id,
            kind: ConstraintKind::Conflicts { subject, when },
            message,
        }
    }

    /// Whenever `when` holds, `then` must hold too.
    pub fn requires(when: Predicate, then: Predicate) -> Self {
        let id = format!("{when} requires {then}");
        let message = format!("'{when}' requires '{then}'");
        Self {
            id,
            kind: ConstraintKind::Requires { when, then },
            message,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn is_satisfied(&self, selection: &Selection) -> bool {
        match &self.kind {
            ConstraintKind::Conflicts { subject, when } => {
                !(subject.evaluate(selection) && when.evaluate(selection))
            }
            ConstraintKind::Requires { when, then } => {
                !when.evaluate(selection) || then.evaluate(selection)
            }
        }
    }

    /// `Err(ConstraintViolation)` carrying the current value of every
    /// referenced option when the selection breaks this constraint.
    pub fn check(&self, selection: &Selection) -> Result<()> {
        if self.is_satisfied(selection) {
            return Ok(());
        }
        let values = self
            .options()
            .into_iter()
            .map(|name| (name.to_string(), selection.describe(name)))
            .collect();
        Err(Error::ConstraintViolation {
            constraint: self.id.clone(),
            message: self.message.clone(),
            values,
        })
    }

    /// Option names the constraint reads, in first-seen order.
    pub fn options(&self) -> Vec<&str> {
        let (a, b) = self.predicates();
        let mut names = a.options();
        for name in b.options() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    fn predicates(&self) -> (&Predicate, &Predicate) {
        match &self.kind {
            ConstraintKind::Conflicts { subject, when } => (subject, when),
            ConstraintKind::Requires { when, then } => (when, then),
        }
    }

    pub(crate) fn check_references(&self, schema: &OptionSchema) -> Result<()> {
        let (a, b) = self.predicates();
        a.check(schema)?;
        b.check(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use crate::schema::OptionSpec;

    fn schema() -> OptionSchema {
        OptionSchema::builder()
            .option(OptionSpec::bool("gpu", false, ""))
            .option(OptionSpec::bool("gpu_hijack", false, ""))
            .build()
            .unwrap()
    }

    fn select(text: &str) -> Selection {
        Selection::merge(&schema(), &Request::parse(text).unwrap()).unwrap()
    }

    #[test]
    fn conflicts_violated_when_both_hold() {
        let c = Constraint::conflicts(Predicate::enabled("gpu_hijack"), Predicate::disabled("gpu"));
        assert_eq!(c.id, "+gpu_hijack when ~gpu");
        assert!(!c.is_satisfied(&select("+gpu_hijack")));
        assert!(c.is_satisfied(&select("+gpu_hijack +gpu")));
        assert!(c.is_satisfied(&select("")));
    }

    #[test]
    fn requires_violated_when_consequent_fails() {
        let c = Constraint::requires(Predicate::enabled("gpu_hijack"), Predicate::enabled("gpu"));
        assert!(!c.is_satisfied(&select("+gpu_hijack ~gpu")));
        assert!(c.is_satisfied(&select("+gpu")));
    }

    #[test]
    fn violation_reports_values() {
        let c = Constraint::conflicts(Predicate::enabled("gpu_hijack"), Predicate::disabled("gpu"))
            .with_message("gpu_hijack implies gpu");
        let err = c.check(&select("+gpu_hijack")).unwrap_err();
        match err {
            Error::ConstraintViolation {
                constraint,
                message,
                values,
            } => {
                assert_eq!(constraint, "+gpu_hijack when ~gpu");
                assert_eq!(message, "gpu_hijack implies gpu");
                assert_eq!(
                    values,
                    vec![
                        ("gpu_hijack".to_string(), "true".to_string()),
                        ("gpu".to_string(), "false".to_string()),
                    ]
                );
            }
            other => panic!("expected ConstraintViolation, got {other:?}"),
        }
    }
}
