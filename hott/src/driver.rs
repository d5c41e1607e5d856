//! Running whole scripts, and reporting on each of their items.

use core::fmt;

use kernel::location::Location;
use kernel::Term;
use log::{debug, info, warn};
use parser::Item;

use crate::error::{Error, Result};
use crate::session::Session;

/// The result of an item of a script.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ItemResult {
    /// `Definition`, `Axiom` or `Theorem`.
    pub kind: &'static str,
    pub name: String,
    pub line: usize,

    /// The body of a definition, the type of an axiom or the proof of a theorem.
    pub outcome: Result<Term>,
}

impl ItemResult {
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    #[inline]
    #[must_use]
    pub fn term(&self) -> Option<&Term> {
        self.outcome.as_ref().ok()
    }
}

/// An error reported to the user, with the script and the item it was raised in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic<'a> {
    pub file: &'a str,
    pub item: Option<&'a ItemResult>,
    pub error: &'a Error,
}

impl fmt::Display for Diagnostic<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fallback = Location::line(self.item.map_or(1, |item| item.line));
        let position = self.error.location.unwrap_or(fallback).start;
        write!(f, "{}:{}:{}: {}: ", self.file, position.line, position.column, self.error.kind_name())?;
        if let Some(item) = self.item {
            write!(f, "{} {} (line {}): ", item.kind, item.name, item.line)?;
        }
        write!(f, "{}", self.error)?;

        if let Some((expected, actual)) = self.error.sides() {
            write!(f, "\n  expected: {expected}\n  got: {actual}")?;
        }
        if let Some(goal) = self.error.goal() {
            write!(f, "\n  goal:\n{goal}")?;
        }
        let hints = self.error.hints();
        if !hints.is_empty() {
            write!(f, "\n  hints: {}", hints.join("; "))?;
        }
        Ok(())
    }
}

/// The results of a script run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Report {
    pub file: String,
    pub items: Vec<ItemResult>,

    /// Set when the script could not be split into items, in which case none was run.
    pub parse_error: Option<Error>,
}

impl Report {
    /// Whether every item succeeded.
    #[inline]
    #[must_use]
    pub fn success(&self) -> bool {
        self.parse_error.is_none() && self.items.iter().all(ItemResult::is_success)
    }

    #[inline]
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::from(!self.success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemResult> {
        self.items.iter().filter(|item| !item.is_success())
    }

    /// The diagnostics of the failures, in source order.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let parse = self.parse_error.iter().map(|error| Diagnostic {
            file: &self.file,
            item: None,
            error,
        });
        let items = self.items.iter().filter_map(|item| {
            item.outcome.as_ref().err().map(|error| Diagnostic {
                file: &self.file,
                item: Some(item),
                error,
            })
        });
        parse.chain(items).collect()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ItemResult> {
        self.items.iter().find(|item| item.name == name)
    }
}

/// Runs every item of a script in order, each one seeing the items that succeeded before it.
#[must_use]
pub fn run_script(session: &mut Session, source: &str, file: &str) -> Report {
    let mut report = Report {
        file: file.to_owned(),
        ..Report::default()
    };

    let items = match parser::parse_script(source) {
        Ok(items) => items,
        Err(err) => {
            warn!("{file}: {err}");
            report.parse_error = Some(err.into());
            return report;
        },
    };

    for item in &items {
        debug!("{file}:{}: {} {}", item.line(), item.kind(), item.name());
        let outcome = session.run_item(item);
        match outcome {
            Ok(_) => info!("{} {} checked", item.kind(), item.name()),
            Err(ref err) => warn!("{} {} (line {}) failed: {err}", item.kind(), item.name(), item.line()),
        }
        report.items.push(result(item, outcome));
    }
    report
}

fn result(item: &Item, outcome: Result<Term>) -> ItemResult {
    ItemResult {
        kind: item.kind(),
        name: item.name().to_owned(),
        line: item.line(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use kernel::term::builders::*;

    use super::*;

    fn run(source: &str) -> Report {
        run_script(&mut Session::new().unwrap(), source, "test.htt")
    }

    #[test]
    fn items_see_their_predecessors() {
        let report = run("\
Definition one : Nat := (App succ zero)
Theorem one-refl : (Id Nat one (App succ zero))
Proof
  reflexivity
Qed
");
        assert!(report.success());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.items[1].kind, "Theorem");
        assert_eq!(report.items[1].line, 2);
        assert_eq!(
            report.get("one-refl").and_then(ItemResult::term),
            Some(&refl(global("Nat"), global("one")))
        );
    }

    #[test]
    fn failures_do_not_stop_the_script() {
        let report = run("\
Axiom bad : zero
Axiom A : Type
Theorem t : (Pi a (Global A) (Global A))
Proof
  intro a
  frobnicate
Qed
");
        assert!(!report.success());
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.failures().map(|item| item.name.as_str()).collect::<Vec<_>>(), vec!["bad", "t"]);
        assert!(report.get("A").map_or(false, ItemResult::is_success));

        let diagnostics: Vec<String> = report.diagnostics().iter().map(ToString::to_string).collect();
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].starts_with("test.htt:1:"));
        assert_eq!(diagnostics[1], "test.htt:6:1: parse error: Theorem t (line 3): unknown tactic: frobnicate");
    }

    #[test]
    fn diagnostics_carry_goals_and_hints() {
        let report = run("\
Theorem t : (Pi n Nat (Id Nat n n))
Proof
  intro n
  rewrite n
Qed
");
        let diagnostics = report.diagnostics();
        let [ref diagnostic] = diagnostics[..] else {
            panic!("expected a single diagnostic");
        };
        let text = diagnostic.to_string();
        assert!(text.starts_with("test.htt:4:1: tactic failed: Theorem t (line 1): rewrite expects an identity"));
        assert!(text.contains("\n  goal:\n"));
        assert!(text.contains("============================"));
        assert!(text.ends_with("\n  hints: to reason by cases on it, use destruct or cases"));
    }

    #[test]
    fn malformed_scripts() {
        let report = run("Qed");
        assert!(!report.success());
        assert!(report.items.is_empty());
        let diagnostics = report.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].to_string(), "test.htt:1:1: parse error: Qed without Proof");
    }
}
