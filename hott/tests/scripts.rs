use std::thread;

use hott::{run_script, Report, Session};
use kernel::term::builders::*;
use kernel::{Context, Term, TypeChecker};

fn run(source: &str) -> (Session, Report) {
    let mut session = Session::new().unwrap();
    let report = run_script(&mut session, source, "test.htt");
    (session, report)
}

/// The proof of the only theorem of a successful script, checked again against its statement.
fn proof(source: &str, name: &str) -> Term {
    let (session, report) = run(source);
    let diagnostics: Vec<String> = report.diagnostics().iter().map(ToString::to_string).collect();
    assert!(report.success(), "{diagnostics:?}");

    let term = report.get(name).and_then(|item| item.term()).cloned().unwrap();
    let ty = session.environment().get(name).unwrap().ty.clone();
    assert_eq!(TypeChecker::new(session.environment()).check(&Context::new(), &term, &ty), Ok(()));
    term
}

fn normalize(session: &Session, term: &Term) -> Term {
    TypeChecker::new(session.environment()).normalize(&Context::new(), term).unwrap()
}

#[test]
fn polymorphic_identity() {
    let source = include_str!("scripts/identity.htt");
    let term = proof(source, "id");
    let (session, _) = run(source);

    let expected = lam("A", sort(0), lam("x", var(0), var(0)));
    assert_eq!(normalize(&session, &term), expected);
}

#[test]
fn reflexivity_of_zero() {
    let term = proof(include_str!("scripts/reflexivity.htt"), "r");
    assert_eq!(term, refl(global("Nat"), global("zero")));
}

#[test]
fn sum_introduction() {
    let term = proof(include_str!("scripts/sum.htt"), "inl-unit");
    assert_eq!(term, global("inl").apply([global("Unit"), global("Unit"), global("tt")]));
}

#[test]
fn induction_on_nat() {
    let source = include_str!("scripts/induction.htt");
    let term = proof(source, "idNat");

    let Term::Lam { ref body, .. } = term else {
        panic!("expected an abstraction, got {term}");
    };
    let (head, args) = body.spine();
    assert_eq!(head, &global("natElim"));
    assert_eq!(args.len(), 4);
    assert_eq!(args[3], &var(0));

    // the proof computes the identity
    let (session, _) = run(source);
    let two = app(global("succ"), app(global("succ"), global("zero")));
    assert_eq!(normalize(&session, &app(term.clone(), two.clone())), two);
}

#[test]
fn contradiction() {
    let term = proof(include_str!("scripts/contradiction.htt"), "ex-falso");

    let Term::Lam { ref body, .. } = term else {
        panic!("expected an abstraction, got {term}");
    };
    let (head, args) = body.spine();
    assert_eq!(head, &global("emptyElim"));
    assert_eq!(args.last(), Some(&&var(0)));
}

#[test]
fn out_of_scope_statement() {
    let (session, report) = run("Theorem ex-falso : (Pi e Empty (Var 99999))\nProof intro e contradiction Qed");
    assert!(!report.success());
    assert!(!session.environment().contains("ex-falso"));
    assert_eq!(report.diagnostics().len(), 1);
}

#[test]
fn library() {
    let (session, report) = run(include_str!("scripts/library.htt"));
    let diagnostics: Vec<String> = report.diagnostics().iter().map(ToString::to_string).collect();
    assert!(report.success(), "{diagnostics:?}");
    assert_eq!(report.items.len(), 9);
    for name in ["two", "A", "a", "two-refl", "const", "first-arg", "uses-const", "pick-a", "plus-zero"] {
        assert!(session.environment().contains(name), "{name} is missing");
    }
    assert_eq!(report.get("pick-a").and_then(|item| item.term()), Some(&global("a")));
}

#[test]
fn failures_are_isolated() {
    let (session, report) = run(include_str!("scripts/failures.htt"));
    assert_eq!(report.exit_code(), 1);

    let failures: Vec<(&str, usize)> = report.failures().map(|item| (item.name.as_str(), item.line)).collect();
    assert_eq!(failures, vec![("broken", 4), ("unfinished", 11)]);
    assert!(!session.environment().contains("broken"));
    assert!(!session.environment().contains("unfinished"));
    assert!(session.environment().contains("fine"));

    let diagnostics: Vec<String> = report.diagnostics().iter().map(ToString::to_string).collect();
    assert_eq!(diagnostics[0], "test.htt:7:1: parse error: Theorem broken (line 4): unknown tactic: frobnicate");
    assert!(diagnostics[1].starts_with("test.htt:11:1: tactic failed: Theorem unfinished (line 11): 1 goal(s) left"));
}

#[test]
fn empty_scripts() {
    for source in ["", "-- only comments\n\n-- and blank lines\n"] {
        let (_, report) = run(source);
        assert!(report.items.is_empty());
        assert!(report.success());
        assert_eq!(report.exit_code(), 0);
    }
}

#[test]
fn universe_mismatch() {
    let (_, report) = run("Theorem t : (Sort 1)\nProof\n  exact (Sort 1)\nQed");
    let item = report.get("t").unwrap();
    let err = item.outcome.as_ref().unwrap_err();
    assert_eq!(err.kind_name(), "type mismatch");
    assert_eq!(err.location.map(|location| location.start.line), Some(3));
}

#[test]
fn rewrite_needs_an_identity() {
    let (_, report) = run("Theorem t : (Pi n Nat (Id Nat n n))\nProof\n  intro n\n  rewrite n\nQed");
    let err = report.get("t").unwrap().outcome.as_ref().unwrap_err();
    assert_eq!(err.kind_name(), "tactic failed");
    assert!(err.hints().iter().any(|hint| hint.contains("destruct") && hint.contains("cases")));
}

#[test]
fn concurrent_sessions() {
    let (session, report) = run(include_str!("scripts/library.htt"));
    assert!(report.success());

    let handles: Vec<_> = (0..2)
        .map(|ix| {
            let mut session = session.clone();
            thread::spawn(move || {
                let name = format!("uses-two-{ix}");
                let source = format!("Theorem {name} : (Id Nat two (App succ (App succ zero)))\nProof\n  exact two-refl\nQed");
                let report = run_script(&mut session, &source, "thread.htt");
                (report.success(), session.environment().contains(&name), session.environment().contains("uses-two-0"), session.environment().contains("uses-two-1"))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
    assert_eq!(results, vec![(true, true, true, false), (true, true, false, true)]);
    assert!(!session.environment().contains("uses-two-0"));
}
