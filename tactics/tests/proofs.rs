use kernel::term::builders::*;
use kernel::{Context, Environment, Term, TypeChecker};
use tactics::elimination::{cases, destruct, induction};
use tactics::primitives::{assumption, exact, intro, intros, reflexivity};
use tactics::rewrite::{rewrite, rewrite_rev};
use tactics::tactic::{progress, seq};
use tactics::{run, ProofState, Tactic};

fn start(ty: Term) -> ProofState {
    ProofState::new(Environment::with_builtins().unwrap(), ty, Context::new())
}

fn prove(ty: Term, tactics: &[Tactic]) -> ProofState {
    let mut state = start(ty);
    for tactic in tactics {
        run(&mut state, tactic).unwrap();
    }
    state
}

fn qed(state: &ProofState) -> Term {
    let proof = state.extract().unwrap();
    TypeChecker::new(state.environment()).check(&Context::new(), &proof, &state.root().ty).unwrap();
    proof
}

fn normalize(state: &ProofState, term: Term) -> Term {
    TypeChecker::new(state.environment()).normalize(&Context::new(), &term).unwrap()
}

fn nat() -> Term {
    global("Nat")
}

fn two() -> Term {
    app(global("succ"), app(global("succ"), global("zero")))
}

#[test]
fn induction_on_nat() {
    let mut state = prove(arrow(nat(), nat()), &[intro(Some("n".to_owned())), induction("n".to_owned())]);
    assert_eq!(state.goal_count(), 2);
    assert_eq!(state.goals()[0].context.len(), 1);
    assert_eq!(state.goals()[1].context.len(), 3);

    run(&mut state, &exact(global("zero"))).unwrap();
    run(&mut state, &exact(app(global("succ"), var(1)))).unwrap();
    let proof = qed(&state);
    assert_eq!(normalize(&state, app(proof, two())), two());
}

#[test]
fn progress_counts_goals() {
    let mut state = start(arrow(nat(), nat()));
    let before = state.clone();
    let err = run(&mut state, &progress(intro(None))).unwrap_err();
    assert_eq!(err.to_string(), "intro made no progress");
    assert_eq!(state, before);

    run(&mut state, &progress(seq(vec![intro(None), exact(var(0))]))).unwrap();
    assert!(state.is_complete());
}

#[test]
fn induction_hypotheses() {
    // doubling, by recursion on the induction hypothesis
    let state = prove(arrow(nat(), nat()), &[
        intro(Some("n".to_owned())),
        induction("n".to_owned()),
        exact(global("zero")),
        exact(app(global("succ"), app(global("succ"), var(0)))),
    ]);
    let proof = qed(&state);
    let four = app(global("succ"), app(global("succ"), two()));
    assert_eq!(normalize(&state, app(proof, two())), four);
}

#[test]
fn cases_hide_induction_hypotheses() {
    let state = prove(arrow(nat(), nat()), &[intro(Some("n".to_owned())), cases("n".to_owned())]);
    assert_eq!(state.goal_count(), 2);
    assert_eq!(state.goals()[1].context.len(), 2);
}

#[test]
fn cases_on_unit() {
    let mut state = prove(arrow(global("Unit"), nat()), &[intro(Some("u".to_owned())), cases("u".to_owned())]);
    assert_eq!(state.goal_count(), 1);
    assert_eq!(state.goals()[0].ty, nat());
    run(&mut state, &exact(global("zero"))).unwrap();
    let proof = qed(&state);
    assert_eq!(normalize(&state, app(proof, global("tt"))), global("zero"));
}

#[test]
fn destruct_booleans() {
    let bool = || global("Bool");
    let state = prove(arrow(bool(), bool()), &[
        intro(Some("b".to_owned())),
        destruct("b".to_owned()),
        exact(global("false")),
        exact(global("true")),
    ]);
    let negation = qed(&state);
    assert_eq!(normalize(&state, app(negation.clone(), global("true"))), global("false"));
    assert_eq!(normalize(&state, app(negation, global("false"))), global("true"));
}

#[test]
fn destruct_sums() {
    let sum = global("Sum").apply([nat(), nat()]);
    let state = prove(arrow(sum, nat()), &[intro(Some("s".to_owned())), destruct("s".to_owned()), assumption(), assumption()]);
    let proof = qed(&state);
    let left = global("inl").apply([nat(), nat(), two()]);
    assert_eq!(normalize(&state, app(proof, left)), two());
}

#[test]
fn elimination_failures() {
    let mut state = prove(arrow(global("Unit"), global("Unit")), &[intro(Some("u".to_owned()))]);
    let before = state.clone();

    let err = run(&mut state, &destruct("u".to_owned())).unwrap_err();
    assert_eq!(err.kind_name(), "tactic failed");
    assert_eq!(err.hints, vec!["use cases instead".to_owned()]);
    assert_eq!(state, before);

    let err = run(&mut state, &induction("v".to_owned())).unwrap_err();
    assert_eq!(err.to_string(), "no hypothesis named v");

    let mut state = prove(arrow(nat(), arrow(nat(), nat())), &[intro(Some("f".to_owned()))]);
    assert!(run(&mut state, &cases("g".to_owned())).is_err());
}

/// `Π x y. Id Nat x y → goal`, with `x y h` introduced.
fn with_identity(goal: Term) -> ProofState {
    let ty = pi("x", nat(), pi("y", nat(), pi("h", id(nat(), var(1), var(0)), goal)));
    prove(ty, &[intros()])
}

#[test]
fn rewriting() {
    // Id Nat y x
    let mut state = with_identity(id(nat(), var(1), var(2)));
    run(&mut state, &rewrite(var(0))).unwrap();
    assert_eq!(state.current_goal().unwrap().ty, id(nat(), var(2), var(2)));
    run(&mut state, &reflexivity()).unwrap();
    qed(&state);

    // Id Nat x y
    let mut state = with_identity(id(nat(), var(2), var(1)));
    run(&mut state, &rewrite_rev(var(0))).unwrap();
    assert_eq!(state.current_goal().unwrap().ty, id(nat(), var(1), var(1)));
    run(&mut state, &reflexivity()).unwrap();
    qed(&state);
}

#[test]
fn rewriting_failures() {
    let mut state = with_identity(id(nat(), global("zero"), global("zero")));
    let err = run(&mut state, &rewrite(var(0))).unwrap_err();
    assert!(err.to_string().ends_with("does not occur in the goal"));

    let err = run(&mut state, &rewrite(var(1))).unwrap_err();
    assert_eq!(err.hints, vec!["to reason by cases on it, use destruct or cases".to_owned()]);
    assert!(err.goal.is_some());
}
