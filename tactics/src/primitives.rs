//! Primitive tactics.
//!
//! Each primitive works on the focused goal. It either solves it with a complete term, or with a
//! skeleton whose holes are new goals; skeletons are type-checked by the kernel against the goal
//! before the tactic succeeds.

use elaboration::unifier::Unifier;
use kernel::nbe::Evaluator;
use kernel::term::pretty::Rendered;
use kernel::term::{Icity, Name, Term};
use kernel::type_checker::TypeChecker;
use kernel::zonk::{collect_metas, zonk};

use crate::argument::Argument;
use crate::error::{Error, Result};
use crate::proof_state::{Goal, ProofState, Subgoal};
use crate::tactic::{first, repeat, seq, try_, Tactic};

/// The builtin inductive type without constructors.
const EMPTY: &str = "Empty";
const UNIT: &str = "Unit";
const LIST: &str = "List";

pub(crate) fn checker(state: &ProofState) -> TypeChecker<'_> {
    TypeChecker::with_metas(state.environment(), state.metas())
}

/// A term of the context of a goal, as shown to the user.
pub(crate) fn render(state: &ProofState, goal: &Goal, term: &Term) -> String {
    Rendered::new(zonk(state.metas(), term), goal.context.names()).to_string()
}

/// The type of a goal, normalized unless it already has the expected shape.
pub(crate) fn view(state: &ProofState, goal: &Goal, shape: fn(&Term) -> bool) -> Result<Term> {
    let ty = zonk(state.metas(), &goal.ty);
    if shape(&ty) {
        Ok(ty)
    } else {
        state.normalize(&goal.context, &ty)
    }
}

/// Type-checks the proof of a goal, as far as it is known.
pub(crate) fn verify(state: &ProofState, goal: &Goal) -> Result<()> {
    let proof = zonk(state.metas(), &goal.hole());
    checker(state).check(&goal.context, &proof, &goal.ty)?;
    Ok(())
}

/// Hints for a goal some tactic did not fit.
fn suggestions(state: &ProofState, goal: &Goal, err: Error) -> Error {
    match view(state, goal, |ty| matches!(*ty, Term::Pi { .. })) {
        Ok(Term::Pi { .. }) => err.hint("the goal is a function type, did you mean intros?"),
        _ => err,
    }
}

fn is_pi(ty: &Term) -> bool {
    matches!(*ty, Term::Pi { .. })
}

/// Introduces the binder of a Π goal as a hypothesis, named `name`, or after the binder.
#[must_use]
pub fn intro(name: Option<String>) -> Tactic {
    Tactic::new("intro", move |state| {
        let goal = state.focused()?;
        let Term::Pi {
            name: binder,
            icity,
            domain,
            codomain,
        } = view(state, &goal, is_pi)?
        else {
            return Err(Error::failed(format!("intro expects a function type, got {}", render(state, &goal, &goal.ty)))
                .hint("use exact or apply to prove the goal"));
        };

        let name = match name {
            Some(ref name) => Name::new(name.clone()),
            None if binder.is_anonymous() => Name::from("x"),
            None => binder,
        };
        let len = goal.context.len();
        let subgoal = Subgoal {
            ty: *codomain,
            context: goal.context.extend(name.clone(), (*domain).clone(), icity),
        };
        state.solve_goal_with_subgoals(goal.id, vec![subgoal], |ids| Term::Lam {
            name,
            icity,
            annotation: Some(domain),
            body: Box::new(Term::meta(ids[0], len + 1)),
        })?;
        verify(state, &goal)
    })
}

/// Introduces several hypotheses, with the given names.
#[must_use]
pub fn intro_n(names: Vec<String>) -> Tactic {
    let intros = seq(names.into_iter().map(|name| intro(Some(name))).collect());
    Tactic::new("intro", move |state| intros.apply(state))
}

/// Introduces every leading binder of the goal.
#[must_use]
pub fn intros() -> Tactic {
    let intros = repeat(intro(None));
    Tactic::new("intros", move |state| intros.apply(state))
}

/// Solves the goal with a term of its type.
#[must_use]
pub fn exact<A: Into<Argument>>(term: A) -> Tactic {
    let term = term.into();
    Tactic::new("exact", move |state| {
        let goal = state.focused()?;
        let term = term.resolve(state, &goal, Some(&goal.ty))?;
        let term = zonk(state.metas(), &term);

        if let Some(hole) = collect_metas(&term).first() {
            return Err(Error::failed(format!("the term given to exact leaves {hole} unsolved"))
                .hint("use apply to turn missing arguments into goals"));
        }
        checker(state)
            .check(&goal.context, &term, &goal.ty)
            .map_err(|err| suggestions(state, &goal, err.into()))?;
        state.solve_goal(goal.id, term)
    })
}

/// Solves the goal with a hypothesis of its type, the innermost one first.
#[must_use]
pub fn assumption() -> Tactic {
    Tactic::new("assumption", |state| {
        let goal = state.focused()?;
        let mut found = None;
        for ix in 0..goal.context.len() {
            let Some(ty) = goal.context.type_of(ix) else {
                continue;
            };
            if checker(state).conv(&goal.context, &ty, &goal.ty)? {
                found = Some(ix);
                break;
            }
        }

        let Some(ix) = found else {
            return Err(suggestions(
                state,
                &goal,
                Error::failed(format!("no hypothesis has type {}", render(state, &goal, &goal.ty))),
            ));
        };
        state.solve_goal(goal.id, Term::Var(ix))
    })
}

/// Solves the goal with a term applied to as many new goals as needed for its type to match.
#[must_use]
pub fn apply<A: Into<Argument>>(term: A) -> Tactic {
    let term = term.into();
    Tactic::new("apply", move |state| {
        let goal = state.focused()?;
        let ctx = &goal.context;
        let term = term.resolve(state, &goal, None)?;

        let environment = state.environment().clone();
        let metas = state.metas().clone();
        let mut ty = TypeChecker::with_metas(&environment, &metas).synth(ctx, &term)?;
        let mut proof = term.clone();
        let mut created = Vec::new();

        let solved = loop {
            let attempt = metas.clone();
            let unified = {
                let mut unifier = Unifier::new(&environment, &attempt);
                unifier.unify(ctx, &ty, &goal.ty).and_then(|()| unifier.finish()).is_ok()
            };
            if unified {
                break attempt;
            }

            let Term::Pi {
                icity,
                domain,
                codomain,
                ..
            } = Evaluator::new(&environment, Some(&metas)).normalize(ctx, &ty)?
            else {
                return Err(suggestions(
                    state,
                    &goal,
                    Error::failed(format!(
                        "cannot apply {} of type {} to {}",
                        render(state, &goal, &term),
                        render(state, &goal, &ty),
                        render(state, &goal, &goal.ty)
                    )),
                ));
            };

            let id = metas.fresh(*domain, ctx.clone(), None);
            let hole = Term::meta(id, ctx.len());
            proof = Term::App {
                function: Box::new(proof),
                argument: Box::new(hole.clone()),
                icity,
            };
            ty = codomain.subst(0, &hole);
            created.push(id);
        };

        state.commit_metas(solved);
        state.solve_goal_with_metas(goal.id, proof, &created)?;
        verify(state, &goal)
    })
}

/// Solves an identity or path goal between convertible endpoints.
#[must_use]
pub fn reflexivity() -> Tactic {
    Tactic::new("reflexivity", |state| {
        let goal = state.focused()?;
        let shape = view(state, &goal, |ty| matches!(*ty, Term::Id { .. } | Term::Path { .. }))?;
        let (Term::Id { ty, lhs, rhs } | Term::Path { ty, lhs, rhs }) = shape.clone() else {
            return Err(suggestions(
                state,
                &goal,
                Error::failed(format!("reflexivity expects an equality, got {}", render(state, &goal, &shape))),
            ));
        };

        if !checker(state).conv(&goal.context, &lhs, &rhs)? {
            return Err(Error::failed(format!(
                "{} and {} are not equal",
                render(state, &goal, &lhs),
                render(state, &goal, &rhs)
            ))
            .hint("try simpl, rewrite or induction first"));
        }

        let proof = match shape {
            Term::Id { .. } => Term::Refl { ty, point: lhs },
            _ => Term::PathLam {
                name: Name::from("i"),
                body: Box::new(lhs.ilift(1, 0)),
            },
        };
        checker(state).check(&goal.context, &proof, &goal.ty)?;
        state.solve_goal(goal.id, proof)
    })
}

fn sigma(state: &ProofState, goal: &Goal, tactic: &str) -> Result<(Name, Term, Term)> {
    match view(state, goal, |ty| matches!(*ty, Term::Sigma { .. }))? {
        Term::Sigma { name, first, second } => Ok((name, *first, *second)),
        ty => Err(Error::failed(format!("{tactic} expects a Σ type, got {}", render(state, goal, &ty)))),
    }
}

/// Splits a Σ goal into its first component and its second one, the latter depending on the
/// former through a new hypothesis.
#[must_use]
pub fn split() -> Tactic {
    Tactic::new("split", |state| {
        let goal = state.focused()?;
        let (name, first, second) = sigma(state, &goal, "split")?;
        let name = if name.is_anonymous() { Name::from("x") } else { name };

        let len = goal.context.len();
        let subgoals = vec![
            Subgoal {
                ty: first.clone(),
                context: goal.context.clone(),
            },
            Subgoal {
                ty: second,
                context: goal.context.extend(name, first, Icity::Explicit),
            },
        ];
        state.solve_goal_with_subgoals(goal.id, subgoals, |ids| {
            let witness = Term::meta(ids[0], len);
            let args = (0..len).rev().map(Term::Var).chain([witness.clone()]).collect();
            Term::Pair(Box::new(witness), Box::new(Term::Meta(ids[1], args)))
        })?;
        verify(state, &goal)
    })
}

/// Proves a Σ goal with the given first component.
#[must_use]
pub fn exists<A: Into<Argument>>(witness: A) -> Tactic {
    let witness = witness.into();
    Tactic::new("exists", move |state| {
        let goal = state.focused()?;
        let (_, first, second) = sigma(state, &goal, "exists")?;
        let witness = zonk(state.metas(), &witness.resolve(state, &goal, Some(&first))?);
        checker(state).check(&goal.context, &witness, &first)?;

        let len = goal.context.len();
        let subgoal = Subgoal {
            ty: second.subst(0, &witness),
            context: goal.context.clone(),
        };
        state.solve_goal_with_subgoals(goal.id, vec![subgoal], |ids| {
            Term::Pair(Box::new(witness), Box::new(Term::meta(ids[0], len)))
        })?;
        verify(state, &goal)
    })
}

/// Instantiates the leading Π binders of a closed type.
fn instantiate_pis(mut ty: Term, args: &[Term]) -> Option<Term> {
    for arg in args {
        let Term::Pi { codomain, .. } = ty else {
            return None;
        };
        ty = codomain.subst(0, arg);
    }
    Some(ty)
}

/// The inductive type the goal is an instance of, with its parameters.
fn inductive_goal(state: &ProofState, goal: &Goal) -> Result<(String, Vec<Term>)> {
    let ty = state.normalize(&goal.context, &zonk(state.metas(), &goal.ty))?;
    let (head, args) = ty.spine();
    match *head {
        Term::Global(ref name) if state.environment().inductive(name).is_some() => {
            Ok((name.clone(), args.into_iter().cloned().collect()))
        },
        _ => Err(Error::failed(format!("the goal {} is not an inductive type", render(state, goal, &ty)))),
    }
}

/// Whether an inductive has two parameters and two constructors of one field each, as sums do.
fn is_sum(state: &ProofState, name: &str) -> bool {
    state.environment().inductive(name).map_or(false, |info| {
        info.params == 2
            && info.constructors.len() == 2
            && info
                .constructors
                .iter()
                .all(|ctor| state.environment().constructor(ctor).map_or(false, |ctor| ctor.fields() == 1))
    })
}

/// Proves a sum by its constructor on `side`.
fn injection(state: &mut ProofState, side: usize) -> Result<()> {
    let goal = state.focused()?;
    let (name, params) = inductive_goal(state, &goal)?;
    if !is_sum(state, &name) || params.len() != 2 {
        return Err(Error::failed(format!("{name} is not a sum type")).hint("use constructor or exists instead"));
    }

    let info = state
        .environment()
        .inductive(&name)
        .ok_or_else(|| Error::failed(format!("{name} is not an inductive type")))?;
    let ctor = info.constructors.get(side).cloned().unwrap_or_default();
    let Some(Term::Pi { domain, .. }) = state
        .environment()
        .get(&ctor)
        .and_then(|declaration| instantiate_pis(declaration.ty.clone(), &params))
    else {
        return Err(Error::failed(format!("constructor {ctor} of {name} does not take one field")));
    };

    let len = goal.context.len();
    let subgoal = Subgoal {
        ty: *domain,
        context: goal.context.clone(),
    };
    state.solve_goal_with_subgoals(goal.id, vec![subgoal], |ids| {
        Term::Global(ctor).apply(params).apply([Term::meta(ids[0], len)])
    })?;
    verify(state, &goal)
}

/// Proves a sum by its left side.
#[must_use]
pub fn left() -> Tactic {
    Tactic::new("left", |state| injection(state, 0))
}

/// Proves a sum by its right side.
#[must_use]
pub fn right() -> Tactic {
    Tactic::new("right", |state| injection(state, 1))
}

/// Proves `Unit` by `tt`, a list type by `nil`, and a sum by its left side.
#[must_use]
pub fn constructor() -> Tactic {
    Tactic::new("constructor", |state| {
        let goal = state.focused()?;
        let (name, params) = inductive_goal(state, &goal)?;
        if is_sum(state, &name) {
            return injection(state, 0);
        }

        if name != UNIT && name != LIST {
            return Err(Error::failed(format!("constructor does not apply to {name}"))
                .hint("use exists, apply or exact instead"));
        }

        let environment = state.environment();
        let nullary = environment.inductive(&name).and_then(|info| {
            info.constructors
                .iter()
                .find(|ctor| environment.constructor(ctor).map_or(false, |ctor| ctor.fields() == 0))
        });
        let Some(ctor) = nullary else {
            return Err(Error::failed(format!("{name} has no constructor without arguments")));
        };

        let proof = Term::Global(ctor.clone()).apply(params);
        checker(state).check(&goal.context, &proof, &goal.ty)?;
        state.solve_goal(goal.id, proof)
    })
}

/// Proves any goal from a hypothesis of the empty type.
#[must_use]
pub fn contradiction() -> Tactic {
    Tactic::new("contradiction", |state| {
        let goal = state.focused()?;
        let eliminator = state
            .environment()
            .inductive(EMPTY)
            .and_then(|info| info.eliminator.clone())
            .ok_or_else(|| Error::failed(format!("{EMPTY} is not declared")))?;

        let empty = Term::Global(EMPTY.to_owned());
        let mut found = None;
        for ix in 0..goal.context.len() {
            let Some(ty) = goal.context.type_of(ix) else {
                continue;
            };
            if checker(state).conv(&goal.context, &ty, &empty)? {
                found = Some(ix);
                break;
            }
        }
        let Some(ix) = found else {
            return Err(Error::failed(format!("no hypothesis has type {EMPTY}")).hint("introduce hypotheses with intros"));
        };

        let motive = Term::Lam {
            name: Name::default(),
            icity: Icity::Explicit,
            annotation: Some(Box::new(empty)),
            body: Box::new(goal.ty.lift(1, 0)),
        };
        let proof = Term::Global(eliminator).apply([motive, Term::Var(ix)]);
        checker(state).check(&goal.context, &proof, &goal.ty)?;
        state.solve_goal(goal.id, proof)
    })
}

/// Replaces the goal by its normal form.
#[must_use]
pub fn simpl() -> Tactic {
    Tactic::new("simpl", |state| {
        let goal = state.focused()?;
        let normal = state.normalize(&goal.context, &zonk(state.metas(), &goal.ty))?;
        state.replace_goal(goal.id, normal, goal.context)
    })
}

/// Replaces a definition by its body in the goal and its hypotheses.
#[must_use]
pub fn unfold(name: String) -> Tactic {
    Tactic::new("unfold", move |state| {
        let goal = state.focused()?;
        let Some(body) = state.environment().get(&name).and_then(|declaration| declaration.unfolding()).cloned() else {
            return Err(Error::failed(format!("{name} is not a definition")).hint("only definitions can be unfolded"));
        };

        let replace = |term: &Term| {
            term.map(0, 0, &mut |term, _, _| match *term {
                Term::Global(ref global) if *global == name => Some(body.clone()),
                _ => None,
            })
        };
        let ty = replace(&goal.ty);
        let context = goal.context.map_types(replace);
        if ty == goal.ty && context == goal.context {
            return Err(Error::failed(format!("{name} does not occur in the goal")));
        }
        state.replace_goal(goal.id, ty, context)
    })
}

/// Closes the goal with a hypothesis or by reflexivity.
#[must_use]
pub fn trivial() -> Tactic {
    let trivial = first(vec![assumption(), reflexivity()]);
    Tactic::new("trivial", move |state| trivial.apply(state))
}

/// Introduces every hypothesis, then closes goals with hypotheses or by reflexivity for as long
/// as it works.
#[must_use]
pub fn auto() -> Tactic {
    let auto = seq(vec![try_(intros()), repeat(first(vec![assumption(), reflexivity()]))]);
    Tactic::new("auto", move |state| auto.apply(state))
}

#[cfg(test)]
mod tests {
    use kernel::context::Context;
    use kernel::environment::Environment;
    use kernel::term::builders::*;

    use super::*;
    use crate::tactic::run;

    fn env() -> Environment {
        let mut env = Environment::with_builtins().unwrap();
        env.add_definition("two", global("Nat"), app(global("succ"), app(global("succ"), global("zero"))))
            .unwrap();
        env
    }

    fn prove(ty: Term, tactics: &[Tactic]) -> ProofState {
        let mut state = ProofState::new(env(), ty, Context::new());
        for tactic in tactics {
            run(&mut state, tactic).unwrap();
        }
        state
    }

    /// Extracts the proof and checks it against the statement.
    fn qed(state: &ProofState) -> Term {
        let proof = state.extract().unwrap();
        TypeChecker::new(state.environment()).check(&Context::new(), &proof, &state.root().ty).unwrap();
        proof
    }

    fn polymorphic_identity() -> Term {
        pi("A", sort(0), pi("x", var(0), var(1)))
    }

    #[test]
    fn introductions() {
        let state = prove(polymorphic_identity(), &[intro(Some("B".to_owned())), intro(None)]);
        let goal = state.current_goal().unwrap();
        assert_eq!(goal.context.names(), vec!["B".to_owned(), "x".to_owned()]);
        assert_eq!(goal.ty, var(1));

        let state = prove(polymorphic_identity(), &[intros(), assumption()]);
        assert_eq!(qed(&state), lam("A", sort(0), lam("x", var(0), var(0))));

        let state = prove(arrow(global("Nat"), global("Nat")), &[intro_n(vec!["n".to_owned()])]);
        assert_eq!(state.current_goal().unwrap().context.names(), vec!["n".to_owned()]);

        let mut state = ProofState::new(env(), global("Nat"), Context::new());
        let err = run(&mut state, &intro(None)).unwrap_err();
        assert_eq!(err.kind_name(), "tactic failed");
        assert_eq!(err.goal.as_deref(), Some("  ============================\n  Nat"));
    }

    #[test]
    fn exact_terms() {
        let state = prove(global("Nat"), &[exact(app(global("succ"), global("zero")))]);
        assert_eq!(qed(&state), app(global("succ"), global("zero")));

        let mut state = ProofState::new(env(), sort(1), Context::new());
        let before = state.clone();
        let err = run(&mut state, &exact(sort(1))).unwrap_err();
        assert_eq!(err.kind_name(), "type mismatch");
        assert_eq!(state, before);
        run(&mut state, &exact(sort(0))).unwrap();

        let mut state = ProofState::new(env(), arrow(global("Nat"), global("Nat")), Context::new());
        let err = run(&mut state, &exact(global("zero"))).unwrap_err();
        assert_eq!(err.hints, vec!["the goal is a function type, did you mean intros?".to_owned()]);
    }

    #[test]
    fn assumptions_up_to_conversion() {
        let ty = arrow(global("two"), app(global("succ"), app(global("succ"), global("zero"))));
        let state = prove(ty, &[intro(None), assumption()]);
        assert_eq!(qed(&state), lam("x", global("two"), var(0)));

        let mut state = ProofState::new(env(), arrow(global("Bool"), global("Nat")), Context::new());
        run(&mut state, &intro(None)).unwrap();
        assert!(run(&mut state, &assumption()).is_err());
    }

    #[test]
    fn applications() {
        let state = prove(arrow(global("Nat"), global("Nat")), &[intro(None), apply(global("succ")), assumption()]);
        assert_eq!(qed(&state), lam("x", global("Nat"), app(global("succ"), var(0))));

        // The implicit argument is found by unification.
        let mut env = env();
        env.add_axiom("pick", implicit_pi("A", sort(0), pi("x", var(0), var(1)))).unwrap();
        let mut state = ProofState::new(env, global("Bool"), Context::new());
        run(&mut state, &apply(global("pick"))).unwrap();
        assert_eq!(state.goal_count(), 1);
        assert_eq!(state.current_goal().unwrap().ty, global("Bool"));
        run(&mut state, &exact(global("true"))).unwrap();
        qed(&state);

        let mut state = ProofState::new(self::env(), global("Bool"), Context::new());
        assert!(run(&mut state, &apply(global("zero"))).is_err());
    }

    #[test]
    fn reflexivity_goals() {
        let state = prove(id(global("Nat"), global("two"), app(global("succ"), app(global("succ"), global("zero")))), &[
            reflexivity(),
        ]);
        assert_eq!(qed(&state), refl(global("Nat"), global("two")));

        let state = prove(path(global("Nat"), global("zero"), global("zero")), &[reflexivity()]);
        assert_eq!(qed(&state), path_lam("i", global("zero")));

        let mut state = ProofState::new(env(), id(global("Nat"), global("zero"), global("two")), Context::new());
        let err = run(&mut state, &reflexivity()).unwrap_err();
        assert_eq!(err.hints, vec!["try simpl, rewrite or induction first".to_owned()]);
    }

    #[test]
    fn pairs() {
        let ty = sigma("n", global("Nat"), id(global("Nat"), var(0), var(0)));
        let state = prove(ty.clone(), &[split(), exact(global("zero")), reflexivity()]);
        assert_eq!(qed(&state), pair(global("zero"), refl(global("Nat"), global("zero"))));

        let state = prove(ty.clone(), &[exists(global("two")), reflexivity()]);
        assert_eq!(qed(&state), pair(global("two"), refl(global("Nat"), global("two"))));

        let mut state = ProofState::new(env(), ty, Context::new());
        assert!(run(&mut state, &exists(global("tt"))).is_err());
        assert!(run(&mut state, &left()).is_err());
    }

    #[test]
    fn sums() {
        let unit_or_unit = global("Sum").apply([global("Unit"), global("Unit")]);
        let state = prove(unit_or_unit.clone(), &[left(), constructor()]);
        assert_eq!(qed(&state), global("inl").apply([global("Unit"), global("Unit"), global("tt")]));

        let state = prove(unit_or_unit, &[right(), constructor()]);
        assert_eq!(qed(&state), global("inr").apply([global("Unit"), global("Unit"), global("tt")]));

        let state = prove(global("Sum").apply([global("Empty"), global("Unit")]), &[constructor()]);
        assert_eq!(state.current_goal().unwrap().ty, global("Empty"));

        let state = prove(app(global("List"), global("Bool")), &[constructor()]);
        assert_eq!(qed(&state), app(global("nil"), global("Bool")));

        let mut state = ProofState::new(env(), global("Empty"), Context::new());
        assert!(run(&mut state, &constructor()).is_err());

        let state = prove(global("Unit"), &[constructor()]);
        assert_eq!(qed(&state), global("tt"));
        for ty in ["Nat", "Bool"] {
            let mut state = ProofState::new(env(), global(ty), Context::new());
            let err = run(&mut state, &constructor()).unwrap_err();
            assert_eq!(err.to_string(), format!("constructor does not apply to {ty}"));
            assert!(!state.is_complete());
        }
    }

    #[test]
    fn contradictions() {
        let state = prove(arrow(global("Empty"), global("Unit")), &[intro(Some("e".to_owned())), contradiction()]);
        let proof = qed(&state);
        assert_eq!(proof.head_global(), None);
        let Term::Lam { ref body, .. } = proof else {
            panic!("expected an abstraction");
        };
        assert_eq!(body.head_global(), Some("emptyElim"));

        let mut state = ProofState::new(env(), arrow(global("Unit"), global("Empty")), Context::new());
        run(&mut state, &intro(None)).unwrap();
        assert!(run(&mut state, &contradiction()).is_err());
    }

    #[test]
    fn conversions() {
        let mut state = ProofState::new(env(), id(global("Nat"), global("two"), global("two")), Context::new());
        run(&mut state, &simpl()).unwrap();
        let two = app(global("succ"), app(global("succ"), global("zero")));
        assert_eq!(state.current_goal().unwrap().ty, id(global("Nat"), two.clone(), two.clone()));
        run(&mut state, &reflexivity()).unwrap();
        qed(&state);

        let ty = arrow(global("two"), id(global("Nat"), global("two"), global("zero")));
        let mut state = ProofState::new(env(), ty, Context::new());
        run(&mut state, &intro(Some("h".to_owned()))).unwrap();
        run(&mut state, &unfold("two".to_owned())).unwrap();
        let goal = state.current_goal().unwrap();
        assert_eq!(goal.ty, id(global("Nat"), two.clone(), global("zero")));
        assert_eq!(goal.context.type_of(0), Some(two));

        assert!(run(&mut state, &unfold("two".to_owned())).is_err());
        assert!(run(&mut state, &unfold("succ".to_owned())).is_err());
    }

    #[test]
    fn automation() {
        let state = prove(polymorphic_identity(), &[auto()]);
        assert!(state.is_complete());
        qed(&state);

        let state = prove(arrow(global("Nat"), id(global("Nat"), global("zero"), global("zero"))), &[
            intros(),
            trivial(),
        ]);
        qed(&state);

        let mut state = ProofState::new(env(), global("Nat"), Context::new());
        assert!(run(&mut state, &trivial()).is_err());
        run(&mut state, &auto()).unwrap();
        assert_eq!(state.goal_count(), 1);
    }
}
