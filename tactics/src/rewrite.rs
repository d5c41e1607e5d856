//! Rewriting the goal with an identity.
//!
//! Given `h : Id A x y`, the goal `G` is seen as `C y h` for the motive
//! `C = λ y'. λ p. G[y := y']`, so that `J A C d x y h : G` as soon as `d : G[y := x]`.

use kernel::term::{Icity, Name, Term};
use kernel::zonk::zonk;

use crate::argument::Argument;
use crate::error::{Error, Result};
use crate::primitives::{checker, render, verify};
use crate::proof_state::{ProofState, Subgoal};
use crate::tactic::Tactic;

/// An identity proof with its type.
struct Identity {
    proof: Term,
    ty: Term,
    lhs: Term,
    rhs: Term,
}

fn identity(state: &ProofState, hypothesis: &Argument) -> Result<Identity> {
    let goal = state.focused()?;
    let proof = zonk(state.metas(), &hypothesis.resolve(state, &goal, None)?);
    let ty = checker(state).synth(&goal.context, &proof)?;
    match state.normalize(&goal.context, &ty)? {
        Term::Id { ty, lhs, rhs } => Ok(Identity {
            proof,
            ty: *ty,
            lhs: *lhs,
            rhs: *rhs,
        }),
        ty => Err(Error::failed(format!(
            "rewrite expects an identity, {} has type {}",
            render(state, &goal, &proof),
            render(state, &goal, &ty)
        ))
        .hint("to reason by cases on it, use destruct or cases")),
    }
}

/// `λ y. λ p. body`, a motive for `J` over identities from `lhs` in `ty`.
fn motive(ty: &Term, lhs: &Term, body: Term) -> Term {
    Term::Lam {
        name: Name::from("y"),
        icity: Icity::Explicit,
        annotation: Some(Box::new(ty.clone())),
        body: Box::new(Term::Lam {
            name: Name::from("p"),
            icity: Icity::Explicit,
            annotation: Some(Box::new(Term::Id {
                ty: Box::new(ty.lift(1, 0)),
                lhs: Box::new(lhs.lift(1, 0)),
                rhs: Box::new(Term::Var(0)),
            })),
            body: Box::new(body),
        }),
    }
}

/// `h : Id A y x` from `h : Id A x y`.
fn symmetry(identity: Identity) -> Identity {
    let Identity { proof, ty, lhs, rhs } = identity;
    // C y p = Id A y x
    let body = Term::Id {
        ty: Box::new(ty.lift(2, 0)),
        lhs: Box::new(Term::Var(1)),
        rhs: Box::new(lhs.lift(2, 0)),
    };
    let proof = Term::J {
        ty: Box::new(ty.clone()),
        motive: Box::new(motive(&ty, &lhs, body)),
        base: Box::new(Term::Refl {
            ty: Box::new(ty.clone()),
            point: Box::new(lhs.clone()),
        }),
        lhs: Box::new(lhs.clone()),
        rhs: Box::new(rhs.clone()),
        path: Box::new(proof),
    };
    Identity {
        proof,
        ty,
        lhs: rhs,
        rhs: lhs,
    }
}

/// Replaces the occurrences of the right-hand side of an identity in the goal by its left-hand
/// side.
fn rewrite_with(state: &mut ProofState, identity: Identity) -> Result<()> {
    let goal = state.focused()?;
    let Identity { proof, ty, lhs, rhs } = identity;

    let body = zonk(state.metas(), &goal.ty).lift(2, 0).abstract_occurrences(&rhs.lift(2, 0), 1);
    if !body.has_free_var(1) {
        return Err(Error::failed(format!("{} does not occur in the goal", render(state, &goal, &rhs))));
    }
    let rewritten = body.instantiate(&[
        lhs.clone(),
        Term::Refl {
            ty: Box::new(ty.clone()),
            point: Box::new(lhs.clone()),
        },
    ]);

    let len = goal.context.len();
    let subgoal = Subgoal {
        ty: rewritten,
        context: goal.context.clone(),
    };
    state.solve_goal_with_subgoals(goal.id, vec![subgoal], |ids| Term::J {
        motive: Box::new(motive(&ty, &lhs, body)),
        ty: Box::new(ty),
        base: Box::new(Term::meta(ids[0], len)),
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        path: Box::new(proof),
    })?;
    verify(state, &goal)
}

/// Rewrites the goal with `h : Id A x y`, replacing `y` by `x`.
#[must_use]
pub fn rewrite<A: Into<Argument>>(hypothesis: A) -> Tactic {
    let hypothesis = hypothesis.into();
    Tactic::new("rewrite", move |state| {
        let identity = identity(state, &hypothesis)?;
        rewrite_with(state, identity)
    })
}

/// Rewrites the goal with `h : Id A x y`, replacing `x` by `y`.
#[must_use]
pub fn rewrite_rev<A: Into<Argument>>(hypothesis: A) -> Tactic {
    let hypothesis = hypothesis.into();
    Tactic::new("rewrite_rev", move |state| {
        let identity = identity(state, &hypothesis)?;
        rewrite_with(state, symmetry(identity))
    })
}
