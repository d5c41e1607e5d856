//! Case analysis and induction on hypotheses of inductive types.
//!
//! The goal is abstracted over the hypothesis to form the motive of the eliminator of its type,
//! and each case of the eliminator becomes a goal, under hypotheses standing for the fields of the
//! constructor (and, for induction, the induction hypotheses).

use kernel::term::{Icity, Name, Term};
use kernel::zonk::zonk;
use log::debug;

use crate::error::{Error, Result};
use crate::primitives::{checker, render, verify};
use crate::proof_state::{ProofState, Subgoal};
use crate::tactic::Tactic;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Mode {
    /// Case analysis on a type with two constructors.
    Destruct,
    Cases,
    Induction,
}

impl Mode {
    const fn name(self) -> &'static str {
        match self {
            Self::Destruct => "destruct",
            Self::Cases => "cases",
            Self::Induction => "induction",
        }
    }
}

/// A binder of the telescope of a case.
struct Field {
    name: Name,
    ty: Term,

    /// Whether the binder is an induction hypothesis.
    hypothesis: bool,
}

/// Splits a case type into the binders of its fields and induction hypotheses, and its result.
fn telescope(mut ty: Term, recursive: &[bool]) -> Result<(Vec<Field>, Term)> {
    let mut fields = Vec::new();
    for &recursive in recursive {
        for hypothesis in [false, true] {
            if hypothesis && !recursive {
                continue;
            }
            let Term::Pi {
                name, domain, codomain, ..
            } = ty
            else {
                return Err(kernel::Error::bug("case of an eliminator with too few binders").into());
            };
            fields.push(Field {
                name,
                ty: *domain,
                hypothesis,
            });
            ty = *codomain;
        }
    }
    Ok((fields, ty))
}

/// Drops the binders at positions `removed` of a telescope from a term living under its first
/// `depth` binders, provided the term does not mention them.
fn strengthen(term: &Term, depth: usize, removed: &[usize]) -> Option<Term> {
    removed.iter().filter(|&&gone| gone < depth).try_fold(term.clone(), |term, &gone| {
        let ix = depth - 1 - gone;
        (!term.has_free_var(ix)).then(|| term.subst(ix, &Term::Var(0)))
    })
}

fn eliminate(state: &mut ProofState, hypothesis: &str, mode: Mode) -> Result<()> {
    let goal = state.focused()?;
    let ctx = &goal.context;
    let Some((ix, ty)) = state.lookup_hypothesis(hypothesis) else {
        return Err(Error::failed(format!("no hypothesis named {hypothesis}")).hint("introduce it with intro first"));
    };

    let ty = state.normalize(ctx, &zonk(state.metas(), &ty))?;
    let (head, params) = ty.spine();
    let info = match *head {
        Term::Global(ref name) => state.environment().inductive(name).map(|info| (name.clone(), info.clone())),
        _ => None,
    };
    let Some((inductive, info)) = info else {
        return Err(Error::failed(format!(
            "{hypothesis} has type {}, which is not an inductive type",
            render(state, &goal, &ty)
        )));
    };
    if !info.path_constructors.is_empty() {
        return Err(Error::failed(format!("{} does not apply to the higher inductive type {inductive}", mode.name()))
            .hint("use its recursor with apply"));
    }
    if mode == Mode::Destruct && info.constructors.len() != 2 {
        return Err(Error::failed(format!("destruct expects a type with two constructors, {inductive} has {}", info.constructors.len()))
            .hint("use cases instead"));
    }
    let Some(eliminator) = info.eliminator.clone() else {
        return Err(Error::failed(format!("{inductive} has no eliminator")));
    };
    let params: Vec<Term> = params.into_iter().cloned().collect();
    if params.len() != info.params {
        return Err(kernel::Error::bug(format!("{inductive} applied to {} parameters", params.len())).into());
    }

    let motive = Term::Lam {
        name: Name::from("x"),
        icity: Icity::Explicit,
        annotation: Some(Box::new(ty.clone())),
        body: Box::new(goal.ty.lift(1, 0).replace_var(ix + 1, &Term::Var(0))),
    };
    let head = Term::Global(eliminator).apply(params).apply([motive]);

    // Π cases. Π x. P x
    let mut cases = state.normalize(ctx, &checker(state).synth(ctx, &head)?)?;
    let mut case_types = Vec::with_capacity(info.constructors.len());
    for _ in &info.constructors {
        let Term::Pi { domain, codomain, .. } = cases else {
            return Err(kernel::Error::bug(format!("eliminator of {inductive} with too few cases")).into());
        };
        case_types.push(*domain);
        cases = codomain.subst(0, &Term::Var(0));
    }

    let len = ctx.len();
    let mut subgoals = Vec::new();
    let mut shapes = Vec::new();
    for (ctor, case) in info.constructors.iter().zip(case_types) {
        let recursive = state
            .environment()
            .constructor(ctor)
            .map(|ctor| ctor.recursive.clone())
            .ok_or_else(|| kernel::Error::bug(format!("{ctor} is not a constructor")))?;
        let (fields, result) = telescope(case, &recursive)?;

        let removed: Vec<usize> = if mode == Mode::Induction {
            Vec::new()
        } else {
            fields.iter().enumerate().filter(|(_, field)| field.hypothesis).map(|(position, _)| position).collect()
        };
        let dependent = || Error::failed(format!("the case {ctor} depends on its induction hypotheses"));

        let mut context = ctx.clone();
        for (position, field) in fields.iter().enumerate() {
            if !removed.contains(&position) {
                let ty = strengthen(&field.ty, position, &removed).ok_or_else(dependent)?;
                context = context.extend(field.name.clone(), ty, Icity::Explicit);
            }
        }
        let ty = strengthen(&result, fields.len(), &removed).ok_or_else(dependent)?;

        debug!("{} {hypothesis}: case {ctor} under {} binder(s)", mode.name(), fields.len());
        subgoals.push(Subgoal { ty, context });
        shapes.push((fields, removed));
    }

    state.solve_goal_with_subgoals(goal.id, subgoals, |ids| {
        let cases = ids.iter().zip(shapes).map(|(&id, (fields, removed))| {
            let depth = fields.len();
            let args = (0..len)
                .rev()
                .map(|ix| Term::Var(depth + ix))
                .chain(
                    (0..depth)
                        .filter(|position| !removed.contains(position))
                        .map(|position| Term::Var(depth - 1 - position)),
                )
                .collect();
            fields.into_iter().rev().fold(Term::Meta(id, args), |body, field| Term::Lam {
                name: field.name,
                icity: Icity::Explicit,
                annotation: Some(Box::new(field.ty)),
                body: Box::new(body),
            })
        });
        head.apply(cases).apply([Term::Var(ix)])
    })?;
    verify(state, &goal)
}

/// Case analysis on a hypothesis whose type has two constructors.
#[must_use]
pub fn destruct(hypothesis: String) -> Tactic {
    Tactic::new("destruct", move |state| eliminate(state, &hypothesis, Mode::Destruct))
}

/// Case analysis on a hypothesis of an inductive type. Any inductive without path constructors
/// qualifies, so `Unit` and `Empty` are accepted along with `Nat`, `List`, `Bool` and `Sum`.
#[must_use]
pub fn cases(hypothesis: String) -> Tactic {
    Tactic::new("cases", move |state| eliminate(state, &hypothesis, Mode::Cases))
}

/// Induction on a hypothesis of an inductive type: recursive fields come with an induction
/// hypothesis named `ih`.
#[must_use]
pub fn induction(hypothesis: String) -> Tactic {
    Tactic::new("induction", move |state| eliminate(state, &hypothesis, Mode::Induction))
}
