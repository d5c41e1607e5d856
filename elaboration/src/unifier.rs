//! Pattern unification.
//!
//! Terms are unified up to conversion: both sides are normalized, unsolved metavariables
//! included, and compared structurally. A metavariable applied to distinct bound variables is
//! solved by inverting that renaming on the other side; any other flexible problem is postponed
//! until later solutions make it tractable.

use core::mem;

use kernel::context::Context;
use kernel::environment::Environment;
use kernel::location::Location;
use kernel::meta::MetaStore;
use kernel::nbe::Evaluator;
use kernel::term::pretty::Rendered;
use kernel::term::{Icity, MetaId, Term};
use kernel::zonk::{has_meta, zonk};
use log::{debug, trace};

use crate::error::{ElaborationError, Result, UnificationError};

/// A unification problem waiting for more metavariables to be solved.
#[derive(Clone, Debug)]
pub struct Constraint {
    pub context: Context,
    pub lhs: Term,
    pub rhs: Term,
    pub location: Option<Location>,
}

pub struct Unifier<'a> {
    environment: &'a Environment,
    metas: &'a MetaStore,
    postponed: Vec<Constraint>,

    /// Number of metavariables solved so far, to detect progress.
    solved: usize,
}

impl<'a> Unifier<'a> {
    #[inline]
    #[must_use]
    pub const fn new(environment: &'a Environment, metas: &'a MetaStore) -> Self {
        Self {
            environment,
            metas,
            postponed: Vec::new(),
            solved: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn postponed(&self) -> &[Constraint] {
        &self.postponed
    }

    fn evaluator(&self) -> Evaluator<'a> {
        Evaluator::new(self.environment, Some(self.metas))
    }

    fn render(&self, ctx: &Context, term: &Term) -> Rendered {
        Rendered::new(zonk(self.metas, term), ctx.names())
    }

    fn mismatch(&self, ctx: &Context, lhs: &Term, rhs: &Term) -> Result<()> {
        Err(UnificationError::Mismatch {
            lhs: self.render(ctx, lhs),
            rhs: self.render(ctx, rhs),
        }
        .into())
    }

    /// Makes `lhs` and `rhs` convertible, solving metavariables on the way. Problems outside of
    /// the pattern fragment are postponed rather than failing.
    ///
    /// # Errors
    /// Fails if the terms cannot be made equal, or if a solution would be cyclic or ill-scoped.
    pub fn unify(&mut self, ctx: &Context, lhs: &Term, rhs: &Term) -> Result<()> {
        self.unify_at(ctx, lhs, rhs, None)
    }

    /// Like [`Unifier::unify`], remembering where the problem comes from.
    ///
    /// # Errors
    /// See [`Unifier::unify`].
    pub fn unify_at(&mut self, ctx: &Context, lhs: &Term, rhs: &Term, location: Option<Location>) -> Result<()> {
        let evaluator = self.evaluator();
        let lhs = evaluator.normalize(ctx, lhs)?;
        let rhs = evaluator.normalize(ctx, rhs)?;
        self.unify_normal(ctx, &lhs, &rhs, location)
    }

    /// Unifies subterms of normal forms, which only need to be normalized again once a
    /// metavariable they mention may have been solved.
    fn unify_sub(&mut self, ctx: &Context, lhs: &Term, rhs: &Term, location: Option<Location>) -> Result<()> {
        if has_meta(lhs) || has_meta(rhs) {
            self.unify_at(ctx, lhs, rhs, location)
        } else {
            self.unify_normal(ctx, lhs, rhs, location)
        }
    }

    fn unify_normal(&mut self, ctx: &Context, lhs: &Term, rhs: &Term, location: Option<Location>) -> Result<()> {
        if lhs == rhs {
            return Ok(());
        }
        trace!("unify {lhs} =?= {rhs}");

        match (flex(lhs), flex(rhs)) {
            (Some((m, args)), Some((n, others))) if m == n && args.len() == others.len() => {
                for (arg, other) in args.into_iter().zip(others) {
                    self.unify_sub(ctx, arg, other, location)?;
                }
                return Ok(());
            },
            (Some((m, args)), other) => {
                if let Some(vars) = pattern(&args) {
                    return self.solve(ctx, m, &vars, rhs);
                }
                if let Some((n, others)) = other {
                    if let Some(vars) = pattern(&others) {
                        return self.solve(ctx, n, &vars, lhs);
                    }
                }
                return self.postpone(ctx, lhs, rhs, location);
            },
            (None, Some((m, args))) => {
                return match pattern(&args) {
                    Some(vars) => self.solve(ctx, m, &vars, lhs),
                    None => self.postpone(ctx, lhs, rhs, location),
                };
            },
            (None, None) => (),
        }

        match (lhs, rhs) {
            (
                &Term::Pi {
                    ref name,
                    icity,
                    ref domain,
                    ref codomain,
                },
                &Term::Pi {
                    icity: other_icity,
                    domain: ref other_domain,
                    codomain: ref other_codomain,
                    ..
                },
            ) if icity == other_icity => {
                self.unify_sub(ctx, domain, other_domain, location)?;
                let ctx = ctx.extend(name.clone(), (**domain).clone(), icity);
                self.unify_sub(&ctx, codomain, other_codomain, location)
            },

            (
                &Term::Sigma {
                    ref name,
                    ref first,
                    ref second,
                },
                &Term::Sigma {
                    first: ref other_first,
                    second: ref other_second,
                    ..
                },
            ) => {
                self.unify_sub(ctx, first, other_first, location)?;
                let ctx = ctx.extend(name.clone(), (**first).clone(), Icity::Explicit);
                self.unify_sub(&ctx, second, other_second, location)
            },

            (
                &Term::Lam {
                    ref name,
                    icity,
                    ref annotation,
                    ref body,
                },
                &Term::Lam {
                    annotation: ref other_annotation,
                    body: ref other_body,
                    ..
                },
            ) => {
                let domain = annotation.as_ref().or(other_annotation.as_ref()).map_or(Term::Sort(0), |ann| (**ann).clone());
                self.unify_sub(&ctx.extend(name.clone(), domain, icity), body, other_body, location)
            },

            (
                &Term::Lam {
                    ref name,
                    icity,
                    ref annotation,
                    ref body,
                },
                other,
            )
            | (
                other,
                &Term::Lam {
                    ref name,
                    icity,
                    ref annotation,
                    ref body,
                },
            ) => {
                let domain = annotation.as_ref().map_or(Term::Sort(0), |ann| (**ann).clone());
                let expanded = Term::App {
                    function: Box::new(other.lift(1, 0)),
                    argument: Box::new(Term::Var(0)),
                    icity,
                };
                self.unify_at(&ctx.extend(name.clone(), domain, icity), body, &expanded, location)
            },

            (&Term::Pair(ref fst, ref snd), &Term::Pair(ref other_fst, ref other_snd)) => {
                self.unify_sub(ctx, fst, other_fst, location)?;
                self.unify_sub(ctx, snd, other_snd, location)
            },

            (&Term::Pair(ref fst, ref snd), other) | (other, &Term::Pair(ref fst, ref snd)) => {
                self.unify_at(ctx, fst, &Term::Fst(Box::new(other.clone())), location)?;
                self.unify_at(ctx, snd, &Term::Snd(Box::new(other.clone())), location)
            },

            (&Term::PathLam { ref name, ref body }, &Term::PathLam { body: ref other_body, .. }) => {
                self.unify_sub(&ctx.extend_interval(name.clone()), body, other_body, location)
            },

            (&Term::PathLam { ref name, ref body }, other) | (other, &Term::PathLam { ref name, ref body }) => {
                let expanded = Term::PathApp {
                    path: Box::new(other.ilift(1, 0)),
                    point: Box::new(Term::IVar(0)),
                };
                self.unify_at(&ctx.extend_interval(name.clone()), body, &expanded, location)
            },

            (
                &Term::App {
                    ref function,
                    ref argument,
                    icity,
                },
                &Term::App {
                    function: ref other_function,
                    argument: ref other_argument,
                    icity: other_icity,
                },
            ) if icity == other_icity => {
                self.unify_sub(ctx, function, other_function, location)?;
                self.unify_sub(ctx, argument, other_argument, location)
            },

            (&Term::Fst(ref pair), &Term::Fst(ref other)) | (&Term::Snd(ref pair), &Term::Snd(ref other)) => {
                self.unify_sub(ctx, pair, other, location)
            },

            (
                &Term::Id {
                    ref ty,
                    ref lhs,
                    ref rhs,
                },
                &Term::Id {
                    ty: ref other_ty,
                    lhs: ref other_lhs,
                    rhs: ref other_rhs,
                },
            )
            | (
                &Term::Path {
                    ref ty,
                    ref lhs,
                    ref rhs,
                },
                &Term::Path {
                    ty: ref other_ty,
                    lhs: ref other_lhs,
                    rhs: ref other_rhs,
                },
            ) => {
                self.unify_sub(ctx, ty, other_ty, location)?;
                self.unify_sub(ctx, lhs, other_lhs, location)?;
                self.unify_sub(ctx, rhs, other_rhs, location)
            },

            (&Term::Refl { ref ty, ref point }, &Term::Refl {
                ty: ref other_ty,
                point: ref other_point,
            }) => {
                self.unify_sub(ctx, ty, other_ty, location)?;
                self.unify_sub(ctx, point, other_point, location)
            },

            (
                &Term::J {
                    ref ty,
                    ref motive,
                    ref base,
                    ref lhs,
                    ref rhs,
                    ref path,
                },
                &Term::J {
                    ty: ref other_ty,
                    motive: ref other_motive,
                    base: ref other_base,
                    lhs: ref other_lhs,
                    rhs: ref other_rhs,
                    path: ref other_path,
                },
            ) => {
                for (term, other) in [
                    (ty, other_ty),
                    (motive, other_motive),
                    (base, other_base),
                    (lhs, other_lhs),
                    (rhs, other_rhs),
                    (path, other_path),
                ] {
                    self.unify_sub(ctx, term, other, location)?;
                }
                Ok(())
            },

            (
                &Term::PathP {
                    ref family,
                    ref lhs,
                    ref rhs,
                },
                &Term::PathP {
                    family: ref other_family,
                    lhs: ref other_lhs,
                    rhs: ref other_rhs,
                },
            ) => {
                self.unify_sub(&ctx.extend_interval("i"), family, other_family, location)?;
                self.unify_sub(ctx, lhs, other_lhs, location)?;
                self.unify_sub(ctx, rhs, other_rhs, location)
            },

            (
                &Term::Path {
                    ref ty,
                    ref lhs,
                    ref rhs,
                },
                &Term::PathP {
                    ref family,
                    lhs: ref other_lhs,
                    rhs: ref other_rhs,
                },
            )
            | (
                &Term::PathP {
                    ref family,
                    lhs: ref other_lhs,
                    rhs: ref other_rhs,
                },
                &Term::Path {
                    ref ty,
                    ref lhs,
                    ref rhs,
                },
            ) => {
                self.unify_sub(&ctx.extend_interval("i"), &ty.ilift(1, 0), family, location)?;
                self.unify_sub(ctx, lhs, other_lhs, location)?;
                self.unify_sub(ctx, rhs, other_rhs, location)
            },

            (&Term::PathApp { ref path, ref point }, &Term::PathApp {
                path: ref other_path,
                point: ref other_point,
            }) => {
                self.unify_sub(ctx, path, other_path, location)?;
                self.unify_sub(ctx, point, other_point, location)
            },

            (
                &Term::Transport {
                    ref family,
                    ref element,
                },
                &Term::Transport {
                    family: ref other_family,
                    element: ref other_element,
                },
            ) => {
                self.unify_sub(&ctx.extend_interval("i"), family, other_family, location)?;
                self.unify_sub(ctx, element, other_element, location)
            },

            (
                &Term::HitApp {
                    ref hit,
                    ref ctor,
                    ref args,
                    ref iargs,
                },
                &Term::HitApp {
                    hit: ref other_hit,
                    ctor: ref other_ctor,
                    args: ref other_args,
                    iargs: ref other_iargs,
                },
            ) if hit == other_hit && ctor == other_ctor && args.len() == other_args.len() && iargs.len() == other_iargs.len() => {
                for (term, other) in args.iter().zip(other_args).chain(iargs.iter().zip(other_iargs)) {
                    self.unify_sub(ctx, term, other, location)?;
                }
                Ok(())
            },

            _ => self.mismatch(ctx, lhs, rhs),
        }
    }

    fn postpone(&mut self, ctx: &Context, lhs: &Term, rhs: &Term, location: Option<Location>) -> Result<()> {
        trace!("postponed {lhs} =?= {rhs}");
        self.postponed.push(Constraint {
            context: ctx.clone(),
            lhs: lhs.clone(),
            rhs: rhs.clone(),
            location,
        });
        Ok(())
    }

    /// Solves `?m[vars] := term`. The first variables stand for the context of `?m`, outermost
    /// first; the remaining ones are arguments `?m` is applied to, which the solution abstracts.
    fn solve(&mut self, ctx: &Context, meta: MetaId, vars: &[usize], term: &Term) -> Result<()> {
        let term = zonk(self.metas, term);
        if term.any(0, 0, &mut |sub, _, _| matches!(*sub, Term::Meta(id, _) if id == meta)) {
            return Err(UnificationError::OccursCheck {
                meta,
                term: self.render(ctx, &term),
            }
            .into());
        }

        let len = vars.len();
        let renamed = term.try_map(0, 0, &mut |sub, depth, _| match *sub {
            Term::Var(ix) if ix >= depth => vars
                .iter()
                .rposition(|&var| var == ix - depth)
                .map(|position| Some(Term::Var(len - 1 - position + depth)))
                .ok_or(()),
            _ => Ok(None),
        });
        let Ok(renamed) = renamed else {
            return Err(UnificationError::ScopeEscape {
                meta,
                term: self.render(ctx, &term),
            }
            .into());
        };

        let entry = self.metas.lookup(meta)?;
        let Some(arity) = len.checked_sub(entry.context.len()) else {
            return Err(crate::error::Error::from(kernel::Error::bug(format!("{meta} is applied to too few arguments"))));
        };

        // the binders abstracted by the solution are read off the type of the metavariable
        let mut binders = Vec::with_capacity(arity);
        let mut scope = entry.context;
        let mut ty = entry.ty;
        for _ in 0..arity {
            match self.evaluator().normalize(&scope, &ty)? {
                Term::Pi {
                    name,
                    icity,
                    domain,
                    codomain,
                } => {
                    scope = scope.extend(name.clone(), (*domain).clone(), icity);
                    binders.push((name, icity, domain));
                    ty = *codomain;
                },
                _ => return self.mismatch(ctx, &Term::meta(meta, 0), &term),
            }
        }

        let solution = binders.into_iter().rev().fold(renamed, |body, (name, icity, domain)| Term::Lam {
            name,
            icity,
            annotation: Some(domain),
            body: Box::new(body),
        });

        debug!("solved {meta} := {solution}");
        self.metas.solve(meta, solution)?;
        self.solved += 1;
        Ok(())
    }

    /// Retries postponed problems as long as some of them make progress.
    ///
    /// # Errors
    /// Fails if a retried problem turns out to have no solution.
    pub fn solve_postponed(&mut self) -> Result<()> {
        loop {
            let pending = mem::take(&mut self.postponed);
            if pending.is_empty() {
                return Ok(());
            }

            let count = pending.len();
            let solved = self.solved;
            for constraint in pending {
                self.unify_at(&constraint.context, &constraint.lhs, &constraint.rhs, constraint.location)?;
            }

            if self.solved == solved && self.postponed.len() >= count {
                return Ok(());
            }
        }
    }

    /// Requires every postponed problem to be solved.
    ///
    /// # Errors
    /// An ambiguity listing the problems left, located at the first of them.
    pub fn finish(&mut self) -> Result<()> {
        self.solve_postponed()?;
        let Some(first) = self.postponed.first() else {
            return Ok(());
        };
        let location = first.location;

        let problems = mem::take(&mut self.postponed)
            .into_iter()
            .map(|constraint| {
                format!(
                    "{} =?= {}",
                    self.render(&constraint.context, &constraint.lhs),
                    self.render(&constraint.context, &constraint.rhs)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        let err = crate::error::Error::from(ElaborationError::Ambiguous(problems));
        Err(match location {
            Some(location) => err.at(location),
            None => err,
        })
    }
}

/// A metavariable, with the arguments standing for its context followed by the arguments it is
/// applied to.
fn flex(term: &Term) -> Option<(MetaId, Vec<&Term>)> {
    let (head, spine) = term.spine();
    match *head {
        Term::Meta(id, ref args) => Some((id, args.iter().chain(spine).collect())),
        _ => None,
    }
}

/// The bound variables a metavariable is applied to, if they are pairwise distinct.
fn pattern(args: &[&Term]) -> Option<Vec<usize>> {
    let mut vars = Vec::with_capacity(args.len());
    for arg in args {
        match **arg {
            Term::Var(ix) if !vars.contains(&ix) => vars.push(ix),
            _ => return None,
        }
    }
    Some(vars)
}

#[cfg(test)]
mod tests {
    use kernel::term::builders::*;

    use super::*;

    fn nat_ctx() -> Context {
        Context::new()
            .extend("n", global("Nat"), Icity::Explicit)
            .extend("m", global("Nat"), Icity::Explicit)
    }

    #[test]
    fn solves_patterns() {
        let env = Environment::with_builtins().unwrap();
        let metas = MetaStore::new();
        let ctx = nat_ctx();
        let meta = metas.fresh(global("Nat"), ctx.clone(), None);
        let mut unifier = Unifier::new(&env, &metas);

        // ?0[n, m] =?= succ n
        unifier.unify(&ctx, &Term::meta(meta, 2), &app(global("succ"), var(1))).unwrap();
        assert_eq!(metas.solution(meta), Some(app(global("succ"), var(1))));
        assert_eq!(zonk(&metas, &Term::meta(meta, 2)), app(global("succ"), var(1)));
    }

    #[test]
    fn inverts_renamings() {
        let env = Environment::with_builtins().unwrap();
        let metas = MetaStore::new();
        let ctx = nat_ctx();

        // ?0 lives in a context [x, y]; the problem ?0[m, n] =?= succ n swaps them
        let meta = metas.fresh(global("Nat"), ctx.clone(), None);
        let mut unifier = Unifier::new(&env, &metas);
        unifier
            .unify(&ctx, &Term::Meta(meta, vec![var(0), var(1)]), &app(global("succ"), var(1)))
            .unwrap();
        assert_eq!(metas.solution(meta), Some(app(global("succ"), var(0))));
    }

    #[test]
    fn abstracts_applied_arguments() {
        let env = Environment::with_builtins().unwrap();
        let metas = MetaStore::new();
        let f = metas.fresh(arrow(global("Nat"), global("Nat")), Context::new(), None);
        let ctx = Context::new().extend("n", global("Nat"), Icity::Explicit);
        let mut unifier = Unifier::new(&env, &metas);

        // ?f n =?= succ n
        unifier
            .unify(&ctx, &app(Term::meta(f, 0), var(0)), &app(global("succ"), var(0)))
            .unwrap();
        assert_eq!(metas.solution(f), Some(lam("_", global("Nat"), app(global("succ"), var(0)))));
    }

    #[test]
    fn structural() {
        let env = Environment::with_builtins().unwrap();
        let metas = MetaStore::new();
        let ctx = Context::new();
        let a = metas.fresh(sort(1), ctx.clone(), None);
        let mut unifier = Unifier::new(&env, &metas);

        // (Pi x ?a Nat) =?= (Pi x Bool Nat)
        unifier
            .unify(&ctx, &pi("x", Term::meta(a, 0), global("Nat")), &pi("x", global("Bool"), global("Nat")))
            .unwrap();
        assert_eq!(metas.solution(a), Some(global("Bool")));

        let err = unifier.unify(&ctx, &global("Nat"), &global("Bool")).unwrap_err();
        assert_eq!(err.kind_name(), "type mismatch");
        assert_eq!(err.to_string(), "cannot unify Nat with Bool");
    }

    #[test]
    fn up_to_conversion() {
        let env = Environment::with_builtins().unwrap();
        let metas = MetaStore::new();
        let ctx = Context::new();
        let mut unifier = Unifier::new(&env, &metas);

        // (λx. x) Nat =?= Nat
        let redex = app(lam("x", sort(0), var(0)), global("Nat"));
        assert!(unifier.unify(&ctx, &redex, &global("Nat")).is_ok());

        // η: λx. f x =?= f
        let ctx = ctx.extend("f", arrow(global("Nat"), global("Nat")), Icity::Explicit);
        let expanded = lam("x", global("Nat"), app(var(1), var(0)));
        assert!(unifier.unify(&ctx, &expanded, &var(0)).is_ok());
    }

    #[test]
    fn occurs_check() {
        let env = Environment::with_builtins().unwrap();
        let metas = MetaStore::new();
        let ctx = Context::new();
        let meta = metas.fresh(global("Nat"), ctx.clone(), None);
        let mut unifier = Unifier::new(&env, &metas);

        let err = unifier
            .unify(&ctx, &Term::meta(meta, 0), &app(global("succ"), Term::meta(meta, 0)))
            .unwrap_err();
        assert_eq!(err.kind_name(), "occurs check");
        assert!(!metas.lookup(meta).unwrap().is_solved());
    }

    #[test]
    fn scope_escape() {
        let env = Environment::with_builtins().unwrap();
        let metas = MetaStore::new();
        let meta = metas.fresh(global("Nat"), Context::new(), None);
        let ctx = Context::new().extend("n", global("Nat"), Icity::Explicit);
        let mut unifier = Unifier::new(&env, &metas);

        // ?0 was created outside of n, it cannot depend on it
        let err = unifier.unify(&ctx, &Term::meta(meta, 0), &var(0)).unwrap_err();
        assert_eq!(err.kind_name(), "scope escape");
    }

    #[test]
    fn postponed_until_solvable() {
        let env = Environment::with_builtins().unwrap();
        let metas = MetaStore::new();
        let ctx = Context::new();
        let f = metas.fresh(arrow(global("Nat"), global("Nat")), ctx.clone(), None);
        let a = metas.fresh(global("Nat"), ctx.clone(), None);
        let mut unifier = Unifier::new(&env, &metas);

        // ?f zero =?= succ zero is not a pattern, it waits for ?f
        let flex = app(Term::meta(f, 0), global("zero"));
        let zero = global("zero");
        unifier.unify(&ctx, &flex, &app(global("succ"), zero.clone())).unwrap();
        assert_eq!(unifier.postponed().len(), 1);

        // ?a =?= zero does not help, the problem stays ambiguous
        unifier.unify(&ctx, &Term::meta(a, 0), &zero).unwrap();
        let err = unifier.finish().unwrap_err();
        assert_eq!(err.kind_name(), "ambiguous");
        assert!(err.to_string().contains("=?="));

        // once ?f is known, the problem goes away
        let mut unifier = Unifier::new(&env, &metas);
        unifier.unify(&ctx, &flex, &app(global("succ"), zero)).unwrap();
        metas.solve(f, lam("x", global("Nat"), app(global("succ"), var(0)))).unwrap();
        assert_eq!(unifier.finish(), Ok(()));
    }
}
