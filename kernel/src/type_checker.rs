//! Bidirectional type checking of core terms.
//!
//! [`TypeChecker::synth`] infers the type of a term, [`TypeChecker::check`] verifies a term
//! against a given type. Types are compared by [conversion](crate::nbe::Evaluator::conv); no
//! metavariable is ever solved here, solved ones are only unfolded.

use derive_more::Display;
use log::trace;

use crate::context::Context;
use crate::environment::Environment;
use crate::error::{Result, ResultTerm};
use crate::meta::MetaStore;
use crate::nbe::Evaluator;
use crate::term::pretty::Rendered;
use crate::term::{Icity, Level, Name, Term};
use crate::zonk::zonk;

/// Type errors that can occur in the kernel.
#[non_exhaustive]
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum TypeCheckerError {
    #[display(fmt = "unbound variable {}", _0)]
    UnboundVariable(usize),

    #[display(fmt = "unbound interval variable {}", _0)]
    UnboundIntervalVariable(usize),

    #[display(fmt = "unknown constant {}", _0)]
    UnknownGlobal(String),

    #[display(fmt = "{} is not a type", _0)]
    SortExpected(Rendered),

    #[display(fmt = "{} is not a function type", _0)]
    PiExpected(Rendered),

    #[display(fmt = "{} is not a pair type", _0)]
    SigmaExpected(Rendered),

    #[display(fmt = "{} is not a path type", _0)]
    PathExpected(Rendered),

    #[display(fmt = "expected an {expected} argument, got an {actual} one")]
    IcityMismatch { expected: Icity, actual: Icity },

    #[display(fmt = "{term} does not have the expected type")]
    TypeMismatch {
        term: Rendered,
        expected: Rendered,
        actual: Rendered,
    },

    #[display(fmt = "path endpoint {actual} does not match {expected}")]
    EndpointMismatch { expected: Rendered, actual: Rendered },

    #[display(fmt = "cannot infer the type of {}", _0)]
    CannotInfer(Rendered),

    #[display(fmt = "{hit} has no constructor {ctor}")]
    UnknownConstructor { hit: String, ctor: String },
}

impl TypeCheckerError {
    /// Short name of the class of error, as shown in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match *self {
            Self::UnboundVariable(_) | Self::UnboundIntervalVariable(_) | Self::UnknownGlobal(_) => "unbound name",
            Self::SortExpected(_) => "sort expected",
            Self::PiExpected(_) => "pi expected",
            Self::SigmaExpected(_) => "sigma expected",
            Self::IcityMismatch { .. } => "icity mismatch",
            Self::PathExpected(_)
            | Self::TypeMismatch { .. }
            | Self::EndpointMismatch { .. }
            | Self::UnknownConstructor { .. } => "type mismatch",
            Self::CannotInfer(_) => "ambiguous",
        }
    }

    /// The expected and actual sides of a mismatch.
    #[must_use]
    pub const fn sides(&self) -> Option<(&Rendered, &Rendered)> {
        match *self {
            Self::TypeMismatch {
                ref expected,
                ref actual,
                ..
            }
            | Self::EndpointMismatch {
                ref expected,
                ref actual,
            } => Some((expected, actual)),
            _ => None,
        }
    }
}

/// The kernel type checker, working in a global environment and, optionally, with the solutions
/// of a metavariable store.
#[derive(Clone, Copy)]
pub struct TypeChecker<'a> {
    environment: &'a Environment,
    metas: Option<&'a MetaStore>,
}

impl<'a> TypeChecker<'a> {
    #[inline]
    #[must_use]
    pub const fn new(environment: &'a Environment) -> Self {
        Self {
            environment,
            metas: None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_metas(environment: &'a Environment, metas: &'a MetaStore) -> Self {
        Self {
            environment,
            metas: Some(metas),
        }
    }

    #[inline]
    #[must_use]
    pub const fn evaluator(&self) -> Evaluator<'a> {
        Evaluator::new(self.environment, self.metas)
    }

    /// # Errors
    /// See [`Evaluator::eval`].
    pub fn normalize(&self, ctx: &Context, term: &Term) -> ResultTerm {
        self.evaluator().normalize(ctx, term)
    }

    /// # Errors
    /// See [`Evaluator::eval`].
    pub fn conv(&self, ctx: &Context, lhs: &Term, rhs: &Term) -> Result<bool> {
        self.evaluator().is_def_eq(ctx, lhs, rhs)
    }

    fn render(&self, ctx: &Context, term: &Term) -> Rendered {
        let term = self.metas.map_or_else(|| term.clone(), |metas| zonk(metas, term));
        Rendered::new(term, ctx.names())
    }

    /// A rendered term, normalized whenever possible.
    fn render_normal(&self, ctx: &Context, term: &Term) -> Rendered {
        let normal = self.normalize(ctx, term).unwrap_or_else(|_| term.clone());
        self.render(ctx, &normal)
    }

    /// Requires `actual` and `expected` to be convertible.
    ///
    /// # Errors
    /// A type mismatch rendering both sides in normal form.
    pub fn expect(&self, ctx: &Context, term: &Term, actual: &Term, expected: &Term) -> Result<()> {
        if self.conv(ctx, actual, expected)? {
            return Ok(());
        }

        Err(TypeCheckerError::TypeMismatch {
            term: self.render(ctx, term),
            expected: self.render_normal(ctx, expected),
            actual: self.render_normal(ctx, actual),
        }
        .into())
    }

    /// The level of the universe a type lives in.
    ///
    /// # Errors
    /// Fails if `term` is not a type.
    pub fn sort_of(&self, ctx: &Context, term: &Term) -> Result<Level> {
        let ty = self.synth(ctx, term)?;
        match self.normalize(ctx, &ty)? {
            Term::Sort(level) => Ok(level),
            _ => Err(TypeCheckerError::SortExpected(self.render(ctx, term)).into()),
        }
    }

    /// Infers the type of a term.
    ///
    /// # Errors
    /// Fails if the term is ill-typed.
    pub fn synth(&self, ctx: &Context, term: &Term) -> ResultTerm {
        trace!("synth {term}");

        match *term {
            Term::Var(ix) => ctx.type_of(ix).ok_or_else(|| TypeCheckerError::UnboundVariable(ix).into()),

            Term::Global(ref name) => self
                .environment
                .get(name)
                .map(|decl| decl.ty.clone())
                .ok_or_else(|| TypeCheckerError::UnknownGlobal(name.clone()).into()),

            Term::Sort(level) => Ok(Term::Sort(level + 1)),

            Term::Pi {
                ref name,
                icity,
                ref domain,
                ref codomain,
            } => {
                let i = self.sort_of(ctx, domain)?;
                let j = self.sort_of(&ctx.extend(name.clone(), (**domain).clone(), icity), codomain)?;
                Ok(Term::Sort(i.max(j)))
            },

            Term::Lam {
                ref name,
                icity,
                ref annotation,
                ref body,
            } => {
                let Some(ref annotation) = *annotation else {
                    return Err(TypeCheckerError::CannotInfer(self.render(ctx, term)).into());
                };
                self.sort_of(ctx, annotation)?;
                let codomain = self.synth(&ctx.extend(name.clone(), (**annotation).clone(), icity), body)?;
                Ok(Term::Pi {
                    name: name.clone(),
                    icity,
                    domain: annotation.clone(),
                    codomain: Box::new(codomain),
                })
            },

            Term::App {
                ref function,
                ref argument,
                icity,
            } => {
                let ty = self.synth(ctx, function)?;
                match self.normalize(ctx, &ty)? {
                    Term::Pi {
                        icity: expected,
                        domain,
                        codomain,
                        ..
                    } => {
                        if expected != icity {
                            return Err(TypeCheckerError::IcityMismatch { expected, actual: icity }.into());
                        }
                        self.check(ctx, argument, &domain)?;
                        Ok(codomain.subst(0, argument))
                    },
                    normal => Err(TypeCheckerError::PiExpected(self.render(ctx, &normal)).into()),
                }
            },

            Term::Sigma {
                ref name,
                ref first,
                ref second,
            } => {
                let i = self.sort_of(ctx, first)?;
                let j = self.sort_of(&ctx.extend(name.clone(), (**first).clone(), Icity::Explicit), second)?;
                Ok(Term::Sort(i.max(j)))
            },

            Term::Pair(ref fst, ref snd) => {
                let first = self.synth(ctx, fst)?;
                let second = self.synth(ctx, snd)?;
                Ok(Term::Sigma {
                    name: Name::default(),
                    first: Box::new(first),
                    second: Box::new(second.lift(1, 0)),
                })
            },

            Term::Fst(ref pair) => Ok(self.sigma(ctx, pair)?.0),

            Term::Snd(ref pair) => {
                let (_, second) = self.sigma(ctx, pair)?;
                Ok(second.subst(0, &Term::Fst(pair.clone())))
            },

            Term::Let {
                ref name,
                ref annotation,
                ref value,
                ref body,
            } => {
                let ty = match *annotation {
                    Some(ref annotation) => {
                        self.sort_of(ctx, annotation)?;
                        self.check(ctx, value, annotation)?;
                        (**annotation).clone()
                    },
                    None => self.synth(ctx, value)?,
                };
                let body_ty = self.synth(&ctx.define(name.clone(), ty, (**value).clone()), body)?;
                Ok(body_ty.subst(0, value))
            },

            Term::Meta(id, ref args) => {
                let Some(metas) = self.metas else {
                    return Err(TypeCheckerError::CannotInfer(self.render(ctx, term)).into());
                };
                let entry = metas.lookup(id)?;
                Ok(entry.ty.instantiate(args))
            },

            Term::Id {
                ref ty,
                ref lhs,
                ref rhs,
            }
            | Term::Path {
                ref ty,
                ref lhs,
                ref rhs,
            } => {
                let level = self.sort_of(ctx, ty)?;
                self.check(ctx, lhs, ty)?;
                self.check(ctx, rhs, ty)?;
                Ok(Term::Sort(level))
            },

            Term::Refl { ref ty, ref point } => {
                self.sort_of(ctx, ty)?;
                self.check(ctx, point, ty)?;
                Ok(Term::Id {
                    ty: ty.clone(),
                    lhs: point.clone(),
                    rhs: point.clone(),
                })
            },

            Term::J {
                ref ty,
                ref motive,
                ref base,
                ref lhs,
                ref rhs,
                ref path,
            } => {
                let level = self.sort_of(ctx, ty)?;
                self.check(ctx, lhs, ty)?;
                self.check(ctx, rhs, ty)?;

                // C : Π (y : A). Id A x y → Sort level
                let motive_ty = Term::Pi {
                    name: Name::from("y"),
                    icity: Icity::Explicit,
                    domain: ty.clone(),
                    codomain: Box::new(Term::Pi {
                        name: Name::from("p"),
                        icity: Icity::Explicit,
                        domain: Box::new(Term::Id {
                            ty: Box::new(ty.lift(1, 0)),
                            lhs: Box::new(lhs.lift(1, 0)),
                            rhs: Box::new(Term::Var(0)),
                        }),
                        codomain: Box::new(Term::Sort(level)),
                    }),
                };
                self.check(ctx, motive, &motive_ty)?;

                let refl = Term::Refl {
                    ty: ty.clone(),
                    point: lhs.clone(),
                };
                self.check(ctx, base, &(**motive).clone().apply([(**lhs).clone(), refl]))?;
                self.check(ctx, path, &Term::Id {
                    ty: ty.clone(),
                    lhs: lhs.clone(),
                    rhs: rhs.clone(),
                })?;
                Ok((**motive).clone().apply([(**rhs).clone(), (**path).clone()]))
            },

            Term::Interval => Ok(Term::Sort(0)),
            Term::I0 | Term::I1 => Ok(Term::Interval),
            Term::IVar(ix) => {
                if ix < ctx.ilen() {
                    Ok(Term::Interval)
                } else {
                    Err(TypeCheckerError::UnboundIntervalVariable(ix).into())
                }
            },

            Term::PathP {
                ref family,
                ref lhs,
                ref rhs,
            } => {
                let level = self.sort_of(&ctx.extend_interval("i"), family)?;
                self.check(ctx, lhs, &family.isubst(0, &Term::I0))?;
                self.check(ctx, rhs, &family.isubst(0, &Term::I1))?;
                Ok(Term::Sort(level))
            },

            Term::PathLam { ref name, ref body } => {
                let line = self.synth(&ctx.extend_interval(name.clone()), body)?;
                let lhs = Box::new(body.isubst(0, &Term::I0));
                let rhs = Box::new(body.isubst(0, &Term::I1));
                if line.has_free_ivar(0) {
                    Ok(Term::PathP {
                        family: Box::new(line),
                        lhs,
                        rhs,
                    })
                } else {
                    Ok(Term::Path {
                        ty: Box::new(line.isubst(0, &Term::I0)),
                        lhs,
                        rhs,
                    })
                }
            },

            Term::PathApp { ref path, ref point } => {
                self.check(ctx, point, &Term::Interval)?;
                let ty = self.synth(ctx, path)?;
                match self.normalize(ctx, &ty)? {
                    Term::Path { ty, .. } => Ok(*ty),
                    Term::PathP { family, .. } => Ok(family.isubst(0, point)),
                    normal => Err(TypeCheckerError::PathExpected(self.render(ctx, &normal)).into()),
                }
            },

            Term::Transport {
                ref family,
                ref element,
            } => {
                self.sort_of(&ctx.extend_interval("i"), family)?;
                self.check(ctx, element, &family.isubst(0, &Term::I0))?;
                Ok(family.isubst(0, &Term::I1))
            },

            Term::HitApp {
                ref hit,
                ref ctor,
                ref args,
                ref iargs,
            } => {
                let unknown = || TypeCheckerError::UnknownConstructor {
                    hit: hit.clone(),
                    ctor: ctor.clone(),
                };
                let info = self.environment.inductive(hit).ok_or_else(unknown)?;

                if info.path_constructors.iter().any(|path| path.name == *ctor) {
                    for iarg in iargs {
                        self.check(ctx, iarg, &Term::Interval)?;
                    }
                    if !args.is_empty() || iargs.len() != 1 {
                        return Err(unknown().into());
                    }
                    Ok(Term::Global(hit.clone()))
                } else if info.constructors.contains(ctor) && iargs.is_empty() {
                    self.synth(ctx, &Term::Global(ctor.clone()).apply(args.iter().cloned()))
                } else {
                    Err(unknown().into())
                }
            },
        }
    }

    fn sigma(&self, ctx: &Context, pair: &Term) -> Result<(Term, Term)> {
        let ty = self.synth(ctx, pair)?;
        match self.normalize(ctx, &ty)? {
            Term::Sigma { first, second, .. } => Ok((*first, *second)),
            normal => Err(TypeCheckerError::SigmaExpected(self.render(ctx, &normal)).into()),
        }
    }

    /// Checks a term against a type.
    ///
    /// # Errors
    /// Fails if the term is ill-typed, or does not have type `ty`.
    pub fn check(&self, ctx: &Context, term: &Term, ty: &Term) -> Result<()> {
        trace!("check {term} : {ty}");

        match *term {
            Term::Lam {
                ref name,
                icity,
                ref annotation,
                ref body,
            } => match self.normalize(ctx, ty)? {
                Term::Pi {
                    icity: expected,
                    domain,
                    codomain,
                    ..
                } => {
                    if expected != icity {
                        return Err(TypeCheckerError::IcityMismatch { expected, actual: icity }.into());
                    }
                    if let Some(ref annotation) = *annotation {
                        self.sort_of(ctx, annotation)?;
                        self.expect(ctx, annotation, annotation, &domain)?;
                    }
                    self.check(&ctx.extend(name.clone(), *domain, icity), body, &codomain)
                },
                _ if annotation.is_some() => self.infer_and_compare(ctx, term, ty),
                normal => Err(TypeCheckerError::PiExpected(self.render(ctx, &normal)).into()),
            },

            Term::Pair(ref fst, ref snd) => match self.normalize(ctx, ty)? {
                Term::Sigma { first, second, .. } => {
                    self.check(ctx, fst, &first)?;
                    self.check(ctx, snd, &second.subst(0, fst))
                },
                _ => self.infer_and_compare(ctx, term, ty),
            },

            Term::Let {
                ref name,
                ref annotation,
                ref value,
                ref body,
            } => {
                let value_ty = match *annotation {
                    Some(ref annotation) => {
                        self.sort_of(ctx, annotation)?;
                        self.check(ctx, value, annotation)?;
                        (**annotation).clone()
                    },
                    None => self.synth(ctx, value)?,
                };
                self.check(&ctx.define(name.clone(), value_ty, (**value).clone()), body, &ty.lift(1, 0))
            },

            Term::PathLam { ref name, ref body } => {
                let (line, lhs, rhs) = match self.normalize(ctx, ty)? {
                    Term::Path { ty, lhs, rhs } => (ty.ilift(1, 0), lhs, rhs),
                    Term::PathP { family, lhs, rhs } => (*family, lhs, rhs),
                    _ => return self.infer_and_compare(ctx, term, ty),
                };
                self.check(&ctx.extend_interval(name.clone()), body, &line)?;

                for (point, expected) in [(Term::I0, lhs), (Term::I1, rhs)] {
                    let actual = body.isubst(0, &point);
                    if !self.conv(ctx, &actual, &expected)? {
                        return Err(TypeCheckerError::EndpointMismatch {
                            expected: self.render_normal(ctx, &expected),
                            actual: self.render_normal(ctx, &actual),
                        }
                        .into());
                    }
                }
                Ok(())
            },

            _ => self.infer_and_compare(ctx, term, ty),
        }
    }

    fn infer_and_compare(&self, ctx: &Context, term: &Term, ty: &Term) -> Result<()> {
        let actual = self.synth(ctx, term)?;
        self.expect(ctx, term, &actual, ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::builders::*;

    fn env() -> Environment {
        Environment::with_builtins().unwrap()
    }

    fn polymorphic_id() -> (Term, Term) {
        let ty = pi("A", sort(0), pi("x", var(0), var(1)));
        let term = lam("A", sort(0), lam("x", var(0), var(0)));
        (term, ty)
    }

    #[test]
    fn identity() {
        let env = env();
        let checker = TypeChecker::new(&env);
        let (term, ty) = polymorphic_id();

        assert_eq!(checker.synth(&Context::new(), &term), Ok(ty.clone()));
        assert_eq!(checker.check(&Context::new(), &term, &ty), Ok(()));
        assert_eq!(checker.synth(&Context::new(), &ty), Ok(sort(1)));
    }

    #[test]
    fn synth_then_check() {
        let env = env();
        let checker = TypeChecker::new(&env);
        let ctx = Context::new();

        let terms = [
            app(global("succ"), global("zero")),
            pair(global("zero"), global("true")),
            refl(global("Nat"), global("zero")),
            global("natElim"),
            global("loop"),
            path_lam("i", global("zero")),
            polymorphic_id().0,
        ];
        for term in terms {
            let ty = checker.synth(&ctx, &term).unwrap();
            assert_eq!(checker.check(&ctx, &term, &ty), Ok(()), "{term}");
            let ty_nf = checker.normalize(&ctx, &ty).unwrap();
            assert!(checker.conv(&ctx, &ty_nf, &ty).unwrap());
        }
    }

    #[test]
    fn builtin_signatures_are_well_typed() {
        let env = env();
        let checker = TypeChecker::new(&env);
        for name in env.names() {
            let ty = &env.get(name).unwrap().ty;
            assert!(checker.sort_of(&Context::new(), ty).is_ok(), "type of {name}");
        }
    }

    #[test]
    fn universes_are_strict() {
        let env = env();
        let checker = TypeChecker::new(&env);
        let err = checker.check(&Context::new(), &global("Nat"), &sort(1)).unwrap_err();
        assert_eq!(err.kind_name(), "type mismatch");
        assert_eq!(checker.synth(&Context::new(), &sort(3)), Ok(sort(4)));
    }

    #[test]
    fn errors() {
        let env = env();
        let checker = TypeChecker::new(&env);
        let ctx = Context::new();

        let err = checker.synth(&ctx, &var(0)).unwrap_err();
        assert_eq!(err.kind_name(), "unbound name");

        let err = checker.synth(&ctx, &app(global("zero"), global("zero"))).unwrap_err();
        assert_eq!(err.kind_name(), "pi expected");
        assert_eq!(err.to_string(), "Nat is not a function type");

        let err = checker.synth(&ctx, &Term::Fst(Box::new(global("zero")))).unwrap_err();
        assert_eq!(err.kind_name(), "sigma expected");

        let err = checker.synth(&ctx, &pi("x", global("zero"), global("Nat"))).unwrap_err();
        assert_eq!(err.kind_name(), "sort expected");

        let implicit = Term::App {
            function: Box::new(global("succ")),
            argument: Box::new(global("zero")),
            icity: Icity::Implicit,
        };
        assert_eq!(checker.synth(&ctx, &implicit).unwrap_err().kind_name(), "icity mismatch");

        let err = checker.check(&ctx, &global("true"), &global("Nat")).unwrap_err();
        match err.kind {
            crate::error::Kind::TypeChecker(ref err) => {
                let (expected, actual) = err.sides().unwrap();
                assert_eq!(expected.to_string(), "Nat");
                assert_eq!(actual.to_string(), "Bool");
            },
            _ => panic!("unexpected error {err}"),
        }
    }

    #[test]
    fn check_mode_rules() {
        let env = env();
        let checker = TypeChecker::new(&env);
        let ctx = Context::new();

        // unannotated lambdas only check
        let term = lam_untyped("n", app(global("succ"), var(0)));
        assert_eq!(checker.check(&ctx, &term, &pi("n", global("Nat"), global("Nat"))), Ok(()));
        assert_eq!(checker.synth(&ctx, &term).unwrap_err().kind_name(), "ambiguous");

        // dependent pairs
        let ty = sigma("n", global("Nat"), id(global("Nat"), var(0), global("zero")));
        let term = pair(global("zero"), refl(global("Nat"), global("zero")));
        assert_eq!(checker.check(&ctx, &term, &ty), Ok(()));
    }

    #[test]
    fn paths() {
        let env = env();
        let checker = TypeChecker::new(&env);
        let ctx = Context::new()
            .extend("a", global("Nat"), Icity::Explicit)
            .extend("b", global("Nat"), Icity::Explicit)
            .extend("p", path(global("Nat"), var(1), var(0)), Icity::Explicit);

        // λi. p i : Path Nat a b
        let eta = path_lam("i", path_app(var(0), Term::IVar(0)));
        assert_eq!(checker.check(&ctx, &eta, &path(global("Nat"), var(2), var(1))), Ok(()));

        // but not from b to a
        let err = checker.check(&ctx, &eta, &path(global("Nat"), var(1), var(2))).unwrap_err();
        assert_eq!(err.kind_name(), "type mismatch");

        assert_eq!(checker.synth(&ctx, &path_app(var(0), Term::I0)), Ok(global("Nat")));
        assert_eq!(
            checker.synth(&Context::new(), &global("loop")),
            Ok(path(global("S1"), global("base"), global("base")))
        );

        // the body of loop meets its boundary
        let decl = env.get("loop").unwrap();
        assert_eq!(checker.check(&Context::new(), decl.body.as_ref().unwrap(), &decl.ty), Ok(()));
    }

    #[test]
    fn transport_along_constant_line() {
        let env = env();
        let checker = TypeChecker::new(&env);
        let term = Term::Transport {
            family: Box::new(global("Nat")),
            element: Box::new(global("zero")),
        };
        assert_eq!(checker.synth(&Context::new(), &term), Ok(global("Nat")));
    }

    #[test]
    fn deep_nesting() {
        let env = env();
        let checker = TypeChecker::new(&env);
        let depth = 100;
        let ty = (0..depth).fold(global("Nat"), |acc, _| pi("x", global("Nat"), acc));
        let term = (0..depth).fold(global("zero"), |acc, _| lam("x", global("Nat"), acc));
        assert_eq!(checker.check(&Context::new(), &term, &ty), Ok(()));
    }
}
