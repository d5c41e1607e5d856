//! Bidirectional elaboration of surface terms into core terms.
//!
//! The elaborator mirrors the kernel [type checker](kernel::type_checker), but works on
//! [builders](crate::builder): it resolves names, turns holes and omitted implicit arguments into
//! metavariables, and reconciles types through [unification](crate::unifier) instead of mere
//! conversion. Its output is then checked again by the kernel.

use kernel::context::Context;
use kernel::environment::Environment;
use kernel::location::Location;
use kernel::meta::MetaStore;
use kernel::nbe::Evaluator;
use kernel::term::pretty::Rendered;
use kernel::term::{Icity, Level, MetaId, Name, Term};
use kernel::type_checker::TypeCheckerError;
use kernel::zonk::zonk;
use log::trace;

use crate::builder::{Binder, Builder, Payload, FAMILY_VARIABLE};
use crate::error::{ElaborationError, Error, Kind, Result, UnificationError};
use crate::unifier::Unifier;

pub struct Elaborator<'a> {
    environment: &'a Environment,
    metas: &'a MetaStore,
    unifier: Unifier<'a>,
}

/// Whether a normal term is headed by a metavariable.
fn is_flex(term: &Term) -> bool {
    matches!(*term.spine().0, Term::Meta(..))
}

impl<'a> Elaborator<'a> {
    #[inline]
    #[must_use]
    pub const fn new(environment: &'a Environment, metas: &'a MetaStore) -> Self {
        Self {
            environment,
            metas,
            unifier: Unifier::new(environment, metas),
        }
    }

    #[inline]
    #[must_use]
    pub const fn metas(&self) -> &'a MetaStore {
        self.metas
    }

    fn normalize(&self, ctx: &Context, term: &Term) -> Result<Term> {
        Ok(Evaluator::new(self.environment, Some(self.metas)).normalize(ctx, term)?)
    }

    fn render(&self, ctx: &Context, term: &Term) -> Rendered {
        Rendered::new(zonk(self.metas, term), ctx.names())
    }

    fn render_normal(&self, ctx: &Context, term: &Term) -> Rendered {
        let normal = self.normalize(ctx, term).unwrap_or_else(|_| term.clone());
        self.render(ctx, &normal)
    }

    fn fresh(&self, ctx: &Context, ty: Term, location: Location, name: Option<&str>) -> Term {
        let id = match name {
            Some(name) => self.metas.fresh_named(ty, ctx.clone(), Some(location), name),
            None => self.metas.fresh(ty, ctx.clone(), Some(location)),
        };
        Term::meta(id, ctx.len())
    }

    fn fresh_type(&self, ctx: &Context, location: Location) -> Term {
        self.fresh(ctx, Term::Sort(0), location, None)
    }

    /// Elaborates a term and infers its type, then solves every problem it raised. Both results
    /// are zonked, but may still contain unsolved metavariables.
    ///
    /// # Errors
    /// Fails if the term is ill-typed or if some unification problem is left ambiguous.
    pub fn infer(&mut self, ctx: &Context, builder: &Builder) -> Result<(Term, Term)> {
        let (term, ty) = self.synth(ctx, builder)?;
        self.unifier.finish()?;
        Ok((zonk(self.metas, &term), zonk(self.metas, &ty)))
    }

    /// Elaborates a term against a type, then solves every problem it raised.
    ///
    /// # Errors
    /// Fails if the term is ill-typed or if some unification problem is left ambiguous.
    pub fn elaborate(&mut self, ctx: &Context, builder: &Builder, expected: &Term) -> Result<Term> {
        let term = self.check(ctx, builder, expected)?;
        self.unifier.finish()?;
        Ok(zonk(self.metas, &term))
    }

    /// Elaborates a type, returning the level of its universe.
    ///
    /// # Errors
    /// Fails if the term is not a type.
    pub fn elaborate_type(&mut self, ctx: &Context, builder: &Builder) -> Result<(Term, Level)> {
        let (ty, level) = self.sort_of(ctx, builder)?;
        self.unifier.finish()?;
        Ok((zonk(self.metas, &ty), level))
    }

    /// Unifies two terms of `ctx`, solving every problem it raises.
    ///
    /// # Errors
    /// See [`Unifier::unify`].
    pub fn unify(&mut self, ctx: &Context, lhs: &Term, rhs: &Term) -> Result<()> {
        self.unifier.unify(ctx, lhs, rhs)?;
        self.unifier.finish()
    }

    /// Requires `actual` to unify with `expected`, reporting a type mismatch about `term`.
    fn expect(&mut self, ctx: &Context, location: Location, term: &Term, actual: &Term, expected: &Term) -> Result<()> {
        match self.unifier.unify_at(ctx, actual, expected, Some(location)) {
            Err(Error {
                kind: Kind::Unification(UnificationError::Mismatch { .. }),
                ..
            }) => Err(Error::from(TypeCheckerError::TypeMismatch {
                term: self.render(ctx, term),
                expected: self.render_normal(ctx, expected),
                actual: self.render_normal(ctx, actual),
            })
            .at(location)),
            result => result,
        }
    }

    fn sort_of(&mut self, ctx: &Context, builder: &Builder) -> Result<(Term, Level)> {
        let (ty, sort) = self.synth(ctx, builder)?;
        match self.normalize(ctx, &sort)? {
            Term::Sort(level) => Ok((ty, level)),
            normal if is_flex(&normal) => {
                self.unifier.unify_at(ctx, &normal, &Term::Sort(0), Some(builder.location))?;
                Ok((ty, 0))
            },
            _ => Err(Error::from(TypeCheckerError::SortExpected(self.render(ctx, &ty))).at(builder.location)),
        }
    }

    fn global(&self, name: &str) -> Result<(Term, Term)> {
        self.environment
            .get(name)
            .map(|decl| (Term::Global(name.to_owned()), decl.ty.clone()))
            .ok_or_else(|| ElaborationError::UnboundName(name.to_owned()).into())
    }

    /// Applies a term to fresh metavariables as long as its type is an implicit product.
    fn insert_implicits(&self, ctx: &Context, term: Term, ty: Term, location: Location) -> Result<(Term, Term)> {
        let mut term = term;
        let mut ty = ty;
        loop {
            match self.normalize(ctx, &ty)? {
                Term::Pi {
                    icity: Icity::Implicit,
                    domain,
                    codomain,
                    ..
                } => {
                    let meta = self.fresh(ctx, *domain, location, None);
                    ty = codomain.subst(0, &meta);
                    term = Term::App {
                        function: Box::new(term),
                        argument: Box::new(meta),
                        icity: Icity::Implicit,
                    };
                },
                _ => return Ok((term, ty)),
            }
        }
    }

    /// The domain and codomain of the type of a function applied to an argument of the given
    /// icity.
    fn function_type(&mut self, ctx: &Context, ty: &Term, icity: Icity, location: Location) -> Result<(Term, Term)> {
        match self.normalize(ctx, ty)? {
            Term::Pi {
                icity: expected,
                domain,
                codomain,
                ..
            } => {
                if expected != icity {
                    return Err(TypeCheckerError::IcityMismatch { expected, actual: icity }.into());
                }
                Ok((*domain, *codomain))
            },
            normal if is_flex(&normal) => {
                let domain = self.fresh_type(ctx, location);
                let codomain = self.fresh_type(&ctx.extend("x", domain.clone(), icity), location);
                let pi = Term::Pi {
                    name: Name::from("x"),
                    icity,
                    domain: Box::new(domain.clone()),
                    codomain: Box::new(codomain.clone()),
                };
                self.unifier.unify_at(ctx, &normal, &pi, Some(location))?;
                Ok((domain, codomain))
            },
            normal => Err(TypeCheckerError::PiExpected(self.render(ctx, &normal)).into()),
        }
    }

    /// The components of the type of a pair.
    fn pair_type(&mut self, ctx: &Context, ty: &Term, location: Location) -> Result<(Term, Term)> {
        match self.normalize(ctx, ty)? {
            Term::Sigma { first, second, .. } => Ok((*first, *second)),
            normal if is_flex(&normal) => {
                let first = self.fresh_type(ctx, location);
                let second = self.fresh_type(&ctx.extend("x", first.clone(), Icity::Explicit), location);
                let sigma = Term::Sigma {
                    name: Name::from("x"),
                    first: Box::new(first.clone()),
                    second: Box::new(second.clone()),
                };
                self.unifier.unify_at(ctx, &normal, &sigma, Some(location))?;
                Ok((first, second))
            },
            normal => Err(TypeCheckerError::SigmaExpected(self.render(ctx, &normal)).into()),
        }
    }

    /// Infers the type of a surface term, returning its elaboration along with the type.
    ///
    /// # Errors
    /// Fails if the term is ill-typed.
    pub fn synth(&mut self, ctx: &Context, builder: &Builder) -> Result<(Term, Term)> {
        trace!("elaborate {builder}");
        self.synth_payload(ctx, builder).map_err(|err| err.at(builder.location))
    }

    fn synth_all(&mut self, ctx: &Context, builders: &[Builder]) -> Result<Vec<Term>> {
        let mut terms = Vec::with_capacity(builders.len());
        for builder in builders {
            terms.push(self.synth(ctx, builder)?.0);
        }
        Ok(terms)
    }

    #[allow(clippy::too_many_lines)]
    fn synth_payload(&mut self, ctx: &Context, builder: &Builder) -> Result<(Term, Term)> {
        let location = builder.location;

        match builder.payload {
            Payload::Var(name) => {
                if let Some(ix) = ctx.lookup(name) {
                    let ty = ctx.type_of(ix).ok_or(TypeCheckerError::UnboundVariable(ix))?;
                    return Ok((Term::Var(ix), ty));
                }
                if let Some(ix) = ctx.lookup_interval(name) {
                    return Ok((Term::IVar(ix), Term::Interval));
                }
                self.global(name)
            },

            Payload::Index(ix) => {
                let ty = ctx.type_of(ix).ok_or(TypeCheckerError::UnboundVariable(ix))?;
                Ok((Term::Var(ix), ty))
            },

            Payload::Global(name) => self.global(name),

            Payload::Sort(level) => Ok((Term::Sort(level), Term::Sort(level + 1))),

            Payload::Hole(name) => {
                let ty = self.fresh_type(ctx, location);
                Ok((self.fresh(ctx, ty.clone(), location, name), ty))
            },

            Payload::Pi(Binder { name, icity }, ref domain, ref codomain) => {
                let (domain, i) = self.sort_of(ctx, domain)?;
                let (codomain, j) = self.sort_of(&ctx.extend(name, domain.clone(), icity), codomain)?;
                let pi = Term::Pi {
                    name: Name::from(name),
                    icity,
                    domain: Box::new(domain),
                    codomain: Box::new(codomain),
                };
                Ok((pi, Term::Sort(i.max(j))))
            },

            Payload::Lam(Binder { name, icity }, Some(ref annotation), ref body) => {
                let (annotation, _) = self.sort_of(ctx, annotation)?;
                let (body, codomain) = self.synth(&ctx.extend(name, annotation.clone(), icity), body)?;
                let lam = Term::Lam {
                    name: Name::from(name),
                    icity,
                    annotation: Some(Box::new(annotation.clone())),
                    body: Box::new(body),
                };
                let pi = Term::Pi {
                    name: Name::from(name),
                    icity,
                    domain: Box::new(annotation),
                    codomain: Box::new(codomain),
                };
                Ok((lam, pi))
            },

            Payload::Lam(Binder { name, .. }, None, _) => {
                Err(ElaborationError::UnannotatedAbstraction(name.to_owned()).into())
            },

            Payload::App(ref function, ref argument, icity) => {
                let (function, ty) = self.synth(ctx, function)?;
                let (function, ty) = match icity {
                    Icity::Explicit => self.insert_implicits(ctx, function, ty, location)?,
                    Icity::Implicit => (function, ty),
                };
                let (domain, codomain) = self.function_type(ctx, &ty, icity, location)?;
                let argument = self.check(ctx, argument, &domain)?;
                let ty = codomain.subst(0, &argument);
                let app = Term::App {
                    function: Box::new(function),
                    argument: Box::new(argument),
                    icity,
                };
                Ok((app, ty))
            },

            Payload::Sigma(name, ref first, ref second) => {
                let (first, i) = self.sort_of(ctx, first)?;
                let (second, j) = self.sort_of(&ctx.extend(name, first.clone(), Icity::Explicit), second)?;
                let sigma = Term::Sigma {
                    name: Name::from(name),
                    first: Box::new(first),
                    second: Box::new(second),
                };
                Ok((sigma, Term::Sort(i.max(j))))
            },

            Payload::Pair(ref fst, ref snd) => {
                let (fst, first) = self.synth(ctx, fst)?;
                let (snd, second) = self.synth(ctx, snd)?;
                let sigma = Term::Sigma {
                    name: Name::default(),
                    first: Box::new(first),
                    second: Box::new(second.lift(1, 0)),
                };
                Ok((Term::Pair(Box::new(fst), Box::new(snd)), sigma))
            },

            Payload::Fst(ref pair) => {
                let (pair, ty) = self.synth(ctx, pair)?;
                let (first, _) = self.pair_type(ctx, &ty, location)?;
                Ok((Term::Fst(Box::new(pair)), first))
            },

            Payload::Snd(ref pair) => {
                let (pair, ty) = self.synth(ctx, pair)?;
                let (_, second) = self.pair_type(ctx, &ty, location)?;
                let fst = Term::Fst(Box::new(pair.clone()));
                Ok((Term::Snd(Box::new(pair)), second.subst(0, &fst)))
            },

            Payload::Let(name, ref annotation, ref value, ref body) => {
                let (value, ty) = self.let_value(ctx, annotation.as_deref(), value)?;
                let (body, body_ty) = self.synth(&ctx.define(name, ty.clone(), value.clone()), body)?;
                let ty = body_ty.subst(0, &value);
                let term = Term::Let {
                    name: Name::from(name),
                    annotation: Some(Box::new(ty.clone())),
                    value: Box::new(value),
                    body: Box::new(body),
                };
                Ok((term, ty))
            },

            Payload::Meta(id, ref args) => {
                let id = MetaId(id);
                let entry = self.metas.lookup(id)?;
                if args.len() != entry.context.len() {
                    return Err(ElaborationError::MetaArity {
                        id,
                        expected: entry.context.len(),
                        actual: args.len(),
                    }
                    .into());
                }
                let args = self.synth_all(ctx, args)?;
                let ty = entry.ty.instantiate(&args);
                Ok((Term::Meta(id, args), ty))
            },

            Payload::Id(ref ty, ref lhs, ref rhs) => {
                let (ty, level) = self.sort_of(ctx, ty)?;
                let lhs = self.check(ctx, lhs, &ty)?;
                let rhs = self.check(ctx, rhs, &ty)?;
                let id = Term::Id {
                    ty: Box::new(ty),
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
                Ok((id, Term::Sort(level)))
            },

            Payload::Refl(ref ty, ref point) => {
                let (ty, _) = self.sort_of(ctx, ty)?;
                let point = self.check(ctx, point, &ty)?;
                let id = Term::Id {
                    ty: Box::new(ty.clone()),
                    lhs: Box::new(point.clone()),
                    rhs: Box::new(point.clone()),
                };
                let refl = Term::Refl {
                    ty: Box::new(ty),
                    point: Box::new(point),
                };
                Ok((refl, id))
            },

            Payload::J(ref args) => {
                let [ref ty, ref motive, ref base, ref lhs, ref rhs, ref path] = **args;
                let (ty, level) = self.sort_of(ctx, ty)?;
                let lhs = self.check(ctx, lhs, &ty)?;
                let rhs = self.check(ctx, rhs, &ty)?;

                // C : Π (y : A). Id A x y → Sort level
                let motive_ty = Term::Pi {
                    name: Name::from("y"),
                    icity: Icity::Explicit,
                    domain: Box::new(ty.clone()),
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
                let motive = self.check(ctx, motive, &motive_ty)?;

                let refl = Term::Refl {
                    ty: Box::new(ty.clone()),
                    point: Box::new(lhs.clone()),
                };
                let base = self.check(ctx, base, &motive.clone().apply([lhs.clone(), refl]))?;
                let id = Term::Id {
                    ty: Box::new(ty.clone()),
                    lhs: Box::new(lhs.clone()),
                    rhs: Box::new(rhs.clone()),
                };
                let path = self.check(ctx, path, &id)?;

                let result = motive.clone().apply([rhs.clone(), path.clone()]);
                let j = Term::J {
                    ty: Box::new(ty),
                    motive: Box::new(motive),
                    base: Box::new(base),
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    path: Box::new(path),
                };
                Ok((j, result))
            },

            Payload::Interval => Ok((Term::Interval, Term::Sort(0))),
            Payload::I0 => Ok((Term::I0, Term::Interval)),
            Payload::I1 => Ok((Term::I1, Term::Interval)),
            Payload::IVar(ix) => {
                if ix < ctx.ilen() {
                    Ok((Term::IVar(ix), Term::Interval))
                } else {
                    Err(TypeCheckerError::UnboundIntervalVariable(ix).into())
                }
            },

            Payload::Path(ref ty, ref lhs, ref rhs) => {
                let (ty, level) = self.sort_of(ctx, ty)?;
                let lhs = self.check(ctx, lhs, &ty)?;
                let rhs = self.check(ctx, rhs, &ty)?;
                let path = Term::Path {
                    ty: Box::new(ty),
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
                Ok((path, Term::Sort(level)))
            },

            Payload::PathP(ref family, ref lhs, ref rhs) => {
                let (family, level) = self.sort_of(&ctx.extend_interval(FAMILY_VARIABLE), family)?;
                let lhs = self.check(ctx, lhs, &family.isubst(0, &Term::I0))?;
                let rhs = self.check(ctx, rhs, &family.isubst(0, &Term::I1))?;
                let path = Term::PathP {
                    family: Box::new(family),
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
                Ok((path, Term::Sort(level)))
            },

            Payload::PathLam(name, ref body) => {
                let (body, line) = self.synth(&ctx.extend_interval(name), body)?;
                let lhs = Box::new(body.isubst(0, &Term::I0));
                let rhs = Box::new(body.isubst(0, &Term::I1));
                let ty = if line.has_free_ivar(0) {
                    Term::PathP {
                        family: Box::new(line),
                        lhs,
                        rhs,
                    }
                } else {
                    Term::Path {
                        ty: Box::new(line.isubst(0, &Term::I0)),
                        lhs,
                        rhs,
                    }
                };
                let lam = Term::PathLam {
                    name: Name::from(name),
                    body: Box::new(body),
                };
                Ok((lam, ty))
            },

            Payload::PathApp(ref path, ref point) => {
                let point = self.check(ctx, point, &Term::Interval)?;
                let (path, ty) = self.synth(ctx, path)?;
                let ty = match self.normalize(ctx, &ty)? {
                    Term::Path { ty, .. } => *ty,
                    Term::PathP { family, .. } => family.isubst(0, &point),
                    normal => return Err(TypeCheckerError::PathExpected(self.render(ctx, &normal)).into()),
                };
                let app = Term::PathApp {
                    path: Box::new(path),
                    point: Box::new(point),
                };
                Ok((app, ty))
            },

            Payload::Transport(ref family, ref element) => {
                let (family, _) = self.sort_of(&ctx.extend_interval(FAMILY_VARIABLE), family)?;
                let element = self.check(ctx, element, &family.isubst(0, &Term::I0))?;
                let ty = family.isubst(0, &Term::I1);
                let transport = Term::Transport {
                    family: Box::new(family),
                    element: Box::new(element),
                };
                Ok((transport, ty))
            },

            Payload::HitApp(hit, ctor, ref args, ref iargs) => self.hit_app(ctx, hit, ctor, args, iargs, location),
        }
    }

    fn let_value(&mut self, ctx: &Context, annotation: Option<&Builder>, value: &Builder) -> Result<(Term, Term)> {
        match annotation {
            Some(annotation) => {
                let (annotation, _) = self.sort_of(ctx, annotation)?;
                let value = self.check(ctx, value, &annotation)?;
                Ok((value, annotation))
            },
            None => self.synth(ctx, value),
        }
    }

    fn hit_app(
        &mut self,
        ctx: &Context,
        hit: &str,
        ctor: &str,
        args: &[Builder],
        iargs: &[Builder],
        location: Location,
    ) -> Result<(Term, Term)> {
        let unknown = || {
            Error::from(TypeCheckerError::UnknownConstructor {
                hit: hit.to_owned(),
                ctor: ctor.to_owned(),
            })
        };
        let info = self.environment.inductive(hit).ok_or_else(unknown)?;

        if info.path_constructors.iter().any(|path| path.name == ctor) {
            if !args.is_empty() || iargs.len() != 1 {
                return Err(unknown());
            }
            let mut points = Vec::with_capacity(iargs.len());
            for iarg in iargs {
                points.push(self.check(ctx, iarg, &Term::Interval)?);
            }
            let term = Term::HitApp {
                hit: hit.to_owned(),
                ctor: ctor.to_owned(),
                args: Vec::new(),
                iargs: points,
            };
            return Ok((term, Term::Global(hit.to_owned())));
        }

        if !info.constructors.iter().any(|name| name == ctor) || !iargs.is_empty() {
            return Err(unknown());
        }
        let (_, mut ty) = self.global(ctor)?;
        let mut terms = Vec::with_capacity(args.len());
        for arg in args {
            let (domain, codomain) = self.function_type(ctx, &ty, Icity::Explicit, location)?;
            let arg = self.check(ctx, arg, &domain)?;
            ty = codomain.subst(0, &arg);
            terms.push(arg);
        }
        let term = Term::HitApp {
            hit: hit.to_owned(),
            ctor: ctor.to_owned(),
            args: terms,
            iargs: Vec::new(),
        };
        Ok((term, ty))
    }

    /// Elaborates a surface term against a type.
    ///
    /// # Errors
    /// Fails if the term is ill-typed, or its type cannot be unified with `expected`.
    pub fn check(&mut self, ctx: &Context, builder: &Builder, expected: &Term) -> Result<Term> {
        trace!("elaborate {builder} against {expected}");
        self.check_payload(ctx, builder, expected).map_err(|err| err.at(builder.location))
    }

    fn check_payload(&mut self, ctx: &Context, builder: &Builder, expected: &Term) -> Result<Term> {
        let location = builder.location;
        let normal = self.normalize(ctx, expected)?;

        // η-expansion at implicit products
        if let Term::Pi {
            ref name,
            icity: Icity::Implicit,
            ref domain,
            ref codomain,
        } = normal
        {
            if !matches!(builder.payload, Payload::Lam(Binder { icity: Icity::Implicit, .. }, ..)) {
                let inner = ctx.extend(name.clone(), (**domain).clone(), Icity::Implicit);
                let body = self.check(&inner, builder, codomain)?;
                return Ok(Term::Lam {
                    name: name.clone(),
                    icity: Icity::Implicit,
                    annotation: Some(domain.clone()),
                    body: Box::new(body),
                });
            }
        }

        match builder.payload {
            Payload::Lam(Binder { name, icity }, ref annotation, ref body) => match normal {
                Term::Pi {
                    icity: expected_icity,
                    domain,
                    codomain,
                    ..
                } => {
                    if expected_icity != icity {
                        return Err(TypeCheckerError::IcityMismatch {
                            expected: expected_icity,
                            actual: icity,
                        }
                        .into());
                    }
                    if let Some(ref annotation) = *annotation {
                        let (ann, _) = self.sort_of(ctx, annotation)?;
                        self.expect(ctx, annotation.location, &ann, &ann, &domain)?;
                    }
                    let body = self.check(&ctx.extend(name, (*domain).clone(), icity), body, &codomain)?;
                    Ok(Term::Lam {
                        name: Name::from(name),
                        icity,
                        annotation: Some(domain),
                        body: Box::new(body),
                    })
                },
                _ if annotation.is_some() => self.infer_and_compare(ctx, builder, expected),
                normal if is_flex(&normal) => {
                    let domain = self.fresh_type(ctx, location);
                    let (body, codomain) = self.synth(&ctx.extend(name, domain.clone(), icity), body)?;
                    let lam = Term::Lam {
                        name: Name::from(name),
                        icity,
                        annotation: Some(Box::new(domain.clone())),
                        body: Box::new(body),
                    };
                    let pi = Term::Pi {
                        name: Name::from(name),
                        icity,
                        domain: Box::new(domain),
                        codomain: Box::new(codomain),
                    };
                    self.expect(ctx, location, &lam, &pi, &normal)?;
                    Ok(lam)
                },
                normal => Err(TypeCheckerError::PiExpected(self.render(ctx, &normal)).into()),
            },

            Payload::Pair(ref fst, ref snd) => match normal {
                Term::Sigma { first, second, .. } => {
                    let fst = self.check(ctx, fst, &first)?;
                    let snd = self.check(ctx, snd, &second.subst(0, &fst))?;
                    Ok(Term::Pair(Box::new(fst), Box::new(snd)))
                },
                _ => self.infer_and_compare(ctx, builder, expected),
            },

            Payload::Hole(name) => Ok(self.fresh(ctx, expected.clone(), location, name)),

            Payload::Let(name, ref annotation, ref value, ref body) => {
                let (value, ty) = self.let_value(ctx, annotation.as_deref(), value)?;
                let body = self.check(&ctx.define(name, ty.clone(), value.clone()), body, &expected.lift(1, 0))?;
                Ok(Term::Let {
                    name: Name::from(name),
                    annotation: Some(Box::new(ty)),
                    value: Box::new(value),
                    body: Box::new(body),
                })
            },

            Payload::PathLam(name, ref body) => {
                let (line, lhs, rhs) = match normal {
                    Term::Path { ty, lhs, rhs } => (ty.ilift(1, 0), lhs, rhs),
                    Term::PathP { family, lhs, rhs } => (*family, lhs, rhs),
                    _ => return self.infer_and_compare(ctx, builder, expected),
                };
                let body = self.check(&ctx.extend_interval(name), body, &line)?;
                for (point, endpoint) in [(Term::I0, lhs), (Term::I1, rhs)] {
                    let actual = body.isubst(0, &point);
                    if let Err(err) = self.unifier.unify_at(ctx, &actual, &endpoint, Some(location)) {
                        return Err(match err.kind {
                            Kind::Unification(UnificationError::Mismatch { .. }) => TypeCheckerError::EndpointMismatch {
                                expected: self.render_normal(ctx, &endpoint),
                                actual: self.render_normal(ctx, &actual),
                            }
                            .into(),
                            _ => err,
                        });
                    }
                }
                Ok(Term::PathLam {
                    name: Name::from(name),
                    body: Box::new(body),
                })
            },

            _ => self.infer_and_compare(ctx, builder, expected),
        }
    }

    fn infer_and_compare(&mut self, ctx: &Context, builder: &Builder, expected: &Term) -> Result<Term> {
        let (term, ty) = self.synth(ctx, builder)?;
        let (term, ty) = self.insert_implicits(ctx, term, ty, builder.location)?;
        self.expect(ctx, builder.location, &term, &ty, expected)?;
        Ok(term)
    }
}
