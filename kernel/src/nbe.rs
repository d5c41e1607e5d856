//! Normalization by evaluation.
//!
//! Terms are evaluated into [values](crate::value), which are then read back (quoted) into
//! normal terms. Evaluation performs β-reduction, unfolds transparent global definitions,
//! computes eliminators applied to constructors, reduces `J` on `Refl`, path applications of path
//! abstractions or at endpoints, constant transports and higher constructors at their endpoints.
//!
//! Conversion is decided on values, with η for functions, pairs and paths. Read-back does not
//! η-contract, hence two convertible terms may have distinct normal forms if they only differ by
//! η; [`Evaluator::conv`] is the reference for definitional equality.

use log::trace;

use crate::context::Context;
use crate::environment::{DeclarationKind, EliminatorInfo, Environment};
use crate::error::{Error, Result, ResultTerm};
use crate::meta::MetaStore;
use crate::term::{Icity, Term};
use crate::value::{Closure, Elim, Env, Head, Payload, Value};

/// Level of the variable used to probe whether a line of types depends on its interval
/// variable; it exceeds every level actually in use.
const PROBE: usize = usize::MAX >> 2;

/// Evaluation capabilities: the global environment, and optionally the metavariable solutions to
/// unfold.
#[derive(Clone, Copy)]
pub struct Evaluator<'a> {
    environment: &'a Environment,
    metas: Option<&'a MetaStore>,
}

impl<'a> Evaluator<'a> {
    #[inline]
    #[must_use]
    pub const fn new(environment: &'a Environment, metas: Option<&'a MetaStore>) -> Self {
        Self { environment, metas }
    }

    #[inline]
    #[must_use]
    pub const fn environment(&self) -> &'a Environment {
        self.environment
    }

    /// The environment in which terms of `ctx` evaluate: local definitions are bound to their
    /// values, assumptions to variables carrying their type.
    ///
    /// # Errors
    /// Fails with a kernel bug if the context is not well-scoped.
    pub fn env(&self, ctx: &Context) -> Result<Env> {
        let mut env = Env::default();
        for level in 0..ctx.ilen() {
            env.ivars.push_back(Value::ivar(level));
        }
        let ivars = env.ivars.clone();

        for (level, binding) in ctx.bindings().enumerate() {
            let prefix = Env {
                vars: env.vars.clone(),
                ivars: ivars.take(binding.ilen),
            };
            let value = match binding.value {
                Some(ref value) => self.eval(&prefix, value)?,
                None => Value::var(level, Some(self.eval(&prefix, &binding.ty)?)),
            };
            env.vars.push_back(value);
        }
        Ok(env)
    }

    /// Evaluates a term in an environment.
    ///
    /// # Errors
    /// Fails with a kernel bug on ill-scoped or ill-typed eliminations.
    pub fn eval(&self, env: &Env, term: &Term) -> Result<Value> {
        Ok(match *term {
            Term::Var(ix) => env
                .var(ix)
                .cloned()
                .ok_or_else(|| Error::bug(format!("variable {ix} escapes an environment of size {}", env.vars.len())))?,

            Term::Global(ref name) => self.global(name)?,

            Term::Sort(level) => Value::new(Payload::Sort(level)),

            Term::Pi {
                ref name,
                icity,
                ref domain,
                ref codomain,
            } => Value::new(Payload::Pi(name.clone(), icity, self.eval(env, domain)?, Closure::new(env, codomain))),

            Term::Lam {
                ref name,
                icity,
                ref annotation,
                ref body,
            } => {
                let annotation = annotation.as_ref().map(|ann| self.eval(env, ann)).transpose()?;
                Value::new(Payload::Lam(name.clone(), icity, annotation, Closure::new(env, body)))
            },

            Term::App {
                ref function,
                ref argument,
                icity,
            } => {
                let function = self.eval(env, function)?;
                let argument = self.eval(env, argument)?;
                self.apply(&function, argument, icity)?
            },

            Term::Sigma {
                ref name,
                ref first,
                ref second,
            } => Value::new(Payload::Sigma(name.clone(), self.eval(env, first)?, Closure::new(env, second))),

            Term::Pair(ref fst, ref snd) => Value::new(Payload::Pair(self.eval(env, fst)?, self.eval(env, snd)?)),
            Term::Fst(ref pair) => self.fst(&self.eval(env, pair)?)?,
            Term::Snd(ref pair) => self.snd(&self.eval(env, pair)?)?,

            Term::Let { ref value, ref body, .. } => {
                let value = self.eval(env, value)?;
                self.eval(&env.push(value), body)?
            },

            Term::Meta(id, ref args) => match self.metas.and_then(|metas| metas.solution(id)) {
                Some(solution) => self.eval(env, &solution.instantiate(args))?,
                None => {
                    let args = args.iter().map(|arg| self.eval(env, arg)).collect::<Result<_>>()?;
                    Value::neutral(Head::Meta(id, args), Vec::new())
                },
            },

            Term::Id {
                ref ty,
                ref lhs,
                ref rhs,
            } => Value::new(Payload::Id(self.eval(env, ty)?, self.eval(env, lhs)?, self.eval(env, rhs)?)),

            Term::Refl { ref ty, ref point } => Value::new(Payload::Refl(self.eval(env, ty)?, self.eval(env, point)?)),

            Term::J {
                ref ty,
                ref motive,
                ref base,
                ref lhs,
                ref rhs,
                ref path,
            } => {
                let elim = Elim::J {
                    ty: self.eval(env, ty)?,
                    motive: self.eval(env, motive)?,
                    base: self.eval(env, base)?,
                    lhs: self.eval(env, lhs)?,
                    rhs: self.eval(env, rhs)?,
                };
                self.elim(&self.eval(env, path)?, &elim)?
            },

            Term::Interval => Value::new(Payload::Interval),
            Term::I0 => Value::new(Payload::I0),
            Term::I1 => Value::new(Payload::I1),

            Term::IVar(ix) => env.ivar(ix).cloned().ok_or_else(|| {
                Error::bug(format!("interval variable {ix} escapes an environment of size {}", env.ivars.len()))
            })?,

            Term::Path {
                ref ty,
                ref lhs,
                ref rhs,
            } => Value::new(Payload::Path(self.eval(env, ty)?, self.eval(env, lhs)?, self.eval(env, rhs)?)),

            Term::PathP {
                ref family,
                ref lhs,
                ref rhs,
            } => Value::new(Payload::PathP(Closure::new(env, family), self.eval(env, lhs)?, self.eval(env, rhs)?)),

            Term::PathLam { ref name, ref body } => Value::new(Payload::PathLam(name.clone(), Closure::new(env, body))),

            Term::PathApp { ref path, ref point } => self.path_app(&self.eval(env, path)?, self.eval(env, point)?)?,

            Term::Transport {
                ref family,
                ref element,
            } => self.transport(Closure::new(env, family), self.eval(env, element)?)?,

            Term::HitApp {
                ref hit,
                ref ctor,
                ref args,
                ref iargs,
            } => {
                let args = args.iter().map(|arg| self.eval(env, arg)).collect::<Result<_>>()?;
                let iargs = iargs.iter().map(|arg| self.eval(env, arg)).collect::<Result<_>>()?;
                self.hit(hit, ctor, args, iargs)?
            },
        })
    }

    /// Transparent definitions unfold; every other constant is neutral.
    fn global(&self, name: &str) -> Result<Value> {
        match self.environment.get(name).and_then(|decl| decl.unfolding()) {
            Some(body) => self.eval(&Env::default(), body),
            None => Ok(Value::global(name)),
        }
    }

    /// Instantiates a closure binding a term variable.
    ///
    /// # Errors
    /// See [`Evaluator::eval`].
    pub fn instantiate(&self, closure: &Closure, value: Value) -> Result<Value> {
        self.eval(&closure.env.push(value), &closure.body)
    }

    /// Instantiates a closure binding an interval variable.
    ///
    /// # Errors
    /// See [`Evaluator::eval`].
    pub fn instantiate_interval(&self, closure: &Closure, point: Value) -> Result<Value> {
        self.eval(&closure.env.ipush(point), &closure.body)
    }

    /// Applies an elimination to a value.
    ///
    /// # Errors
    /// See [`Evaluator::eval`].
    pub fn elim(&self, value: &Value, elim: &Elim) -> Result<Value> {
        match *elim {
            Elim::App(ref argument, icity) => self.apply(value, argument.clone(), icity),
            Elim::Fst => self.fst(value),
            Elim::Snd => self.snd(value),
            Elim::PathApp(ref point) => self.path_app(value, point.clone()),
            Elim::J { ref base, .. } => match **value {
                Payload::Refl(..) => Ok(base.clone()),
                Payload::Neutral(ref head, ref spine) => Ok(push(head, spine, elim.clone())),
                _ => Err(Error::bug("J eliminates a value that is not an identity proof")),
            },
        }
    }

    /// # Errors
    /// Fails with a kernel bug if `function` is not a function.
    pub fn apply(&self, function: &Value, argument: Value, icity: Icity) -> Result<Value> {
        match **function {
            Payload::Lam(_, _, _, ref closure) => self.instantiate(closure, argument),
            Payload::Neutral(ref head, ref spine) => {
                let mut spine = spine.clone();
                spine.push(Elim::App(argument, icity));
                self.iota(head, spine)
            },
            _ => Err(Error::bug("application of a value that is not a function")),
        }
    }

    fn fst(&self, pair: &Value) -> Result<Value> {
        match **pair {
            Payload::Pair(ref fst, _) => Ok(fst.clone()),
            Payload::Neutral(ref head, ref spine) => Ok(push(head, spine, Elim::Fst)),
            _ => Err(Error::bug("projection of a value that is not a pair")),
        }
    }

    fn snd(&self, pair: &Value) -> Result<Value> {
        match **pair {
            Payload::Pair(_, ref snd) => Ok(snd.clone()),
            Payload::Neutral(ref head, ref spine) => Ok(push(head, spine, Elim::Snd)),
            _ => Err(Error::bug("projection of a value that is not a pair")),
        }
    }

    /// # Errors
    /// Fails with a kernel bug if `path` is not a path.
    pub fn path_app(&self, path: &Value, point: Value) -> Result<Value> {
        match **path {
            Payload::PathLam(_, ref closure) => self.instantiate_interval(closure, point),
            Payload::Neutral(ref head, ref spine) => {
                if let Some(end) = point.endpoint() {
                    if let Some(value) = self.neutral_endpoint(head, spine, end)? {
                        return Ok(value);
                    }
                }
                Ok(push(head, spine, Elim::PathApp(point)))
            },
            _ => Err(Error::bug("path application of a value that is not a path")),
        }
    }

    /// The endpoint of a neutral path, read from its type.
    fn neutral_endpoint(&self, head: &Head, spine: &[Elim], end: bool) -> Result<Option<Value>> {
        Ok(self.neutral_type(head, spine)?.and_then(|ty| match *ty {
            Payload::Path(_, ref lhs, ref rhs) | Payload::PathP(_, ref lhs, ref rhs) => {
                Some(if end { rhs.clone() } else { lhs.clone() })
            },
            _ => None,
        }))
    }

    /// The type of a neutral value, when its head has a known type.
    fn neutral_type(&self, head: &Head, spine: &[Elim]) -> Result<Option<Value>> {
        let mut ty = match *head {
            Head::Var(_, Some(ref ty)) => ty.clone(),
            Head::Global(ref name) => match self.environment.get(name) {
                Some(decl) => self.eval(&Env::default(), &decl.ty)?,
                None => return Ok(None),
            },
            Head::Var(_, None) | Head::Meta(..) | Head::IVar(_) | Head::Transport(..) => return Ok(None),
        };

        for (i, elim) in spine.iter().enumerate() {
            ty = match (&*ty, elim) {
                (&Payload::Pi(_, _, _, ref codomain), &Elim::App(ref argument, _)) => {
                    self.instantiate(codomain, argument.clone())?
                },
                (&Payload::Sigma(_, ref first, _), &Elim::Fst) => first.clone(),
                (&Payload::Sigma(_, _, ref second), &Elim::Snd) => {
                    let pair = Value::neutral(head.clone(), spine[..i].to_vec());
                    self.instantiate(second, self.fst(&pair)?)?
                },
                (&Payload::Path(ref ty, ..), &Elim::PathApp(_)) => ty.clone(),
                (&Payload::PathP(ref family, ..), &Elim::PathApp(ref point)) => {
                    self.instantiate_interval(family, point.clone())?
                },
                _ => return Ok(None),
            };
        }
        Ok(Some(ty))
    }

    /// Computes an eliminator applied to a constructor, once enough arguments are given.
    fn iota(&self, head: &Head, spine: Vec<Elim>) -> Result<Value> {
        let info = match *head {
            Head::Global(ref name) => match self.environment.eliminator(name) {
                Some(info) if spine.len() >= info.arity() => info,
                _ => return Ok(Value::neutral(head.clone(), spine)),
            },
            _ => return Ok(Value::neutral(head.clone(), spine)),
        };

        match self.iota_step(head, &spine, info)? {
            Some(value) => spine[info.arity()..].iter().try_fold(value, |value, elim| self.elim(&value, elim)),
            None => Ok(Value::neutral(head.clone(), spine)),
        }
    }

    fn iota_step(&self, head: &Head, spine: &[Elim], info: &EliminatorInfo) -> Result<Option<Value>> {
        let args = spine[..info.arity()]
            .iter()
            .map(|elim| match *elim {
                Elim::App(ref value, _) => Some(value),
                _ => None,
            })
            .collect::<Option<Vec<_>>>();
        let Some(args) = args else { return Ok(None) };
        let Some(scrutinee) = args.last() else { return Ok(None) };
        let cases = &args[info.params + 1..info.arity() - 1];

        let (index, fields, recursive, iargs) = match ***scrutinee {
            Payload::Neutral(Head::Global(ref ctor), ref ctor_spine) => match self.environment.constructor(ctor) {
                Some(ctor_info)
                    if ctor_info.inductive == info.inductive && ctor_spine.len() == ctor_info.params + ctor_info.fields() =>
                {
                    let fields = ctor_spine[ctor_info.params..]
                        .iter()
                        .map(|elim| match *elim {
                            Elim::App(ref value, _) => Some(value.clone()),
                            _ => None,
                        })
                        .collect::<Option<Vec<_>>>();
                    let Some(fields) = fields else { return Ok(None) };
                    (ctor_info.index, fields, ctor_info.recursive.clone(), Vec::new())
                },
                _ => return Ok(None),
            },

            Payload::Hit {
                ref hit,
                ref ctor,
                ref args,
                ref iargs,
            } if *hit == info.inductive => {
                match self.environment.inductive(hit).and_then(|hit_info| hit_info.case_index(ctor)) {
                    Some(index) => (index, args.clone(), vec![false; args.len()], iargs.clone()),
                    None => return Ok(None),
                }
            },

            _ => return Ok(None),
        };

        let Some(case) = cases.get(index) else {
            return Err(Error::bug(format!("constructor {index} has no case in {}", info.inductive)));
        };
        trace!("ι-reduction of {} on constructor {index}", info.inductive);

        let partial = Value::neutral(head.clone(), spine[..info.arity() - 1].to_vec());
        let mut result = (*case).clone();
        for (field, recursive) in fields.into_iter().zip(recursive) {
            result = self.apply(&result, field.clone(), Icity::Explicit)?;
            if recursive {
                let ih = self.apply(&partial, field, Icity::Explicit)?;
                result = self.apply(&result, ih, Icity::Explicit)?;
            }
        }
        for point in iargs {
            result = self.path_app(&result, point)?;
        }
        Ok(Some(result))
    }

    fn transport(&self, family: Closure, element: Value) -> Result<Value> {
        let line = self.instantiate_interval(&family, Value::ivar(PROBE))?;
        let line = self.quote(PROBE + 1, PROBE + 1, &line)?;
        if line.has_free_ivar(0) {
            Ok(Value::neutral(Head::Transport(family, element), Vec::new()))
        } else {
            Ok(element)
        }
    }

    fn hit(&self, hit: &str, ctor: &str, args: Vec<Value>, iargs: Vec<Value>) -> Result<Value> {
        let Some(info) = self.environment.inductive(hit) else {
            return Ok(Value::new(Payload::Hit {
                hit: hit.to_owned(),
                ctor: ctor.to_owned(),
                args,
                iargs,
            }));
        };

        match info.path_constructors.iter().find(|path| path.name == ctor) {
            Some(path) => match iargs.first().and_then(Value::endpoint) {
                Some(false) => self.eval(&Env::default(), &path.lhs),
                Some(true) => self.eval(&Env::default(), &path.rhs),
                None => Ok(Value::new(Payload::Hit {
                    hit: hit.to_owned(),
                    ctor: ctor.to_owned(),
                    args,
                    iargs,
                })),
            },
            None => args
                .into_iter()
                .try_fold(self.global(ctor)?, |function, arg| self.apply(&function, arg, Icity::Explicit)),
        }
    }

    /// Reads a value back as a term, in a context of `level` variables and `ilevel` interval
    /// variables.
    ///
    /// # Errors
    /// Fails with a kernel bug if the value mentions variables beyond these levels.
    pub fn quote(&self, level: usize, ilevel: usize, value: &Value) -> ResultTerm {
        Ok(match **value {
            Payload::Neutral(ref head, ref spine) => {
                let head = self.quote_head(level, ilevel, head)?;
                spine.iter().try_fold(head, |term, elim| self.quote_elim(level, ilevel, term, elim))?
            },

            Payload::Sort(sort) => Term::Sort(sort),

            Payload::Pi(ref name, icity, ref domain, ref codomain) => {
                let var = Value::var(level, Some(domain.clone()));
                Term::Pi {
                    name: name.clone(),
                    icity,
                    domain: Box::new(self.quote(level, ilevel, domain)?),
                    codomain: Box::new(self.quote(level + 1, ilevel, &self.instantiate(codomain, var)?)?),
                }
            },

            Payload::Lam(ref name, icity, ref annotation, ref body) => {
                let var = Value::var(level, annotation.clone());
                Term::Lam {
                    name: name.clone(),
                    icity,
                    annotation: annotation
                        .as_ref()
                        .map(|ann| self.quote(level, ilevel, ann).map(Box::new))
                        .transpose()?,
                    body: Box::new(self.quote(level + 1, ilevel, &self.instantiate(body, var)?)?),
                }
            },

            Payload::Sigma(ref name, ref first, ref second) => {
                let var = Value::var(level, Some(first.clone()));
                Term::Sigma {
                    name: name.clone(),
                    first: Box::new(self.quote(level, ilevel, first)?),
                    second: Box::new(self.quote(level + 1, ilevel, &self.instantiate(second, var)?)?),
                }
            },

            Payload::Pair(ref fst, ref snd) => {
                Term::Pair(Box::new(self.quote(level, ilevel, fst)?), Box::new(self.quote(level, ilevel, snd)?))
            },

            Payload::Id(ref ty, ref lhs, ref rhs) => Term::Id {
                ty: Box::new(self.quote(level, ilevel, ty)?),
                lhs: Box::new(self.quote(level, ilevel, lhs)?),
                rhs: Box::new(self.quote(level, ilevel, rhs)?),
            },

            Payload::Refl(ref ty, ref point) => Term::Refl {
                ty: Box::new(self.quote(level, ilevel, ty)?),
                point: Box::new(self.quote(level, ilevel, point)?),
            },

            Payload::Interval => Term::Interval,
            Payload::I0 => Term::I0,
            Payload::I1 => Term::I1,

            Payload::Path(ref ty, ref lhs, ref rhs) => Term::Path {
                ty: Box::new(self.quote(level, ilevel, ty)?),
                lhs: Box::new(self.quote(level, ilevel, lhs)?),
                rhs: Box::new(self.quote(level, ilevel, rhs)?),
            },

            Payload::PathP(ref family, ref lhs, ref rhs) => Term::PathP {
                family: Box::new(self.quote_line(level, ilevel, family)?),
                lhs: Box::new(self.quote(level, ilevel, lhs)?),
                rhs: Box::new(self.quote(level, ilevel, rhs)?),
            },

            Payload::PathLam(ref name, ref body) => Term::PathLam {
                name: name.clone(),
                body: Box::new(self.quote_line(level, ilevel, body)?),
            },

            Payload::Hit {
                ref hit,
                ref ctor,
                ref args,
                ref iargs,
            } => Term::HitApp {
                hit: hit.clone(),
                ctor: ctor.clone(),
                args: args.iter().map(|arg| self.quote(level, ilevel, arg)).collect::<Result<_>>()?,
                iargs: iargs.iter().map(|arg| self.quote(level, ilevel, arg)).collect::<Result<_>>()?,
            },
        })
    }

    /// Reads back a closure binding an interval variable.
    fn quote_line(&self, level: usize, ilevel: usize, closure: &Closure) -> ResultTerm {
        self.quote(level, ilevel + 1, &self.instantiate_interval(closure, Value::ivar(ilevel))?)
    }

    fn quote_head(&self, level: usize, ilevel: usize, head: &Head) -> ResultTerm {
        Ok(match *head {
            Head::Var(var, _) => Term::Var(
                level
                    .checked_sub(var + 1)
                    .ok_or_else(|| Error::bug(format!("variable of level {var} read back at level {level}")))?,
            ),
            Head::Global(ref name) => Term::Global(name.clone()),
            Head::Meta(id, ref args) => {
                Term::Meta(id, args.iter().map(|arg| self.quote(level, ilevel, arg)).collect::<Result<_>>()?)
            },
            Head::IVar(var) => Term::IVar(ilevel.checked_sub(var + 1).ok_or_else(|| {
                Error::bug(format!("interval variable of level {var} read back at level {ilevel}"))
            })?),
            Head::Transport(ref family, ref element) => Term::Transport {
                family: Box::new(self.quote_line(level, ilevel, family)?),
                element: Box::new(self.quote(level, ilevel, element)?),
            },
        })
    }

    fn quote_elim(&self, level: usize, ilevel: usize, term: Term, elim: &Elim) -> ResultTerm {
        Ok(match *elim {
            Elim::App(ref argument, icity) => Term::App {
                function: Box::new(term),
                argument: Box::new(self.quote(level, ilevel, argument)?),
                icity,
            },
            Elim::Fst => Term::Fst(Box::new(term)),
            Elim::Snd => Term::Snd(Box::new(term)),
            Elim::PathApp(ref point) => Term::PathApp {
                path: Box::new(term),
                point: Box::new(self.quote(level, ilevel, point)?),
            },
            Elim::J {
                ref ty,
                ref motive,
                ref base,
                ref lhs,
                ref rhs,
            } => Term::J {
                ty: Box::new(self.quote(level, ilevel, ty)?),
                motive: Box::new(self.quote(level, ilevel, motive)?),
                base: Box::new(self.quote(level, ilevel, base)?),
                lhs: Box::new(self.quote(level, ilevel, lhs)?),
                rhs: Box::new(self.quote(level, ilevel, rhs)?),
                path: Box::new(term),
            },
        })
    }

    /// Definitional equality of two values, with η-rules for functions, pairs and paths.
    ///
    /// # Errors
    /// Fails with a kernel bug on ill-typed values.
    pub fn conv(&self, level: usize, ilevel: usize, lhs: &Value, rhs: &Value) -> Result<bool> {
        use Payload::*;

        Ok(match (&**lhs, &**rhs) {
            (&Sort(i), &Sort(j)) => i == j,

            (&Pi(_, i1, ref d1, ref c1), &Pi(_, i2, ref d2, ref c2)) => {
                i1 == i2 && self.conv(level, ilevel, d1, d2)? && self.conv_closures(level, ilevel, c1, c2, Some(d1))?
            },

            (&Lam(_, _, ref ann, ref c1), &Lam(_, _, _, ref c2)) => self.conv_closures(level, ilevel, c1, c2, ann.as_ref())?,

            (&Lam(_, icity, ref ann, ref body), _) => {
                let var = Value::var(level, ann.clone());
                let applied = self.apply(rhs, var.clone(), icity)?;
                self.conv(level + 1, ilevel, &self.instantiate(body, var)?, &applied)?
            },

            (_, &Lam(..)) => self.conv(level, ilevel, rhs, lhs)?,

            (&Sigma(_, ref f1, ref s1), &Sigma(_, ref f2, ref s2)) => {
                self.conv(level, ilevel, f1, f2)? && self.conv_closures(level, ilevel, s1, s2, Some(f1))?
            },

            (&Pair(ref a1, ref b1), &Pair(ref a2, ref b2)) => {
                self.conv(level, ilevel, a1, a2)? && self.conv(level, ilevel, b1, b2)?
            },

            (&Pair(ref a, ref b), &Neutral(..)) => {
                self.conv(level, ilevel, a, &self.fst(rhs)?)? && self.conv(level, ilevel, b, &self.snd(rhs)?)?
            },

            (&Neutral(..), &Pair(..)) => self.conv(level, ilevel, rhs, lhs)?,

            (&Id(ref t1, ref x1, ref y1), &Id(ref t2, ref x2, ref y2))
            | (&Path(ref t1, ref x1, ref y1), &Path(ref t2, ref x2, ref y2)) => {
                self.conv(level, ilevel, t1, t2)? && self.conv(level, ilevel, x1, x2)? && self.conv(level, ilevel, y1, y2)?
            },

            (&Refl(ref t1, ref x1), &Refl(ref t2, ref x2)) => {
                self.conv(level, ilevel, t1, t2)? && self.conv(level, ilevel, x1, x2)?
            },

            (&Interval, &Interval) | (&I0, &I0) | (&I1, &I1) => true,

            (&PathP(ref f1, ref x1, ref y1), &PathP(ref f2, ref x2, ref y2)) => {
                self.conv_lines(level, ilevel, f1, f2)?
                    && self.conv(level, ilevel, x1, x2)?
                    && self.conv(level, ilevel, y1, y2)?
            },

            (&Path(ref ty, ref x1, ref y1), &PathP(ref family, ref x2, ref y2)) => {
                let line = self.instantiate_interval(family, Value::ivar(ilevel))?;
                self.conv(level, ilevel + 1, ty, &line)?
                    && self.conv(level, ilevel, x1, x2)?
                    && self.conv(level, ilevel, y1, y2)?
            },

            (&PathP(..), &Path(..)) => self.conv(level, ilevel, rhs, lhs)?,

            (&PathLam(_, ref b1), &PathLam(_, ref b2)) => self.conv_lines(level, ilevel, b1, b2)?,

            (&PathLam(_, ref body), &Neutral(..)) => {
                let point = Value::ivar(ilevel);
                let applied = self.path_app(rhs, point.clone())?;
                self.conv(level, ilevel + 1, &self.instantiate_interval(body, point)?, &applied)?
            },

            (&Neutral(..), &PathLam(..)) => self.conv(level, ilevel, rhs, lhs)?,

            (
                &Hit {
                    hit: ref h1,
                    ctor: ref c1,
                    args: ref a1,
                    iargs: ref i1,
                },
                &Hit {
                    hit: ref h2,
                    ctor: ref c2,
                    args: ref a2,
                    iargs: ref i2,
                },
            ) => h1 == h2 && c1 == c2 && self.conv_all(level, ilevel, a1, a2)? && self.conv_all(level, ilevel, i1, i2)?,

            (&Neutral(ref h1, ref s1), &Neutral(ref h2, ref s2)) => {
                s1.len() == s2.len() && self.conv_head(level, ilevel, h1, h2)? && {
                    let mut equal = true;
                    for (e1, e2) in s1.iter().zip(s2) {
                        if !self.conv_elim(level, ilevel, e1, e2)? {
                            equal = false;
                            break;
                        }
                    }
                    equal
                }
            },

            _ => false,
        })
    }

    fn conv_all(&self, level: usize, ilevel: usize, lhs: &[Value], rhs: &[Value]) -> Result<bool> {
        if lhs.len() != rhs.len() {
            return Ok(false);
        }
        for (l, r) in lhs.iter().zip(rhs) {
            if !self.conv(level, ilevel, l, r)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn conv_closures(&self, level: usize, ilevel: usize, c1: &Closure, c2: &Closure, ty: Option<&Value>) -> Result<bool> {
        let var = Value::var(level, ty.cloned());
        self.conv(level + 1, ilevel, &self.instantiate(c1, var.clone())?, &self.instantiate(c2, var)?)
    }

    fn conv_lines(&self, level: usize, ilevel: usize, c1: &Closure, c2: &Closure) -> Result<bool> {
        let point = Value::ivar(ilevel);
        self.conv(
            level,
            ilevel + 1,
            &self.instantiate_interval(c1, point.clone())?,
            &self.instantiate_interval(c2, point)?,
        )
    }

    fn conv_head(&self, level: usize, ilevel: usize, h1: &Head, h2: &Head) -> Result<bool> {
        Ok(match (h1, h2) {
            (&Head::Var(v1, _), &Head::Var(v2, _)) => v1 == v2,
            (&Head::Global(ref g1), &Head::Global(ref g2)) => g1 == g2,
            (&Head::IVar(v1), &Head::IVar(v2)) => v1 == v2,
            (&Head::Meta(m1, ref a1), &Head::Meta(m2, ref a2)) => m1 == m2 && self.conv_all(level, ilevel, a1, a2)?,
            (&Head::Transport(ref f1, ref e1), &Head::Transport(ref f2, ref e2)) => {
                self.conv_lines(level, ilevel, f1, f2)? && self.conv(level, ilevel, e1, e2)?
            },
            _ => false,
        })
    }

    fn conv_elim(&self, level: usize, ilevel: usize, e1: &Elim, e2: &Elim) -> Result<bool> {
        Ok(match (e1, e2) {
            (&Elim::App(ref a1, i1), &Elim::App(ref a2, i2)) => i1 == i2 && self.conv(level, ilevel, a1, a2)?,
            (&Elim::Fst, &Elim::Fst) | (&Elim::Snd, &Elim::Snd) => true,
            (&Elim::PathApp(ref r1), &Elim::PathApp(ref r2)) => self.conv(level, ilevel, r1, r2)?,
            (
                &Elim::J {
                    ty: ref t1,
                    motive: ref m1,
                    base: ref b1,
                    lhs: ref l1,
                    rhs: ref r1,
                },
                &Elim::J {
                    ty: ref t2,
                    motive: ref m2,
                    base: ref b2,
                    lhs: ref l2,
                    rhs: ref r2,
                },
            ) => self.conv_all(level, ilevel, &[t1.clone(), m1.clone(), b1.clone(), l1.clone(), r1.clone()], &[
                t2.clone(),
                m2.clone(),
                b2.clone(),
                l2.clone(),
                r2.clone(),
            ])?,
            _ => false,
        })
    }

    /// The normal form of a term of `ctx`.
    ///
    /// # Errors
    /// See [`Evaluator::eval`].
    pub fn normalize(&self, ctx: &Context, term: &Term) -> ResultTerm {
        let env = self.env(ctx)?;
        let normal = self.quote(ctx.len(), ctx.ilen(), &self.eval(&env, term)?)?;
        trace!("normalized {term} to {normal}");
        Ok(normal)
    }

    /// Whether two terms of `ctx` are definitionally equal.
    ///
    /// # Errors
    /// See [`Evaluator::eval`].
    pub fn is_def_eq(&self, ctx: &Context, lhs: &Term, rhs: &Term) -> Result<bool> {
        let env = self.env(ctx)?;
        self.conv(ctx.len(), ctx.ilen(), &self.eval(&env, lhs)?, &self.eval(&env, rhs)?)
    }

    /// Whether `term` is a constructor of an inductive type applied to its arguments, returning
    /// the constructor name.
    #[must_use]
    pub fn constructor_head<'t>(&self, term: &'t Term) -> Option<&'t str> {
        term.head_global().filter(|name| {
            matches!(self.environment.get(name).map(|decl| &decl.kind), Some(&DeclarationKind::Constructor(_)))
        })
    }
}

fn push(head: &Head, spine: &[Elim], elim: Elim) -> Value {
    let mut spine = spine.to_vec();
    spine.push(elim);
    Value::neutral(head.clone(), spine)
}
