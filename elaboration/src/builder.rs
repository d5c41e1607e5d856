//! Surface terms.
//!
//! A [`Builder`] describes a term in a naive but easy-to-build manner: variables are referred to
//! by name, holes may be left for the elaborator to fill, and every node remembers where it was
//! written. A builder becomes a core term either by being [realised](Builder::realise), a purely
//! syntactic translation, or by being [elaborated](crate::Elaborator).

use core::fmt;

use derive_more::{Constructor, Deref};
use kernel::location::Location;
use kernel::term::{Icity, Level, MetaId, Name, Term};

use crate::error::{ElaborationError, Error, Result};

/// Wrapper template of [`Payload`], including [`Location`].
#[derive(Clone, Constructor, Debug, Deref, PartialEq, Eq)]
pub struct Builder<'build> {
    /// Location of the term.
    pub location: Location,

    /// Term's effective builder.
    #[deref]
    pub payload: Payload<'build>,
}

/// A binder name, and whether the binder is implicit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binder<'build> {
    pub name: &'build str,
    pub icity: Icity,
}

impl<'build> Binder<'build> {
    #[inline]
    #[must_use]
    pub const fn explicit(name: &'build str) -> Self {
        Self {
            name,
            icity: Icity::Explicit,
        }
    }

    #[inline]
    #[must_use]
    pub const fn implicit(name: &'build str) -> Self {
        Self {
            name,
            icity: Icity::Implicit,
        }
    }
}

/// Template of terms.
///
/// The variants mirror the [core terms](Term), with names instead of de Bruijn indices. The
/// families of `PathP` and `Transport` bind an interval variable named `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::missing_docs_in_private_items)]
pub enum Payload<'build> {
    /// A variable, local or global, or an interval variable.
    Var(&'build str),

    /// A local variable given by its de Bruijn index.
    Index(usize),

    /// A global constant, bypassing local names.
    Global(&'build str),

    Sort(Level),

    /// A hole, possibly named.
    Hole(Option<&'build str>),

    Pi(Binder<'build>, Box<Builder<'build>>, Box<Builder<'build>>),
    Lam(Binder<'build>, Option<Box<Builder<'build>>>, Box<Builder<'build>>),
    App(Box<Builder<'build>>, Box<Builder<'build>>, Icity),

    Sigma(&'build str, Box<Builder<'build>>, Box<Builder<'build>>),
    Pair(Box<Builder<'build>>, Box<Builder<'build>>),
    Fst(Box<Builder<'build>>),
    Snd(Box<Builder<'build>>),

    Let(&'build str, Option<Box<Builder<'build>>>, Box<Builder<'build>>, Box<Builder<'build>>),

    Meta(usize, Vec<Builder<'build>>),

    Id(Box<Builder<'build>>, Box<Builder<'build>>, Box<Builder<'build>>),
    Refl(Box<Builder<'build>>, Box<Builder<'build>>),
    J(Box<[Builder<'build>; 6]>),

    Interval,
    I0,
    I1,
    IVar(usize),

    Path(Box<Builder<'build>>, Box<Builder<'build>>, Box<Builder<'build>>),
    PathP(Box<Builder<'build>>, Box<Builder<'build>>, Box<Builder<'build>>),
    PathLam(&'build str, Box<Builder<'build>>),
    PathApp(Box<Builder<'build>>, Box<Builder<'build>>),
    Transport(Box<Builder<'build>>, Box<Builder<'build>>),

    HitApp(&'build str, &'build str, Vec<Builder<'build>>, Vec<Builder<'build>>),
}

/// The name of the interval variable bound by the families of `PathP` and `Transport`.
pub const FAMILY_VARIABLE: &str = "i";

/// Names in scope while realising a builder, outermost first.
#[derive(Default)]
struct Scope<'build> {
    names: Vec<&'build str>,
    inames: Vec<&'build str>,
}

impl<'build> Scope<'build> {
    fn under<T, F>(&mut self, name: &'build str, interval: bool, f: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
    {
        self.stack(interval).push(name);
        let result = f(self);
        self.stack(interval).pop();
        result
    }

    fn stack(&mut self, interval: bool) -> &mut Vec<&'build str> {
        if interval { &mut self.inames } else { &mut self.names }
    }

    fn resolve(names: &[&str], name: &str) -> Option<usize> {
        names.iter().rev().position(|bound| *bound == name && *bound != "_")
    }
}

impl<'build> Builder<'build> {
    /// Realise a builder into a core [`Term`], without any typing: names are resolved to the
    /// innermost binder carrying them, term binders before interval ones, then to global constants.
    ///
    /// # Errors
    /// Fails on holes, which only the elaborator knows how to fill.
    #[inline]
    pub fn realise(&self) -> Result<Term> {
        self.realise_in(&mut Scope::default())
    }

    /// Realise a builder in a context whose binders are named `names`, outermost first.
    ///
    /// # Errors
    /// Fails on holes.
    #[inline]
    pub fn realise_with(&self, names: &[&'build str]) -> Result<Term> {
        let mut scope = Scope {
            names: names.to_vec(),
            inames: Vec::new(),
        };
        self.realise_in(&mut scope)
    }

    fn realise_all(builders: &[Self], scope: &mut Scope<'build>) -> Result<Vec<Term>> {
        builders.iter().map(|builder| builder.realise_in(scope)).collect()
    }

    fn realise_in(&self, scope: &mut Scope<'build>) -> Result<Term> {
        let boxed = |builder: &Self, scope: &mut Scope<'build>| builder.realise_in(scope).map(Box::new);

        let term = match self.payload {
            Payload::Var(name) => match Scope::resolve(&scope.names, name) {
                Some(ix) => Term::Var(ix),
                None => match Scope::resolve(&scope.inames, name) {
                    Some(ix) => Term::IVar(ix),
                    None => Term::Global(name.to_owned()),
                },
            },
            Payload::Index(ix) => Term::Var(ix),
            Payload::Global(name) => Term::Global(name.to_owned()),
            Payload::Sort(level) => Term::Sort(level),
            Payload::Hole(name) => {
                let name = name.map_or_else(|| "_".to_owned(), |name| format!("?{name}"));
                return Err(Error::from(ElaborationError::Hole(name)).at(self.location));
            },

            Payload::Pi(binder, ref domain, ref codomain) => Term::Pi {
                name: Name::from(binder.name),
                icity: binder.icity,
                domain: boxed(domain, scope)?,
                codomain: scope.under(binder.name, false, |scope| boxed(codomain, scope))?,
            },
            Payload::Lam(binder, ref annotation, ref body) => Term::Lam {
                name: Name::from(binder.name),
                icity: binder.icity,
                annotation: annotation.as_ref().map(|ann| boxed(ann, scope)).transpose()?,
                body: scope.under(binder.name, false, |scope| boxed(body, scope))?,
            },
            Payload::App(ref function, ref argument, icity) => Term::App {
                function: boxed(function, scope)?,
                argument: boxed(argument, scope)?,
                icity,
            },

            Payload::Sigma(name, ref first, ref second) => Term::Sigma {
                name: Name::from(name),
                first: boxed(first, scope)?,
                second: scope.under(name, false, |scope| boxed(second, scope))?,
            },
            Payload::Pair(ref fst, ref snd) => Term::Pair(boxed(fst, scope)?, boxed(snd, scope)?),
            Payload::Fst(ref pair) => Term::Fst(boxed(pair, scope)?),
            Payload::Snd(ref pair) => Term::Snd(boxed(pair, scope)?),

            Payload::Let(name, ref annotation, ref value, ref body) => Term::Let {
                name: Name::from(name),
                annotation: annotation.as_ref().map(|ann| boxed(ann, scope)).transpose()?,
                value: boxed(value, scope)?,
                body: scope.under(name, false, |scope| boxed(body, scope))?,
            },

            Payload::Meta(id, ref args) => Term::Meta(MetaId(id), Self::realise_all(args, scope)?),

            Payload::Id(ref ty, ref lhs, ref rhs) => Term::Id {
                ty: boxed(ty, scope)?,
                lhs: boxed(lhs, scope)?,
                rhs: boxed(rhs, scope)?,
            },
            Payload::Refl(ref ty, ref point) => Term::Refl {
                ty: boxed(ty, scope)?,
                point: boxed(point, scope)?,
            },
            Payload::J(ref args) => {
                let [ref ty, ref motive, ref base, ref lhs, ref rhs, ref path] = **args;
                Term::J {
                    ty: boxed(ty, scope)?,
                    motive: boxed(motive, scope)?,
                    base: boxed(base, scope)?,
                    lhs: boxed(lhs, scope)?,
                    rhs: boxed(rhs, scope)?,
                    path: boxed(path, scope)?,
                }
            },

            Payload::Interval => Term::Interval,
            Payload::I0 => Term::I0,
            Payload::I1 => Term::I1,
            Payload::IVar(ix) => Term::IVar(ix),

            Payload::Path(ref ty, ref lhs, ref rhs) => Term::Path {
                ty: boxed(ty, scope)?,
                lhs: boxed(lhs, scope)?,
                rhs: boxed(rhs, scope)?,
            },
            Payload::PathP(ref family, ref lhs, ref rhs) => Term::PathP {
                family: scope.under(FAMILY_VARIABLE, true, |scope| boxed(family, scope))?,
                lhs: boxed(lhs, scope)?,
                rhs: boxed(rhs, scope)?,
            },
            Payload::PathLam(name, ref body) => Term::PathLam {
                name: Name::from(name),
                body: scope.under(name, true, |scope| boxed(body, scope))?,
            },
            Payload::PathApp(ref path, ref point) => Term::PathApp {
                path: boxed(path, scope)?,
                point: boxed(point, scope)?,
            },
            Payload::Transport(ref family, ref element) => Term::Transport {
                family: scope.under(FAMILY_VARIABLE, true, |scope| boxed(family, scope))?,
                element: boxed(element, scope)?,
            },

            Payload::HitApp(hit, ctor, ref args, ref iargs) => Term::HitApp {
                hit: hit.to_owned(),
                ctor: ctor.to_owned(),
                args: Self::realise_all(args, scope)?,
                iargs: Self::realise_all(iargs, scope)?,
            },
        };

        Ok(term)
    }
}

impl fmt::Display for Binder<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.icity {
            Icity::Explicit => write!(f, "{}", self.name),
            Icity::Implicit => write!(f, "{{{}}}", self.name),
        }
    }
}

fn list(f: &mut fmt::Formatter, head: &str, args: &[&Builder]) -> fmt::Result {
    write!(f, "({head}")?;
    args.iter().try_for_each(|arg| write!(f, " {arg}"))?;
    write!(f, ")")
}

fn group(f: &mut fmt::Formatter, builders: &[Builder]) -> fmt::Result {
    write!(f, "(")?;
    for (i, builder) in builders.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{builder}")?;
    }
    write!(f, ")")
}

impl fmt::Display for Builder<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.payload.fmt(f)
    }
}

/// Surface terms print back in the S-expression syntax they are read from, with their names.
impl fmt::Display for Payload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Var(name) => write!(f, "{name}"),
            Self::Index(ix) => write!(f, "(Var {ix})"),
            Self::Global(name) => write!(f, "(Global {name})"),
            Self::Sort(0) => write!(f, "Type"),
            Self::Sort(level) => write!(f, "(Sort {level})"),
            Self::Hole(None) => write!(f, "_"),
            Self::Hole(Some(name)) => write!(f, "?{name}"),

            Self::Pi(binder, ref domain, ref codomain) => match binder.icity {
                Icity::Explicit => write!(f, "(Pi {} {domain} {codomain})", binder.name),
                Icity::Implicit => write!(f, "(Pi {{{} {domain}}} {codomain})", binder.name),
            },
            Self::Lam(binder, None, ref body) => write!(f, "(Lam {binder} {body})"),
            Self::Lam(binder, Some(ref ann), ref body) => match binder.icity {
                Icity::Explicit => write!(f, "(Lam {} {ann} {body})", binder.name),
                Icity::Implicit => write!(f, "(Lam {{{} {ann}}} {body})", binder.name),
            },
            Self::App(ref function, ref argument, Icity::Explicit) => write!(f, "(App {function} {argument})"),
            Self::App(ref function, ref argument, Icity::Implicit) => write!(f, "(App {function} {{{argument}}})"),

            Self::Sigma(name, ref first, ref second) => write!(f, "(Sigma {name} {first} {second})"),
            Self::Pair(ref fst, ref snd) => list(f, "Pair", &[fst, snd]),
            Self::Fst(ref pair) => list(f, "Fst", &[pair]),
            Self::Snd(ref pair) => list(f, "Snd", &[pair]),

            Self::Let(name, None, ref value, ref body) => write!(f, "(Let {name} {value} {body})"),
            Self::Let(name, Some(ref ann), ref value, ref body) => write!(f, "(Let {name} {ann} {value} {body})"),

            Self::Meta(id, ref args) => {
                write!(f, "(Meta {id}")?;
                args.iter().try_for_each(|arg| write!(f, " {arg}"))?;
                write!(f, ")")
            },

            Self::Id(ref ty, ref lhs, ref rhs) => list(f, "Id", &[ty, lhs, rhs]),
            Self::Refl(ref ty, ref point) => list(f, "Refl", &[ty, point]),
            Self::J(ref args) => {
                let [ref ty, ref motive, ref base, ref lhs, ref rhs, ref path] = **args;
                list(f, "J", &[ty, motive, base, lhs, rhs, path])
            },

            Self::Interval => write!(f, "I"),
            Self::I0 => write!(f, "i0"),
            Self::I1 => write!(f, "i1"),
            Self::IVar(ix) => write!(f, "(IVar {ix})"),

            Self::Path(ref ty, ref lhs, ref rhs) => list(f, "Path", &[ty, lhs, rhs]),
            Self::PathP(ref family, ref lhs, ref rhs) => list(f, "PathP", &[family, lhs, rhs]),
            Self::PathLam(name, ref body) => write!(f, "(PathLam {name} {body})"),
            Self::PathApp(ref path, ref point) => list(f, "PathApp", &[path, point]),
            Self::Transport(ref family, ref element) => list(f, "Transport", &[family, element]),

            Self::HitApp(hit, ctor, ref args, ref iargs) => {
                write!(f, "(HITApp {hit} {ctor} ")?;
                group(f, args)?;
                write!(f, " ")?;
                group(f, iargs)?;
                write!(f, ")")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use kernel::term::builders::*;

    use super::*;

    fn at(payload: Payload) -> Builder {
        Builder::new(Location::default(), payload)
    }

    fn boxed(payload: Payload) -> Box<Builder> {
        Box::new(at(payload))
    }

    #[test]
    fn names_are_resolved() {
        // (Pi A Type (Pi x A A))
        let builder = at(Payload::Pi(
            Binder::explicit("A"),
            boxed(Payload::Sort(0)),
            boxed(Payload::Pi(Binder::explicit("x"), boxed(Payload::Var("A")), boxed(Payload::Var("A")))),
        ));
        assert_eq!(builder.realise(), Ok(pi("A", sort(0), pi("x", var(0), var(1)))));
        assert_eq!(builder.to_string(), "(Pi A Type (Pi x A A))");
    }

    #[test]
    fn unbound_names_are_globals() {
        let builder = at(Payload::App(boxed(Payload::Var("succ")), boxed(Payload::Var("n")), Icity::Explicit));
        assert_eq!(builder.realise(), Ok(app(global("succ"), global("n"))));
        assert_eq!(builder.realise_with(&["n"]), Ok(app(global("succ"), var(0))));
    }

    #[test]
    fn interval_names() {
        // (PathLam j (PathApp p j)) with p bound outside
        let builder = at(Payload::PathLam(
            "j",
            boxed(Payload::PathApp(boxed(Payload::Var("p")), boxed(Payload::Var("j")))),
        ));
        assert_eq!(builder.realise_with(&["p"]), Ok(path_lam("j", path_app(var(0), Term::IVar(0)))));

        // the family of a transport binds `i`
        let builder = at(Payload::Transport(
            boxed(Payload::PathApp(boxed(Payload::Var("L")), boxed(Payload::Var("i")))),
            boxed(Payload::Var("x")),
        ));
        assert_eq!(
            builder.realise(),
            Ok(Term::Transport {
                family: Box::new(path_app(global("L"), Term::IVar(0))),
                element: Box::new(global("x")),
            })
        );
    }

    #[test]
    fn holes_are_rejected() {
        let builder = at(Payload::App(boxed(Payload::Var("f")), boxed(Payload::Hole(Some("h"))), Icity::Explicit));
        let err = builder.realise().unwrap_err();
        assert_eq!(err.to_string(), "hole ?h cannot appear in a core term");
        assert_eq!(err.kind_name(), "unsolved metas");
    }
}
