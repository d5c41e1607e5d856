//! Core terms of the theory, and their de Bruijn algebra.
//!
//! Variables are de Bruijn indices, `0` being the innermost binder. Interval variables live in a
//! separate index space: they are bound by path abstractions and by the type families of `PathP`
//! and `Transport`, and ordinary binders leave them untouched (and conversely).

pub mod builders;
pub mod pretty;

use core::convert::Infallible;

use derive_more::{Display, From};

use crate::error::{Error, Result};

/// Universe levels are fixed natural numbers.
pub type Level = usize;

/// Identifier of a metavariable in a [`MetaStore`](crate::meta::MetaStore).
#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
#[display(fmt = "?{}", _0)]
pub struct MetaId(pub usize);

/// A binder name. Names are printing hints only: any two names compare equal, so that the
/// structural equality of terms is α-equivalence.
#[derive(Clone, Debug, Default, From)]
pub struct Name(String);

impl Name {
    #[inline]
    #[must_use]
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        if self.0.is_empty() { "_" } else { &self.0 }
    }

    /// Whether this name can be used to refer to its binder.
    #[inline]
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty() || self.0 == "_"
    }
}

impl From<&str> for Name {
    #[inline]
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl PartialEq for Name {
    #[inline]
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl Eq for Name {}

impl core::fmt::Display for Name {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a binder, or an argument, is explicit or implicit.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum Icity {
    #[default]
    #[display(fmt = "explicit")]
    Explicit,

    #[display(fmt = "implicit")]
    Implicit,
}

/// The core term language.
///
/// `PartialEq` is α-equivalence: binder names are ignored, see [`Name`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Term {
    Var(usize),
    Global(String),
    Sort(Level),

    Pi {
        name: Name,
        icity: Icity,
        domain: Box<Term>,
        codomain: Box<Term>,
    },

    Lam {
        name: Name,
        icity: Icity,
        annotation: Option<Box<Term>>,
        body: Box<Term>,
    },

    App {
        function: Box<Term>,
        argument: Box<Term>,
        icity: Icity,
    },

    Sigma {
        name: Name,
        first: Box<Term>,
        second: Box<Term>,
    },

    Pair(Box<Term>, Box<Term>),
    Fst(Box<Term>),
    Snd(Box<Term>),

    Let {
        name: Name,
        annotation: Option<Box<Term>>,
        value: Box<Term>,
        body: Box<Term>,
    },

    /// A metavariable applied to the variables of the context it was created in.
    Meta(MetaId, Vec<Term>),

    Id {
        ty: Box<Term>,
        lhs: Box<Term>,
        rhs: Box<Term>,
    },

    Refl {
        ty: Box<Term>,
        point: Box<Term>,
    },

    J {
        ty: Box<Term>,
        motive: Box<Term>,
        base: Box<Term>,
        lhs: Box<Term>,
        rhs: Box<Term>,
        path: Box<Term>,
    },

    Interval,
    I0,
    I1,
    IVar(usize),

    Path {
        ty: Box<Term>,
        lhs: Box<Term>,
        rhs: Box<Term>,
    },

    /// Dependent path type; `family` has interval variable `0` free.
    PathP {
        family: Box<Term>,
        lhs: Box<Term>,
        rhs: Box<Term>,
    },

    PathLam {
        name: Name,
        body: Box<Term>,
    },

    PathApp {
        path: Box<Term>,
        point: Box<Term>,
    },

    /// Transport along a line of types; `family` has interval variable `0` free.
    Transport {
        family: Box<Term>,
        element: Box<Term>,
    },

    /// Application of a constructor of a higher inductive type to its arguments, and to its
    /// interval arguments when it is a path constructor.
    HitApp {
        hit: String,
        ctor: String,
        args: Vec<Term>,
        iargs: Vec<Term>,
    },
}

use Term::*;

impl Term {
    /// The direct subterms of a term, with the number of term and interval binders crossed to
    /// reach each of them.
    #[must_use]
    pub fn children(&self) -> Vec<(&Self, usize, usize)> {
        match *self {
            Var(_) | Global(_) | Sort(_) | Interval | I0 | I1 | IVar(_) => Vec::new(),

            Pi {
                ref domain,
                ref codomain,
                ..
            } => vec![(&**domain, 0, 0), (&**codomain, 1, 0)],

            Lam {
                ref annotation,
                ref body,
                ..
            } => {
                let mut children: Vec<(&Self, usize, usize)> = annotation.iter().map(|ann| (&**ann, 0, 0)).collect();
                children.push((&**body, 1, 0));
                children
            },

            App {
                ref function,
                ref argument,
                ..
            } => vec![(&**function, 0, 0), (&**argument, 0, 0)],

            Sigma {
                ref first, ref second, ..
            } => vec![(&**first, 0, 0), (&**second, 1, 0)],

            Pair(ref fst, ref snd) => vec![(&**fst, 0, 0), (&**snd, 0, 0)],
            Fst(ref pair) | Snd(ref pair) => vec![(&**pair, 0, 0)],

            Let {
                ref annotation,
                ref value,
                ref body,
                ..
            } => {
                let mut children: Vec<(&Self, usize, usize)> = annotation.iter().map(|ann| (&**ann, 0, 0)).collect();
                children.push((&**value, 0, 0));
                children.push((&**body, 1, 0));
                children
            },

            Meta(_, ref args) => args.iter().map(|arg| (arg, 0, 0)).collect(),

            Id {
                ref ty,
                ref lhs,
                ref rhs,
            }
            | Path {
                ref ty,
                ref lhs,
                ref rhs,
            } => vec![(&**ty, 0, 0), (&**lhs, 0, 0), (&**rhs, 0, 0)],

            Refl { ref ty, ref point } => vec![(&**ty, 0, 0), (&**point, 0, 0)],

            J {
                ref ty,
                ref motive,
                ref base,
                ref lhs,
                ref rhs,
                ref path,
            } => vec![(&**ty, 0, 0), (&**motive, 0, 0), (&**base, 0, 0), (&**lhs, 0, 0), (&**rhs, 0, 0), (&**path, 0, 0)],

            PathP {
                ref family,
                ref lhs,
                ref rhs,
            } => vec![(&**family, 0, 1), (&**lhs, 0, 0), (&**rhs, 0, 0)],

            PathLam { ref body, .. } => vec![(&**body, 0, 1)],

            PathApp { ref path, ref point } => vec![(&**path, 0, 0), (&**point, 0, 0)],

            Transport {
                ref family,
                ref element,
            } => vec![(&**family, 0, 1), (&**element, 0, 0)],

            HitApp {
                ref args, ref iargs, ..
            } => args.iter().chain(iargs.iter()).map(|arg| (arg, 0, 0)).collect(),
        }
    }

    /// Whether `f` holds on some subterm, `f` being given the number of term and interval binders
    /// crossed from the root (offset by `depth` and `idepth`).
    pub fn any<F>(&self, depth: usize, idepth: usize, f: &mut F) -> bool
    where
        F: FnMut(&Self, usize, usize) -> bool,
    {
        f(self, depth, idepth)
            || self
                .children()
                .into_iter()
                .any(|(child, d, e)| child.any(depth + d, idepth + e, &mut *f))
    }

    /// Rebuilds a term bottom-up. On each subterm, `f` may return a replacement, in which case
    /// the traversal does not go further down; otherwise, the subterm is rebuilt from its
    /// transformed children.
    pub fn try_map<E, F>(&self, depth: usize, idepth: usize, f: &mut F) -> core::result::Result<Self, E>
    where
        F: FnMut(&Self, usize, usize) -> core::result::Result<Option<Self>, E>,
    {
        if let Some(term) = f(self, depth, idepth)? {
            return Ok(term);
        }

        let mut go = |term: &Self, d: usize, e: usize| -> core::result::Result<Box<Self>, E> {
            Ok(Box::new(term.try_map(depth + d, idepth + e, &mut *f)?))
        };

        Ok(match *self {
            Var(_) | Global(_) | Sort(_) | Interval | I0 | I1 | IVar(_) => self.clone(),

            Pi {
                ref name,
                icity,
                ref domain,
                ref codomain,
            } => Pi {
                name: name.clone(),
                icity,
                domain: go(domain, 0, 0)?,
                codomain: go(codomain, 1, 0)?,
            },

            Lam {
                ref name,
                icity,
                ref annotation,
                ref body,
            } => Lam {
                name: name.clone(),
                icity,
                annotation: annotation.as_ref().map(|ann| go(ann, 0, 0)).transpose()?,
                body: go(body, 1, 0)?,
            },

            App {
                ref function,
                ref argument,
                icity,
            } => App {
                function: go(function, 0, 0)?,
                argument: go(argument, 0, 0)?,
                icity,
            },

            Sigma {
                ref name,
                ref first,
                ref second,
            } => Sigma {
                name: name.clone(),
                first: go(first, 0, 0)?,
                second: go(second, 1, 0)?,
            },

            Pair(ref fst, ref snd) => Pair(go(fst, 0, 0)?, go(snd, 0, 0)?),
            Fst(ref pair) => Fst(go(pair, 0, 0)?),
            Snd(ref pair) => Snd(go(pair, 0, 0)?),

            Let {
                ref name,
                ref annotation,
                ref value,
                ref body,
            } => Let {
                name: name.clone(),
                annotation: annotation.as_ref().map(|ann| go(ann, 0, 0)).transpose()?,
                value: go(value, 0, 0)?,
                body: go(body, 1, 0)?,
            },

            Meta(id, ref args) => Meta(
                id,
                args.iter()
                    .map(|arg| go(arg, 0, 0).map(|arg| *arg))
                    .collect::<core::result::Result<_, _>>()?,
            ),

            Id {
                ref ty,
                ref lhs,
                ref rhs,
            } => Id {
                ty: go(ty, 0, 0)?,
                lhs: go(lhs, 0, 0)?,
                rhs: go(rhs, 0, 0)?,
            },

            Refl { ref ty, ref point } => Refl {
                ty: go(ty, 0, 0)?,
                point: go(point, 0, 0)?,
            },

            J {
                ref ty,
                ref motive,
                ref base,
                ref lhs,
                ref rhs,
                ref path,
            } => J {
                ty: go(ty, 0, 0)?,
                motive: go(motive, 0, 0)?,
                base: go(base, 0, 0)?,
                lhs: go(lhs, 0, 0)?,
                rhs: go(rhs, 0, 0)?,
                path: go(path, 0, 0)?,
            },

            Path {
                ref ty,
                ref lhs,
                ref rhs,
            } => Path {
                ty: go(ty, 0, 0)?,
                lhs: go(lhs, 0, 0)?,
                rhs: go(rhs, 0, 0)?,
            },

            PathP {
                ref family,
                ref lhs,
                ref rhs,
            } => PathP {
                family: go(family, 0, 1)?,
                lhs: go(lhs, 0, 0)?,
                rhs: go(rhs, 0, 0)?,
            },

            PathLam { ref name, ref body } => PathLam {
                name: name.clone(),
                body: go(body, 0, 1)?,
            },

            PathApp { ref path, ref point } => PathApp {
                path: go(path, 0, 0)?,
                point: go(point, 0, 0)?,
            },

            Transport {
                ref family,
                ref element,
            } => Transport {
                family: go(family, 0, 1)?,
                element: go(element, 0, 0)?,
            },

            HitApp {
                ref hit,
                ref ctor,
                ref args,
                ref iargs,
            } => HitApp {
                hit: hit.clone(),
                ctor: ctor.clone(),
                args: args
                    .iter()
                    .map(|arg| go(arg, 0, 0).map(|arg| *arg))
                    .collect::<core::result::Result<_, _>>()?,
                iargs: iargs
                    .iter()
                    .map(|arg| go(arg, 0, 0).map(|arg| *arg))
                    .collect::<core::result::Result<_, _>>()?,
            },
        })
    }

    /// Infallible version of [`Term::try_map`].
    pub fn map<F>(&self, depth: usize, idepth: usize, f: &mut F) -> Self
    where
        F: FnMut(&Self, usize, usize) -> Option<Self>,
    {
        match self.try_map::<Infallible, _>(depth, idepth, &mut |term, d, e| Ok(f(term, d, e))) {
            Ok(term) => term,
            Err(never) => match never {},
        }
    }

    /// Adds `delta` to every variable `ix >= cutoff`. The cutoff grows under each binder.
    ///
    /// # Errors
    /// Fails with a kernel bug if some variable would become negative.
    pub fn shift(&self, delta: isize, cutoff: usize) -> Result<Self> {
        if delta == 0 {
            return Ok(self.clone());
        }

        self.try_map(cutoff, 0, &mut |term, depth, _| match *term {
            Var(ix) if ix >= depth => ix
                .checked_add_signed(delta)
                .map(|ix| Some(Var(ix)))
                .ok_or_else(|| Error::bug(format!("variable {ix} shifted by {delta} is out of range"))),
            _ => Ok(None),
        })
    }

    /// Weakening: the non-negative, hence infallible, case of [`Term::shift`].
    #[must_use]
    pub fn lift(&self, delta: usize, cutoff: usize) -> Self {
        if delta == 0 {
            return self.clone();
        }

        self.map(cutoff, 0, &mut |term, depth, _| match *term {
            Var(ix) if ix >= depth => Some(Var(ix + delta)),
            _ => None,
        })
    }

    /// Replaces `Var(j)` by `u`, where `u` lives in the context of `self` stripped of its `j + 1`
    /// innermost bindings, and lowers the variables bound outside of `Var(j)`.
    #[must_use]
    pub fn subst(&self, j: usize, u: &Self) -> Self {
        self.map(0, 0, &mut |term, depth, idepth| match *term {
            Var(ix) if ix == j + depth => Some(u.lift(j + depth, 0).ilift(idepth, 0)),
            Var(ix) if ix > j + depth => Some(Var(ix - 1)),
            _ => None,
        })
    }

    /// Interval weakening.
    #[must_use]
    pub fn ilift(&self, delta: usize, cutoff: usize) -> Self {
        if delta == 0 {
            return self.clone();
        }

        self.map(0, cutoff, &mut |term, _, idepth| match *term {
            IVar(ix) if ix >= idepth => Some(IVar(ix + delta)),
            _ => None,
        })
    }

    /// Replaces the interval variable `j` by `r`.
    #[must_use]
    pub fn isubst(&self, j: usize, r: &Self) -> Self {
        self.map(0, 0, &mut |term, depth, idepth| match *term {
            IVar(ix) if ix == j + idepth => Some(r.ilift(j + idepth, 0).lift(depth, 0)),
            IVar(ix) if ix > j + idepth => Some(IVar(ix - 1)),
            _ => None,
        })
    }

    /// Simultaneous substitution of a whole context: `self` lives in a context of `args.len()`
    /// bindings, the first argument standing for the outermost one. Variables beyond that
    /// context are lowered accordingly.
    #[must_use]
    pub fn instantiate(&self, args: &[Self]) -> Self {
        let len = args.len();
        if len == 0 {
            return self.clone();
        }

        self.map(0, 0, &mut |term, depth, idepth| match *term {
            Var(ix) if ix >= depth => Some(match args.get(len.wrapping_sub(ix - depth + 1)) {
                Some(arg) if ix - depth < len => arg.lift(depth, 0).ilift(idepth, 0),
                _ => Var(ix - len),
            }),
            _ => None,
        })
    }

    /// Replaces `Var(ix)` by `u`, both living in the same context, leaving other variables alone.
    #[must_use]
    pub fn replace_var(&self, ix: usize, u: &Self) -> Self {
        self.map(0, 0, &mut |term, depth, idepth| match *term {
            Var(k) if k == ix + depth => Some(u.lift(depth, 0).ilift(idepth, 0)),
            _ => None,
        })
    }

    /// Replaces every occurrence of `pattern` by `Var(ix)`, both living in the context of `self`.
    #[must_use]
    pub fn abstract_occurrences(&self, pattern: &Self, ix: usize) -> Self {
        self.map(0, 0, &mut |term, depth, idepth| {
            (*term == pattern.lift(depth, 0).ilift(idepth, 0)).then_some(Var(ix + depth))
        })
    }

    /// Whether `Var(ix)` occurs free.
    #[must_use]
    pub fn has_free_var(&self, ix: usize) -> bool {
        self.any(0, 0, &mut |term, depth, _| matches!(*term, Var(k) if k == ix + depth))
    }

    /// Whether interval variable `ix` occurs free.
    #[must_use]
    pub fn has_free_ivar(&self, ix: usize) -> bool {
        self.any(0, 0, &mut |term, _, idepth| matches!(*term, IVar(k) if k == ix + idepth))
    }

    /// The metavariable standing for a term in a context of `depth` bindings.
    #[must_use]
    pub fn meta(id: MetaId, depth: usize) -> Self {
        Meta(id, (0..depth).rev().map(Var).collect())
    }

    /// Applies `self` to several explicit arguments.
    #[must_use]
    pub fn apply<I: IntoIterator<Item = Self>>(self, args: I) -> Self {
        args.into_iter().fold(self, |function, argument| App {
            function: Box::new(function),
            argument: Box::new(argument),
            icity: Icity::Explicit,
        })
    }

    /// Splits an application into its head and its arguments.
    #[must_use]
    pub fn spine(&self) -> (&Self, Vec<&Self>) {
        let mut head = self;
        let mut args = Vec::new();
        while let App {
            ref function,
            ref argument,
            ..
        } = *head
        {
            args.push(&**argument);
            head = function;
        }
        args.reverse();
        (head, args)
    }

    /// The name of the global this term is an application of, if any.
    #[must_use]
    pub fn head_global(&self) -> Option<&str> {
        match *self.spine().0 {
            Global(ref name) => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::builders::*;
    use super::*;

    #[test]
    fn equality_ignores_binder_names() {
        let x = lam("x", global("Nat"), var(0));
        let y = lam("y", global("Nat"), var(0));
        assert_eq!(x, y);
        assert_ne!(x.to_string(), y.to_string());
        assert_ne!(x, lam("x", global("Bool"), var(0)));
    }

    /// A few open terms exercising every binder of the syntax.
    fn samples() -> Vec<Term> {
        vec![
            var(0),
            var(3),
            pi("x", var(0), app(var(1), var(0))),
            lam("x", var(2), app(var(0), var(3))),
            lam_untyped("y", pair(var(0), var(1))),
            sigma("p", global("Nat"), id(global("Nat"), var(0), var(2))),
            Let {
                name: "v".into(),
                annotation: Some(Box::new(var(0))),
                value: Box::new(var(1)),
                body: Box::new(app(var(0), var(2))),
            },
            Term::meta(MetaId(4), 3),
            J {
                ty: Box::new(var(0)),
                motive: Box::new(lam("y", var(0), lam("p", id(var(1), var(2), var(0)), sort(0)))),
                base: Box::new(var(1)),
                lhs: Box::new(var(2)),
                rhs: Box::new(var(2)),
                path: Box::new(refl(var(0), var(2))),
            },
            PathLam {
                name: "i".into(),
                body: Box::new(PathApp {
                    path: Box::new(var(1)),
                    point: Box::new(IVar(0)),
                }),
            },
            Transport {
                family: Box::new(app(var(0), IVar(0))),
                element: Box::new(var(4)),
            },
        ]
    }

    #[test]
    fn shift_zero_is_identity() {
        for term in samples() {
            for cutoff in 0..4 {
                assert_eq!(term.shift(0, cutoff), Ok(term.clone()));
            }
        }
    }

    #[test]
    fn shift_composes() {
        for term in samples() {
            for (d1, d2) in [(1, 2), (3, 0), (2, 5)] {
                let twice = term.shift(d2, 0).and_then(|t| t.shift(d1, 0));
                assert_eq!(twice, term.shift(d1 + d2, 0));
            }
            let back = term.shift(3, 0).and_then(|t| t.shift(-3, 0));
            assert_eq!(back, Ok(term.clone()));
        }
    }

    #[test]
    fn subst_cancels_weakening() {
        for term in samples() {
            for u in [var(0), global("zero"), lam("z", global("Nat"), var(1))] {
                assert_eq!(term.lift(1, 0).subst(0, &u), term);
            }
        }
    }

    #[test]
    fn negative_shift_is_a_kernel_bug() {
        let err = var(0).shift(-1, 0).unwrap_err();
        assert_eq!(err.kind_name(), "kernel bug");
        assert_eq!(var(0).shift(-1, 1), Ok(var(0)));
    }

    #[test]
    fn shift_under_binders() {
        let term = pi("x", var(0), app(var(0), var(1)));
        assert_eq!(term.lift(2, 0), pi("x", var(2), app(var(0), var(3))));
    }

    #[test]
    fn subst_under_binders() {
        // (λx. x 1) [0 := zero] = λx. x zero
        let term = lam("x", global("Nat"), app(var(0), var(1)));
        assert_eq!(term.subst(0, &global("zero")), lam("x", global("Nat"), app(var(0), global("zero"))));

        // substituted terms are weakened under binders
        let term = lam("x", global("Nat"), var(1));
        assert_eq!(term.subst(0, &var(5)), lam("x", global("Nat"), var(6)));

        // outer variables are lowered
        assert_eq!(var(3).subst(1, &global("a")), var(2));
        assert_eq!(var(0).subst(1, &global("a")), var(0));
    }

    #[test]
    fn interval_binders_are_separate() {
        let term = PathLam {
            name: "i".into(),
            body: Box::new(app(var(0), IVar(0))),
        };
        // term binders are not crossed
        assert_eq!(term.subst(0, &global("f")), PathLam {
            name: "i".into(),
            body: Box::new(app(global("f"), IVar(0)))
        });
        // but interval substitution skips the path binder
        let open = app(var(0), IVar(0));
        assert_eq!(open.isubst(0, &I1), app(var(0), I1));
        assert_eq!(term.isubst(0, &I1), term);
    }

    #[test]
    fn instantiate_whole_context() {
        // in context [a, b], (b a) with a := zero, b := succ
        let term = app(var(0), var(1));
        assert_eq!(term.instantiate(&[global("zero"), global("succ")]), app(global("succ"), global("zero")));
        assert_eq!(
            lam("x", global("Nat"), app(var(1), var(0))).instantiate(&[var(7)]),
            lam("x", global("Nat"), app(var(8), var(0)))
        );
    }

    #[test]
    fn names_are_ignored() {
        assert_eq!(lam("x", sort(0), var(0)), lam("y", sort(0), var(0)));
        assert_ne!(lam("x", sort(0), var(0)), lam("x", sort(1), var(0)));
    }

    #[test]
    fn abstract_occurrences() {
        let term = pi("x", global("Nat"), id(global("Nat"), var(1), var(0)));
        assert_eq!(term.abstract_occurrences(&var(0), 3), pi("x", global("Nat"), id(global("Nat"), var(4), var(0))));
    }
}
