//! Shorthands to build core terms by hand, mostly used by the builtin declarations and by tests.

use super::{Icity, Level, Name, Term};

#[inline]
#[must_use]
pub const fn var(ix: usize) -> Term {
    Term::Var(ix)
}

#[inline]
#[must_use]
pub fn global(name: &str) -> Term {
    Term::Global(name.to_owned())
}

#[inline]
#[must_use]
pub const fn sort(level: Level) -> Term {
    Term::Sort(level)
}

#[inline]
#[must_use]
pub fn pi<N: Into<Name>>(name: N, domain: Term, codomain: Term) -> Term {
    Term::Pi {
        name: name.into(),
        icity: Icity::Explicit,
        domain: Box::new(domain),
        codomain: Box::new(codomain),
    }
}

#[inline]
#[must_use]
pub fn implicit_pi<N: Into<Name>>(name: N, domain: Term, codomain: Term) -> Term {
    Term::Pi {
        name: name.into(),
        icity: Icity::Implicit,
        domain: Box::new(domain),
        codomain: Box::new(codomain),
    }
}

/// Non-dependent function type, `codomain` living in the same context as `domain`.
#[inline]
#[must_use]
pub fn arrow(domain: Term, codomain: Term) -> Term {
    pi("_", domain, codomain.lift(1, 0))
}

#[inline]
#[must_use]
pub fn lam<N: Into<Name>>(name: N, annotation: Term, body: Term) -> Term {
    Term::Lam {
        name: name.into(),
        icity: Icity::Explicit,
        annotation: Some(Box::new(annotation)),
        body: Box::new(body),
    }
}

#[inline]
#[must_use]
pub fn lam_untyped<N: Into<Name>>(name: N, body: Term) -> Term {
    Term::Lam {
        name: name.into(),
        icity: Icity::Explicit,
        annotation: None,
        body: Box::new(body),
    }
}

#[inline]
#[must_use]
pub fn app(function: Term, argument: Term) -> Term {
    Term::App {
        function: Box::new(function),
        argument: Box::new(argument),
        icity: Icity::Explicit,
    }
}

#[inline]
#[must_use]
pub fn sigma<N: Into<Name>>(name: N, first: Term, second: Term) -> Term {
    Term::Sigma {
        name: name.into(),
        first: Box::new(first),
        second: Box::new(second),
    }
}

#[inline]
#[must_use]
pub fn pair(fst: Term, snd: Term) -> Term {
    Term::Pair(Box::new(fst), Box::new(snd))
}

#[inline]
#[must_use]
pub fn id(ty: Term, lhs: Term, rhs: Term) -> Term {
    Term::Id {
        ty: Box::new(ty),
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

#[inline]
#[must_use]
pub fn refl(ty: Term, point: Term) -> Term {
    Term::Refl {
        ty: Box::new(ty),
        point: Box::new(point),
    }
}

#[inline]
#[must_use]
pub fn path(ty: Term, lhs: Term, rhs: Term) -> Term {
    Term::Path {
        ty: Box::new(ty),
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

#[inline]
#[must_use]
pub fn path_lam<N: Into<Name>>(name: N, body: Term) -> Term {
    Term::PathLam {
        name: name.into(),
        body: Box::new(body),
    }
}

#[inline]
#[must_use]
pub fn path_app(path: Term, point: Term) -> Term {
    Term::PathApp {
        path: Box::new(path),
        point: Box::new(point),
    }
}
