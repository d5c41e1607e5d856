//! Errors raised while elaborating surface terms.

use derive_more::{Display, From};
use kernel::location::Location;
use kernel::term::pretty::Rendered;
use kernel::term::MetaId;

/// Failures specific to the elaborator.
#[non_exhaustive]
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum ElaborationError {
    #[display(fmt = "unbound variable {}", _0)]
    UnboundName(String),

    #[display(fmt = "cannot infer the type of the unannotated abstraction over {}", _0)]
    UnannotatedAbstraction(String),

    #[display(fmt = "hole {} cannot appear in a core term", _0)]
    Hole(String),

    #[display(fmt = "metavariable {id} expects {expected} arguments, got {actual}")]
    MetaArity { id: MetaId, expected: usize, actual: usize },

    /// Unification problems that remained outside of the pattern fragment.
    #[display(fmt = "ambiguous elaboration, cannot solve {}", _0)]
    Ambiguous(String),
}

/// Failures of the unifier.
#[non_exhaustive]
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum UnificationError {
    #[display(fmt = "cannot unify {lhs} with {rhs}")]
    Mismatch { lhs: Rendered, rhs: Rendered },

    #[display(fmt = "{meta} occurs in its own solution {term}")]
    OccursCheck { meta: MetaId, term: Rendered },

    #[display(fmt = "the solution {term} of {meta} mentions variables out of its scope")]
    ScopeEscape { meta: MetaId, term: Rendered },
}

/// Type representing elaboration errors.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display(fmt = "{kind}")]
pub struct Error {
    pub kind: Kind,
    pub location: Option<Location>,
}

#[non_exhaustive]
#[derive(Clone, Debug, Display, Eq, PartialEq, From)]
pub enum Kind {
    Kernel(kernel::error::Kind),
    Elaboration(ElaborationError),
    Unification(UnificationError),
}

impl Error {
    #[inline]
    #[must_use]
    pub const fn new(kind: Kind) -> Self {
        Self { kind, location: None }
    }

    /// Attaches a location to the error, unless a more precise one is already known.
    #[inline]
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location.get_or_insert(location);
        self
    }

    /// Short name of the class of error, as shown in diagnostics.
    #[inline]
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            Kind::Kernel(ref kind) => kernel::Error::new(kind.clone()).kind_name(),
            Kind::Elaboration(ElaborationError::UnboundName(_)) => "unbound name",
            Kind::Elaboration(ElaborationError::UnannotatedAbstraction(_) | ElaborationError::Ambiguous(_)) => {
                "ambiguous"
            },
            Kind::Elaboration(ElaborationError::Hole(_)) => "unsolved metas",
            Kind::Elaboration(ElaborationError::MetaArity { .. }) => "meta",
            Kind::Unification(UnificationError::Mismatch { .. }) => "type mismatch",
            Kind::Unification(UnificationError::OccursCheck { .. }) => "occurs check",
            Kind::Unification(UnificationError::ScopeEscape { .. }) => "scope escape",
        }
    }

    /// The expected and actual sides of a mismatch, when the error is one.
    #[inline]
    #[must_use]
    pub fn sides(&self) -> Option<(&Rendered, &Rendered)> {
        match self.kind {
            Kind::Kernel(kernel::Kind::TypeChecker(ref err)) => err.sides(),
            Kind::Unification(UnificationError::Mismatch { ref lhs, ref rhs }) => Some((lhs, rhs)),
            _ => None,
        }
    }
}

impl std::error::Error for Error {}

impl From<kernel::Error> for Error {
    #[inline]
    fn from(err: kernel::Error) -> Self {
        Self {
            kind: Kind::Kernel(err.kind),
            location: err.location,
        }
    }
}

macro_rules! from_kind {
    ($($kind:ty),*) => {
        $(impl From<$kind> for Error {
            #[inline]
            fn from(err: $kind) -> Self {
                Self::new(err.into())
            }
        })*
    };
}

from_kind!(ElaborationError, UnificationError);

macro_rules! from_kernel {
    ($($kind:ty),*) => {
        $(impl From<$kind> for Error {
            #[inline]
            fn from(err: $kind) -> Self {
                kernel::Error::from(err).into()
            }
        })*
    };
}

from_kernel!(
    kernel::type_checker::TypeCheckerError,
    kernel::meta::MetaError,
    kernel::environment::EnvironmentError,
    kernel::zonk::UnsolvedMetas
);

pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use kernel::term::builders::*;
    use kernel::term::Term;
    use kernel::type_checker::TypeCheckerError;

    use super::*;

    #[test]
    fn kind_names() {
        let err: Error = ElaborationError::UnboundName("x".to_owned()).into();
        assert_eq!(err.kind_name(), "unbound name");
        assert_eq!(err.to_string(), "unbound variable x");

        let err: Error = TypeCheckerError::SortExpected(Rendered::new(global("zero"), Vec::new())).into();
        assert_eq!(err.kind_name(), "sort expected");

        let err: Error = UnificationError::OccursCheck {
            meta: MetaId(3),
            term: Rendered::new(app(global("succ"), Term::meta(MetaId(3), 0)), Vec::new()),
        }
        .into();
        assert_eq!(err.kind_name(), "occurs check");
        assert_eq!(err.to_string(), "?3 occurs in its own solution (App succ (Meta 3))");
    }

    #[test]
    fn locations_are_kept() {
        let location = Location::new((1, 2).into(), (1, 5).into());
        let err: Error = kernel::Error::from(TypeCheckerError::UnboundVariable(4)).at(location).into();
        assert_eq!(err.location, Some(location));

        let other = Location::new((3, 1).into(), (3, 2).into());
        assert_eq!(err.at(other).location, Some(location));
    }
}
