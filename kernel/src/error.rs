//! Errors that can be yielded by the kernel

use derive_more::{Display, From};

use crate::environment::EnvironmentError;
use crate::location::Location;
use crate::meta::MetaError;
use crate::type_checker::TypeCheckerError;
use crate::zonk::UnsolvedMetas;

/// Type representing kernel errors.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display(fmt = "{kind}")]
pub struct Error {
    /// The kind of form error that occurred.
    pub kind: Kind,

    /// The source span the error originates from, when known.
    pub location: Option<Location>,
}

impl Error {
    /// Creates a new error from a kind, without location.
    #[inline]
    #[must_use]
    pub const fn new(kind: Kind) -> Self {
        Self { kind, location: None }
    }

    /// Signals a violated internal invariant.
    #[inline]
    #[must_use]
    pub fn bug<S: Into<String>>(message: S) -> Self {
        Self::new(Kind::KernelBug(message.into()))
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
            Kind::TypeChecker(ref err) => err.kind_name(),
            Kind::Meta(_) => "meta",
            Kind::Environment(_) => "environment",
            Kind::UnsolvedMetas(_) => "unsolved metas",
            Kind::KernelBug(_) => "kernel bug",
        }
    }
}

/// The kind of the error. This disambiguate between the different sections of the kernel, where
/// the errors are respectively defined.
#[non_exhaustive]
#[derive(Clone, Debug, Display, Eq, PartialEq, From)]
pub enum Kind {
    TypeChecker(TypeCheckerError),
    Meta(MetaError),
    Environment(EnvironmentError),
    UnsolvedMetas(UnsolvedMetas),

    /// An internal invariant does not hold; never caused by user input.
    #[display(fmt = "kernel bug: {}", _0)]
    #[from(ignore)]
    KernelBug(String),
}

impl std::error::Error for Error {}

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

from_kind!(TypeCheckerError, MetaError, EnvironmentError, UnsolvedMetas);

pub type Result<T> = core::result::Result<T, Error>;
pub type ResultTerm = Result<crate::term::Term>;
