//! Errors of the script driver, gathering those of every layer.

use derive_more::{Display, From};
use kernel::location::Location;
use kernel::term::pretty::Rendered;

/// Type representing driver errors, located in the script they were raised on.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display(fmt = "{kind}")]
pub struct Error {
    pub kind: Kind,
    pub location: Option<Location>,
}

#[non_exhaustive]
#[derive(Clone, Debug, Display, Eq, PartialEq, From)]
pub enum Kind {
    Parser(parser::Error),
    Elaboration(elaboration::Error),
    Kernel(kernel::Error),
    Tactic(tactics::Error),

    /// A tactic line that does not name a known tactic, or with wrong arguments.
    #[from(ignore)]
    TacticLine(String),
}

impl Error {
    #[inline]
    #[must_use]
    pub fn new(kind: Kind) -> Self {
        let location = match kind {
            Kind::Parser(ref err) => Some(err.location),
            Kind::Elaboration(ref err) => err.location,
            Kind::Kernel(ref err) => err.location,
            Kind::Tactic(tactics::Error {
                kind: tactics::Kind::Elaboration(ref err),
                ..
            }) => err.location,
            _ => None,
        };
        Self { kind, location }
    }

    /// Moves the error to a line of a script: locations relative to the text of the line are
    /// shifted, and errors without location point at the line itself.
    #[inline]
    #[must_use]
    pub fn within(mut self, line: usize) -> Self {
        self.location = Some(self.location.map_or_else(|| Location::line(line), |location| location.offset_lines(line)));
        self
    }

    /// Short name of the class of error, as shown in diagnostics.
    #[inline]
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            Kind::Parser(ref err) => err.kind_name(),
            Kind::Elaboration(ref err) => err.kind_name(),
            Kind::Kernel(ref err) => err.kind_name(),
            Kind::Tactic(ref err) => err.kind_name(),
            Kind::TacticLine(_) => "parse error",
        }
    }

    /// The expected and actual sides of a mismatch, when the error is one.
    #[inline]
    #[must_use]
    pub fn sides(&self) -> Option<(&Rendered, &Rendered)> {
        match self.kind {
            Kind::Parser(parser::Error {
                kind: parser::ErrorKind::Elaboration(ref err),
                ..
            })
            | Kind::Elaboration(ref err) => err.sides(),
            Kind::Kernel(kernel::Error {
                kind: kernel::Kind::TypeChecker(ref err),
                ..
            }) => err.sides(),
            Kind::Tactic(ref err) => err.sides(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn hints(&self) -> &[String] {
        match self.kind {
            Kind::Tactic(ref err) => &err.hints,
            _ => &[],
        }
    }

    /// The goal a failing tactic was applied to.
    #[inline]
    #[must_use]
    pub fn goal(&self) -> Option<&str> {
        match self.kind {
            Kind::Tactic(ref err) => err.goal.as_deref(),
            _ => None,
        }
    }
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

from_kind!(parser::Error, elaboration::Error, kernel::Error, tactics::Error);

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
    use super::*;

    #[test]
    fn relocation() {
        let err = Error::new(Kind::TacticLine("unknown tactic: frob".to_owned())).within(7);
        assert_eq!(err.location, Some(Location::line(7)));
        assert_eq!(err.kind_name(), "parse error");

        let err: Error = parser::parse_surface("(Pi x").unwrap_err().into();
        let relocated = err.clone().within(3);
        assert_eq!(relocated.location.map(|location| location.start.line), Some(3));
        assert_eq!(
            relocated.location.map(|location| location.start.column),
            err.location.map(|location| location.start.column)
        );
    }
}
