//! Tactic failures.

use derive_more::{Display, From};
use kernel::term::pretty::Rendered;

/// Type representing tactic errors.
///
/// Besides its kind, a failure remembers the goal it happened on, and suggestions for the user.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display(fmt = "{kind}")]
pub struct Error {
    pub kind: Kind,

    /// The goal the tactic was applied to, as displayed to the user.
    pub goal: Option<String>,

    pub hints: Vec<String>,
}

#[non_exhaustive]
#[derive(Clone, Debug, Display, Eq, PartialEq, From)]
pub enum Kind {
    /// A precondition of the tactic does not hold.
    #[from(ignore)]
    Failed(String),

    Kernel(kernel::Error),
    Elaboration(elaboration::Error),
}

impl Error {
    #[inline]
    #[must_use]
    pub const fn new(kind: Kind) -> Self {
        Self {
            kind,
            goal: None,
            hints: Vec::new(),
        }
    }

    /// A failed precondition.
    #[inline]
    #[must_use]
    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self::new(Kind::Failed(message.into()))
    }

    /// Records the goal the failure happened on, unless one is already known.
    #[inline]
    #[must_use]
    pub fn on_goal(mut self, goal: String) -> Self {
        self.goal.get_or_insert(goal);
        self
    }

    #[inline]
    #[must_use]
    pub fn hint<S: Into<String>>(mut self, hint: S) -> Self {
        self.hints.push(hint.into());
        self
    }

    /// Short name of the class of error, as shown in diagnostics.
    #[inline]
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            Kind::Failed(_) => "tactic failed",
            Kind::Kernel(ref err) => err.kind_name(),
            Kind::Elaboration(ref err) => err.kind_name(),
        }
    }

    /// The expected and actual types of a mismatch, when the failure is one.
    #[inline]
    #[must_use]
    pub fn sides(&self) -> Option<(&Rendered, &Rendered)> {
        match self.kind {
            Kind::Kernel(kernel::Error {
                kind: kernel::Kind::TypeChecker(ref err),
                ..
            }) => err.sides(),
            Kind::Elaboration(ref err) => err.sides(),
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

from_kind!(kernel::Error, elaboration::Error);

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

/// The result of running a tactic on a proof state, which it modifies in place.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let err = Error::failed("no goals").hint("try Qed");
        assert_eq!(err.kind_name(), "tactic failed");
        assert_eq!(err.to_string(), "no goals");
        assert_eq!(err.hints, vec!["try Qed".to_owned()]);

        let err: Error = kernel::type_checker::TypeCheckerError::UnboundVariable(3).into();
        assert_eq!(err.kind_name(), "unbound name");
        assert!(err.sides().is_none());
    }

    #[test]
    fn first_goal_wins() {
        let err = Error::failed("oops").on_goal("inner".to_owned()).on_goal("outer".to_owned());
        assert_eq!(err.goal.as_deref(), Some("inner"));
    }
}
