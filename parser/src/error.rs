//! Errors raised while reading terms and scripts.

use derive_more::{Constructor, Display, From};
use kernel::location::Location;

/// Type representing parser errors.
#[derive(Clone, Constructor, Debug, Display, Eq, PartialEq)]
#[display(fmt = "{kind}")]
pub struct Error {
    /// The kind of form error that occurred.
    pub kind: ErrorKind,

    /// The location of the error.
    pub location: Location,
}

#[non_exhaustive]
#[derive(Clone, Debug, Display, Eq, PartialEq, From)]
pub enum ErrorKind {
    #[from(ignore)]
    CannotParse(String),

    /// A well-formed S-expression that does not describe a term.
    #[display(fmt = "malformed {}", _0)]
    #[from(ignore)]
    Malformed(String),

    /// A script not following the item structure.
    #[from(ignore)]
    Script(String),

    Elaboration(elaboration::Error),
}

impl Error {
    /// Short name of the class of error, as shown in diagnostics.
    #[inline]
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ErrorKind::Elaboration(ref err) => err.kind_name(),
            _ => "parse error",
        }
    }
}

impl From<elaboration::Error> for Error {
    #[inline]
    fn from(err: elaboration::Error) -> Self {
        let location = err.location.unwrap_or_default();
        Self::new(err.into(), location)
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
