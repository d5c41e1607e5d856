//! Term arguments of tactics.

use core::fmt;
use std::sync::Arc;

use kernel::term::Term;

use crate::error::Result;
use crate::proof_state::{Goal, ProofState};

type Elaborate = dyn Fn(&ProofState, &Goal, Option<&Term>) -> Result<Term> + Send + Sync;

/// A term given to a tactic.
///
/// Arguments are either core terms of the context of the goal, or computations producing such a
/// term once the goal is known, such as the elaboration of a surface term. The latter are given
/// the type the term is expected to have, when the tactic knows it.
#[derive(Clone)]
pub enum Argument {
    Term(Term),
    Deferred(Arc<Elaborate>),
}

impl Argument {
    #[inline]
    #[must_use]
    pub fn deferred<F>(elaborate: F) -> Self
    where
        F: Fn(&ProofState, &Goal, Option<&Term>) -> Result<Term> + Send + Sync + 'static,
    {
        Self::Deferred(Arc::new(elaborate))
    }

    /// The term, in the context of `goal`.
    ///
    /// # Errors
    /// Fails when the argument is deferred and its computation fails.
    pub fn resolve(&self, state: &ProofState, goal: &Goal, expected: Option<&Term>) -> Result<Term> {
        match *self {
            Self::Term(ref term) => Ok(term.clone()),
            Self::Deferred(ref elaborate) => elaborate(state, goal, expected),
        }
    }
}

impl From<Term> for Argument {
    #[inline]
    fn from(term: Term) -> Self {
        Self::Term(term)
    }
}

impl fmt::Debug for Argument {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Term(ref term) => write!(f, "Term({term})"),
            Self::Deferred(_) => write!(f, "Deferred"),
        }
    }
}
