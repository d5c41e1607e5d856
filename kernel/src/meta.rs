//! The metavariable store.
//!
//! Metavariables are holes standing for terms in some local context. The store allocates them,
//! records their type and context, and holds their solution once they are solved. A solution is
//! an open term living in the context the metavariable was created in; an occurrence
//! `Meta(id, args)` stands for that solution with the context variables replaced by `args`.
//!
//! The store is shared behind a reader-writer lock: several readers may inspect it at the same
//! time, while solving or allocating takes the lock exclusively. Cloning a store yields an
//! independent deep copy, used to snapshot proof states and for speculative unification.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use derive_more::Display;
use log::trace;

use crate::context::Context;
use crate::location::Location;
use crate::term::{MetaId, Term};

/// Errors raised when manipulating metavariables.
#[non_exhaustive]
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum MetaError {
    #[display(fmt = "unknown metavariable {}", _0)]
    Unknown(MetaId),

    #[display(fmt = "metavariable {} is already solved", _0)]
    AlreadySolved(MetaId),

    #[display(fmt = "metavariable {} is frozen", _0)]
    Frozen(MetaId),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MetaState {
    Unsolved,
    Solved(Term),
    Frozen,
}

/// Everything known about a metavariable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MetaEntry {
    /// The type of the metavariable, in its context.
    pub ty: Term,

    /// The context the metavariable was created in.
    pub context: Context,

    pub state: MetaState,

    /// The name of the hole the metavariable was created for, if any.
    pub name: Option<String>,

    pub location: Option<Location>,
}

impl MetaEntry {
    #[inline]
    #[must_use]
    pub const fn solution(&self) -> Option<&Term> {
        match self.state {
            MetaState::Solved(ref term) => Some(term),
            MetaState::Unsolved | MetaState::Frozen => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_solved(&self) -> bool {
        matches!(self.state, MetaState::Solved(_))
    }
}

#[derive(Default)]
pub struct MetaStore {
    entries: Arc<RwLock<Vec<MetaEntry>>>,
}

impl MetaStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<MetaEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<MetaEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate(&self, ty: Term, context: Context, location: Option<Location>, name: Option<String>) -> MetaId {
        let mut entries = self.write();
        let id = MetaId(entries.len());
        trace!("new metavariable {id} : {ty}");
        entries.push(MetaEntry {
            ty,
            context,
            state: MetaState::Unsolved,
            name,
            location,
        });
        id
    }

    /// Allocates an anonymous metavariable of type `ty` in `context`.
    pub fn fresh(&self, ty: Term, context: Context, location: Option<Location>) -> MetaId {
        self.allocate(ty, context, location, None)
    }

    /// Allocates a metavariable remembered under `name` for diagnostics.
    pub fn fresh_named<S: Into<String>>(&self, ty: Term, context: Context, location: Option<Location>, name: S) -> MetaId {
        self.allocate(ty, context, location, Some(name.into()))
    }

    /// A copy of the entry of a metavariable.
    ///
    /// # Errors
    /// Fails if the metavariable does not belong to this store.
    pub fn lookup(&self, id: MetaId) -> Result<MetaEntry, MetaError> {
        self.read().get(id.0).cloned().ok_or(MetaError::Unknown(id))
    }

    /// The solution of a metavariable, if it has one.
    #[must_use]
    pub fn solution(&self, id: MetaId) -> Option<Term> {
        self.read().get(id.0).and_then(MetaEntry::solution).cloned()
    }

    /// The metavariable created for the hole named `name`.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<MetaId> {
        self.read().iter().position(|entry| entry.name.as_deref() == Some(name)).map(MetaId)
    }

    /// Records the solution of an unsolved metavariable. The term is stored as is: it must live
    /// in the context of the metavariable.
    ///
    /// # Errors
    /// Fails if the metavariable is unknown, already solved or frozen.
    pub fn solve(&self, id: MetaId, term: Term) -> Result<(), MetaError> {
        let mut entries = self.write();
        let entry = entries.get_mut(id.0).ok_or(MetaError::Unknown(id))?;

        match entry.state {
            MetaState::Unsolved => {
                trace!("solved {id} := {term}");
                entry.state = MetaState::Solved(term);
                Ok(())
            },
            MetaState::Solved(_) => Err(MetaError::AlreadySolved(id)),
            MetaState::Frozen => Err(MetaError::Frozen(id)),
        }
    }

    /// Like [`MetaStore::solve`], reporting failure as `false`.
    pub fn try_solve(&self, id: MetaId, term: Term) -> bool {
        self.solve(id, term).is_ok()
    }

    /// Forbids any later solution of an unsolved metavariable. Freezing twice is harmless.
    ///
    /// # Errors
    /// Fails if the metavariable is unknown or already solved.
    pub fn freeze(&self, id: MetaId) -> Result<(), MetaError> {
        let mut entries = self.write();
        let entry = entries.get_mut(id.0).ok_or(MetaError::Unknown(id))?;

        match entry.state {
            MetaState::Solved(_) => Err(MetaError::AlreadySolved(id)),
            MetaState::Unsolved | MetaState::Frozen => {
                entry.state = MetaState::Frozen;
                Ok(())
            },
        }
    }

    /// Identifiers of the metavariables without a solution, frozen ones included.
    #[must_use]
    pub fn unsolved(&self) -> Vec<MetaId> {
        self.read()
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_solved())
            .map(|(id, _)| MetaId(id))
            .collect()
    }

    #[must_use]
    pub fn all_solved(&self) -> bool {
        self.read().iter().all(MetaEntry::is_solved)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl Clone for MetaStore {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::new(RwLock::new(self.read().clone())),
        }
    }
}

impl PartialEq for MetaStore {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries) || *self.read() == *other.read()
    }
}

impl Eq for MetaStore {}

impl core::fmt::Debug for MetaStore {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_list().entries(self.read().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::builders::*;

    #[test]
    fn allocation_is_monotonic() {
        let store = MetaStore::new();
        let a = store.fresh(sort(0), Context::new(), None);
        let b = store.fresh_named(global("Nat"), Context::new(), None, "n");

        assert_eq!(a, MetaId(0));
        assert_eq!(b, MetaId(1));
        assert_eq!(store.by_name("n"), Some(b));
        assert_eq!(store.unsolved(), vec![a, b]);
    }

    #[test]
    fn solve_once() {
        let store = MetaStore::new();
        let id = store.fresh(global("Nat"), Context::new(), None);

        assert_eq!(store.solve(id, global("zero")), Ok(()));
        assert_eq!(store.solve(id, global("zero")), Err(MetaError::AlreadySolved(id)));
        assert!(!store.try_solve(id, global("zero")));
        assert_eq!(store.solution(id), Some(global("zero")));
        assert!(store.all_solved());
    }

    #[test]
    fn frozen_metas_are_never_solved() {
        let store = MetaStore::new();
        let id = store.fresh(global("Nat"), Context::new(), None);

        assert_eq!(store.freeze(id), Ok(()));
        assert_eq!(store.solve(id, global("zero")), Err(MetaError::Frozen(id)));
        assert!(!store.all_solved());
        assert_eq!(store.lookup(MetaId(7)), Err(MetaError::Unknown(MetaId(7))));
    }

    #[test]
    fn clones_are_deep() {
        let store = MetaStore::new();
        let id = store.fresh(global("Nat"), Context::new(), None);
        let snapshot = store.clone();

        store.solve(id, global("zero")).unwrap();

        assert_eq!(snapshot.solution(id), None);
        assert_ne!(snapshot, store);
        assert_eq!(snapshot.clone(), snapshot);
    }

    #[test]
    fn concurrent_readers() {
        let store = MetaStore::new();
        let id = store.fresh(global("Nat"), Context::new(), None);
        store.solve(id, global("zero")).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| assert_eq!(store.solution(id), Some(global("zero"))));
            }
        });
    }
}
