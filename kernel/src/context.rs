//! Local typing contexts.
//!
//! A context is a persistent sequence of bindings, the last one being de Bruijn index `0`, along
//! with the names of the interval variables in scope. Extending a context returns a new one
//! sharing its prefix with the old.

use im::Vector;

use crate::term::{Icity, Name, Term};

/// A local binding. Its type (and value, for local definitions) live in the context made of the
/// bindings before it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Binding {
    pub name: Name,
    pub ty: Term,
    pub icity: Icity,
    pub value: Option<Term>,

    /// Number of interval variables in scope when the binding was introduced.
    pub ilen: usize,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Context {
    bindings: Vector<Binding>,
    intervals: Vector<Name>,
}

impl Context {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Number of interval variables in scope.
    #[inline]
    #[must_use]
    pub fn ilen(&self) -> usize {
        self.intervals.len()
    }

    fn push(&self, binding: Binding) -> Self {
        let mut bindings = self.bindings.clone();
        bindings.push_back(binding);
        Self {
            bindings,
            intervals: self.intervals.clone(),
        }
    }

    /// Adds an assumption `name : ty`.
    #[must_use]
    pub fn extend<N: Into<Name>>(&self, name: N, ty: Term, icity: Icity) -> Self {
        self.push(Binding {
            name: name.into(),
            ty,
            icity,
            value: None,
            ilen: self.ilen(),
        })
    }

    /// Adds a local definition `name : ty := value`.
    #[must_use]
    pub fn define<N: Into<Name>>(&self, name: N, ty: Term, value: Term) -> Self {
        self.push(Binding {
            name: name.into(),
            ty,
            icity: Icity::Explicit,
            value: Some(value),
            ilen: self.ilen(),
        })
    }

    /// Adds an interval variable.
    #[must_use]
    pub fn extend_interval<N: Into<Name>>(&self, name: N) -> Self {
        let mut intervals = self.intervals.clone();
        intervals.push_back(name.into());
        Self {
            bindings: self.bindings.clone(),
            intervals,
        }
    }

    /// Rewrites the type and value of every binding, each one in its own context.
    #[must_use]
    pub fn map_types<F: FnMut(&Term) -> Term>(&self, mut f: F) -> Self {
        let bindings = self
            .bindings
            .iter()
            .map(|binding| Binding {
                ty: f(&binding.ty),
                value: binding.value.as_ref().map(&mut f),
                ..binding.clone()
            })
            .collect();
        Self {
            bindings,
            intervals: self.intervals.clone(),
        }
    }

    /// The binding of `Var(ix)`, as stored.
    #[inline]
    #[must_use]
    pub fn get(&self, ix: usize) -> Option<&Binding> {
        self.len().checked_sub(ix + 1).and_then(|level| self.bindings.get(level))
    }

    /// The type of `Var(ix)`, moved to the whole context.
    #[must_use]
    pub fn type_of(&self, ix: usize) -> Option<Term> {
        let binding = self.get(ix)?;
        Some(binding.ty.lift(ix + 1, 0).ilift(self.ilen() - binding.ilen, 0))
    }

    /// The value of `Var(ix)` if it is a local definition, moved to the whole context.
    #[must_use]
    pub fn value_of(&self, ix: usize) -> Option<Term> {
        let binding = self.get(ix)?;
        let value = binding.value.as_ref()?;
        Some(value.lift(ix + 1, 0).ilift(self.ilen() - binding.ilen, 0))
    }

    /// The index of the innermost binding named `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.bindings
            .iter()
            .rev()
            .position(|binding| !binding.name.is_anonymous() && binding.name.as_str() == name)
    }

    /// The index of the innermost interval variable named `name`.
    #[must_use]
    pub fn lookup_interval(&self, name: &str) -> Option<usize> {
        self.intervals
            .iter()
            .rev()
            .position(|iname| !iname.is_anonymous() && iname.as_str() == name)
    }

    /// Bindings from the outermost to the innermost.
    pub fn bindings(&self) -> impl DoubleEndedIterator<Item = &Binding> {
        self.bindings.iter()
    }

    /// Binder names from the outermost to the innermost, as used for printing.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.bindings.iter().map(|binding| binding.name.as_str().to_owned()).collect()
    }

    /// The variables of the context, outermost first: the arguments of a metavariable created in
    /// this context.
    #[must_use]
    pub fn variables(&self) -> Vec<Term> {
        (0..self.len()).rev().map(Term::Var).collect()
    }
}
