//! The global environment.
//!
//! Definitions, axioms, theorems, inductive types, their constructors and their eliminators all
//! live in one namespace. The environment is a persistent map: cloning it is cheap, and clones
//! evolve independently, so that concurrent sessions can each start from a snapshot.

use std::sync::Arc;

use derive_more::Display;
use im::{HashMap, Vector};
use log::info;

use crate::error::Result;
use crate::term::Term;

/// Errors that can occur, at runtime, during environment manipulation.
#[non_exhaustive]
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum EnvironmentError {
    #[display(fmt = "{} is already defined", _0)]
    AlreadyDefined(String),

    #[display(fmt = "{} is not defined", _0)]
    NotFound(String),

    #[display(fmt = "ill-formed inductive {}: {}", _0, _1)]
    InvalidInductive(String, String),
}

/// A path constructor of a higher inductive type, together with its boundary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathConstructor {
    pub name: String,

    /// Closed endpoints at `i0` and `i1`.
    pub lhs: Term,
    pub rhs: Term,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InductiveInfo {
    pub params: usize,
    pub constructors: Vec<String>,
    pub path_constructors: Vec<PathConstructor>,
    pub eliminator: Option<String>,
}

impl InductiveInfo {
    /// Position of a constructor in the order the eliminator takes its cases in: point
    /// constructors first, then path constructors.
    #[must_use]
    pub fn case_index(&self, ctor: &str) -> Option<usize> {
        self.constructors.iter().position(|name| name == ctor).or_else(|| {
            self.path_constructors
                .iter()
                .position(|path| path.name == ctor)
                .map(|ix| ix + self.constructors.len())
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConstructorInfo {
    pub inductive: String,
    pub index: usize,
    pub params: usize,

    /// For each field, whether it is a recursive occurrence of the inductive.
    pub recursive: Vec<bool>,
}

impl ConstructorInfo {
    #[inline]
    #[must_use]
    pub fn fields(&self) -> usize {
        self.recursive.len()
    }
}

/// Eliminators take the parameters, the motive, one case per constructor and the scrutinee.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EliminatorInfo {
    pub inductive: String,
    pub params: usize,
    pub cases: usize,
}

impl EliminatorInfo {
    /// Number of arguments after which the eliminator may compute.
    #[inline]
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.params + self.cases + 2
    }
}

#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum DeclarationKind {
    /// Transparent definition, unfolded during evaluation.
    #[display(fmt = "definition")]
    Definition,

    #[display(fmt = "axiom")]
    Axiom,

    /// Opaque definition: its body is kept, but never unfolded.
    #[display(fmt = "theorem")]
    Theorem,

    #[display(fmt = "inductive")]
    Inductive(InductiveInfo),

    #[display(fmt = "constructor")]
    Constructor(ConstructorInfo),

    #[display(fmt = "eliminator")]
    Eliminator(EliminatorInfo),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub ty: Term,
    pub body: Option<Term>,
    pub kind: DeclarationKind,
}

impl Declaration {
    /// The body to unfold when evaluating, if any.
    #[inline]
    #[must_use]
    pub fn unfolding(&self) -> Option<&Term> {
        match self.kind {
            DeclarationKind::Definition => self.body.as_ref(),
            _ => None,
        }
    }
}

/// Global environment, binding names to their declarations.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Environment {
    declarations: HashMap<String, Arc<Declaration>>,
    order: Vector<String>,
}

impl Environment {
    /// Creates an empty environment.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.declarations.get(name).map(|decl| &**decl)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    /// Names of the declarations, in the order they were added.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Adds a declaration. No type-checking is performed here.
    ///
    /// # Errors
    /// Fails if the name is already taken.
    pub fn add(&mut self, declaration: Declaration) -> Result<&mut Self> {
        if self.contains(&declaration.name) {
            return Err(EnvironmentError::AlreadyDefined(declaration.name).into());
        }

        info!("added {} {}", declaration.kind, declaration.name);
        self.order.push_back(declaration.name.clone());
        self.declarations.insert(declaration.name.clone(), Arc::new(declaration));
        Ok(self)
    }

    /// Adds a transparent definition.
    ///
    /// # Errors
    /// Fails if the name is already taken.
    pub fn add_definition<S: Into<String>>(&mut self, name: S, ty: Term, body: Term) -> Result<&mut Self> {
        self.add(Declaration {
            name: name.into(),
            ty,
            body: Some(body),
            kind: DeclarationKind::Definition,
        })
    }

    /// Adds an axiom.
    ///
    /// # Errors
    /// Fails if the name is already taken.
    pub fn add_axiom<S: Into<String>>(&mut self, name: S, ty: Term) -> Result<&mut Self> {
        self.add(Declaration {
            name: name.into(),
            ty,
            body: None,
            kind: DeclarationKind::Axiom,
        })
    }

    /// Adds an opaque theorem.
    ///
    /// # Errors
    /// Fails if the name is already taken.
    pub fn add_theorem<S: Into<String>>(&mut self, name: S, ty: Term, proof: Term) -> Result<&mut Self> {
        self.add(Declaration {
            name: name.into(),
            ty,
            body: Some(proof),
            kind: DeclarationKind::Theorem,
        })
    }

    /// The inductive information of `name`, if it is an inductive type.
    #[must_use]
    pub fn inductive(&self, name: &str) -> Option<&InductiveInfo> {
        match self.get(name)?.kind {
            DeclarationKind::Inductive(ref info) => Some(info),
            _ => None,
        }
    }

    #[must_use]
    pub fn constructor(&self, name: &str) -> Option<&ConstructorInfo> {
        match self.get(name)?.kind {
            DeclarationKind::Constructor(ref info) => Some(info),
            _ => None,
        }
    }

    #[must_use]
    pub fn eliminator(&self, name: &str) -> Option<&EliminatorInfo> {
        match self.get(name)?.kind {
            DeclarationKind::Eliminator(ref info) => Some(info),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::builders::*;

    #[test]
    fn add_and_get() {
        let mut env = Environment::new();
        env.add_axiom("A", sort(0)).unwrap().add_definition("B", sort(0), global("A")).unwrap();

        assert_eq!(env.get("A").map(|decl| &decl.kind), Some(&DeclarationKind::Axiom));
        assert_eq!(env.get("B").and_then(Declaration::unfolding), Some(&global("A")));
        assert_eq!(env.names().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn theorems_are_opaque() {
        let mut env = Environment::new();
        env.add_theorem("t", sort(1), sort(0)).unwrap();

        assert_eq!(env.get("t").and_then(Declaration::unfolding), None);
        assert_eq!(env.get("t").and_then(|decl| decl.body.as_ref()), Some(&sort(0)));
    }

    #[test]
    fn redefinition_fails() {
        let mut env = Environment::new();
        env.add_axiom("A", sort(0)).unwrap();

        let err = env.add_axiom("A", sort(1)).unwrap_err();
        assert_eq!(err.to_string(), "A is already defined");
        assert_eq!(env.get("A").map(|decl| &decl.ty), Some(&sort(0)));
    }

    #[test]
    fn snapshots_are_independent() {
        let mut env = Environment::new();
        env.add_axiom("A", sort(0)).unwrap();
        let snapshot = env.clone();
        env.add_axiom("B", sort(0)).unwrap();

        assert!(!snapshot.contains("B"));
        assert!(env.contains("B"));
    }
}
