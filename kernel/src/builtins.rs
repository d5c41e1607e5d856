//! Inductive types available in every environment.

use crate::environment::{
    ConstructorInfo, Declaration, DeclarationKind, EliminatorInfo, Environment, InductiveInfo, PathConstructor,
};
use crate::error::Result;
use crate::inductive::InductiveSpec;
use crate::term::builders::*;
use crate::term::Term;

fn spec(name: &str, ty: Term, params: usize, constructors: Vec<(&str, Term)>, eliminator: &str) -> InductiveSpec {
    InductiveSpec {
        name: name.to_owned(),
        ty,
        params,
        constructors: constructors.into_iter().map(|(name, ty)| (name.to_owned(), ty)).collect(),
        eliminator: eliminator.to_owned(),
    }
}

fn inductives() -> Vec<InductiveSpec> {
    let sum = |a: usize, b: usize| global("Sum").apply([var(a), var(b)]);
    let list = |a: usize| app(global("List"), var(a));

    vec![
        spec("Empty", sort(0), 0, Vec::new(), "emptyElim"),
        spec("Unit", sort(0), 0, vec![("tt", global("Unit"))], "unitElim"),
        spec("Bool", sort(0), 0, vec![("true", global("Bool")), ("false", global("Bool"))], "boolElim"),
        spec(
            "Nat",
            sort(0),
            0,
            vec![("zero", global("Nat")), ("succ", pi("n", global("Nat"), global("Nat")))],
            "natElim",
        ),
        spec(
            "Sum",
            pi("A", sort(0), pi("B", sort(0), sort(0))),
            2,
            vec![
                ("inl", pi("A", sort(0), pi("B", sort(0), pi("a", var(1), sum(2, 1))))),
                ("inr", pi("A", sort(0), pi("B", sort(0), pi("b", var(0), sum(2, 1))))),
            ],
            "sumElim",
        ),
        spec(
            "List",
            pi("A", sort(0), sort(0)),
            1,
            vec![
                ("nil", pi("A", sort(0), list(0))),
                ("cons", pi("A", sort(0), pi("x", var(0), pi("xs", list(1), list(2))))),
            ],
            "listElim",
        ),
    ]
}

/// The circle: a point `base` and a path `loop` from `base` to itself, with its non-dependent
/// recursor `s1Rec : Π P. Π b : P. Π l : Path P b b. S1 → P`.
fn circle(env: &mut Environment) -> Result<&mut Environment> {
    let s1 = global("S1");
    let base = global("base");

    env.add(Declaration {
        name: "S1".to_owned(),
        ty: sort(0),
        body: None,
        kind: DeclarationKind::Inductive(InductiveInfo {
            params: 0,
            constructors: vec!["base".to_owned()],
            path_constructors: vec![PathConstructor {
                name: "loop".to_owned(),
                lhs: base.clone(),
                rhs: base.clone(),
            }],
            eliminator: Some("s1Rec".to_owned()),
        }),
    })?
    .add(Declaration {
        name: "base".to_owned(),
        ty: s1.clone(),
        body: None,
        kind: DeclarationKind::Constructor(ConstructorInfo {
            inductive: "S1".to_owned(),
            index: 0,
            params: 0,
            recursive: Vec::new(),
        }),
    })?
    .add(Declaration {
        name: "s1Rec".to_owned(),
        ty: pi("P", sort(0), pi("b", var(0), pi("l", path(var(1), var(0), var(0)), pi("x", s1.clone(), var(3))))),
        body: None,
        kind: DeclarationKind::Eliminator(EliminatorInfo {
            inductive: "S1".to_owned(),
            params: 0,
            cases: 2,
        }),
    })?
    .add_definition(
        "loop",
        path(s1, base.clone(), base),
        path_lam("i", Term::HitApp {
            hit: "S1".to_owned(),
            ctor: "loop".to_owned(),
            args: Vec::new(),
            iargs: vec![Term::IVar(0)],
        }),
    )
}

impl Environment {
    /// An environment holding `Empty`, `Unit`, `Bool`, `Nat`, `Sum`, `List` and the circle `S1`.
    ///
    /// # Errors
    /// Never fails on an empty environment; adding the builtins twice reports the clash.
    pub fn add_builtins(&mut self) -> Result<&mut Self> {
        for spec in inductives() {
            self.add_inductive(spec)?;
        }
        circle(self)
    }

    /// A fresh environment with the builtin inductive types.
    ///
    /// # Errors
    /// See [`Environment::add_builtins`].
    pub fn with_builtins() -> Result<Self> {
        let mut env = Self::new();
        env.add_builtins()?;
        Ok(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_declared() {
        let env = Environment::with_builtins().unwrap();

        for name in ["Nat", "zero", "succ", "natElim", "Sum", "inl", "inr", "sumElim", "Empty", "emptyElim", "tt"] {
            assert!(env.contains(name), "{name} is missing");
        }
        assert_eq!(env.inductive("Sum").map(|info| info.params), Some(2));
        assert_eq!(env.inductive("S1").and_then(|info| info.case_index("loop")), Some(1));
        assert_eq!(
            env.get("emptyElim").map(|decl| &decl.ty),
            Some(&pi("P", pi("x", global("Empty"), sort(0)), pi("x", global("Empty"), app(var(1), var(0)))))
        );
    }

    #[test]
    fn builtins_twice() {
        let mut env = Environment::with_builtins().unwrap();
        assert!(env.add_builtins().is_err());
    }
}
