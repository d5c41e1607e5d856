//! Declaration of parameterised inductive types.
//!
//! From the signatures of an inductive type and of its constructors, this module derives the
//! type of the dependent eliminator and the metadata its computation rule relies on. Positivity
//! and termination are not checked: declared inductives are trusted.

use crate::environment::{
    ConstructorInfo, Declaration, DeclarationKind, EliminatorInfo, Environment, EnvironmentError, InductiveInfo,
};
use crate::error::Result;
use crate::term::{Icity, Name, Term};

/// A non-indexed inductive type: `ty` is a telescope of `params` binders ending in a sort, and
/// each constructor type starts with the same parameters and ends in the inductive applied to
/// them.
#[derive(Clone, Debug)]
pub struct InductiveSpec {
    pub name: String,
    pub ty: Term,
    pub params: usize,
    pub constructors: Vec<(String, Term)>,
    pub eliminator: String,
}

/// Splits `count` leading Π binders off a type.
fn telescope(mut ty: &Term, count: Option<usize>) -> (Vec<(Name, Term)>, &Term) {
    let mut binders = Vec::new();
    while let Term::Pi {
        ref name,
        ref domain,
        ref codomain,
        ..
    } = *ty
    {
        if count.map_or(false, |count| binders.len() == count) {
            break;
        }
        binders.push((name.clone(), (**domain).clone()));
        ty = codomain;
    }
    (binders, ty)
}

/// Closes `body` under the given binders, the first one being outermost.
fn close(binders: Vec<(Name, Term)>, body: Term) -> Term {
    binders.into_iter().rev().fold(body, |codomain, (name, domain)| Term::Pi {
        name,
        icity: Icity::Explicit,
        domain: Box::new(domain),
        codomain: Box::new(codomain),
    })
}

/// `Var` referring to the binder at `level`, seen from a context of `depth` bindings.
const fn at(depth: usize, level: usize) -> Term {
    Term::Var(depth - 1 - level)
}

impl InductiveSpec {
    fn invalid<S: Into<String>>(&self, message: S) -> EnvironmentError {
        EnvironmentError::InvalidInductive(self.name.clone(), message.into())
    }

    /// The inductive applied to its parameters, in a context of `depth` bindings starting with
    /// them.
    fn applied(&self, depth: usize) -> Term {
        Term::Global(self.name.clone()).apply((0..self.params).map(|level| at(depth, level)))
    }

    /// Fields of a constructor, along with whether each one is recursive.
    fn fields(&self, ctor: &str, ty: &Term) -> core::result::Result<Vec<(Name, Term, bool)>, EnvironmentError> {
        let (params, rest) = telescope(ty, Some(self.params));
        if params.len() != self.params {
            return Err(self.invalid(format!("constructor {ctor} does not take every parameter")));
        }

        let (fields, result) = telescope(rest, None);
        if *result != self.applied(self.params + fields.len()) {
            return Err(self.invalid(format!("constructor {ctor} does not build {}", self.name)));
        }

        Ok(fields
            .into_iter()
            .enumerate()
            .map(|(j, (name, ty))| {
                let recursive = ty == self.applied(self.params + j);
                (name, ty, recursive)
            })
            .collect())
    }

    /// The type of the case of the eliminator for a constructor, in a context made of the
    /// parameters, the motive and the previous cases.
    fn case(&self, ctor: &str, fields: &[(Name, Term, bool)], depth: usize) -> Term {
        let motive = self.params;
        let mut binders = Vec::new();
        let mut levels = Vec::new();

        for (name, ty, recursive) in fields {
            let cur = depth + binders.len();
            let args: Vec<Term> =
                (0..self.params).map(|level| at(cur, level)).chain(levels.iter().map(|&level| at(cur, level))).collect();
            binders.push((name.clone(), ty.instantiate(&args)));
            levels.push(cur);

            if *recursive {
                let cur = cur + 1;
                binders.push((Name::from("ih"), Term::App {
                    function: Box::new(at(cur, motive)),
                    argument: Box::new(Term::Var(0)),
                    icity: Icity::Explicit,
                }));
            }
        }

        let cur = depth + binders.len();
        let built = Term::Global(ctor.to_owned())
            .apply((0..self.params).map(|level| at(cur, level)).chain(levels.iter().map(|&level| at(cur, level))));
        let result = at(cur, motive).apply([built]);

        close(binders, result)
    }

    /// The type of the dependent eliminator:
    /// `Π params. Π (P : D params → Type). Π cases. Π (x : D params). P x`.
    fn eliminator_type(&self, constructors: &[(String, Vec<(Name, Term, bool)>)]) -> core::result::Result<Term, EnvironmentError> {
        let (params, sort) = telescope(&self.ty, Some(self.params));
        if params.len() != self.params || !matches!(*sort, Term::Sort(_)) {
            return Err(self.invalid("its type must be a telescope of parameters ending in a sort"));
        }

        let mut binders = params;
        let motive = Term::Pi {
            name: Name::from("x"),
            icity: Icity::Explicit,
            domain: Box::new(self.applied(self.params)),
            codomain: Box::new(Term::Sort(0)),
        };
        binders.push((Name::from("P"), motive));

        for (ctor, fields) in constructors {
            let case = self.case(ctor, fields, binders.len());
            binders.push((Name::new(ctor.clone()), case));
        }

        let depth = binders.len();
        binders.push((Name::from("x"), self.applied(depth)));
        let body = at(depth + 1, self.params).apply([Term::Var(0)]);

        Ok(close(binders, body))
    }
}

impl Environment {
    /// Declares an inductive type, its constructors and its eliminator.
    ///
    /// # Errors
    /// Fails if a name is taken, or if a constructor signature does not fit the inductive.
    pub fn add_inductive(&mut self, spec: InductiveSpec) -> Result<&mut Self> {
        let constructors = spec
            .constructors
            .iter()
            .map(|(name, ty)| Ok((name.clone(), spec.fields(name, ty)?)))
            .collect::<core::result::Result<Vec<_>, EnvironmentError>>()?;
        let eliminator = spec.eliminator_type(&constructors)?;

        let names = core::iter::once(&spec.name)
            .chain(spec.constructors.iter().map(|(name, _)| name))
            .chain(core::iter::once(&spec.eliminator));
        for name in names {
            if self.contains(name) {
                return Err(EnvironmentError::AlreadyDefined(name.clone()).into());
            }
        }

        self.add(Declaration {
            name: spec.name.clone(),
            ty: spec.ty.clone(),
            body: None,
            kind: DeclarationKind::Inductive(InductiveInfo {
                params: spec.params,
                constructors: spec.constructors.iter().map(|(name, _)| name.clone()).collect(),
                path_constructors: Vec::new(),
                eliminator: Some(spec.eliminator.clone()),
            }),
        })?;

        for (index, ((name, ty), (_, fields))) in spec.constructors.iter().zip(&constructors).enumerate() {
            self.add(Declaration {
                name: name.clone(),
                ty: ty.clone(),
                body: None,
                kind: DeclarationKind::Constructor(ConstructorInfo {
                    inductive: spec.name.clone(),
                    index,
                    params: spec.params,
                    recursive: fields.iter().map(|&(_, _, recursive)| recursive).collect(),
                }),
            })?;
        }

        self.add(Declaration {
            name: spec.eliminator.clone(),
            ty: eliminator,
            body: None,
            kind: DeclarationKind::Eliminator(EliminatorInfo {
                inductive: spec.name.clone(),
                params: spec.params,
                cases: spec.constructors.len(),
            }),
        })
    }
}
