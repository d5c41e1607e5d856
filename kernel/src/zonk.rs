//! Zonking: folding metavariable solutions into terms.

use core::fmt;

use crate::location::Location;
use crate::meta::MetaStore;
use crate::term::pretty::Rendered;
use crate::term::{MetaId, Term};

/// A metavariable still unsolved when a complete term was required.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnsolvedMeta {
    pub id: MetaId,
    pub name: Option<String>,
    pub ty: Rendered,
    pub location: Option<Location>,
}

impl fmt::Display for UnsolvedMeta {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name {
            Some(ref name) => write!(f, "?{name} ({})", self.id)?,
            None => write!(f, "{}", self.id)?,
        }
        write!(f, " : {}", self.ty)?;
        if let Some(location) = self.location {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}

/// The error raised by [`zonk_full`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnsolvedMetas(pub Vec<UnsolvedMeta>);

impl fmt::Display for UnsolvedMetas {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unsolved metavariables: ")?;
        for (i, meta) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{meta}")?;
        }
        Ok(())
    }
}

/// Replaces every solved metavariable by its solution, recursively. Unsolved metavariables are
/// kept, with their arguments zonked.
#[must_use]
pub fn zonk(metas: &MetaStore, term: &Term) -> Term {
    term.map(0, 0, &mut |term, _, _| match *term {
        Term::Meta(id, ref args) => {
            let args: Vec<Term> = args.iter().map(|arg| zonk(metas, arg)).collect();
            Some(match metas.solution(id) {
                Some(solution) => zonk(metas, &solution.instantiate(&args)),
                None => Term::Meta(id, args),
            })
        },
        _ => None,
    })
}

/// Zonks a term that must be complete.
///
/// # Errors
/// Lists the metavariables left unsolved.
pub fn zonk_full(metas: &MetaStore, term: &Term) -> Result<Term, UnsolvedMetas> {
    let zonked = zonk(metas, term);
    let unsolved = collect_metas(&zonked);
    if unsolved.is_empty() {
        return Ok(zonked);
    }

    Err(UnsolvedMetas(
        unsolved
            .into_iter()
            .map(|id| match metas.lookup(id) {
                Ok(entry) => UnsolvedMeta {
                    id,
                    name: entry.name,
                    ty: Rendered::new(zonk(metas, &entry.ty), entry.context.names()),
                    location: entry.location,
                },
                Err(_) => UnsolvedMeta {
                    id,
                    name: None,
                    ty: Rendered::new(Term::Meta(id, Vec::new()), Vec::new()),
                    location: None,
                },
            })
            .collect(),
    ))
}

#[must_use]
pub fn has_meta(term: &Term) -> bool {
    term.any(0, 0, &mut |term, _, _| matches!(*term, Term::Meta(..)))
}

/// The metavariables occurring in a term, in order of first occurrence.
#[must_use]
pub fn collect_metas(term: &Term) -> Vec<MetaId> {
    let mut metas = Vec::new();
    term.any(0, 0, &mut |term, _, _| {
        if let Term::Meta(id, _) = *term {
            if !metas.contains(&id) {
                metas.push(id);
            }
        }
        false
    });
    metas
}
