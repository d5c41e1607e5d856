//! Pretty-printing of terms.
//!
//! The canonical form is the S-expression syntax read back by the parser, with variables printed
//! as de Bruijn indices. Diagnostics use [`Named`], which prints variables by the name of their
//! binder whenever that name is unambiguous.

use core::fmt;

use super::Term::{self, *};
use super::{Icity, Name};

impl fmt::Display for Term {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Printer::new(false).write(f, self)
    }
}

/// A term ready to be printed with the names of the binders it lives under.
pub struct Named<'a> {
    pub term: &'a Term,

    /// Names of the context, outermost first.
    pub names: &'a [String],
}

impl fmt::Display for Named<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut printer = Printer::new(true);
        printer.names.extend(self.names.iter().cloned());
        printer.write(f, self.term)
    }
}

/// An owned term together with the names of its context, as carried by diagnostics.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rendered {
    pub term: Term,
    pub names: Vec<String>,
}

impl Rendered {
    #[inline]
    #[must_use]
    pub fn new(term: Term, names: Vec<String>) -> Self {
        Self { term, names }
    }
}

impl fmt::Display for Rendered {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Named {
            term: &self.term,
            names: &self.names,
        }
        .fmt(f)
    }
}

/// Atoms the parser reads as something other than a global.
const RESERVED: [&str; 5] = ["Type", "I", "i0", "i1", "_"];

struct Printer {
    named: bool,
    names: Vec<String>,
    inames: Vec<String>,
}

impl Printer {
    const fn new(named: bool) -> Self {
        Self {
            named,
            names: Vec::new(),
            inames: Vec::new(),
        }
    }

    /// The name a variable can be printed with, if it is neither anonymous nor shadowed.
    fn resolve(names: &[String], ix: usize) -> Option<&str> {
        let position = names.len().checked_sub(ix + 1)?;
        let name = names.get(position)?;
        let shadowed = names.get(position + 1..).map_or(false, |inner| inner.contains(name));
        (!shadowed && !name.is_empty() && name != "_").then_some(name.as_str())
    }

    /// Whether a global of this name would be read back as something else.
    fn is_captured(&self, name: &str) -> bool {
        RESERVED.contains(&name) || self.names.iter().chain(&self.inames).any(|binder| binder == name)
    }

    fn under<F>(&mut self, name: &Name, interval: bool, f: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        let stack = if interval { &mut self.inames } else { &mut self.names };
        stack.push(name.as_str().to_owned());
        let result = f(self);
        let stack = if interval { &mut self.inames } else { &mut self.names };
        stack.pop();
        result
    }

    fn binder(&mut self, f: &mut fmt::Formatter, name: &Name, icity: Icity, annotation: Option<&Term>) -> fmt::Result {
        match (icity, annotation) {
            (Icity::Explicit, None) => write!(f, "{name}"),
            (Icity::Explicit, Some(ann)) => {
                write!(f, "{name} ")?;
                self.write(f, ann)
            },
            (Icity::Implicit, None) => write!(f, "{{{name}}}"),
            (Icity::Implicit, Some(ann)) => {
                write!(f, "{{{name} ")?;
                self.write(f, ann)?;
                write!(f, "}}")
            },
        }
    }

    fn list(&mut self, f: &mut fmt::Formatter, head: &str, args: &[&Term]) -> fmt::Result {
        write!(f, "({head}")?;
        for arg in args {
            write!(f, " ")?;
            self.write(f, arg)?;
        }
        write!(f, ")")
    }

    fn group(&mut self, f: &mut fmt::Formatter, terms: &[Term]) -> fmt::Result {
        write!(f, "(")?;
        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            self.write(f, term)?;
        }
        write!(f, ")")
    }

    fn write(&mut self, f: &mut fmt::Formatter, term: &Term) -> fmt::Result {
        match *term {
            Var(ix) => match Self::resolve(&self.names, ix).filter(|_| self.named) {
                Some(name) => write!(f, "{name}"),
                None => write!(f, "(Var {ix})"),
            },

            Global(ref name) if self.is_captured(name) => write!(f, "(Global {name})"),
            Global(ref name) => write!(f, "{name}"),

            Sort(0) => write!(f, "Type"),
            Sort(level) => write!(f, "(Sort {level})"),

            Pi {
                ref name,
                icity,
                ref domain,
                ref codomain,
            } => {
                write!(f, "(Pi ")?;
                match icity {
                    Icity::Explicit => {
                        write!(f, "{name} ")?;
                        self.write(f, domain)?;
                    },
                    Icity::Implicit => self.binder(f, name, icity, Some(domain))?,
                }
                write!(f, " ")?;
                self.under(name, false, |this| this.write(f, codomain))?;
                write!(f, ")")
            },

            Lam {
                ref name,
                icity,
                ref annotation,
                ref body,
            } => {
                write!(f, "(Lam ")?;
                self.binder(f, name, icity, annotation.as_deref())?;
                write!(f, " ")?;
                self.under(name, false, |this| this.write(f, body))?;
                write!(f, ")")
            },

            App {
                ref function,
                ref argument,
                icity,
            } => {
                write!(f, "(App ")?;
                self.write(f, function)?;
                match icity {
                    Icity::Explicit => {
                        write!(f, " ")?;
                        self.write(f, argument)?;
                    },
                    Icity::Implicit => {
                        write!(f, " {{")?;
                        self.write(f, argument)?;
                        write!(f, "}}")?;
                    },
                }
                write!(f, ")")
            },

            Sigma {
                ref name,
                ref first,
                ref second,
            } => {
                write!(f, "(Sigma {name} ")?;
                self.write(f, first)?;
                write!(f, " ")?;
                self.under(name, false, |this| this.write(f, second))?;
                write!(f, ")")
            },

            Pair(ref fst, ref snd) => self.list(f, "Pair", &[fst, snd]),
            Fst(ref pair) => self.list(f, "Fst", &[pair]),
            Snd(ref pair) => self.list(f, "Snd", &[pair]),

            Let {
                ref name,
                ref annotation,
                ref value,
                ref body,
            } => {
                write!(f, "(Let {name} ")?;
                if let Some(ref ann) = *annotation {
                    self.write(f, ann)?;
                    write!(f, " ")?;
                }
                self.write(f, value)?;
                write!(f, " ")?;
                self.under(name, false, |this| this.write(f, body))?;
                write!(f, ")")
            },

            Meta(id, ref args) => {
                write!(f, "(Meta {}", id.0)?;
                for arg in args {
                    write!(f, " ")?;
                    self.write(f, arg)?;
                }
                write!(f, ")")
            },

            Id {
                ref ty,
                ref lhs,
                ref rhs,
            } => self.list(f, "Id", &[ty, lhs, rhs]),

            Refl { ref ty, ref point } => self.list(f, "Refl", &[ty, point]),

            J {
                ref ty,
                ref motive,
                ref base,
                ref lhs,
                ref rhs,
                ref path,
            } => self.list(f, "J", &[ty, motive, base, lhs, rhs, path]),

            Interval => write!(f, "I"),
            I0 => write!(f, "i0"),
            I1 => write!(f, "i1"),
            IVar(ix) => match Self::resolve(&self.inames, ix).filter(|_| self.named) {
                Some(name) => write!(f, "{name}"),
                None => write!(f, "(IVar {ix})"),
            },

            Path {
                ref ty,
                ref lhs,
                ref rhs,
            } => self.list(f, "Path", &[ty, lhs, rhs]),

            PathP {
                ref family,
                ref lhs,
                ref rhs,
            } => {
                write!(f, "(PathP ")?;
                self.under(&Name::from("i"), true, |this| this.write(f, family))?;
                write!(f, " ")?;
                self.write(f, lhs)?;
                write!(f, " ")?;
                self.write(f, rhs)?;
                write!(f, ")")
            },

            PathLam { ref name, ref body } => {
                write!(f, "(PathLam {name} ")?;
                self.under(name, true, |this| this.write(f, body))?;
                write!(f, ")")
            },

            PathApp { ref path, ref point } => self.list(f, "PathApp", &[path, point]),

            Transport {
                ref family,
                ref element,
            } => {
                write!(f, "(Transport ")?;
                self.under(&Name::from("i"), true, |this| this.write(f, family))?;
                write!(f, " ")?;
                self.write(f, element)?;
                write!(f, ")")
            },

            HitApp {
                ref hit,
                ref ctor,
                ref args,
                ref iargs,
            } => {
                write!(f, "(HITApp {hit} {ctor} ")?;
                self.group(f, args)?;
                write!(f, " ")?;
                self.group(f, iargs)?;
                write!(f, ")")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::builders::*;
    use super::*;

    #[test]
    fn canonical() {
        let term = pi("A", sort(0), pi("x", var(0), var(1)));
        assert_eq!(term.to_string(), "(Pi A Type (Pi x (Var 0) (Var 1)))");

        let term = lam("n", global("Nat"), app(global("succ"), var(0)));
        assert_eq!(term.to_string(), "(Lam n Nat (App succ (Var 0)))");

        assert_eq!(sort(2).to_string(), "(Sort 2)");
        assert_eq!(lam_untyped("x", var(0)).to_string(), "(Lam x (Var 0))");

        let term = lam("Nat", global("Nat"), global("Nat"));
        assert_eq!(term.to_string(), "(Lam Nat Nat (Global Nat))");
    }

    #[test]
    fn implicits() {
        let term = implicit_pi("A", sort(0), arrow(var(0), var(0)));
        assert_eq!(term.to_string(), "(Pi {A Type} (Pi _ (Var 0) (Var 1)))");

        let term = Term::App {
            function: Box::new(global("f")),
            argument: Box::new(global("Nat")),
            icity: Icity::Implicit,
        };
        assert_eq!(term.to_string(), "(App f {Nat})");
    }

    #[test]
    fn cubical() {
        let term = path_lam("i", Term::HitApp {
            hit: "S1".to_owned(),
            ctor: "loop".to_owned(),
            args: Vec::new(),
            iargs: vec![Term::IVar(0)],
        });
        assert_eq!(term.to_string(), "(PathLam i (HITApp S1 loop () ((IVar 0))))");
    }

    #[test]
    fn named() {
        let term = pi("A", sort(0), pi("x", var(0), var(1)));
        let names = Vec::new();
        assert_eq!(Named { term: &term, names: &names }.to_string(), "(Pi A Type (Pi x A A))");

        // shadowed names fall back to indices
        let term = lam("x", global("Nat"), lam("x", global("Nat"), var(1)));
        assert_eq!(
            Named { term: &term, names: &names }.to_string(),
            "(Lam x Nat (Lam x Nat (Var 1)))"
        );

        let names = vec!["n".to_owned(), "h".to_owned()];
        assert_eq!(
            Rendered::new(app(var(1), var(0)), names).to_string(),
            "(App n h)"
        );
    }
}
