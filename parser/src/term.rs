//! Reading terms from their S-expression syntax.
//!
//! The canonical syntax is the one the kernel prints terms with: every compound form is a list
//! headed by a keyword (`Pi`, `Lam`, `App`, …). On top of it, the surface syntax accepts a few
//! aliases (`λ`, `\`, `lambda`, `->`, `Σ`, `@`, `<>`), numerals as de Bruijn indices, holes
//! (`_`, `?name`), universes `Type0`…`TypeN`, and bare lists as applications. Implicit binders and
//! arguments are written between braces.

use elaboration::builder::{Binder, Builder, Payload};
use kernel::location::Location;
use kernel::term::{Icity, Term};
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest::{Parser, Span};

use crate::error::{Error, ErrorKind, Result};

#[derive(Parser)]
#[grammar = "sexpr.pest"]
struct SexprParser;

/// Convert pest locations to kernel locations.
fn convert_span(span: Span) -> Location {
    let (x1, y1) = span.start_pos().line_col();
    let (x2, y2) = span.end_pos().line_col();

    ((x1, y1), (x2, y2)).into()
}

fn convert_error(err: pest::error::Error<Rule>) -> Error {
    let location = match err.line_col {
        LineColLocation::Pos(pos) => (pos, pos).into(),
        LineColLocation::Span(start, end) => (start, end).into(),
    };
    let err = err.renamed_rules(|rule| {
        match *rule {
            Rule::atom => "atom",
            Rule::list => "list",
            Rule::braced => "braced expression",
            Rule::EOI => "end of input",
            _ => "term",
        }
        .to_owned()
    });
    Error::new(ErrorKind::CannotParse(err.variant.message().into_owned()), location)
}

fn malformed<T>(location: Location, form: &str) -> Result<T> {
    Err(Error::new(ErrorKind::Malformed(form.to_owned()), location))
}

/// The name carried by an atom.
fn name<'i>(pair: &Pair<'i, Rule>) -> Result<&'i str> {
    match pair.as_rule() {
        Rule::atom => Ok(pair.as_str()),
        _ => malformed(convert_span(pair.as_span()), "name"),
    }
}

fn number(pair: &Pair<Rule>) -> Result<usize> {
    pair.as_str()
        .parse()
        .or_else(|_| malformed(convert_span(pair.as_span()), "natural number"))
}

/// A binder `x`, `{x}` or `{x A}`.
fn binder<'i>(pair: &Pair<'i, Rule>) -> Result<(Binder<'i>, Option<Builder<'i>>)> {
    let location = convert_span(pair.as_span());
    match pair.as_rule() {
        Rule::atom => Ok((Binder::explicit(pair.as_str()), None)),
        Rule::braced => {
            let inner: Vec<_> = pair.clone().into_inner().collect();
            match inner.as_slice() {
                [x] => Ok((Binder::implicit(name(x)?), None)),
                [x, ty] => Ok((Binder::implicit(name(x)?), Some(build(ty.clone())?))),
                _ => malformed(location, "implicit binder"),
            }
        },
        _ => malformed(location, "binder"),
    }
}

fn boxed<'i>(pair: &Pair<'i, Rule>) -> Result<Box<Builder<'i>>> {
    build(pair.clone()).map(Box::new)
}

/// The elements of a parenthesised group, as in the arguments of `HITApp`.
fn group<'i>(pair: &Pair<'i, Rule>) -> Result<Vec<Builder<'i>>> {
    match pair.as_rule() {
        Rule::list => pair.clone().into_inner().map(build).collect(),
        _ => malformed(convert_span(pair.as_span()), "argument group"),
    }
}

/// Applies a head to arguments, braced ones being implicit.
fn application<'i>(head: Builder<'i>, args: &[Pair<'i, Rule>], location: Location) -> Result<Builder<'i>> {
    args.iter().try_fold(head, |function, arg| {
        let (argument, icity) = match arg.as_rule() {
            Rule::braced => {
                let inner: Vec<_> = arg.clone().into_inner().collect();
                match inner.as_slice() {
                    [argument] => (boxed(argument)?, Icity::Implicit),
                    _ => return malformed(convert_span(arg.as_span()), "implicit argument"),
                }
            },
            _ => (boxed(arg)?, Icity::Explicit),
        };
        Ok(Builder::new(location, Payload::App(Box::new(function), argument, icity)))
    })
}

fn atom(text: &str, location: Location) -> Result<Builder> {
    let payload = match text {
        "_" => Payload::Hole(None),
        "Type" => Payload::Sort(0),
        "I" => Payload::Interval,
        "i0" => Payload::I0,
        "i1" => Payload::I1,
        _ => {
            if let Some(hole) = text.strip_prefix('?') {
                Payload::Hole(Some(hole))
            } else if let Ok(ix) = text.parse() {
                Payload::Index(ix)
            } else if let Some(level) = text.strip_prefix("Type").and_then(|level| level.parse().ok()) {
                Payload::Sort(level)
            } else {
                Payload::Var(text)
            }
        },
    };
    Ok(Builder::new(location, payload))
}

/// Build a term from errorless pest's output.
fn build(pair: Pair<Rule>) -> Result<Builder> {
    let location = convert_span(pair.as_span());
    match pair.as_rule() {
        Rule::atom => atom(pair.as_str(), location),
        Rule::list => list(pair.into_inner().collect(), location),
        _ => malformed(location, "term, implicit arguments only appear in applications"),
    }
}

#[allow(clippy::too_many_lines)]
fn list(items: Vec<Pair<Rule>>, location: Location) -> Result<Builder> {
    let Some((head, args)) = items.split_first() else {
        return malformed(location, "term, () is empty");
    };

    let keyword = match head.as_rule() {
        Rule::atom => head.as_str(),
        Rule::list => "",
        _ => return malformed(location, "application head"),
    };

    let payload = match (keyword, args) {
        ("Sort", [level]) => Payload::Sort(number(level)?),

        ("Var", [var]) => match number(var) {
            Ok(ix) => Payload::Index(ix),
            Err(_) => Payload::Var(name(var)?),
        },

        ("Global", [global]) => Payload::Global(name(global)?),

        ("IVar", [ix]) => Payload::IVar(number(ix)?),

        ("Pi", [x, domain, codomain]) => match binder(x)? {
            (binder, None) => Payload::Pi(binder, boxed(domain)?, boxed(codomain)?),
            _ => return malformed(location, "product, expected (Pi x A B) or (Pi {x A} B)"),
        },
        ("Pi", [x, codomain]) => match binder(x)? {
            (binder, Some(domain)) => Payload::Pi(binder, Box::new(domain), boxed(codomain)?),
            _ => return malformed(location, "product, expected (Pi x A B) or (Pi {x A} B)"),
        },

        ("->", [_, _, ..]) => {
            let Some((last, domains)) = args.split_last() else {
                return malformed(location, "arrow");
            };
            let codomain = build(last.clone())?;
            return domains.iter().try_rfold(codomain, |codomain, domain| {
                Ok(Builder::new(location, Payload::Pi(Binder::explicit("_"), boxed(domain)?, Box::new(codomain))))
            });
        },

        ("Lam" | "λ" | "\\" | "lambda", [x, body]) => {
            let (binder, annotation) = binder(x)?;
            Payload::Lam(binder, annotation.map(Box::new), boxed(body)?)
        },
        ("Lam" | "λ" | "\\" | "lambda", [x, annotation, body]) => match binder(x)? {
            (binder, None) => Payload::Lam(binder, Some(boxed(annotation)?), boxed(body)?),
            _ => return malformed(location, "abstraction, the binder is annotated twice"),
        },

        ("App", [function, rest @ ..]) if !rest.is_empty() => {
            return application(build(function.clone())?, rest, location);
        },

        ("Sigma" | "Σ", [x, first, second]) => Payload::Sigma(name(x)?, boxed(first)?, boxed(second)?),
        ("Pair", [fst, snd]) => Payload::Pair(boxed(fst)?, boxed(snd)?),
        ("Fst", [pair]) => Payload::Fst(boxed(pair)?),
        ("Snd", [pair]) => Payload::Snd(boxed(pair)?),

        ("Let", [x, value, body]) => Payload::Let(name(x)?, None, boxed(value)?, boxed(body)?),
        ("Let", [x, annotation, value, body]) => {
            Payload::Let(name(x)?, Some(boxed(annotation)?), boxed(value)?, boxed(body)?)
        },

        ("Meta", [id, rest @ ..]) => {
            let args = rest.iter().cloned().map(build).collect::<Result<_>>()?;
            Payload::Meta(number(id)?, args)
        },

        ("Id", [ty, lhs, rhs]) => Payload::Id(boxed(ty)?, boxed(lhs)?, boxed(rhs)?),
        ("Refl", [ty, point]) => Payload::Refl(boxed(ty)?, boxed(point)?),
        ("J", [ty, motive, base, lhs, rhs, path]) => Payload::J(Box::new([
            build(ty.clone())?,
            build(motive.clone())?,
            build(base.clone())?,
            build(lhs.clone())?,
            build(rhs.clone())?,
            build(path.clone())?,
        ])),

        ("Path", [ty, lhs, rhs]) => Payload::Path(boxed(ty)?, boxed(lhs)?, boxed(rhs)?),
        ("PathP", [family, lhs, rhs]) => Payload::PathP(boxed(family)?, boxed(lhs)?, boxed(rhs)?),
        ("PathLam" | "<>", [i, body]) => Payload::PathLam(name(i)?, boxed(body)?),
        ("PathApp" | "@", [path, point]) => Payload::PathApp(boxed(path)?, boxed(point)?),
        ("Transport", [family, element]) => Payload::Transport(boxed(family)?, boxed(element)?),

        ("HITApp", [hit, ctor, args, iargs]) => Payload::HitApp(name(hit)?, name(ctor)?, group(args)?, group(iargs)?),

        (
            "Sort" | "Var" | "Global" | "IVar" | "Pi" | "->" | "Lam" | "λ" | "\\" | "lambda" | "App" | "Sigma" | "Σ"
            | "Pair" | "Fst" | "Snd" | "Let" | "Meta" | "Id" | "Refl" | "J" | "Path" | "PathP" | "PathLam" | "<>"
            | "PathApp" | "@" | "Transport" | "HITApp",
            _,
        ) => return malformed(location, &format!("{keyword}, wrong number of arguments")),

        (_, []) => return build(head.clone()),

        _ => return application(build(head.clone())?, args, location),
    };

    Ok(Builder::new(location, payload))
}

/// Parse a surface term.
///
/// # Errors
/// Fails if the text is not a well-formed S-expression, or does not describe a term.
#[inline]
pub fn parse_surface(input: &str) -> Result<Builder> {
    let mut pairs = SexprParser::parse(Rule::term, input).map_err(convert_error)?;
    match pairs.next() {
        Some(pair) => build(pair),
        None => malformed(Location::default(), "term, the input is empty"),
    }
}

/// Parse a term and realise it into a core [`Term`], without elaborating it.
///
/// # Errors
/// Fails on syntax errors, and on holes.
#[inline]
pub fn parse_term(input: &str) -> Result<Term> {
    Ok(parse_surface(input)?.realise()?)
}

#[cfg(test)]
mod tests {
    use kernel::term::builders::*;

    use super::*;

    #[test]
    fn canonical() {
        assert_eq!(
            parse_term("(Pi A Type (Pi x (Var 0) (Var 1)))"),
            Ok(pi("A", sort(0), pi("x", var(0), var(1))))
        );
        assert_eq!(
            parse_term("(Lam n Nat (App succ (Var 0)))"),
            Ok(lam("n", global("Nat"), app(global("succ"), var(0))))
        );
        assert_eq!(parse_term("(Sort 3)"), Ok(sort(3)));
        assert_eq!(parse_term("(Lam x (Var 0))"), Ok(lam_untyped("x", var(0))));
        assert_eq!(parse_term("(Lam Nat Nat (Global Nat))"), Ok(lam("Nat", global("Nat"), global("Nat"))));
    }

    #[test]
    fn names() {
        assert_eq!(parse_term("(Lam x Nat x)"), Ok(lam("x", global("Nat"), var(0))));
        assert_eq!(parse_term("(Pi A Type (Pi x A A))"), parse_term("(Pi A Type (Pi x (Var 0) (Var 1)))"));
        assert_eq!(parse_term("(PathLam j (HITApp S1 loop () (j)))"), Ok(path_lam("j", Term::HitApp {
            hit: "S1".to_owned(),
            ctor: "loop".to_owned(),
            args: Vec::new(),
            iargs: vec![Term::IVar(0)],
        })));
    }

    #[test]
    fn aliases() {
        assert_eq!(parse_term("(λ x Nat x)"), parse_term("(Lam x Nat x)"));
        assert_eq!(parse_term("(\\ x Nat x)"), parse_term("(Lam x Nat x)"));
        assert_eq!(parse_term("(-> Nat Bool Nat)"), Ok(arrow(global("Nat"), arrow(global("Bool"), global("Nat")))));
        assert_eq!(parse_term("(Σ x Nat Bool)"), Ok(sigma("x", global("Nat"), global("Bool"))));
        assert_eq!(parse_term("(<> i (@ p i))"), Ok(path_lam("i", path_app(global("p"), Term::IVar(0)))));
        assert_eq!(parse_term("(succ (succ zero))"), parse_term("(App succ (App succ zero))"));
        assert_eq!(parse_term("(Lam x Nat 0)"), Ok(lam("x", global("Nat"), var(0))));
        assert_eq!(parse_term("Type2"), Ok(sort(2)));
    }

    #[test]
    fn implicits() {
        let expected = Term::App {
            function: Box::new(app(global("id"), global("zero"))),
            argument: Box::new(global("Nat")),
            icity: Icity::Implicit,
        };
        assert_eq!(parse_term("(App id zero {Nat})"), Ok(expected.clone()));
        assert_eq!(parse_term("(id zero {Nat})"), Ok(expected));
        assert_eq!(
            parse_term("(Pi {A Type} (-> A A))"),
            Ok(implicit_pi("A", sort(0), arrow(var(0), var(1))))
        );
    }

    #[test]
    fn holes() {
        let builder = parse_surface("(succ ?n)").unwrap();
        let Payload::App(_, ref argument, Icity::Explicit) = builder.payload else {
            panic!("expected an application, got {builder}");
        };
        assert_eq!(argument.payload, Payload::Hole(Some("n")));

        let err = parse_term("(succ _)").unwrap_err();
        assert_eq!(err.kind_name(), "unsolved metas");
        assert_eq!(err.location, Location::new((1, 7).into(), (1, 8).into()));
    }

    #[test]
    fn comments() {
        assert_eq!(parse_term("; the successor\n(succ ; of\n zero)"), parse_term("(succ zero)"));
    }

    #[test]
    fn failures() {
        let err = parse_term("(Pi x Nat").unwrap_err();
        assert_eq!(err.kind_name(), "parse error");
        assert_eq!(err.location.start.line, 1);

        let err = parse_term("(Pi x Nat Nat Nat)").unwrap_err();
        assert_eq!(err.to_string(), "malformed Pi, wrong number of arguments");
        assert_eq!(err.location, Location::new((1, 1).into(), (1, 19).into()));

        assert!(parse_term("()").is_err());
        assert!(parse_term("{x}").is_err());
        assert!(parse_term("(Sort x)").is_err());
        assert!(parse_term("").is_err());
        assert!(parse_term("zero zero").is_err());
    }
}
