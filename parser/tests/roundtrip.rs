use kernel::context::Context;
use kernel::environment::Environment;
use kernel::term::builders::*;
use kernel::type_checker::TypeChecker;
use parser::{parse_surface, parse_term};

const SEED_TERMS: &str = include_str!("fixtures/seed_terms.sexp");

fn seed_terms() -> impl Iterator<Item = &'static str> {
    SEED_TERMS.lines().map(str::trim).filter(|line| !line.is_empty() && !line.starts_with(';'))
}

#[test]
fn seed_terms_are_canonical() {
    assert!(seed_terms().count() >= 30);

    for text in seed_terms() {
        let term = parse_term(text).unwrap_or_else(|err| panic!("{text}: {err}"));
        let printed = term.to_string();
        assert_eq!(printed, text);
        assert_eq!(parse_term(&printed), Ok(term));
        assert_eq!(parse_term(&printed).unwrap().to_string(), printed);
    }
}

#[test]
fn surface_terms_reach_canonical_forms() {
    let cases = [
        ("(λ x Nat x)", "(Lam x Nat (Var 0))"),
        ("(-> Nat Nat)", "(Pi _ Nat Nat)"),
        ("(Pi {A Type} (-> A A))", "(Pi {A Type} (Pi _ (Var 0) (Var 1)))"),
        ("(succ (succ zero))", "(App succ (App succ zero))"),
        ("(<> i (@ p i))", "(PathLam i (PathApp p (IVar 0)))"),
        ("(PathP (Path Nat zero zero) (<> j zero) (<> j zero))", "(PathP (Path Nat zero zero) (PathLam j zero) (PathLam j zero))"),
        ("Type3", "(Sort 3)"),
    ];
    for (surface, canonical) in cases {
        let term = parse_term(surface).unwrap();
        assert_eq!(term.to_string(), canonical);
        assert_eq!(parse_term(canonical), Ok(term));
    }
}

#[test]
fn shadowed_globals_round_trip() {
    let term = lam("zero", global("Nat"), app(global("succ"), global("zero")));
    let printed = term.to_string();
    assert_eq!(printed, "(Lam zero Nat (App succ (Global zero)))");
    assert_eq!(parse_term(&printed), Ok(term));
}

fn nest(depth: usize, open: &str, leaf: &str) -> String {
    let mut text = String::new();
    for ix in 0..depth {
        text.push_str(&open.replace('#', &ix.to_string()));
    }
    text.push_str(leaf);
    text.push_str(&")".repeat(depth));
    text
}

#[test]
fn deep_nesting() {
    let env = Environment::with_builtins().unwrap();
    let checker = TypeChecker::new(&env);
    let ctx = Context::new();

    let pis = parse_term(&nest(100, "(Pi x# Nat ", "Nat")).unwrap();
    assert_eq!(checker.sort_of(&ctx, &pis), Ok(0));

    let apps = parse_term(&nest(100, "(succ ", "zero")).unwrap();
    assert_eq!(checker.synth(&ctx, &apps), Ok(global("Nat")));

    let lams = parse_term(&nest(100, "(Lam x# Nat ", "x0")).unwrap();
    assert_eq!(checker.check(&ctx, &lams, &pis), Ok(()));

    assert!(parse_surface(&nest(100, "(", "_")).is_ok());
}

#[test]
fn locations() {
    let builder = parse_surface("(Pi x Nat\n  (Id Nat x x))").unwrap();
    assert_eq!(builder.location.start.line, 1);
    assert_eq!(builder.location.end.line, 2);

    let err = parse_term("(Pi x Nat\n  (Id Nat x _))").unwrap_err();
    assert_eq!(err.location.start.line, 2);
    assert_eq!(err.location.start.column, 13);
    assert!(parse_term("(Id Nat x)").is_err());
}
