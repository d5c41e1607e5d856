use elaboration::Elaborator;
use kernel::context::Context;
use kernel::environment::Environment;
use kernel::meta::MetaStore;
use kernel::nbe::Evaluator;
use kernel::term::builders::*;
use kernel::type_checker::TypeChecker;
use kernel::zonk::zonk_full;
use parser::parse_surface;

fn environment() -> Environment {
    let mut env = Environment::with_builtins().unwrap();
    let ty = parser::parse_term("(Pi {A Type} (-> A A))").unwrap();
    let body = parser::parse_term("(Lam {A Type} (Lam x A x))").unwrap();
    env.add_definition("id", ty, body).unwrap();
    let ty = parser::parse_term("(Pi {A Type} (-> A (List A) (List A)))").unwrap();
    env.add_axiom("push", ty).unwrap();
    env
}

/// Synthesised types are accepted by checking, and elaborated terms pass the kernel.
#[test]
fn synthesis_agrees_with_checking() {
    let env = environment();
    let checker = TypeChecker::new(&env);
    let ctx = Context::new();

    let terms = [
        "(id zero)",
        "(id {Bool} true)",
        "(push zero (nil Nat))",
        "(Lam n Nat (succ n))",
        "(Pair zero tt)",
        "(Refl Nat (succ zero))",
        "(Let two Nat (succ (succ zero)) (Refl Nat two))",
        "(PathLam i (HITApp S1 loop () (i)))",
        "(J Nat (Lam y Nat (Lam p (Id Nat zero y) Nat)) zero zero zero (Refl Nat zero))",
        "(Pi {A Type} (-> A A))",
    ];
    for text in terms {
        let builder = parse_surface(text).unwrap();

        let metas = MetaStore::new();
        let (term, ty) = Elaborator::new(&env, &metas).infer(&ctx, &builder).unwrap();
        let term = zonk_full(&metas, &term).unwrap();
        let ty = zonk_full(&metas, &ty).unwrap();
        assert_eq!(checker.check(&ctx, &term, &ty), Ok(()), "{text}");

        let metas = MetaStore::new();
        let checked = Elaborator::new(&env, &metas).elaborate(&ctx, &builder, &ty).unwrap();
        let evaluator = Evaluator::new(&env, None);
        assert_eq!(evaluator.normalize(&ctx, &checked), evaluator.normalize(&ctx, &term), "{text}");
    }
}

#[test]
fn holes_are_solved_by_unification() {
    let env = environment();
    let metas = MetaStore::new();
    let mut elaborator = Elaborator::new(&env, &metas);

    // the hole is the implicit argument of id
    let builder = parse_surface("(id {_} zero)").unwrap();
    let (term, ty) = elaborator.infer(&Context::new(), &builder).unwrap();
    assert_eq!(zonk_full(&metas, &term).unwrap().to_string(), "(App (App id {Nat}) zero)");
    assert_eq!(ty, global("Nat"));

    // ?n is only constrained by the expected type
    let builder = parse_surface("(Refl Nat ?n)").unwrap();
    let expected = parser::parse_term("(Id Nat (succ zero) (succ zero))").unwrap();
    let term = elaborator.elaborate(&Context::new(), &builder, &expected).unwrap();
    assert_eq!(term.to_string(), "(Refl Nat (App succ zero))");
}

#[test]
fn failures_are_located() {
    let env = environment();
    let metas = MetaStore::new();
    let mut elaborator = Elaborator::new(&env, &metas);

    let builder = parse_surface("(Pair zero\n  (succ true))").unwrap();
    let err = elaborator.infer(&Context::new(), &builder).unwrap_err();
    assert_eq!(err.kind_name(), "type mismatch");
    let location = err.location.unwrap();
    assert_eq!((location.start.line, location.start.column), (2, 9));

    let builder = parse_surface("(id {zero} zero)").unwrap();
    let err = elaborator.infer(&Context::new(), &builder).unwrap_err();
    assert_eq!(err.kind_name(), "type mismatch");

    let builder = parse_surface("(succ {zero})").unwrap();
    let err = elaborator.infer(&Context::new(), &builder).unwrap_err();
    assert_eq!(err.kind_name(), "icity mismatch");

    let builder = parse_surface("(Fst zero)").unwrap();
    let err = elaborator.infer(&Context::new(), &builder).unwrap_err();
    assert_eq!(err.kind_name(), "sigma expected");

    let builder = parse_surface("(Pi x zero Nat)").unwrap();
    let err = elaborator.infer(&Context::new(), &builder).unwrap_err();
    assert_eq!(err.kind_name(), "sort expected");
}
