//! Sessions, extending a global environment item by item.
//!
//! Each item is elaborated and checked against the current environment, which is only extended
//! once every check passed: a failing item leaves the session as it was.

use elaboration::Elaborator;
use kernel::environment::EnvironmentError;
use kernel::zonk::zonk_full;
use kernel::{Context, Environment, MetaStore, Term, TypeChecker};
use log::debug;
use parser::{Item, TacticLine};
use tactics::ProofState;

use crate::error::Result;
use crate::interpreter;

/// A global environment, together with the means of extending it.
///
/// Cloning a session takes a snapshot of its environment: both copies then evolve independently.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Session {
    environment: Environment,
}

impl Session {
    /// A session over the builtin inductive types.
    ///
    /// # Errors
    /// Fails only if the builtins are ill-formed.
    #[inline]
    pub fn new() -> Result<Self> {
        Ok(Self::from_environment(Environment::with_builtins()?))
    }

    #[inline]
    #[must_use]
    pub const fn from_environment(environment: Environment) -> Self {
        Self { environment }
    }

    #[inline]
    #[must_use]
    pub const fn environment(&self) -> &Environment {
        &self.environment
    }

    fn fresh_name(&self, name: &str) -> Result<()> {
        if self.environment.contains(name) {
            return Err(EnvironmentError::AlreadyDefined(name.to_owned()).into());
        }
        Ok(())
    }

    /// Reads and checks a closed type.
    ///
    /// # Errors
    /// Fails if the text is not a term, or not a type.
    pub fn read_type(&self, text: &str) -> Result<Term> {
        let builder = parser::parse_surface(text)?;
        let metas = MetaStore::new();
        let ctx = Context::new();
        let (ty, _) = Elaborator::new(&self.environment, &metas).elaborate_type(&ctx, &builder)?;
        let ty = zonk_full(&metas, &ty)?;
        TypeChecker::new(&self.environment).sort_of(&ctx, &ty)?;
        Ok(ty)
    }

    /// Reads a closed term and checks it against a type.
    ///
    /// # Errors
    /// Fails if the text is not a term of the given type.
    pub fn read_term(&self, text: &str, ty: &Term) -> Result<Term> {
        let builder = parser::parse_surface(text)?;
        let metas = MetaStore::new();
        let ctx = Context::new();
        let term = Elaborator::new(&self.environment, &metas).elaborate(&ctx, &builder, ty)?;
        let term = zonk_full(&metas, &term)?;
        TypeChecker::new(&self.environment).check(&ctx, &term, ty)?;
        Ok(term)
    }

    /// Reads a closed term, returning it with its type.
    ///
    /// # Errors
    /// Fails if the text is not a well-typed term.
    pub fn synth(&self, text: &str) -> Result<(Term, Term)> {
        let builder = parser::parse_surface(text)?;
        let metas = MetaStore::new();
        let ctx = Context::new();
        let (term, _) = Elaborator::new(&self.environment, &metas).infer(&ctx, &builder)?;
        let term = zonk_full(&metas, &term)?;
        let checker = TypeChecker::new(&self.environment);
        let ty = checker.synth(&ctx, &term)?;
        Ok((term, checker.normalize(&ctx, &ty)?))
    }

    /// Reads a closed term and normalizes it.
    ///
    /// # Errors
    /// Fails if the text is not a well-typed term.
    pub fn eval(&self, text: &str) -> Result<Term> {
        let (term, _) = self.synth(text)?;
        Ok(TypeChecker::new(&self.environment).normalize(&Context::new(), &term)?)
    }

    /// Checks and adds a transparent definition, returning its body.
    ///
    /// # Errors
    /// Fails if the name is taken, or if the body is not of the given type.
    pub fn add_definition(&mut self, name: &str, ty: &str, body: &str) -> Result<Term> {
        self.fresh_name(name)?;
        let ty = self.read_type(ty)?;
        let body = self.read_term(body, &ty)?;
        self.environment.add_definition(name, ty, body.clone())?;
        Ok(body)
    }

    /// Checks and adds an axiom, returning its type.
    ///
    /// # Errors
    /// Fails if the name is taken, or if the type is not one.
    pub fn add_axiom(&mut self, name: &str, ty: &str) -> Result<Term> {
        self.fresh_name(name)?;
        let ty = self.read_type(ty)?;
        self.environment.add_axiom(name, ty.clone())?;
        Ok(ty)
    }

    /// A proof state whose only goal is the given closed type.
    ///
    /// # Errors
    /// Fails if the text is not a type.
    pub fn start_proof(&self, ty: &str) -> Result<ProofState> {
        let ty = self.read_type(ty)?;
        Ok(ProofState::new(self.environment.clone(), ty, Context::new()))
    }

    /// Extracts the proof of a complete state, checks it once more against the statement, and adds
    /// it as a theorem.
    ///
    /// # Errors
    /// Fails if goals are left, or if the proof does not check.
    pub fn qed(&mut self, name: &str, state: &ProofState) -> Result<Term> {
        self.fresh_name(name)?;
        let proof = state.extract()?;
        let ty = state.root().ty.clone();
        TypeChecker::new(&self.environment).check(&Context::new(), &proof, &ty)?;
        self.environment.add_theorem(name, ty, proof.clone())?;
        Ok(proof)
    }

    /// Proves a theorem with a sequence of tactic lines, then adds it.
    ///
    /// Errors are located in the line that raised them.
    ///
    /// # Errors
    /// Fails if a tactic line fails, or if the proof is incomplete.
    pub fn prove(&mut self, name: &str, ty: &str, proof: &[TacticLine], line: usize) -> Result<Term> {
        self.fresh_name(name).map_err(|err| err.within(line))?;
        let mut state = self.start_proof(ty).map_err(|err| err.within(line))?;
        for tactic in proof {
            debug!("{name}: {}", tactic.text);
            run_line(&mut state, tactic.text, tactic.inline).map_err(|err| err.within(tactic.line))?;
        }
        self.qed(name, &state).map_err(|err| err.within(line))
    }

    /// Checks an item and adds it to the environment, returning its body, axiom type or proof.
    ///
    /// # Errors
    /// Fails with an error located in the script if the item does not check.
    pub fn run_item(&mut self, item: &Item) -> Result<Term> {
        match *item {
            Item::Definition { name, ty, body, line } => self.add_definition(name, ty, body).map_err(|err| err.within(line)),
            Item::Axiom { name, ty, line } => self.add_axiom(name, ty).map_err(|err| err.within(line)),
            Item::Theorem {
                name,
                ty,
                ref proof,
                line,
            } => self.prove(name, ty, proof, line),
        }
    }
}

/// Runs the tactics of a line on a proof state, leaving the state untouched if one of them fails.
///
/// # Errors
/// Fails if the line is not made of tactics, or if one of them fails.
pub fn run_line(state: &mut ProofState, line: &str, inline: bool) -> Result<()> {
    let tactics = interpreter::read(line, inline)?;
    let saved = state.clone();
    for tactic in &tactics {
        if let Err(err) = tactics::run(state, tactic) {
            *state = saved;
            return Err(err.into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use kernel::term::builders::*;
    use kernel::term::{Icity, Name};

    use super::*;
    use crate::error::Kind;

    #[test]
    fn definitions() {
        let mut session = Session::new().unwrap();
        assert_eq!(session.add_definition("one", "Nat", "(App succ zero)"), Ok(app(global("succ"), global("zero"))));
        assert_eq!(session.eval("one"), Ok(app(global("succ"), global("zero"))));
        assert_eq!(session.synth("one").map(|(_, ty)| ty), Ok(global("Nat")));

        let err = session.add_definition("one", "Nat", "zero").unwrap_err();
        assert_eq!(err.kind_name(), "environment");

        let err = session.add_definition("two", "Nat", "tt").unwrap_err();
        assert_eq!(err.kind_name(), "type mismatch");
        assert!(!session.environment().contains("two"));
    }

    #[test]
    fn implicit_binders_are_in_scope() {
        let mut session = Session::new().unwrap();
        let body = session.add_definition("idi", "(Pi {A Type} (-> A A))", "(Lam x A x)").unwrap();
        assert_eq!(body, Term::Lam {
            name: Name::from("A"),
            icity: Icity::Implicit,
            annotation: Some(Box::new(sort(0))),
            body: Box::new(lam("x", var(0), var(0))),
        });
        assert_eq!(session.synth("(idi zero)").map(|(_, ty)| ty), Ok(global("Nat")));
        assert_eq!(session.eval("(idi zero)"), Ok(global("zero")));
    }

    #[test]
    fn axioms() {
        let mut session = Session::new().unwrap();
        assert_eq!(session.add_axiom("A", "Type"), Ok(sort(0)));
        assert!(session.add_axiom("a", "(Global A)").is_ok());
        assert_eq!(session.synth("a").map(|(_, ty)| ty), Ok(global("A")));
        assert!(session.add_axiom("b", "a").is_err());
        assert!(!session.environment().contains("b"));
    }

    #[test]
    fn proofs() {
        let mut session = Session::new().unwrap();
        let lines = [
            TacticLine {
                line: 2,
                text: "intro n",
                inline: false,
            },
            TacticLine {
                line: 3,
                text: "exact n",
                inline: false,
            },
        ];
        let proof = session.prove("idNat", "(Pi n Nat Nat)", &lines, 1).unwrap();
        assert_eq!(proof, lam("n", global("Nat"), var(0)));
        assert!(session.environment().contains("idNat"));
    }

    #[test]
    fn failing_proofs() {
        let mut session = Session::new().unwrap();
        let lines = [TacticLine {
            line: 4,
            text: "frobnicate",
            inline: false,
        }];
        let err = session.prove("t", "Unit", &lines, 3).unwrap_err();
        assert_eq!(err.kind, Kind::TacticLine("unknown tactic: frobnicate".to_owned()));
        assert_eq!(err.location.map(|location| location.start.line), Some(4));

        let err = session.prove("t", "Unit", &[], 3).unwrap_err();
        assert_eq!(err.kind_name(), "tactic failed");
        assert_eq!(err.location.map(|location| location.start.line), Some(3));
        assert!(!session.environment().contains("t"));
    }

    #[test]
    fn atomic_lines() {
        let session = Session::new().unwrap();
        let mut state = session.start_proof("(Pi n Nat Nat)").unwrap();
        let before = state.clone();
        assert!(run_line(&mut state, "intro n fail", true).is_err());
        assert_eq!(state, before);

        run_line(&mut state, "intro n", false).unwrap();
        assert_eq!(state.goal_count(), 1);
        run_line(&mut state, "exact zero", false).unwrap();
        assert!(state.is_complete());
    }
}
