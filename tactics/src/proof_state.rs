//! Proof states: the goals left to prove a statement.
//!
//! Each goal is an unsolved metavariable, together with the context it lives in and the type it
//! must inhabit. Tactics solve goals with terms that may mention new metavariables, which become
//! the next goals. Once every goal is solved, the proof term of the statement is the zonked
//! solution of the first metavariable.

use core::fmt::Write;

use kernel::context::Context;
use kernel::environment::Environment;
use kernel::meta::MetaStore;
use kernel::nbe::Evaluator;
use kernel::term::pretty::Named;
use kernel::term::{MetaId, Term};
use kernel::zonk::zonk_full;
use log::debug;

use crate::error::{Error, Result};

/// A goal, identified by its metavariable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Goal {
    pub id: MetaId,
    pub ty: Term,

    /// The hypotheses of the goal.
    pub context: Context,
}

impl Goal {
    /// The occurrence of the goal's metavariable in its own context.
    #[inline]
    #[must_use]
    pub fn hole(&self) -> Term {
        Term::meta(self.id, self.context.len())
    }
}

/// A goal to be created by a tactic.
#[derive(Clone, Debug)]
pub struct Subgoal {
    pub ty: Term,
    pub context: Context,
}

/// What a snapshot restores.
#[derive(Clone, Debug)]
pub(crate) struct Snapshot {
    goals: Vec<Goal>,
    metas: MetaStore,
}

#[derive(Clone, Debug)]
pub struct ProofState {
    environment: Environment,
    metas: MetaStore,

    /// The goals left, the focused one first.
    goals: Vec<Goal>,

    /// The statement being proved.
    root: Goal,

    history: Vec<Snapshot>,
}

/// Two states are equal when they have the same goals and metavariables, whatever their history.
impl PartialEq for ProofState {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.goals == other.goals && self.metas == other.metas && self.root == other.root
    }
}

impl Eq for ProofState {}

impl ProofState {
    /// A state with the single goal `ty` under the hypotheses `context`.
    #[must_use]
    pub fn new(environment: Environment, ty: Term, context: Context) -> Self {
        let metas = MetaStore::new();
        let id = metas.fresh(ty.clone(), context.clone(), None);
        let root = Goal { id, ty, context };
        Self {
            environment,
            metas,
            goals: vec![root.clone()],
            root,
            history: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn environment(&self) -> &Environment {
        &self.environment
    }

    #[inline]
    #[must_use]
    pub const fn metas(&self) -> &MetaStore {
        &self.metas
    }

    /// The goal this state was created with.
    #[inline]
    #[must_use]
    pub const fn root(&self) -> &Goal {
        &self.root
    }

    #[inline]
    #[must_use]
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    #[inline]
    #[must_use]
    pub fn goal_count(&self) -> usize {
        self.goals.len()
    }

    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.goals.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn current_goal(&self) -> Option<&Goal> {
        self.goals.first()
    }

    /// The focused goal.
    ///
    /// # Errors
    /// Fails when there is none left.
    #[inline]
    pub fn focused(&self) -> Result<Goal> {
        self.current_goal()
            .cloned()
            .ok_or_else(|| Error::failed("no goals left").hint("the proof is complete, end it with Qed"))
    }

    #[inline]
    #[must_use]
    pub fn goal(&self, id: MetaId) -> Option<&Goal> {
        self.goals.iter().find(|goal| goal.id == id)
    }

    fn position(&self, id: MetaId) -> Result<usize> {
        self.goals
            .iter()
            .position(|goal| goal.id == id)
            .ok_or_else(|| Error::failed(format!("no goal {id}")))
    }

    /// Swaps the focused goal with the goal `id`.
    ///
    /// # Errors
    /// Fails if there is no such goal.
    pub fn focus(&mut self, id: MetaId) -> Result<()> {
        let position = self.position(id)?;
        self.goals.swap(0, position);
        Ok(())
    }

    /// Adds a goal at the end of the list.
    pub fn add_goal(&mut self, ty: Term, context: Context) -> MetaId {
        let id = self.metas.fresh(ty.clone(), context.clone(), None);
        self.goals.push(Goal { id, ty, context });
        id
    }

    /// Changes the statement of a goal, for a convertible one.
    ///
    /// # Errors
    /// Fails if there is no such goal.
    pub fn replace_goal(&mut self, id: MetaId, ty: Term, context: Context) -> Result<()> {
        let position = self.position(id)?;
        self.goals[position] = Goal { id, ty, context };
        Ok(())
    }

    /// Solves a goal with a term living in its context.
    ///
    /// # Errors
    /// Fails if there is no such goal.
    pub fn solve_goal(&mut self, id: MetaId, term: Term) -> Result<()> {
        let position = self.position(id)?;
        debug!("{id} := {term}");
        self.metas.solve(id, term)?;
        self.goals.remove(position);
        Ok(())
    }

    /// Solves a goal with a skeleton mentioning new goals.
    ///
    /// A metavariable is allocated for each subgoal, then `build` makes the skeleton out of their
    /// identifiers. The subgoals replace their parent in the list, in the given order.
    ///
    /// # Errors
    /// Fails if there is no such goal.
    pub fn solve_goal_with_subgoals<F>(&mut self, id: MetaId, subgoals: Vec<Subgoal>, build: F) -> Result<Vec<MetaId>>
    where
        F: FnOnce(&[MetaId]) -> Term,
    {
        let position = self.position(id)?;
        let goals: Vec<Goal> = subgoals
            .into_iter()
            .map(|Subgoal { ty, context }| Goal {
                id: self.metas.fresh(ty.clone(), context.clone(), None),
                ty,
                context,
            })
            .collect();
        let ids: Vec<MetaId> = goals.iter().map(|goal| goal.id).collect();

        let skeleton = build(&ids);
        debug!("{id} := {skeleton}");
        self.metas.solve(id, skeleton)?;
        self.goals.splice(position..=position, goals);
        Ok(ids)
    }

    /// Solves a goal with a term whose unsolved metavariables, already allocated, become the new
    /// goals in their place.
    ///
    /// # Errors
    /// Fails if there is no such goal.
    pub fn solve_goal_with_metas(&mut self, id: MetaId, term: Term, metas: &[MetaId]) -> Result<()> {
        let position = self.position(id)?;
        let mut goals = Vec::new();
        for &meta in metas {
            let entry = self.metas.lookup(meta)?;
            if !entry.is_solved() {
                goals.push(Goal {
                    id: meta,
                    ty: kernel::zonk::zonk(&self.metas, &entry.ty),
                    context: entry.context,
                });
            }
        }
        debug!("{id} := {term}");
        self.metas.solve(id, term)?;
        self.goals.splice(position..=position, goals);
        Ok(())
    }

    /// Replaces the metavariables of this state by the given ones, once a speculative computation
    /// on a copy of them succeeded.
    pub fn commit_metas(&mut self, metas: MetaStore) {
        self.metas = metas;
    }

    pub(crate) fn checkpoint(&self) -> Snapshot {
        Snapshot {
            goals: self.goals.clone(),
            metas: self.metas.clone(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        self.goals = snapshot.goals;
        self.metas = snapshot.metas;
    }

    pub(crate) fn push_history(&mut self, snapshot: Snapshot) {
        self.history.push(snapshot);
    }

    /// Pushes a copy of the goals and metavariables on the history.
    pub fn save(&mut self) {
        let snapshot = self.checkpoint();
        self.push_history(snapshot);
    }

    /// Restores the last snapshot.
    ///
    /// # Errors
    /// Fails when the history is empty.
    pub fn undo(&mut self) -> Result<()> {
        let snapshot = self.history.pop().ok_or_else(|| Error::failed("nothing to undo"))?;
        self.restore(snapshot);
        Ok(())
    }

    /// Number of snapshots that can be restored.
    #[inline]
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// The proof term of the statement, once complete.
    ///
    /// # Errors
    /// Fails if goals are left, or if the proof still mentions unsolved metavariables.
    pub fn extract(&self) -> Result<Term> {
        if !self.is_complete() {
            return Err(Error::failed(format!("{} goal(s) left", self.goal_count())).hint("finish every goal before Qed"));
        }
        Ok(zonk_full(&self.metas, &self.root.hole())?)
    }

    /// The innermost hypothesis of the focused goal called `name`, with its index and type.
    #[must_use]
    pub fn lookup_hypothesis(&self, name: &str) -> Option<(usize, Term)> {
        let goal = self.current_goal()?;
        let ix = goal.context.lookup(name)?;
        Some((ix, goal.context.type_of(ix)?))
    }

    /// Normal form of a term of the context of a goal.
    ///
    /// # Errors
    /// Fails only on kernel bugs.
    pub fn normalize(&self, context: &Context, term: &Term) -> Result<Term> {
        Ok(Evaluator::new(&self.environment, Some(&self.metas)).normalize(context, term)?)
    }

    /// Prints a goal as its hypotheses above its type.
    #[must_use]
    pub fn format_goal(&self, goal: &Goal) -> String {
        let mut out = String::new();
        let mut names: Vec<String> = Vec::with_capacity(goal.context.len());
        for binding in goal.context.bindings() {
            let ty = kernel::zonk::zonk(&self.metas, &binding.ty);
            let name = binding.name.as_str();
            let _ = writeln!(out, "  {name} : {}", Named {
                term: &ty,
                names: &names
            });
            names.push(name.to_owned());
        }
        let ty = kernel::zonk::zonk(&self.metas, &goal.ty);
        let _ = writeln!(out, "  ============================");
        let _ = write!(out, "  {}", Named { term: &ty, names: &names });
        out
    }

    /// Prints every goal, the focused one first.
    #[must_use]
    pub fn format_state(&self) -> String {
        if self.is_complete() {
            return "No more goals.".to_owned();
        }

        let count = self.goal_count();
        let mut out = format!("{count} goal{}", if count == 1 { "" } else { "s" });
        for (ix, goal) in self.goals.iter().enumerate() {
            let focused = if ix == 0 { " (focused)" } else { "" };
            let _ = write!(out, "\n\nGoal {}{focused}:\n{}", goal.id.0, self.format_goal(goal));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use kernel::term::builders::*;
    use kernel::term::Icity;

    use super::*;

    fn state() -> ProofState {
        let env = Environment::with_builtins().unwrap();
        ProofState::new(env, pi("n", global("Nat"), global("Nat")), Context::new())
    }

    #[test]
    fn root_goal() {
        let state = state();
        assert_eq!(state.goal_count(), 1);
        assert_eq!(state.current_goal().unwrap().id, MetaId(0));
        assert!(!state.is_complete());
        assert!(state.extract().is_err());
    }

    #[test]
    fn subgoals_replace_their_parent() {
        let mut state = state();
        let ctx = Context::new().extend("n", global("Nat"), Icity::Explicit);
        let ids = state
            .solve_goal_with_subgoals(
                MetaId(0),
                vec![Subgoal {
                    ty: global("Nat"),
                    context: ctx.clone(),
                }],
                |ids| lam("n", global("Nat"), Term::meta(ids[0], 1)),
            )
            .unwrap();
        assert_eq!(state.current_goal().unwrap().id, ids[0]);
        assert_eq!(state.lookup_hypothesis("n"), Some((0, global("Nat"))));

        state.solve_goal(ids[0], app(global("succ"), var(0))).unwrap();
        assert!(state.is_complete());
        assert_eq!(state.extract(), Ok(lam("n", global("Nat"), app(global("succ"), var(0)))));
    }

    #[test]
    fn focus_and_undo() {
        let mut state = state();
        let before = state.clone();
        state.save();

        let first = state.add_goal(global("Bool"), Context::new());
        let second = state.add_goal(global("Unit"), Context::new());
        state.focus(second).unwrap();
        assert_eq!(state.current_goal().unwrap().id, second);
        assert_eq!(state.goals()[2].id, MetaId(0));
        assert!(state.goal(first).is_some());

        state.undo().unwrap();
        assert_eq!(state, before);
        assert_eq!(state.metas().len(), 1);
        assert!(state.undo().is_err());
    }

    #[test]
    fn formatting() {
        let mut state = state();
        assert!(state.format_state().starts_with("1 goal\n\nGoal 0 (focused):"));

        let ctx = Context::new().extend("n", global("Nat"), Icity::Explicit);
        state
            .solve_goal_with_subgoals(
                MetaId(0),
                vec![Subgoal {
                    ty: id(global("Nat"), var(0), var(0)),
                    context: ctx,
                }],
                |ids| lam("n", global("Nat"), Term::meta(ids[0], 1)),
            )
            .unwrap();
        let goal = state.current_goal().unwrap().clone();
        assert_eq!(
            state.format_goal(&goal),
            "  n : Nat\n  ============================\n  (Id Nat n n)"
        );

        state.solve_goal(goal.id, refl(global("Nat"), var(0))).unwrap();
        assert_eq!(state.format_state(), "No more goals.");
    }
}
