//! Tactics and the combinators composing them.
//!
//! A tactic transforms a proof state in place. Running a tactic is atomic: when it fails, the
//! state is rolled back to what it was before, so that combinators can turn failures into control
//! flow without observing partial work.

use core::fmt;
use std::sync::Arc;

use log::debug;

use crate::error::{Error, Result};
use crate::proof_state::ProofState;

type Body = dyn Fn(&mut ProofState) -> Result<()> + Send + Sync;

/// A named transformation of proof states.
#[derive(Clone)]
pub struct Tactic {
    name: String,
    body: Arc<Body>,
}

impl fmt::Debug for Tactic {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tactic").field(&self.name).finish()
    }
}

impl Tactic {
    #[inline]
    #[must_use]
    pub fn new<S, F>(name: S, body: F) -> Self
    where
        S: Into<String>,
        F: Fn(&mut ProofState) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            body: Arc::new(body),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the tactic, leaving the state untouched if it fails.
    ///
    /// # Errors
    /// The failure of the tactic.
    pub fn apply(&self, state: &mut ProofState) -> Result<()> {
        let checkpoint = state.checkpoint();
        (self.body)(state).map_err(|err| {
            debug!("{} failed: {err}", self.name);
            state.restore(checkpoint);
            err
        })
    }
}

/// Runs a tactic as a step of a proof: on success, the state before the tactic is pushed on the
/// history so that it can be undone; on failure, the state is left as it was and the error
/// records the goal the tactic was applied to.
///
/// # Errors
/// The failure of the tactic.
pub fn run(state: &mut ProofState, tactic: &Tactic) -> Result<()> {
    let snapshot = state.checkpoint();
    match tactic.apply(state) {
        Ok(()) => {
            debug!("{} succeeded, {} goal(s) left", tactic.name(), state.goal_count());
            state.push_history(snapshot);
            Ok(())
        },
        Err(err) => Err(match state.current_goal() {
            Some(goal) => err.on_goal(state.format_goal(goal)),
            None => err,
        }),
    }
}

/// Fail-fast sequential composition.
#[must_use]
pub fn seq(tactics: Vec<Tactic>) -> Tactic {
    Tactic::new("seq", move |state| tactics.iter().try_for_each(|tactic| tactic.apply(state)))
}

/// `first`, unless it fails, in which case `second`.
#[must_use]
pub fn orelse(first: Tactic, second: Tactic) -> Tactic {
    Tactic::new("orelse", move |state| first.apply(state).or_else(|_| second.apply(state)))
}

/// Runs a tactic, absorbing its failure.
#[must_use]
pub fn try_(tactic: Tactic) -> Tactic {
    Tactic::new("try", move |state| {
        if let Err(err) = tactic.apply(state) {
            debug!("try absorbed: {err}");
        }
        Ok(())
    })
}

/// Runs a tactic as long as it succeeds and changes the goals.
#[must_use]
pub fn repeat(tactic: Tactic) -> Tactic {
    Tactic::new("repeat", move |state| {
        loop {
            let before = state.goals().to_vec();
            if tactic.apply(state).is_err() || state.goals() == before.as_slice() {
                return Ok(());
            }
        }
    })
}

/// Like [`repeat`], at most `count` times.
#[must_use]
pub fn repeat_n(count: usize, tactic: Tactic) -> Tactic {
    Tactic::new("repeat", move |state| {
        for _ in 0..count {
            if tactic.apply(state).is_err() {
                break;
            }
        }
        Ok(())
    })
}

/// Runs a tactic exactly `count` times.
#[must_use]
pub fn do_n(count: usize, tactic: Tactic) -> Tactic {
    Tactic::new("do", move |state| (0..count).try_for_each(|_| tactic.apply(state)))
}

/// The first tactic to succeed.
#[must_use]
pub fn first(tactics: Vec<Tactic>) -> Tactic {
    Tactic::new("first", move |state| {
        let mut last = Error::failed("first expects at least one tactic");
        for tactic in &tactics {
            match tactic.apply(state) {
                Ok(()) => return Ok(()),
                Err(err) => last = err,
            }
        }
        Err(last)
    })
}

/// Runs a tactic on every goal, each one being focused in turn.
#[must_use]
pub fn all(tactic: Tactic) -> Tactic {
    Tactic::new("all", move |state| {
        let ids: Vec<_> = state.goals().iter().map(|goal| goal.id).collect();
        for id in ids {
            if state.goal(id).is_some() {
                state.focus(id)?;
                tactic.apply(state)?;
            }
        }
        Ok(())
    })
}

/// Runs a tactic on a given goal, then focuses back on the goal that was focused before, if it is
/// still open.
#[must_use]
pub fn focus(id: kernel::MetaId, tactic: Tactic) -> Tactic {
    Tactic::new("focus", move |state| {
        let previous = state.current_goal().map(|goal| goal.id);
        state.focus(id)?;
        tactic.apply(state)?;
        match previous {
            Some(previous) if previous != id && state.goal(previous).is_some() => state.focus(previous),
            _ => Ok(()),
        }
    })
}

/// Runs a tactic, failing if it leaves as many goals as there were.
#[must_use]
pub fn progress(tactic: Tactic) -> Tactic {
    Tactic::new("progress", move |state| {
        let before = state.goal_count();
        tactic.apply(state)?;
        if state.goal_count() == before {
            return Err(Error::failed(format!("{} made no progress", tactic.name())));
        }
        Ok(())
    })
}

/// Runs a tactic, failing if some goal is left.
#[must_use]
pub fn complete(tactic: Tactic) -> Tactic {
    Tactic::new("complete", move |state| {
        tactic.apply(state)?;
        if state.is_complete() {
            Ok(())
        } else {
            Err(Error::failed(format!("{} left {} goal(s)", tactic.name(), state.goal_count())))
        }
    })
}

/// Runs `then` if `condition` succeeds on a copy of the state, `otherwise` if it fails. The copy
/// is discarded.
#[must_use]
pub fn if_then_else(condition: Tactic, then: Tactic, otherwise: Tactic) -> Tactic {
    Tactic::new("if", move |state| {
        let mut probe = state.clone();
        if condition.apply(&mut probe).is_ok() {
            then.apply(state)
        } else {
            otherwise.apply(state)
        }
    })
}

/// Runs a tactic only if the state satisfies a predicate.
#[must_use]
pub fn guard<P>(predicate: P, tactic: Tactic) -> Tactic
where
    P: Fn(&ProofState) -> bool + Send + Sync + 'static,
{
    Tactic::new("guard", move |state| {
        if predicate(state) {
            tactic.apply(state)
        } else {
            Err(Error::failed(format!("guard of {} does not hold", tactic.name())))
        }
    })
}

#[must_use]
pub fn no_op() -> Tactic {
    Tactic::new("idtac", |_| Ok(()))
}

#[must_use]
pub fn fail_with<S: Into<String>>(message: S) -> Tactic {
    let message = message.into();
    Tactic::new("fail", move |_| Err(Error::failed(message.clone())))
}

#[cfg(test)]
mod tests {
    use kernel::context::Context;
    use kernel::environment::Environment;
    use kernel::term::builders::*;
    use kernel::term::Term;

    use super::*;

    fn fresh() -> ProofState {
        ProofState::new(Environment::with_builtins().unwrap(), global("Unit"), Context::new())
    }

    /// Adds a goal, then fails.
    fn sabotage() -> Tactic {
        Tactic::new("sabotage", |state| {
            state.add_goal(global("Bool"), Context::new());
            Err(Error::failed("sabotaged"))
        })
    }

    fn add_goal() -> Tactic {
        Tactic::new("add", |state| {
            state.add_goal(global("Bool"), Context::new());
            Ok(())
        })
    }

    fn solve() -> Tactic {
        Tactic::new("solve", |state| {
            let goal = state.focused()?;
            state.solve_goal(goal.id, global("tt"))
        })
    }

    #[test]
    fn failures_roll_back() {
        let mut state = fresh();
        let before = state.clone();
        let err = run(&mut state, &sabotage()).unwrap_err();
        assert_eq!(err.to_string(), "sabotaged");
        assert_eq!(state, before);
        assert_eq!(state.history_len(), 0);
        assert!(err.goal.unwrap().ends_with("Unit"));

        run(&mut state, &add_goal()).unwrap();
        assert_eq!(state.history_len(), 1);
        state.undo().unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn sequences() {
        let mut state = fresh();
        let before = state.clone();
        assert!(seq(vec![add_goal(), sabotage()]).apply(&mut state).is_err());
        assert_eq!(state, before);

        seq(vec![add_goal(), add_goal()]).apply(&mut state).unwrap();
        assert_eq!(state.goal_count(), 3);
    }

    #[test]
    fn alternatives() {
        let mut state = fresh();
        orelse(sabotage(), solve()).apply(&mut state).unwrap();
        assert!(state.is_complete());

        let mut state = fresh();
        let before = state.clone();
        try_(sabotage()).apply(&mut state).unwrap();
        assert_eq!(state, before);

        assert_eq!(
            first(vec![sabotage(), fail_with("last")]).apply(&mut state).unwrap_err().to_string(),
            "last"
        );
        first(vec![sabotage(), no_op(), solve()]).apply(&mut state).unwrap();
        assert_eq!(state, before);
        assert!(first(Vec::new()).apply(&mut state).is_err());
    }

    #[test]
    fn repetitions() {
        let mut state = fresh();
        repeat(solve()).apply(&mut state).unwrap();
        assert!(state.is_complete());

        let mut state = fresh();
        repeat(no_op()).apply(&mut state).unwrap();
        repeat_n(3, add_goal()).apply(&mut state).unwrap();
        assert_eq!(state.goal_count(), 4);

        let before = state.clone();
        assert!(do_n(5, solve()).apply(&mut state).is_err());
        assert_eq!(state, before);
        assert!(do_n(2, solve()).apply(&mut state).is_ok());
        assert_eq!(state.goal_count(), 2);
    }

    #[test]
    fn goal_selection() {
        let mut state = fresh();
        let bool_goal = state.add_goal(global("Bool"), Context::new());
        let root = state.current_goal().unwrap().id;

        focus(bool_goal, Tactic::new("true", move |state| state.solve_goal(bool_goal, global("true"))))
            .apply(&mut state)
            .unwrap();
        assert_eq!(state.current_goal().unwrap().id, root);
        assert_eq!(state.goal_count(), 1);

        state.add_goal(global("Unit"), Context::new());
        all(solve()).apply(&mut state).unwrap();
        assert!(state.is_complete());
        assert_eq!(state.extract(), Ok(global("tt")));
    }

    #[test]
    fn checks() {
        let mut state = fresh();
        assert!(progress(no_op()).apply(&mut state).is_err());
        progress(add_goal()).apply(&mut state).unwrap();

        let before = state.clone();
        assert!(complete(solve()).apply(&mut state).is_err());
        assert_eq!(state, before);
        complete(do_n(2, solve())).apply(&mut state).unwrap();

        let mut state = fresh();
        let before = state.clone();
        assert!(guard(ProofState::is_complete, solve()).apply(&mut state).is_err());
        assert_eq!(state, before);
        guard(|state| state.goal_count() == 1, solve()).apply(&mut state).unwrap();
    }

    #[test]
    fn conditionals() {
        let mut state = fresh();
        if_then_else(solve(), add_goal(), sabotage()).apply(&mut state).unwrap();
        assert_eq!(state.goal_count(), 2);
        assert_eq!(state.metas().len(), 2);

        if_then_else(sabotage(), sabotage(), solve()).apply(&mut state).unwrap();
        assert_eq!(state.goal_count(), 1);
        assert_eq!(state.current_goal().map(|goal| goal.ty.clone()), Some(Term::Global("Bool".to_owned())));
    }
}
