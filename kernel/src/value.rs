//! Semantic values, the target of evaluation.
//!
//! Values are in weak-head normal form. Binders are represented by closures pairing a term with
//! the environment it must be evaluated in; variables introduced while reading a value back are
//! de Bruijn *levels*, so that values never need to be shifted.

use std::rc::Rc;

use im::Vector;

use crate::term::{Icity, Level, MetaId, Name, Term};

/// A reference-counted value.
#[derive(Clone, Debug)]
pub struct Value(Rc<Payload>);

#[derive(Clone, Debug)]
pub enum Payload {
    /// An elimination stuck on a variable, an opaque constant or an unsolved metavariable.
    Neutral(Head, Vec<Elim>),

    Sort(Level),
    Pi(Name, Icity, Value, Closure),
    Lam(Name, Icity, Option<Value>, Closure),
    Sigma(Name, Value, Closure),
    Pair(Value, Value),

    Id(Value, Value, Value),
    Refl(Value, Value),

    Interval,
    I0,
    I1,

    Path(Value, Value, Value),

    /// The closure binds an interval variable.
    PathP(Closure, Value, Value),

    /// The closure binds an interval variable.
    PathLam(Name, Closure),

    /// A path constructor of a higher inductive type away from its endpoints.
    Hit {
        hit: String,
        ctor: String,
        args: Vec<Value>,
        iargs: Vec<Value>,
    },
}

#[derive(Clone, Debug)]
pub enum Head {
    /// A local variable, by level, with its type when known.
    Var(usize, Option<Value>),

    Global(String),
    Meta(MetaId, Vec<Value>),

    /// An interval variable, by level.
    IVar(usize),

    /// Transport along a line of types that is not constant.
    Transport(Closure, Value),
}

#[derive(Clone, Debug)]
pub enum Elim {
    App(Value, Icity),
    Fst,
    Snd,
    PathApp(Value),
    J {
        ty: Value,
        motive: Value,
        base: Value,
        lhs: Value,
        rhs: Value,
    },
}

/// Values of the variables in scope, outermost first.
#[derive(Clone, Debug, Default)]
pub struct Env {
    pub vars: Vector<Value>,
    pub ivars: Vector<Value>,
}

impl Env {
    #[must_use]
    pub fn push(&self, value: Value) -> Self {
        let mut vars = self.vars.clone();
        vars.push_back(value);
        Self {
            vars,
            ivars: self.ivars.clone(),
        }
    }

    #[must_use]
    pub fn ipush(&self, value: Value) -> Self {
        let mut ivars = self.ivars.clone();
        ivars.push_back(value);
        Self {
            vars: self.vars.clone(),
            ivars,
        }
    }

    /// The value of `Var(ix)`.
    #[must_use]
    pub fn var(&self, ix: usize) -> Option<&Value> {
        self.vars.len().checked_sub(ix + 1).and_then(|level| self.vars.get(level))
    }

    /// The value of `IVar(ix)`.
    #[must_use]
    pub fn ivar(&self, ix: usize) -> Option<&Value> {
        self.ivars.len().checked_sub(ix + 1).and_then(|level| self.ivars.get(level))
    }
}

/// A term waiting for the value of its innermost variable.
#[derive(Clone, Debug)]
pub struct Closure {
    pub env: Env,
    pub body: Rc<Term>,
}

impl Closure {
    #[must_use]
    pub fn new(env: &Env, body: &Term) -> Self {
        Self {
            env: env.clone(),
            body: Rc::new(body.clone()),
        }
    }
}

impl Value {
    #[inline]
    #[must_use]
    pub fn new(payload: Payload) -> Self {
        Self(Rc::new(payload))
    }

    #[inline]
    #[must_use]
    pub fn neutral(head: Head, spine: Vec<Elim>) -> Self {
        Self::new(Payload::Neutral(head, spine))
    }

    /// The variable of a given level.
    #[inline]
    #[must_use]
    pub fn var(level: usize, ty: Option<Self>) -> Self {
        Self::neutral(Head::Var(level, ty), Vec::new())
    }

    /// The interval variable of a given level.
    #[inline]
    #[must_use]
    pub fn ivar(level: usize) -> Self {
        Self::neutral(Head::IVar(level), Vec::new())
    }

    #[inline]
    #[must_use]
    pub fn global(name: &str) -> Self {
        Self::neutral(Head::Global(name.to_owned()), Vec::new())
    }

    /// Whether the value is an endpoint of the interval: `Some(false)` for `i0`, `Some(true)` for
    /// `i1`.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> Option<bool> {
        match *self.0 {
            Payload::I0 => Some(false),
            Payload::I1 => Some(true),
            _ => None,
        }
    }
}

impl core::ops::Deref for Value {
    type Target = Payload;

    #[inline]
    fn deref(&self) -> &Payload {
        &self.0
    }
}
