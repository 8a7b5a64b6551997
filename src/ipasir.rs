//! IPASIR-style solver façade.
//!
//! The engine is a formula reader, not a solver: the state machine below
//! mirrors the incremental-solver contract (`add`/`assume`/`solve`/`release`)
//! so it can be dropped into pipelines expecting that interface, but the only
//! thing it actually does is clause-boundary bookkeeping on top of a [`Sink`].

use crate::{
    error::{Error, Result},
    types::{Clause, Lit},
};

pub const SAT: i32 = 10;
pub const UNSAT: i32 = 20;

/// Callbacks fired by the façade in strict order: `header` once, then for
/// each clause `clause_start`, `literal` per literal, `clause_end`, and a
/// single `finish` on release.
pub trait Sink {
    fn header(&mut self, var_count: usize, clause_count: usize) -> Result<()>;

    fn clause_start(&mut self) -> Result<()> {
        Ok(())
    }

    fn literal(&mut self, lit: Lit) -> Result<()>;

    fn clause_end(&mut self, clause: Clause) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Input,
    Sat,
    Unsat,
    Released,
}

#[derive(Clone, Copy, Debug)]
enum Op {
    Header,
    Add,
    Assume,
    Solve,
    Release,
}

impl State {
    /// Allowed-operations table; `Released` is terminal.
    fn allows(self, op: Op) -> bool {
        match self {
            State::Input | State::Sat | State::Unsat => {
                matches!(op, Op::Header | Op::Add | Op::Assume | Op::Solve | Op::Release)
            }
            State::Released => false,
        }
    }
}

pub struct Facade<S: Sink> {
    state: State,
    clause: Clause,
    open_clause: bool,
    sink: S,
}

impl<S: Sink> Facade<S> {
    pub fn new(sink: S) -> Self {
        Self {
            state: State::Input,
            clause: vec![],
            open_clause: false,
            sink,
        }
    }

    pub fn signature(&self) -> &'static str {
        "cnf-metrics reader 1.0.0"
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn check(&self, op: Op, what: &'static str) -> Result<()> {
        if self.state.allows(op) {
            Ok(())
        } else {
            Err(Error::Protocol(what))
        }
    }

    /// Forward the DIMACS header to the sink. Must precede any `add`.
    pub fn header(&mut self, var_count: usize, clause_count: usize) -> Result<()> {
        self.check(Op::Header, "header after release")?;
        self.state = State::Input;
        self.sink.header(var_count, clause_count)
    }

    /// Add one literal of the current clause, or terminate it with 0.
    pub fn add(&mut self, lit_or_zero: Lit) -> Result<()> {
        self.check(Op::Add, "add after release")?;
        self.state = State::Input;

        if lit_or_zero == 0 {
            if !self.open_clause {
                return Err(Error::EmptyClause);
            }
            let clause = std::mem::take(&mut self.clause);
            self.open_clause = false;
            self.sink.clause_end(clause)
        } else {
            if !self.open_clause {
                self.open_clause = true;
                self.sink.clause_start()?;
            }
            self.sink.literal(lit_or_zero)?;
            self.clause.push(lit_or_zero);
            Ok(())
        }
    }

    /// Assumptions are not supported by a pure formula reader.
    pub fn assume(&mut self, _lit: Lit) -> Result<()> {
        self.check(Op::Assume, "assume after release")?;
        Err(Error::Unsupported("assumptions are not supported"))
    }

    /// No search happens; the fixed result code is a protocol artifact.
    pub fn solve(&mut self) -> Result<i32> {
        self.check(Op::Solve, "solve after release")?;
        if self.open_clause {
            return Err(Error::Protocol("solve with an unterminated clause"));
        }
        self.state = State::Unsat;
        Ok(UNSAT)
    }

    /// Finalize the sink exactly once and enter the terminal state.
    pub fn release(&mut self) -> Result<()> {
        self.check(Op::Release, "release after release")?;
        if self.open_clause {
            return Err(Error::Protocol("release with an unterminated clause"));
        }
        self.sink.finish()?;
        self.state = State::Released;
        Ok(())
    }
}
