//! Reference driver: repeatedly apply [`step`] while [`can_step`] holds.
//!
//! The step engine itself never stops on its own account, so a program that never
//! reaches normal form keeps a bare loop busy forever. [`DriverConfig`] lets
//! the caller bound the number of steps instead.

use crate::Error;
use crate::ast::Term;
use crate::evaluator::{can_step, step};
use std::iter::FusedIterator;
use tracing::{debug, warn};

/// Settings for a [`Stepper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverConfig {
    /// Upper bound on the number of steps; `None` runs until normal form
    pub max_steps: Option<usize>,
}

impl DriverConfig {
    pub fn unbounded() -> Self {
        DriverConfig { max_steps: None }
    }

    pub fn with_max_steps(max_steps: usize) -> Self {
        DriverConfig {
            max_steps: Some(max_steps),
        }
    }
}

/// Owns the current term of an evaluation and advances it one step at a time.
///
/// Also an [`Iterator`] over successive terms, which stops after the first
/// error or once normal form is reached.
#[derive(Debug, Clone)]
pub struct Stepper {
    current: Term,
    steps_taken: usize,
    config: DriverConfig,
    finished: bool,
}

impl Stepper {
    pub fn new(term: Term, config: DriverConfig) -> Self {
        Stepper {
            current: term,
            steps_taken: 0,
            config,
            finished: false,
        }
    }

    pub fn current(&self) -> &Term {
        &self.current
    }

    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    pub fn is_normal_form(&self) -> bool {
        !can_step(&self.current)
    }

    /// Perform one step.
    ///
    /// Returns `Ok(None)` once the term is in normal form. On error the
    /// current term is left as it was.
    pub fn advance(&mut self) -> Result<Option<&Term>, Error> {
        if !can_step(&self.current) {
            return Ok(None);
        }

        if let Some(limit) = self.config.max_steps
            && self.steps_taken >= limit
        {
            warn!(limit, "step limit reached before normal form");
            return Err(Error::StepLimitExceeded(limit));
        }

        match step(&self.current) {
            Ok(next) => {
                self.steps_taken += 1;
                debug!(step = self.steps_taken, term = %next, "step completed");
                self.current = next;
                Ok(Some(&self.current))
            }
            Err(err) => {
                debug!(step = self.steps_taken + 1, error = %err, "step failed");
                Err(err)
            }
        }
    }

    /// Step until normal form and return the final term
    pub fn run(&mut self) -> Result<Term, Error> {
        while self.advance()?.is_some() {}
        Ok(self.current.clone())
    }

    pub fn into_term(self) -> Term {
        self.current
    }
}

impl Iterator for Stepper {
    type Item = Result<Term, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.advance().map(|next| next.cloned()) {
            Ok(Some(term)) => Some(Ok(term)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for Stepper {}

/// Reduce `term` to normal form under `config`
pub fn evaluate(term: Term, config: DriverConfig) -> Result<Term, Error> {
    Stepper::new(term, config).run()
}
