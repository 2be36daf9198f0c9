//! Snapshot history over a reduction, for scrubbing forward and backward.
//!
//! Every term produced by [`step`] is kept. Moving backward never
//! recomputes anything, and moving forward only calls `step` when the cursor
//! is on the newest snapshot.

use crate::Error;
use crate::ast::Term;
use crate::evaluator::{can_step, step};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Term>,
    position: usize,
}

impl History {
    pub fn new(term: Term) -> Self {
        History {
            snapshots: vec![term],
            position: 0,
        }
    }

    /// Term under the cursor
    pub fn current(&self) -> &Term {
        &self.snapshots[self.position]
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of recorded snapshots, including the initial term
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false: the initial term is recorded on construction
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[Term] {
        &self.snapshots
    }

    pub fn at_newest(&self) -> bool {
        self.position + 1 == self.snapshots.len()
    }

    /// Move to the next snapshot, computing it if needed.
    ///
    /// `Ok(None)` when the newest snapshot is already in normal form. A failed
    /// step leaves the history exactly as it was.
    pub fn forward(&mut self) -> Result<Option<&Term>, Error> {
        if !self.at_newest() {
            self.position += 1;
            return Ok(Some(self.current()));
        }

        let last = self.current();
        if !can_step(last) {
            return Ok(None);
        }
        let next = step(last).inspect_err(|err| {
            debug!(position = self.position, error = %err, "step failed");
        })?;

        self.snapshots.push(next);
        self.position += 1;
        debug!(step = self.position, term = %self.current(), "recorded snapshot");
        Ok(Some(self.current()))
    }

    /// Move to the previous snapshot; `None` at the initial term
    pub fn backward(&mut self) -> Option<&Term> {
        if self.position == 0 {
            return None;
        }
        self.position -= 1;
        Some(self.current())
    }

    /// Return to the initial term without discarding later snapshots
    pub fn rewind(&mut self) -> &Term {
        self.position = 0;
        self.current()
    }

    /// Jump to an already recorded snapshot
    pub fn seek(&mut self, index: usize) -> Option<&Term> {
        if index >= self.snapshots.len() {
            return None;
        }
        self.position = index;
        Some(self.current())
    }
}

/// Path of child indices to the single place where `before` and `after` differ.
///
/// Descends while both terms are lists of the same length with exactly one
/// differing child. `None` when the terms are equal.
pub fn changed_path(before: &Term, after: &Term) -> Option<Vec<usize>> {
    if before == after {
        return None;
    }

    let mut path = Vec::new();
    let (mut left, mut right) = (before, after);
    while let (Term::List(a), Term::List(b)) = (left, right) {
        if a.len() != b.len() {
            break;
        }
        let mut differing = a.iter().zip(b.iter()).enumerate().filter(|(_, (x, y))| x != y);
        match (differing.next(), differing.next()) {
            (Some((index, (x, y))), None) => {
                path.push(index);
                left = x;
                right = y;
            }
            _ => break,
        }
    }
    Some(path)
}
