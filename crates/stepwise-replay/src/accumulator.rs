//! State accumulator: folds a trace prefix into a [`VisualState`].
//!
//! # Invariant
//!
//! For every trace `T` and position `p`:
//!
//! ```text
//! materialize(initial, T, p) == fold(initial, T[0..=p])
//! ```
//!
//! no matter how `p` was reached. The fold keeps no state outside its return
//! value, so stepping, jumping and replaying after a cancellation all agree.
//!
//! # Seek Policy
//!
//! A trace whose steps all carry snapshots is seeked by reading the snapshot
//! at the target. Every other trace is seeked by folding, either forward from
//! a frame of the same trace at or before the target, or from the initial
//! state.

use std::sync::Arc;

use stepwise_trace::{Domain, Position, SeekPolicy, Step, StepKind, Trace, TraceId, VisualState};
use thiserror::Error;
use tracing::trace;

use crate::tables;

/// A step that could not be applied to the state it was given.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FoldError {
    /// An index or node points outside the structure.
    #[error("index {index} out of range for {len} elements")]
    OutOfRange { index: usize, len: usize },

    /// A move names a disk that is not on top of its source peg.
    #[error("disk {item} is not on top of peg {peg}")]
    NotOnTop { item: u32, peg: usize },

    /// The step needs a different structure than the state holds.
    #[error("{kind} step cannot be applied to a {domain} structure")]
    WrongStructure { kind: &'static str, domain: Domain },
}

/// Outcome of applying one step through a transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The state was updated.
    Applied,
    /// The table does not interpret this kind; the state is unchanged.
    Unsupported,
}

/// Per-domain transition rules.
///
/// Implementations must be pure: the only effect of `apply` is on `state`.
pub trait TransitionTable: Send + Sync {
    /// The structure family this table understands.
    fn domain(&self) -> Domain;

    /// Whether `apply` interprets `kind`. Must agree with `apply` returning
    /// anything other than [`Transition::Unsupported`].
    fn supports(&self, kind: &StepKind) -> bool;

    /// Apply one step.
    fn apply(&self, state: &mut VisualState, kind: &StepKind) -> Result<Transition, FoldError>;
}

/// A step left unapplied because the table did not support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedStep {
    pub position: usize,
    pub kind: &'static str,
}

/// A materialized trace position.
#[derive(Debug, Clone)]
pub struct Materialized {
    /// The trace this frame was folded from
    pub trace: TraceId,
    pub position: Position,
    pub state: Arc<VisualState>,
    /// Unsupported steps in `[0..=position]`
    pub skipped: Vec<SkippedStep>,
}

impl Materialized {
    /// The frame before any step.
    pub fn initial(trace: TraceId, state: Arc<VisualState>) -> Self {
        Self {
            trace,
            position: Position::BEFORE_START,
            state,
            skipped: Vec::new(),
        }
    }
}

/// Failure while materializing a position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("step {position}: {source}")]
pub struct MaterializeError {
    /// The step that failed
    pub position: usize,
    #[source]
    pub source: FoldError,
}

/// Folds traces through a transition table.
#[derive(Clone)]
pub struct Accumulator {
    table: Arc<dyn TransitionTable>,
}

impl std::fmt::Debug for Accumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accumulator")
            .field("domain", &self.table.domain())
            .finish()
    }
}

impl Accumulator {
    /// Use a custom transition table.
    pub fn new(table: Arc<dyn TransitionTable>) -> Self {
        Self { table }
    }

    /// Use the built-in table for `domain`.
    pub fn for_domain(domain: Domain) -> Self {
        Self::new(tables::for_domain(domain))
    }

    pub fn domain(&self) -> Domain {
        self.table.domain()
    }

    /// Apply the step at `position` to `state`.
    ///
    /// Returns the skipped step if the table does not support its kind.
    pub fn fold(
        &self,
        state: &mut VisualState,
        position: usize,
        step: &Step,
    ) -> Result<Option<SkippedStep>, MaterializeError> {
        match self.table.apply(state, &step.kind) {
            Ok(Transition::Applied) => Ok(None),
            Ok(Transition::Unsupported) => Ok(Some(SkippedStep {
                position,
                kind: step.kind.name(),
            })),
            Err(source) => Err(MaterializeError { position, source }),
        }
    }

    /// The state after applying `trace[0..=upto]` to `initial`.
    ///
    /// `upto` is clamped to the trace. Under the snapshot policy the stored
    /// snapshot is returned without folding; unsupported steps are still
    /// listed in `skipped`.
    pub fn materialize(
        &self,
        initial: &Arc<VisualState>,
        trace: &Trace,
        upto: Position,
    ) -> Result<Materialized, MaterializeError> {
        let upto = upto.min(trace.last_position());
        if trace.policy() == SeekPolicy::Snapshots {
            if let Some(snapshot) = trace.get(upto).and_then(|s| s.snapshot.clone()) {
                return Ok(Materialized {
                    trace: trace.id(),
                    position: upto,
                    state: snapshot,
                    skipped: self.unsupported(trace, upto),
                });
            }
        }
        let base = Materialized::initial(trace.id(), Arc::clone(initial));
        self.fold_forward(base, trace, upto)
    }

    /// Move from an already materialized frame to `target`.
    ///
    /// Folds forward from `from` when it belongs to the same trace and sits at
    /// or before `target`; otherwise seeks from scratch. Either way the result
    /// equals `materialize(initial, trace, target)`.
    pub fn seek(
        &self,
        initial: &Arc<VisualState>,
        trace: &Trace,
        from: &Materialized,
        target: Position,
    ) -> Result<Materialized, MaterializeError> {
        let target = target.min(trace.last_position());
        if from.trace == trace.id() && from.position == target {
            return Ok(from.clone());
        }
        let reusable = from.trace == trace.id()
            && from.position <= target
            && trace.policy() == SeekPolicy::Replay;
        if reusable {
            trace!(from = %from.position, to = %target, "folding forward from cached frame");
            return self.fold_forward(from.clone(), trace, target);
        }
        self.materialize(initial, trace, target)
    }

    /// Steps in `trace[0..=upto]` the table does not interpret.
    pub fn unsupported(&self, trace: &Trace, upto: Position) -> Vec<SkippedStep> {
        trace.steps()[..upto.applied().min(trace.len())]
            .iter()
            .enumerate()
            .filter(|(_, step)| !self.table.supports(&step.kind))
            .map(|(position, step)| SkippedStep {
                position,
                kind: step.kind.name(),
            })
            .collect()
    }

    fn fold_forward(
        &self,
        mut frame: Materialized,
        trace: &Trace,
        target: Position,
    ) -> Result<Materialized, MaterializeError> {
        let start = frame.position.applied();
        let end = target.applied();
        if start >= end {
            return Ok(frame);
        }
        let state = Arc::make_mut(&mut frame.state);
        for (position, step) in trace.steps()[start..end].iter().enumerate() {
            let position = start + position;
            if let Some(skipped) = self.fold(state, position, step)? {
                frame.skipped.push(skipped);
            }
        }
        frame.position = target;
        Ok(frame)
    }
}
