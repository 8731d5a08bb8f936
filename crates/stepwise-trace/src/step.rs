//! Steps: one observable event in an algorithm's execution.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::state::VisualState;

/// Which side of a pivot an element was classified on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Element is smaller than the pivot
    Less,
    /// Element is greater than or equal to the pivot
    Greater,
}

/// The event carried by a [`Step`].
///
/// Array-domain kinds address elements by position. Graph and tree kinds
/// address nodes by their index in the structure. Peg kinds address pegs by
/// index and disks by size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    /// Two elements are being compared
    Compare { i: usize, j: usize },

    /// An element joins the selection (current minimum, pivot candidate)
    Select { index: usize },

    /// An element leaves the selection
    Deselect { index: usize },

    /// A node (or array slot, when probing) becomes the current one
    Visit { node: usize },

    /// A node is pushed onto the frontier
    Queue { node: usize },

    /// A node is taken off the frontier
    Dequeue { node: usize },

    /// Two array elements exchange positions
    Swap { i: usize, j: usize },

    /// The top disk `item` moves from one peg to another
    Move { item: u32, from: usize, to: usize },

    /// Positions that hold their final value
    MarkSorted { indices: Vec<usize> },

    /// A node is done
    MarkVisited { node: usize },

    /// An edge enters the traversed set
    Explore { source: usize, target: usize },

    /// An edge leaves the traversed set (backtracking)
    Unexplore { source: usize, target: usize },

    /// The pivot settled at its final position; closes the current partition round
    Partition { pivot: usize },

    /// An element was placed on one side of the current pivot
    Classify { index: usize, side: Side },

    /// An array slot is overwritten (merge-style sorts)
    Write { index: usize, value: i64 },

    /// Auxiliary label (distance, bucket contents, output so far).
    /// Empty text removes the label.
    Label { key: String, text: String },

    /// Search hit
    Found { index: usize },

    /// Search miss
    NotFound,

    /// A kind this build does not know about
    #[serde(other)]
    Unknown,
}

impl StepKind {
    /// Wire name of the kind, for logs and notices.
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Compare { .. } => "compare",
            StepKind::Select { .. } => "select",
            StepKind::Deselect { .. } => "deselect",
            StepKind::Visit { .. } => "visit",
            StepKind::Queue { .. } => "queue",
            StepKind::Dequeue { .. } => "dequeue",
            StepKind::Swap { .. } => "swap",
            StepKind::Move { .. } => "move",
            StepKind::MarkSorted { .. } => "mark_sorted",
            StepKind::MarkVisited { .. } => "mark_visited",
            StepKind::Explore { .. } => "explore",
            StepKind::Unexplore { .. } => "unexplore",
            StepKind::Partition { .. } => "partition",
            StepKind::Classify { .. } => "classify",
            StepKind::Write { .. } => "write",
            StepKind::Label { .. } => "label",
            StepKind::Found { .. } => "found",
            StepKind::NotFound => "not_found",
            StepKind::Unknown => "unknown",
        }
    }
}

/// One immutable record in a [`Trace`](crate::Trace).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// What happened
    pub kind: StepKind,

    /// Full visual state after this step, when the producer supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Arc<VisualState>>,

    /// Caption for the renderer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Step {
    /// A step with no snapshot and no caption.
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            snapshot: None,
            note: None,
        }
    }

    /// Attach the state after this step.
    #[must_use]
    pub fn with_snapshot(mut self, state: impl Into<Arc<VisualState>>) -> Self {
        self.snapshot = Some(state.into());
        self
    }

    /// Attach a caption.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

impl From<StepKind> for Step {
    fn from(kind: StepKind) -> Self {
        Step::new(kind)
    }
}
