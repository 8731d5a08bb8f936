//! Stepwise Trace Model
//!
//! Pure data describing one algorithm run as an ordered list of steps.
//!
//! # Overview
//!
//! - [`Step`]: one observable event (compare, swap, visit, move, ...), with an
//!   optional snapshot of the full visual state after it
//! - [`Trace`]: the immutable, cheaply cloned step sequence of one run,
//!   fingerprinted by [`TraceId`]
//! - [`Position`]: where playback is, `-1` meaning "before the first step"
//! - [`VisualState`]: what a renderer draws at a position
//! - [`Structure`]: the domain snapshot inside a visual state (array, graph,
//!   tree, pegs)
//!
//! Nothing here interprets steps. Folding a trace prefix into a
//! [`VisualState`] is the job of `stepwise-replay`.

mod error;
mod state;
mod step;
mod structure;
mod trace;

pub use error::{Error, Result};
pub use state::{Edge, Outcome, VisualState};
pub use step::{Side, Step, StepKind};
pub use structure::{Domain, Graph, Structure, Tree, TreeNode};
pub use trace::{Position, SeekPolicy, Trace, TraceId};
