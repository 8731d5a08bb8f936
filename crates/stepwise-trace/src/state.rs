//! Materialized visual state: the renderable result of folding a trace prefix.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::structure::{Graph, Structure, Tree};

/// A directed edge in the traversed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
}

impl Edge {
    pub const fn new(source: usize, target: usize) -> Self {
        Self { source, target }
    }
}

/// Result of a search, once known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    Found { index: usize },
    NotFound,
}

/// Everything the renderer needs to draw one position of a trace.
///
/// Index-based sets (`selected`, `moved`, `less`, `greater`, `pivot`) follow
/// their elements across swaps. `sorted` and `visited` only ever grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualState {
    /// Current array, graph, tree or pegs
    pub structure: Structure,
    /// Positions touched by the most recent step
    pub active: Vec<usize>,
    pub selected: BTreeSet<usize>,
    /// Positions holding their final value
    pub sorted: BTreeSet<usize>,
    /// Positions whose element has been moved or overwritten
    pub moved: BTreeSet<usize>,
    /// Elements classified below the current pivot
    pub less: BTreeSet<usize>,
    /// Elements classified at or above the current pivot
    pub greater: BTreeSet<usize>,
    pub pivot: Option<usize>,
    pub visited: BTreeSet<usize>,
    pub current: Option<usize>,
    /// Queued nodes in queue order
    pub frontier: VecDeque<usize>,
    pub traversed: BTreeSet<Edge>,
    pub labels: BTreeMap<String, String>,
    pub outcome: Option<Outcome>,
}

impl VisualState {
    /// The state before any step: the structure and nothing highlighted.
    pub fn new(structure: Structure) -> Self {
        Self {
            structure,
            active: Vec::new(),
            selected: BTreeSet::new(),
            sorted: BTreeSet::new(),
            moved: BTreeSet::new(),
            less: BTreeSet::new(),
            greater: BTreeSet::new(),
            pivot: None,
            visited: BTreeSet::new(),
            current: None,
            frontier: VecDeque::new(),
            traversed: BTreeSet::new(),
            labels: BTreeMap::new(),
            outcome: None,
        }
    }

    pub fn array(values: impl Into<Vec<i64>>) -> Self {
        Self::new(Structure::Array(values.into()))
    }

    pub fn graph(graph: Graph) -> Self {
        Self::new(Structure::Graph(graph))
    }

    pub fn tree(tree: Tree) -> Self {
        Self::new(Structure::Tree(tree))
    }

    /// Array values, if this is an array-domain state.
    pub fn values(&self) -> Option<&[i64]> {
        match &self.structure {
            Structure::Array(values) => Some(values),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_has_no_highlights() {
        let state = VisualState::array(vec![3, 1, 2]);
        assert_eq!(state.values(), Some(&[3, 1, 2][..]));
        assert!(state.active.is_empty());
        assert!(state.sorted.is_empty());
        assert!(state.outcome.is_none());
    }

    #[test]
    fn state_serializes_structure_with_tag() {
        let state = VisualState::array(vec![1]);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["structure"]["type"], "array");
        assert_eq!(json["structure"]["data"][0], 1);
    }
}
