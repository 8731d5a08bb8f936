//! Reference producers: run an algorithm on an input and record its steps.
//!
//! Every producer is deterministic in its input. Random inputs come from
//! [`InputGenerator`], which is seeded, so a run request can be reproduced.

mod graph;
mod hanoi;
mod searching;
mod sorting;
mod tree;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use stepwise_replay::Accumulator;
use stepwise_trace::{Graph, Step, StepKind, Structure, Tree, VisualState};
use tracing::debug;

use crate::error::{Error, Result};

/// Largest tower the recursion producer accepts; the trace has `2^n - 1` moves.
pub const MAX_DISKS: u32 = 10;

/// Visualizer family an algorithm belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Sorting,
    Searching,
    Graph,
    Tree,
    Recursion,
}

/// The reference algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    BubbleSort,
    SelectionSort,
    InsertionSort,
    QuickSort,
    MergeSort,
    LinearSearch,
    BinarySearch,
    BreadthFirst,
    DepthFirst,
    PreOrder,
    InOrder,
    PostOrder,
    Hanoi,
}

impl Algorithm {
    pub const ALL: [Algorithm; 13] = [
        Algorithm::BubbleSort,
        Algorithm::SelectionSort,
        Algorithm::InsertionSort,
        Algorithm::QuickSort,
        Algorithm::MergeSort,
        Algorithm::LinearSearch,
        Algorithm::BinarySearch,
        Algorithm::BreadthFirst,
        Algorithm::DepthFirst,
        Algorithm::PreOrder,
        Algorithm::InOrder,
        Algorithm::PostOrder,
        Algorithm::Hanoi,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::BubbleSort => "bubble-sort",
            Algorithm::SelectionSort => "selection-sort",
            Algorithm::InsertionSort => "insertion-sort",
            Algorithm::QuickSort => "quick-sort",
            Algorithm::MergeSort => "merge-sort",
            Algorithm::LinearSearch => "linear-search",
            Algorithm::BinarySearch => "binary-search",
            Algorithm::BreadthFirst => "breadth-first",
            Algorithm::DepthFirst => "depth-first",
            Algorithm::PreOrder => "pre-order",
            Algorithm::InOrder => "in-order",
            Algorithm::PostOrder => "post-order",
            Algorithm::Hanoi => "hanoi",
        }
    }

    pub fn family(&self) -> Family {
        match self {
            Algorithm::BubbleSort
            | Algorithm::SelectionSort
            | Algorithm::InsertionSort
            | Algorithm::QuickSort
            | Algorithm::MergeSort => Family::Sorting,
            Algorithm::LinearSearch | Algorithm::BinarySearch => Family::Searching,
            Algorithm::BreadthFirst | Algorithm::DepthFirst => Family::Graph,
            Algorithm::PreOrder | Algorithm::InOrder | Algorithm::PostOrder => Family::Tree,
            Algorithm::Hanoi => Family::Recursion,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| Error::UnknownAlgorithm(s.to_string()))
    }
}

/// Input to a producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Input {
    /// Values to sort
    Values { values: Vec<i64> },
    /// Values to search and the value sought
    Search { values: Vec<i64>, target: i64 },
    /// Graph to traverse from `start`
    Graph { graph: Graph, start: usize },
    /// Values inserted into a binary search tree, in order
    Tree { values: Vec<i64> },
    /// Height of a tower of Hanoi
    Disks { disks: u32 },
}

impl Input {
    /// Number of elements the producer will work over.
    pub fn size(&self) -> usize {
        match self {
            Input::Values { values } | Input::Search { values, .. } | Input::Tree { values } => {
                values.len()
            }
            Input::Graph { graph, .. } => graph.node_count().max(graph.edges.len()),
            Input::Disks { disks } => *disks as usize,
        }
    }
}

/// A recorded run: where it starts and what happened.
#[derive(Debug, Clone)]
pub struct Run {
    pub algorithm: Algorithm,
    pub initial: VisualState,
    pub steps: Vec<Step>,
}

/// The state a run of `algorithm` on `input` starts from.
///
/// Fails if the input does not fit the algorithm. Binary search sorts its
/// values first.
pub fn initial_state(algorithm: Algorithm, input: &Input) -> Result<VisualState> {
    let mismatch = |expected| Error::InputMismatch {
        algorithm,
        expected,
    };
    let structure = match (algorithm.family(), input) {
        (Family::Sorting, Input::Values { values }) => Structure::Array(values.clone()),
        (Family::Sorting, _) => return Err(mismatch("values")),
        (Family::Searching, Input::Search { values, .. }) => {
            let mut values = values.clone();
            if algorithm == Algorithm::BinarySearch {
                values.sort_unstable();
            }
            Structure::Array(values)
        }
        (Family::Searching, _) => return Err(mismatch("search")),
        (Family::Graph, Input::Graph { graph, start })
            if *start < graph.node_count() && graph.dangling_edge().is_none() =>
        {
            Structure::Graph(graph.clone())
        }
        (Family::Graph, _) => {
            return Err(mismatch("graph with a valid start node and edges within it"))
        }
        (Family::Tree, Input::Tree { values }) => Structure::Tree(Tree::from_values(values)),
        (Family::Tree, _) => return Err(mismatch("tree")),
        (Family::Recursion, Input::Disks { disks }) if (1..=MAX_DISKS).contains(disks) => {
            Structure::hanoi(*disks, 3)
        }
        (Family::Recursion, _) => return Err(mismatch("1 to 10 disks")),
    };
    Ok(VisualState::new(structure))
}

/// Run `algorithm` on `input`.
///
/// With `with_snapshots` every step carries the state it leads to.
pub fn produce(algorithm: Algorithm, input: &Input, with_snapshots: bool) -> Result<Run> {
    let initial = initial_state(algorithm, input)?;
    let steps = match (&initial.structure, input) {
        (Structure::Array(values), Input::Values { .. }) => match algorithm {
            Algorithm::BubbleSort => sorting::bubble(values),
            Algorithm::SelectionSort => sorting::selection(values),
            Algorithm::InsertionSort => sorting::insertion(values),
            Algorithm::QuickSort => sorting::quick(values),
            _ => sorting::merge(values),
        },
        (Structure::Array(values), Input::Search { target, .. }) => match algorithm {
            Algorithm::BinarySearch => searching::binary(values, *target),
            _ => searching::linear(values, *target),
        },
        (Structure::Graph(graph), Input::Graph { start, .. }) => match algorithm {
            Algorithm::BreadthFirst => graph::breadth_first(graph, *start),
            _ => graph::depth_first(graph, *start),
        },
        (Structure::Tree(built), _) => {
            let order = match algorithm {
                Algorithm::PreOrder => tree::Order::Pre,
                Algorithm::InOrder => tree::Order::In,
                _ => tree::Order::Post,
            };
            tree::traverse(built, order)
        }
        (Structure::Pegs(_), Input::Disks { disks }) => hanoi::solve(*disks),
        _ => Vec::new(),
    };

    let steps = if with_snapshots {
        attach_snapshots(&initial, steps)
    } else {
        steps
    };
    debug!(%algorithm, steps = steps.len(), with_snapshots, "run recorded");
    Ok(Run {
        algorithm,
        initial,
        steps,
    })
}

/// Fold the run once and store each intermediate state on its step.
///
/// Stops attaching at the first step that does not fold, which leaves the
/// trace on the replay policy.
fn attach_snapshots(initial: &VisualState, steps: Vec<Step>) -> Vec<Step> {
    let accumulator = Accumulator::for_domain(initial.structure.domain());
    let mut state = initial.clone();
    let mut folding = true;
    steps
        .into_iter()
        .enumerate()
        .map(|(position, step)| {
            if !folding {
                return step;
            }
            match accumulator.fold(&mut state, position, &step) {
                Ok(skipped) => {
                    if let Some(skipped) = skipped {
                        debug!(position, kind = skipped.kind, "snapshot taken over a skipped step");
                    }
                    let snapshot = Arc::new(state.clone());
                    step.with_snapshot(snapshot)
                }
                Err(_) => {
                    folding = false;
                    step
                }
            }
        })
        .collect()
}

/// Appends steps for a producer.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    steps: Vec<Step>,
}

impl Recorder {
    pub(crate) fn push(&mut self, kind: StepKind) {
        self.steps.push(Step::new(kind));
    }

    pub(crate) fn note(&mut self, kind: StepKind, note: impl Into<String>) {
        self.steps.push(Step::new(kind).with_note(note));
    }

    pub(crate) fn label(&mut self, key: &str, text: impl Into<String>) {
        self.push(StepKind::Label {
            key: key.to_string(),
            text: text.into(),
        });
    }

    pub(crate) fn finish(self) -> Vec<Step> {
        self.steps
    }
}

/// Seeded random inputs for each family.
#[derive(Debug)]
pub struct InputGenerator {
    rng: StdRng,
}

impl InputGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A random input of roughly `size` elements suitable for `algorithm`.
    pub fn input_for(&mut self, algorithm: Algorithm, size: usize) -> Input {
        let size = size.max(1);
        match algorithm.family() {
            Family::Sorting => Input::Values {
                values: self.values(size),
            },
            Family::Searching => {
                let values = self.values(size);
                // Mostly present, sometimes absent.
                let target = if self.rng.gen_bool(0.75) {
                    values[self.rng.gen_range(0..values.len())]
                } else {
                    100 + self.rng.gen_range(0..100)
                };
                Input::Search { values, target }
            }
            Family::Graph => Input::Graph {
                graph: self.graph(size),
                start: 0,
            },
            Family::Tree => {
                let mut values: Vec<i64> = (1..=99).collect();
                values.shuffle(&mut self.rng);
                values.truncate(size.min(31));
                Input::Tree { values }
            }
            Family::Recursion => Input::Disks {
                disks: u32::try_from(size).unwrap_or(MAX_DISKS).clamp(1, MAX_DISKS),
            },
        }
    }

    fn values(&mut self, size: usize) -> Vec<i64> {
        (0..size).map(|_| self.rng.gen_range(1..100)).collect()
    }

    /// A connected graph: a random spanning tree plus a few extra edges.
    fn graph(&mut self, size: usize) -> Graph {
        let mut graph = Graph::with_nodes(size);
        for node in 1..size {
            let parent = self.rng.gen_range(0..node);
            graph.connect(parent, node);
        }
        for _ in 0..size / 2 {
            let a = self.rng.gen_range(0..size);
            let b = self.rng.gen_range(0..size);
            graph.connect(a, b);
        }
        graph
    }
}
