//! Built-in transition tables, one per structure family.
//!
//! Kinds that mean the same thing everywhere (visit, queue, labels, search
//! outcomes, traversed edges) share one implementation. Each table lists the
//! kinds it accepts; anything else is [`Transition::Unsupported`].

use std::collections::BTreeSet;
use std::sync::Arc;

use stepwise_trace::{Domain, Edge, Outcome, Side, StepKind, Structure, VisualState};

use crate::accumulator::{FoldError, Transition, TransitionTable};

/// Built-in table for `domain`.
pub fn for_domain(domain: Domain) -> Arc<dyn TransitionTable> {
    match domain {
        Domain::Array => Arc::new(ArrayTable),
        Domain::Graph => Arc::new(GraphTable),
        Domain::Tree => Arc::new(TreeTable),
        Domain::Pegs => Arc::new(PegTable),
    }
}

/// Sorting and searching over an array of values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayTable;

/// Graph traversal.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphTable;

/// Binary tree traversal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeTable;

/// Towers of Hanoi.
#[derive(Debug, Clone, Copy, Default)]
pub struct PegTable;

impl TransitionTable for ArrayTable {
    fn domain(&self) -> Domain {
        Domain::Array
    }

    fn supports(&self, kind: &StepKind) -> bool {
        matches!(
            kind,
            StepKind::Compare { .. }
                | StepKind::Select { .. }
                | StepKind::Deselect { .. }
                | StepKind::Visit { .. }
                | StepKind::Swap { .. }
                | StepKind::Write { .. }
                | StepKind::MarkSorted { .. }
                | StepKind::Classify { .. }
                | StepKind::Partition { .. }
                | StepKind::Found { .. }
                | StepKind::NotFound
                | StepKind::Label { .. }
        )
    }

    fn apply(&self, state: &mut VisualState, kind: &StepKind) -> Result<Transition, FoldError> {
        match kind {
            StepKind::Compare { i, j } => compare(state, *i, *j)?,
            StepKind::Select { index } => select(state, *index)?,
            StepKind::Deselect { index } => deselect(state, *index)?,
            StepKind::Visit { node } => visit(state, *node)?,
            StepKind::Swap { i, j } => swap(state, *i, *j)?,
            StepKind::Write { index, value } => write(state, *index, *value)?,
            StepKind::MarkSorted { indices } => mark_sorted(state, indices)?,
            StepKind::Classify { index, side } => classify(state, *index, *side)?,
            StepKind::Partition { pivot } => partition(state, *pivot)?,
            StepKind::Found { index } => found(state, *index)?,
            StepKind::NotFound => not_found(state),
            StepKind::Label { key, text } => label(state, key, text),
            _ => return Ok(Transition::Unsupported),
        }
        Ok(Transition::Applied)
    }
}

impl TransitionTable for GraphTable {
    fn domain(&self) -> Domain {
        Domain::Graph
    }

    fn supports(&self, kind: &StepKind) -> bool {
        matches!(
            kind,
            StepKind::Visit { .. }
                | StepKind::Queue { .. }
                | StepKind::Dequeue { .. }
                | StepKind::MarkVisited { .. }
                | StepKind::Explore { .. }
                | StepKind::Unexplore { .. }
                | StepKind::Found { .. }
                | StepKind::NotFound
                | StepKind::Label { .. }
        )
    }

    fn apply(&self, state: &mut VisualState, kind: &StepKind) -> Result<Transition, FoldError> {
        match kind {
            StepKind::Visit { node } => visit(state, *node)?,
            StepKind::Queue { node } => queue(state, *node)?,
            StepKind::Dequeue { node } => dequeue(state, *node)?,
            StepKind::MarkVisited { node } => mark_visited(state, *node)?,
            StepKind::Explore { source, target } => explore(state, *source, *target)?,
            StepKind::Unexplore { source, target } => unexplore(state, *source, *target)?,
            StepKind::Found { index } => found(state, *index)?,
            StepKind::NotFound => not_found(state),
            StepKind::Label { key, text } => label(state, key, text),
            _ => return Ok(Transition::Unsupported),
        }
        Ok(Transition::Applied)
    }
}

impl TransitionTable for TreeTable {
    fn domain(&self) -> Domain {
        Domain::Tree
    }

    fn supports(&self, kind: &StepKind) -> bool {
        matches!(
            kind,
            StepKind::Compare { .. }
                | StepKind::Visit { .. }
                | StepKind::Queue { .. }
                | StepKind::Dequeue { .. }
                | StepKind::MarkVisited { .. }
                | StepKind::Explore { .. }
                | StepKind::Unexplore { .. }
                | StepKind::Found { .. }
                | StepKind::NotFound
                | StepKind::Label { .. }
        )
    }

    fn apply(&self, state: &mut VisualState, kind: &StepKind) -> Result<Transition, FoldError> {
        match kind {
            StepKind::Compare { i, j } => compare(state, *i, *j)?,
            StepKind::Visit { node } => visit(state, *node)?,
            StepKind::Queue { node } => queue(state, *node)?,
            StepKind::Dequeue { node } => dequeue(state, *node)?,
            StepKind::MarkVisited { node } => mark_visited(state, *node)?,
            StepKind::Explore { source, target } => explore(state, *source, *target)?,
            StepKind::Unexplore { source, target } => unexplore(state, *source, *target)?,
            StepKind::Found { index } => found(state, *index)?,
            StepKind::NotFound => not_found(state),
            StepKind::Label { key, text } => label(state, key, text),
            _ => return Ok(Transition::Unsupported),
        }
        Ok(Transition::Applied)
    }
}

impl TransitionTable for PegTable {
    fn domain(&self) -> Domain {
        Domain::Pegs
    }

    fn supports(&self, kind: &StepKind) -> bool {
        matches!(
            kind,
            StepKind::Move { .. }
                | StepKind::Select { .. }
                | StepKind::Deselect { .. }
                | StepKind::Label { .. }
        )
    }

    fn apply(&self, state: &mut VisualState, kind: &StepKind) -> Result<Transition, FoldError> {
        match kind {
            StepKind::Move { item, from, to } => move_disk(state, *item, *from, *to)?,
            StepKind::Select { index } => select(state, *index)?,
            StepKind::Deselect { index } => deselect(state, *index)?,
            StepKind::Label { key, text } => label(state, key, text),
            _ => return Ok(Transition::Unsupported),
        }
        Ok(Transition::Applied)
    }
}

fn check(state: &VisualState, index: usize) -> Result<(), FoldError> {
    let len = state.structure.len();
    if index < len {
        Ok(())
    } else {
        Err(FoldError::OutOfRange { index, len })
    }
}

fn wrong_structure(domain: Domain, kind: &'static str) -> FoldError {
    FoldError::WrongStructure { kind, domain }
}

fn compare(state: &mut VisualState, i: usize, j: usize) -> Result<(), FoldError> {
    check(state, i)?;
    check(state, j)?;
    state.active = vec![i, j];
    Ok(())
}

fn select(state: &mut VisualState, index: usize) -> Result<(), FoldError> {
    check(state, index)?;
    state.selected.insert(index);
    state.active = vec![index];
    Ok(())
}

fn deselect(state: &mut VisualState, index: usize) -> Result<(), FoldError> {
    check(state, index)?;
    state.selected.remove(&index);
    state.active = vec![index];
    Ok(())
}

fn visit(state: &mut VisualState, node: usize) -> Result<(), FoldError> {
    check(state, node)?;
    state.current = Some(node);
    state.active = vec![node];
    Ok(())
}

fn queue(state: &mut VisualState, node: usize) -> Result<(), FoldError> {
    check(state, node)?;
    state.frontier.push_back(node);
    state.active = vec![node];
    Ok(())
}

fn dequeue(state: &mut VisualState, node: usize) -> Result<(), FoldError> {
    check(state, node)?;
    if let Some(at) = state.frontier.iter().position(|&n| n == node) {
        state.frontier.remove(at);
    }
    state.active = vec![node];
    Ok(())
}

/// Swap two slots and carry every index-based highlight with its element.
/// `sorted` marks positions, not elements, and stays put.
fn swap(state: &mut VisualState, i: usize, j: usize) -> Result<(), FoldError> {
    check(state, i)?;
    check(state, j)?;
    let domain = state.structure.domain();
    let Structure::Array(values) = &mut state.structure else {
        return Err(wrong_structure(domain, "swap"));
    };
    values.swap(i, j);

    let follow = |index: usize| {
        if index == i {
            j
        } else if index == j {
            i
        } else {
            index
        }
    };
    for set in [
        &mut state.selected,
        &mut state.moved,
        &mut state.less,
        &mut state.greater,
    ] {
        *set = remap(set, follow);
    }
    state.pivot = state.pivot.map(follow);

    state.moved.insert(i);
    state.moved.insert(j);
    state.active = vec![i, j];
    Ok(())
}

fn remap(set: &BTreeSet<usize>, follow: impl Fn(usize) -> usize) -> BTreeSet<usize> {
    set.iter().map(|&index| follow(index)).collect()
}

fn write(state: &mut VisualState, index: usize, value: i64) -> Result<(), FoldError> {
    check(state, index)?;
    let domain = state.structure.domain();
    let Structure::Array(values) = &mut state.structure else {
        return Err(wrong_structure(domain, "write"));
    };
    values[index] = value;
    state.moved.insert(index);
    state.active = vec![index];
    Ok(())
}

fn mark_sorted(state: &mut VisualState, indices: &[usize]) -> Result<(), FoldError> {
    for &index in indices {
        check(state, index)?;
    }
    state.sorted.extend(indices.iter().copied());
    state.active = indices.to_vec();
    Ok(())
}

fn mark_visited(state: &mut VisualState, node: usize) -> Result<(), FoldError> {
    check(state, node)?;
    state.visited.insert(node);
    state.active = vec![node];
    Ok(())
}

fn explore(state: &mut VisualState, source: usize, target: usize) -> Result<(), FoldError> {
    check(state, source)?;
    check(state, target)?;
    state.traversed.insert(Edge::new(source, target));
    state.active = vec![source, target];
    Ok(())
}

fn unexplore(state: &mut VisualState, source: usize, target: usize) -> Result<(), FoldError> {
    check(state, source)?;
    check(state, target)?;
    state.traversed.remove(&Edge::new(source, target));
    state.active = vec![source, target];
    Ok(())
}

fn classify(state: &mut VisualState, index: usize, side: Side) -> Result<(), FoldError> {
    check(state, index)?;
    let (into, out_of) = match side {
        Side::Less => (&mut state.less, &mut state.greater),
        Side::Greater => (&mut state.greater, &mut state.less),
    };
    out_of.remove(&index);
    into.insert(index);
    state.active = vec![index];
    Ok(())
}

/// The pivot has settled; the classification round for its subrange is over.
fn partition(state: &mut VisualState, pivot: usize) -> Result<(), FoldError> {
    check(state, pivot)?;
    state.pivot = Some(pivot);
    state.less.clear();
    state.greater.clear();
    state.active = vec![pivot];
    Ok(())
}

fn found(state: &mut VisualState, index: usize) -> Result<(), FoldError> {
    check(state, index)?;
    state.outcome = Some(Outcome::Found { index });
    state.current = Some(index);
    state.active = vec![index];
    Ok(())
}

fn not_found(state: &mut VisualState) {
    state.outcome = Some(Outcome::NotFound);
    state.current = None;
    state.active.clear();
}

fn label(state: &mut VisualState, key: &str, text: &str) {
    if text.is_empty() {
        state.labels.remove(key);
    } else {
        state.labels.insert(key.to_string(), text.to_string());
    }
    state.active.clear();
}

fn move_disk(state: &mut VisualState, item: u32, from: usize, to: usize) -> Result<(), FoldError> {
    check(state, from)?;
    check(state, to)?;
    let domain = state.structure.domain();
    let Structure::Pegs(pegs) = &mut state.structure else {
        return Err(wrong_structure(domain, "move"));
    };
    if pegs[from].last() != Some(&item) {
        return Err(FoldError::NotOnTop { item, peg: from });
    }
    pegs[from].pop();
    pegs[to].push(item);
    state.active = vec![from, to];
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_trace::{Graph, Tree};

    fn apply_all(table: &dyn TransitionTable, state: &mut VisualState, kinds: &[StepKind]) {
        for kind in kinds {
            assert_eq!(table.apply(state, kind).unwrap(), Transition::Applied, "{kind:?}");
        }
    }

    #[test]
    fn swap_remaps_partition_sets() {
        let mut state = VisualState::array(vec![4, 9, 1, 7]);
        apply_all(
            &ArrayTable,
            &mut state,
            &[
                StepKind::Select { index: 3 },
                StepKind::Classify { index: 0, side: Side::Greater },
                StepKind::Classify { index: 2, side: Side::Less },
                StepKind::Swap { i: 0, j: 2 },
            ],
        );

        assert_eq!(state.values(), Some(&[1, 9, 4, 7][..]));
        assert_eq!(state.less, BTreeSet::from([0]));
        assert_eq!(state.greater, BTreeSet::from([2]));
        assert_eq!(state.selected, BTreeSet::from([3]));
        assert_eq!(state.moved, BTreeSet::from([0, 2]));
        assert_eq!(state.active, vec![0, 2]);
    }

    #[test]
    fn sorted_set_is_positional_and_monotone() {
        let mut state = VisualState::array(vec![3, 2, 1]);
        apply_all(
            &ArrayTable,
            &mut state,
            &[
                StepKind::MarkSorted { indices: vec![2] },
                StepKind::Swap { i: 0, j: 1 },
                StepKind::MarkSorted { indices: vec![0, 1] },
            ],
        );
        assert_eq!(state.sorted, BTreeSet::from([0, 1, 2]));
    }

    #[test]
    fn classify_moves_between_sides() {
        let mut state = VisualState::array(vec![1, 2]);
        apply_all(
            &ArrayTable,
            &mut state,
            &[
                StepKind::Classify { index: 1, side: Side::Less },
                StepKind::Classify { index: 1, side: Side::Greater },
            ],
        );
        assert!(state.less.is_empty());
        assert_eq!(state.greater, BTreeSet::from([1]));

        apply_all(&ArrayTable, &mut state, &[StepKind::Partition { pivot: 0 }]);
        assert!(state.greater.is_empty());
        assert_eq!(state.pivot, Some(0));
    }

    #[test]
    fn explore_and_unexplore_toggle_edges() {
        let mut graph = Graph::with_nodes(3);
        graph.connect(0, 1);
        let mut state = VisualState::graph(graph);

        apply_all(
            &GraphTable,
            &mut state,
            &[
                StepKind::Explore { source: 0, target: 1 },
                StepKind::Explore { source: 1, target: 2 },
                StepKind::Unexplore { source: 1, target: 2 },
            ],
        );
        assert_eq!(state.traversed, BTreeSet::from([Edge::new(0, 1)]));
    }

    #[test]
    fn frontier_keeps_queue_order() {
        let mut state = VisualState::graph(Graph::with_nodes(4));
        apply_all(
            &GraphTable,
            &mut state,
            &[
                StepKind::Queue { node: 2 },
                StepKind::Queue { node: 0 },
                StepKind::Queue { node: 3 },
                StepKind::Dequeue { node: 2 },
            ],
        );
        assert_eq!(state.frontier.iter().copied().collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn tree_visits_track_current_and_visited() {
        let mut state = VisualState::tree(Tree::from_values(&[2, 1, 3]));
        apply_all(
            &TreeTable,
            &mut state,
            &[
                StepKind::Visit { node: 0 },
                StepKind::MarkVisited { node: 0 },
                StepKind::Visit { node: 2 },
            ],
        );
        assert_eq!(state.current, Some(2));
        assert_eq!(state.visited, BTreeSet::from([0]));
    }

    #[test]
    fn disk_moves_between_pegs() {
        let mut state = VisualState::new(Structure::hanoi(2, 3));
        apply_all(
            &PegTable,
            &mut state,
            &[
                StepKind::Move { item: 1, from: 0, to: 1 },
                StepKind::Move { item: 2, from: 0, to: 2 },
                StepKind::Move { item: 1, from: 1, to: 2 },
            ],
        );
        assert_eq!(state.structure, Structure::Pegs(vec![vec![], vec![], vec![2, 1]]));
    }

    #[test]
    fn moving_a_buried_disk_fails() {
        let mut state = VisualState::new(Structure::hanoi(2, 3));
        let err = PegTable
            .apply(&mut state, &StepKind::Move { item: 2, from: 0, to: 1 })
            .unwrap_err();
        assert_eq!(err, FoldError::NotOnTop { item: 2, peg: 0 });
        assert_eq!(state.structure, Structure::hanoi(2, 3));
    }

    #[test]
    fn labels_set_and_clear() {
        let mut state = VisualState::graph(Graph::with_nodes(1));
        apply_all(
            &GraphTable,
            &mut state,
            &[StepKind::Label { key: "dist:0".into(), text: "0".into() }],
        );
        assert_eq!(state.labels.get("dist:0").map(String::as_str), Some("0"));

        apply_all(
            &GraphTable,
            &mut state,
            &[StepKind::Label { key: "dist:0".into(), text: String::new() }],
        );
        assert!(state.labels.is_empty());
    }

    #[test]
    fn tables_reject_foreign_kinds() {
        let mut state = VisualState::graph(Graph::with_nodes(2));
        let result = GraphTable.apply(&mut state, &StepKind::Swap { i: 0, j: 1 });
        assert_eq!(result, Ok(Transition::Unsupported));

        let mut pegs = VisualState::new(Structure::hanoi(1, 3));
        let result = PegTable.apply(&mut pegs, &StepKind::Unknown);
        assert_eq!(result, Ok(Transition::Unsupported));
    }
}
