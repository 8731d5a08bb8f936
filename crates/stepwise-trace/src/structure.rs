//! Domain structures: the thing the renderer draws.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which family of visualizer a structure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Bars: sorting and searching
    Array,
    /// Nodes and edges: graph traversal
    Graph,
    /// Binary tree: tree traversal
    Tree,
    /// Pegs and disks: recursion
    Pegs,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array => write!(f, "array"),
            Self::Graph => write!(f, "graph"),
            Self::Tree => write!(f, "tree"),
            Self::Pegs => write!(f, "pegs"),
        }
    }
}

/// A graph with nodes addressed by index. Edges are undirected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub labels: Vec<String>,
    pub edges: Vec<(usize, usize)>,
}

impl Graph {
    /// A graph with `count` nodes labelled by their index and no edges.
    pub fn with_nodes(count: usize) -> Self {
        Self {
            labels: (0..count).map(|i| i.to_string()).collect(),
            edges: Vec::new(),
        }
    }

    /// Add an undirected edge. Duplicates and self-loops are ignored.
    pub fn connect(&mut self, a: usize, b: usize) {
        if a == b || self.has_edge(a, b) {
            return;
        }
        self.edges.push((a, b));
    }

    /// Whether `a` and `b` are adjacent.
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.edges
            .iter()
            .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
    }

    /// Neighbors of `node` in ascending order.
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .edges
            .iter()
            .filter_map(|&(a, b)| {
                if a == node {
                    Some(b)
                } else if b == node {
                    Some(a)
                } else {
                    None
                }
            })
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    /// The first edge with an endpoint outside the graph, if any.
    pub fn dangling_edge(&self) -> Option<(usize, usize)> {
        let count = self.node_count();
        self.edges
            .iter()
            .copied()
            .find(|&(a, b)| a >= count || b >= count)
    }
}

/// One node of a binary tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub value: i64,
    pub left: Option<usize>,
    pub right: Option<usize>,
}

/// Binary tree stored as an arena; nodes are addressed by arena index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
    pub root: Option<usize>,
}

impl Tree {
    /// Build a binary search tree by inserting `values` in order.
    /// Duplicates go to the right.
    pub fn from_values(values: &[i64]) -> Self {
        let mut tree = Tree::default();
        for &value in values {
            tree.insert(value);
        }
        tree
    }

    /// Insert a value with binary-search-tree ordering; returns its index.
    pub fn insert(&mut self, value: i64) -> usize {
        let index = self.nodes.len();
        self.nodes.push(TreeNode {
            value,
            left: None,
            right: None,
        });

        let Some(mut cursor) = self.root else {
            self.root = Some(index);
            return index;
        };

        loop {
            let node = self.nodes[cursor];
            let slot = if value < node.value { node.left } else { node.right };
            match slot {
                Some(next) => cursor = next,
                None => {
                    if value < node.value {
                        self.nodes[cursor].left = Some(index);
                    } else {
                        self.nodes[cursor].right = Some(index);
                    }
                    return index;
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// The domain snapshot a visual state carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Structure {
    Array(Vec<i64>),
    Graph(Graph),
    Tree(Tree),
    /// Disks per peg, bottom to top
    Pegs(Vec<Vec<u32>>),
}

impl Structure {
    /// The visualizer family this structure belongs to.
    pub fn domain(&self) -> Domain {
        match self {
            Structure::Array(_) => Domain::Array,
            Structure::Graph(_) => Domain::Graph,
            Structure::Tree(_) => Domain::Tree,
            Structure::Pegs(_) => Domain::Pegs,
        }
    }

    /// Number of addressable elements: slots, nodes or pegs.
    pub fn len(&self) -> usize {
        match self {
            Structure::Array(values) => values.len(),
            Structure::Graph(graph) => graph.node_count(),
            Structure::Tree(tree) => tree.node_count(),
            Structure::Pegs(pegs) => pegs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Towers of Hanoi start position: all disks on peg 0, largest at the bottom.
    pub fn hanoi(disks: u32, pegs: usize) -> Self {
        let mut out = vec![Vec::new(); pegs.max(1)];
        out[0] = (1..=disks).rev().collect();
        Structure::Pegs(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bst_insert_orders_children() {
        let tree = Tree::from_values(&[5, 3, 8, 1, 4]);
        let root = tree.root.unwrap();
        assert_eq!(tree.nodes[root].value, 5);

        let left = tree.nodes[root].left.unwrap();
        let right = tree.nodes[root].right.unwrap();
        assert_eq!(tree.nodes[left].value, 3);
        assert_eq!(tree.nodes[right].value, 8);
        assert_eq!(tree.nodes[tree.nodes[left].left.unwrap()].value, 1);
        assert_eq!(tree.nodes[tree.nodes[left].right.unwrap()].value, 4);
    }

    #[test]
    fn graph_neighbors_are_sorted_and_undirected() {
        let mut graph = Graph::with_nodes(4);
        graph.connect(2, 0);
        graph.connect(0, 1);
        graph.connect(1, 0);
        graph.connect(3, 3);

        assert_eq!(graph.neighbors(0), vec![1, 2]);
        assert_eq!(graph.neighbors(3), Vec::<usize>::new());
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn dangling_edges_are_found() {
        let mut graph = Graph::with_nodes(3);
        graph.connect(0, 2);
        assert_eq!(graph.dangling_edge(), None);
        graph.edges.push((1, 7));
        assert_eq!(graph.dangling_edge(), Some((1, 7)));
    }

    #[test]
    fn hanoi_start_position() {
        let pegs = Structure::hanoi(3, 3);
        assert_eq!(pegs, Structure::Pegs(vec![vec![3, 2, 1], vec![], vec![]]));
        assert_eq!(pegs.len(), 3);
        assert_eq!(pegs.domain(), Domain::Pegs);
    }
}
