//! Binary tree traversal producers.

use stepwise_trace::{Step, StepKind, Tree};

use super::Recorder;

/// When a node is emitted relative to its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Order {
    Pre,
    In,
    Post,
}

/// Where a node is in its own visit.
#[derive(Debug, Clone, Copy)]
enum Phase {
    Enter,
    /// Left subtree done; `back` if there was one to return from
    Between { back: bool },
    Leave { back: bool },
}

pub(crate) fn traverse(tree: &Tree, order: Order) -> Vec<Step> {
    let mut rec = Recorder::default();
    let mut output = Vec::new();
    let mut stack = Vec::new();
    if let Some(root) = tree.root {
        stack.push((root, Phase::Enter));
    }

    while let Some((node, phase)) = stack.pop() {
        let entry = tree.nodes[node];
        match phase {
            Phase::Enter => {
                rec.push(StepKind::Visit { node });
                if order == Order::Pre {
                    emit(tree, node, &mut output, &mut rec);
                }
                match entry.left {
                    Some(left) => {
                        rec.push(StepKind::Explore {
                            source: node,
                            target: left,
                        });
                        stack.push((node, Phase::Between { back: true }));
                        stack.push((left, Phase::Enter));
                    }
                    None => stack.push((node, Phase::Between { back: false })),
                }
            }
            Phase::Between { back } => {
                if back {
                    rec.push(StepKind::Visit { node });
                }
                if order == Order::In {
                    emit(tree, node, &mut output, &mut rec);
                }
                match entry.right {
                    Some(right) => {
                        rec.push(StepKind::Explore {
                            source: node,
                            target: right,
                        });
                        stack.push((node, Phase::Leave { back: true }));
                        stack.push((right, Phase::Enter));
                    }
                    None => stack.push((node, Phase::Leave { back: false })),
                }
            }
            Phase::Leave { back } => {
                if back {
                    rec.push(StepKind::Visit { node });
                }
                if order == Order::Post {
                    emit(tree, node, &mut output, &mut rec);
                }
            }
        }
    }
    rec.finish()
}

fn emit(tree: &Tree, node: usize, output: &mut Vec<String>, rec: &mut Recorder) {
    output.push(tree.nodes[node].value.to_string());
    rec.push(StepKind::MarkVisited { node });
    rec.label("output", output.join(" "));
}
