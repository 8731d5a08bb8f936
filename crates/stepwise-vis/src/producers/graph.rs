//! Graph traversal producers.

use std::collections::VecDeque;

use stepwise_trace::{Graph, Step, StepKind};

use super::Recorder;

pub(crate) fn breadth_first(graph: &Graph, start: usize) -> Vec<Step> {
    let mut rec = Recorder::default();
    let mut visited = vec![false; graph.node_count()];
    let mut queue = VecDeque::from([start]);
    visited[start] = true;
    rec.push(StepKind::MarkVisited { node: start });
    rec.push(StepKind::Queue { node: start });

    while let Some(node) = queue.pop_front() {
        rec.push(StepKind::Dequeue { node });
        rec.push(StepKind::Visit { node });
        for next in graph.neighbors(node) {
            if visited[next] {
                continue;
            }
            visited[next] = true;
            rec.push(StepKind::Explore {
                source: node,
                target: next,
            });
            rec.push(StepKind::MarkVisited { node: next });
            rec.push(StepKind::Queue { node: next });
        }
    }
    rec.finish()
}

pub(crate) fn depth_first(graph: &Graph, start: usize) -> Vec<Step> {
    let mut rec = Recorder::default();
    let mut visited = vec![false; graph.node_count()];
    visited[start] = true;
    rec.push(StepKind::Visit { node: start });
    rec.push(StepKind::MarkVisited { node: start });
    let mut stack = vec![(start, graph.neighbors(start).into_iter())];

    while let Some((node, pending)) = stack.last_mut() {
        let node = *node;
        match pending.find(|&next| !visited[next]) {
            Some(next) => {
                rec.push(StepKind::Explore {
                    source: node,
                    target: next,
                });
                visited[next] = true;
                rec.push(StepKind::Visit { node: next });
                rec.push(StepKind::MarkVisited { node: next });
                stack.push((next, graph.neighbors(next).into_iter()));
            }
            None => {
                stack.pop();
                if let Some(&(parent, _)) = stack.last() {
                    rec.note(StepKind::Visit { node: parent }, format!("back at {parent}"));
                }
            }
        }
    }
    rec.finish()
}
