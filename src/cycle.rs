use alloc::{vec, vec::Vec};
use tracing::{debug, error, info_span};

use crate::{errors::FinalizeErrorKind, graph::Graph, node::NodeId};

/// Checks the resolved graph for cycles with an explicit-stack DFS over in-arena edges.
///
/// Returns the nodes in post-order, so every node comes after all of its dependencies.
/// Edges to nodes of finalized containers can't close a cycle and are skipped.
pub(crate) fn topological_order(graph: &Graph) -> Result<Vec<NodeId>, FinalizeErrorKind> {
    let span = info_span!("detect_cycles", nodes = graph.nodes.len());
    let _guard = span.enter();

    let len = graph.nodes.len();
    let mut visited = vec![false; len];
    let mut on_stack = vec![false; len];
    let mut order = Vec::with_capacity(len);
    // (node, next slot to follow)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for start in 0..len {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        on_stack[start] = true;
        stack.push((start, 0));

        while let Some((index, cursor)) = stack.last_mut() {
            let index = *index;
            let slots = &graph.nodes[index].slots;

            if *cursor == slots.len() {
                on_stack[index] = false;
                order.push(NodeId(index));
                stack.pop();
                continue;
            }

            let next = slots[*cursor].node();
            *cursor += 1;
            let Some(NodeId(dependency)) = next else {
                continue;
            };

            if on_stack[dependency] {
                let start = stack.iter().position(|(index, _)| *index == dependency).unwrap_or_default();
                let path = stack[start..]
                    .iter()
                    .map(|(index, _)| graph.key_of(NodeId(*index)).clone())
                    .collect();

                let err = FinalizeErrorKind::CyclicDependency { path };
                error!("{}", err);
                return Err(err);
            }
            if !visited[dependency] {
                visited[dependency] = true;
                on_stack[dependency] = true;
                stack.push((dependency, 0));
            }
        }
    }

    debug!("No cycles");
    Ok(order)
}
