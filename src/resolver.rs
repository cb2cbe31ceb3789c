use alloc::{format, string::String, vec::Vec};
use tracing::{debug, error, info_span};

use crate::{
    dependency::{DependencyKind, Slot},
    errors::UnresolvedDependency,
    graph::Graph,
    node::BuildNode,
    Key,
};

/// Fills the dependency slots of every node by looking each dependency up from the node's scope.
///
/// Optional dependencies with nothing bound stay empty.
/// The first mandatory one with nothing bound fails the whole resolution.
pub(crate) fn resolve(graph: &mut Graph, verify_slots: bool) -> Result<(), UnresolvedDependency> {
    let span = info_span!("resolve", nodes = graph.nodes.len());
    let _guard = span.enter();

    for index in 0..graph.nodes.len() {
        let node = &graph.nodes[index];
        if node.dependencies.is_empty() {
            continue;
        }

        let scope = node.lookup_scope();
        let mut slots = Vec::with_capacity(node.dependencies.len());
        for (position, dependency) in node.dependencies.iter().enumerate() {
            if node.is_prebound(position) {
                slots.push(node.slots[position].clone());
                continue;
            }

            let slot = match &dependency.kind {
                DependencyKind::Context => Slot::Context,
                DependencyKind::Key(key) => match graph.lookup(scope, key) {
                    Some(slot) => slot,
                    None if dependency.optional => {
                        debug!(%key, "Optional dependency not bound");
                        Slot::Empty
                    }
                    None => {
                        let err = unresolved(node, key, position);
                        error!("{}", err);
                        return Err(err);
                    }
                },
            };
            slots.push(slot);
        }

        graph.nodes[index].slots = slots;
    }

    if verify_slots {
        verify(graph)?;
    }
    Ok(())
}

/// Every mandatory slot must be filled after resolution.
fn verify(graph: &Graph) -> Result<(), UnresolvedDependency> {
    for node in &graph.nodes {
        for (position, (dependency, slot)) in node.dependencies.iter().zip(&node.slots).enumerate() {
            if !slot.is_empty() || dependency.optional {
                continue;
            }
            if let Some(key) = dependency.key() {
                let err = unresolved(node, key, position);
                error!("{}", err);
                return Err(err);
            }
        }
    }
    Ok(())
}

fn unresolved(node: &BuildNode, dependency: &Key, position: usize) -> UnresolvedDependency {
    UnresolvedDependency {
        node: node.key().cloned().unwrap_or_else(|| dependency.clone()),
        provenance: node.provenance,
        dependency: dependency.clone(),
        position,
        siblings: (node.dependencies.len() > 1).then(|| siblings(node, position)),
    }
}

/// Renders as `(Clock, >Database<, Logger)`.
fn siblings(node: &BuildNode, failed: usize) -> String {
    let rendered = node
        .dependencies
        .iter()
        .enumerate()
        .map(|(position, dependency)| {
            if position == failed {
                format!(">{dependency}<")
            } else {
                format!("{dependency}")
            }
        })
        .collect::<Vec<_>>();
    format!("({})", rendered.join(", "))
}
