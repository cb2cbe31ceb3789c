use alloc::{sync::Arc, vec::Vec};
use core::mem;
use tracing::{debug, error, info_span};

use crate::{
    dependency::Slot,
    errors::{FinalizeErrorKind, InstantiateErrorKind},
    graph::Graph,
    node::{BuildKind, BuildNode, ImportTarget, Lifecycle, NodeId},
    registry::{NodeRegistry, Registry, ScopeId, ScopeParent},
    runtime::{Producer, RuntimeKind, RuntimeNode, RuntimeSlot},
    BindingMode, Context,
};

/// Converts build nodes into runtime nodes, each exactly once.
struct Freezer {
    nodes: Vec<Option<BuildNode>>,
    memo: Vec<Option<Arc<RuntimeNode>>>,
    eager_init: bool,
}

impl Freezer {
    fn new(nodes: Vec<BuildNode>, eager_init: bool) -> Self {
        let memo = nodes.iter().map(|_| None).collect();
        Self {
            nodes: nodes.into_iter().map(Some).collect(),
            memo,
            eager_init,
        }
    }

    /// Dependencies are converted first. With nodes visited in topological order,
    /// they're already memoized and the recursion stays one level deep.
    fn to_runtime(&mut self, id: NodeId) -> Result<Arc<RuntimeNode>, InstantiateErrorKind> {
        if let Some(node) = &self.memo[id.0] {
            return Ok(node.clone());
        }
        let node = self.nodes[id.0].take().expect("graph is checked for cycles before freezing");
        let key = node.key().cloned().expect("nodes are keyed when inserted");
        let provenance = node.provenance;

        let mut slots = Vec::with_capacity(node.slots.len());
        for slot in node.slots {
            slots.push(match slot {
                Slot::Node(dependency) => RuntimeSlot::Node(self.to_runtime(dependency)?),
                Slot::Foreign(dependency) => RuntimeSlot::Node(dependency),
                Slot::Context => RuntimeSlot::Context,
                Slot::Empty => RuntimeSlot::Missing,
            });
        }

        let runtime = match node.kind {
            BuildKind::Instance(value) => RuntimeNode::instance(key, provenance, value),
            BuildKind::Factory { lifecycle, factory } | BuildKind::Derived { lifecycle, method: factory } => {
                let producer = Producer::new(factory, slots.into_boxed_slice());
                match lifecycle {
                    Lifecycle::Prototype => RuntimeNode::new(key, provenance, BindingMode::Prototype, RuntimeKind::Prototype(producer)),
                    Lifecycle::EagerSingleton if self.eager_init => {
                        let value = producer
                            .produce(&Context::new())
                            .map_err(|err| err.in_node(&key, provenance))?;
                        debug!(%key, "Eager singleton instantiated");
                        RuntimeNode::new(key, provenance, BindingMode::EagerSingleton, RuntimeKind::Value(value))
                    }
                    lifecycle => RuntimeNode::lazy(key, provenance, lifecycle.into(), producer),
                }
            }
            BuildKind::Alias => {
                let target = delegate(slots);
                RuntimeNode::new(key, provenance, target.binding_mode(), RuntimeKind::Alias(target))
            }
            BuildKind::Exposed { private_key, .. } => {
                let target = delegate(slots);
                RuntimeNode::new(
                    key,
                    provenance,
                    target.binding_mode(),
                    RuntimeKind::Exposed { private_key, target },
                )
            }
            BuildKind::Imported { source_key, target } => {
                let target = match target {
                    ImportTarget::Node(target) => target,
                    ImportTarget::Scope(_) => delegate(slots),
                };
                RuntimeNode::new(
                    key,
                    provenance,
                    target.binding_mode(),
                    RuntimeKind::Imported { source_key, target },
                )
            }
        };

        debug!(key = %runtime.key(), mode = ?runtime.binding_mode(), "Frozen");

        let runtime = Arc::new(runtime);
        self.memo[id.0] = Some(runtime.clone());
        Ok(runtime)
    }
}

/// Target of a delegating node: its single mandatory dependency.
fn delegate(slots: Vec<RuntimeSlot>) -> Arc<RuntimeNode> {
    match slots.into_iter().next() {
        Some(RuntimeSlot::Node(target)) => target,
        _ => unreachable!("delegating nodes have one mandatory dependency"),
    }
}

/// Freezes the graph into the runtime registry of `root`.
///
/// Eager singletons are instantiated here, in dependency order, unless `eager_init` is off.
pub(crate) fn freeze(graph: Graph, root: ScopeId, order: &[NodeId], eager_init: bool) -> Result<Registry, FinalizeErrorKind> {
    let span = info_span!("freeze", nodes = graph.nodes.len());
    let _guard = span.enter();

    let Graph { nodes, mut scopes, .. } = graph;
    let root = mem::replace(&mut scopes[root.0], NodeRegistry::new(ScopeParent::None, false));

    let mut freezer = Freezer::new(nodes, eager_init);
    for id in order {
        if let Err(err) = freezer.to_runtime(*id) {
            let err = FinalizeErrorKind::Instantiate(err);
            error!("{}", err);
            return Err(err);
        }
    }

    let memo = freezer.memo;
    Ok(root.freeze(|id| memo[id.0].clone().expect("every node is converted")))
}
