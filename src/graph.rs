use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error};

use crate::{
    dependency::Slot,
    errors::ConfigErrorKind,
    node::{BuildNode, NodeHandle, NodeId},
    registry::{NodeRegistry, ScopeId, ScopeParent},
    Key, Provenance,
};

/// Identity of one arena. Handles carry it, so they can't be used with another arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GraphId(usize);

impl GraphId {
    fn next() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Arena of build nodes and the scopes they're registered in.
pub(crate) struct Graph {
    id: GraphId,
    pub(crate) nodes: Vec<BuildNode>,
    pub(crate) scopes: Vec<NodeRegistry>,
}

impl Graph {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            id: GraphId::next(),
            nodes: Vec::new(),
            scopes: Vec::new(),
        }
    }

    pub(crate) fn add_scope(&mut self, parent: ScopeParent, private: bool) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(NodeRegistry::new(parent, private));
        id
    }

    #[inline]
    #[must_use]
    pub(crate) fn scope(&self, id: ScopeId) -> &NodeRegistry {
        &self.scopes[id.0]
    }

    #[inline]
    #[must_use]
    pub(crate) fn node(&self, id: NodeId) -> &BuildNode {
        &self.nodes[id.0]
    }

    /// Key of a registered node.
    #[inline]
    #[must_use]
    pub(crate) fn key_of(&self, id: NodeId) -> &Key {
        self.nodes[id.0].key().expect("nodes are keyed when inserted")
    }

    #[inline]
    #[must_use]
    pub(crate) fn handle(&self, id: NodeId, key: Key) -> NodeHandle {
        NodeHandle { graph: self.id, id, key }
    }

    /// Whether the handle was issued by this arena and still names the same node.
    /// Handles of an absorbed graph are stale: its nodes moved to new ids.
    #[must_use]
    pub(crate) fn owns(&self, handle: &NodeHandle) -> bool {
        handle.graph == self.id && self.nodes.get(handle.id.0).and_then(BuildNode::key) == Some(&handle.key)
    }

    /// Fails with [`ConfigErrorKind::DuplicateKey`] if the scope already has the key.
    pub(crate) fn check_vacant(&self, scope: ScopeId, key: &Key, provenance: Provenance) -> Result<(), ConfigErrorKind> {
        match self.scope(scope).get_local(key) {
            Some(existing) => Err(self.duplicate(existing, key, provenance)),
            None => Ok(()),
        }
    }

    fn duplicate(&self, existing: NodeId, key: &Key, provenance: Provenance) -> ConfigErrorKind {
        let err = ConfigErrorKind::DuplicateKey {
            key: key.clone(),
            first: self.node(existing).provenance,
            second: provenance,
        };
        error!("{}", err);
        err
    }

    /// Keys the node and registers it in its own scope.
    /// Nothing is added when the key is already taken.
    pub(crate) fn insert(&mut self, mut node: BuildNode, key: Key) -> Result<NodeId, ConfigErrorKind> {
        let id = NodeId(self.nodes.len());
        node.assign_key(key.clone())?;
        if let Err(existing) = self.scopes[node.scope.0].put_if_absent(key.clone(), id) {
            return Err(self.duplicate(existing, &key, node.provenance));
        }
        self.nodes.push(node);

        debug!(%key, "Registered");
        Ok(id)
    }

    /// Searches `key` from `scope` up: the scope itself, its parent scopes,
    /// then the registry chain of the parent container if there is one.
    #[must_use]
    pub(crate) fn lookup(&self, scope: ScopeId, key: &Key) -> Option<Slot> {
        let mut current = scope;
        loop {
            let registry = self.scope(current);
            if let Some(id) = registry.get_local(key) {
                return Some(Slot::Node(id));
            }
            match &registry.parent {
                ScopeParent::None => return None,
                ScopeParent::Scope(parent) => current = *parent,
                ScopeParent::Container(parent) => return parent.get(key).cloned().map(Slot::Foreign),
            }
        }
    }

    /// Moves every node and scope of `other` into this arena, keeping them isolated.
    /// Returns the new id of `other_root`.
    pub(crate) fn absorb(&mut self, other: Graph, other_root: ScopeId) -> ScopeId {
        let (nodes_offset, scopes_offset) = (self.nodes.len(), self.scopes.len());

        self.nodes.extend(other.nodes.into_iter().map(|mut node| {
            node.shift(nodes_offset, scopes_offset);
            node
        }));
        self.scopes.extend(other.scopes.into_iter().map(|mut scope| {
            scope.shift(nodes_offset, scopes_offset);
            scope
        }));

        ScopeId(other_root.0 + scopes_offset)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::Graph;
    use crate::{
        dependency::Slot,
        errors::ConfigErrorKind,
        node::{BuildKind, BuildNode, NodeId},
        registry::{ScopeId, ScopeParent},
        Key, Provenance,
    };

    use alloc::{format, string::{String, ToString as _}, sync::Arc, vec};
    use tracing_test::traced_test;

    struct Clock;
    struct Mailer;

    fn instance(scope: ScopeId) -> BuildNode {
        BuildNode::new(scope, Provenance::caller(), BuildKind::Instance(Arc::new(Clock)), vec![])
    }

    #[test]
    #[traced_test]
    fn test_insert_rejects_duplicates() {
        let mut graph = Graph::new();
        let root = graph.add_scope(ScopeParent::None, false);

        let first = graph.insert(instance(root), Key::of::<Clock>()).unwrap();
        let err = graph.insert(instance(root), Key::of::<Clock>()).unwrap_err();

        assert!(matches!(err, ConfigErrorKind::DuplicateKey { key, .. } if key == Key::of::<Clock>()));
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.key_of(first), &Key::of::<Clock>());
    }

    #[test]
    #[traced_test]
    fn test_lookup_walks_parents_but_not_children() {
        let mut graph = Graph::new();
        let root = graph.add_scope(ScopeParent::None, false);
        let private = graph.add_scope(ScopeParent::Scope(root), true);

        let clock = graph.insert(instance(root), Key::of::<Clock>()).unwrap();
        let mailer = graph.insert(instance(private), Key::of::<Mailer>()).unwrap();

        assert!(matches!(graph.lookup(private, &Key::of::<Clock>()), Some(Slot::Node(id)) if id == clock));
        assert!(matches!(graph.lookup(private, &Key::of::<Mailer>()), Some(Slot::Node(id)) if id == mailer));
        assert!(graph.lookup(root, &Key::of::<Mailer>()).is_none());
    }

    #[test]
    #[traced_test]
    fn test_absorb_reindexes() {
        let mut graph = Graph::new();
        let root = graph.add_scope(ScopeParent::None, false);
        graph.insert(instance(root), Key::of::<Clock>()).unwrap();

        let mut bundle = Graph::new();
        let bundle_root = bundle.add_scope(ScopeParent::None, false);
        let bundle_private = bundle.add_scope(ScopeParent::Scope(bundle_root), true);
        bundle.insert(instance(bundle_private), Key::of::<Mailer>()).unwrap();
        bundle.insert(instance(bundle_root), Key::of::<Clock>()).unwrap();

        let absorbed_root = graph.absorb(bundle, bundle_root);

        assert_eq!(absorbed_root, ScopeId(1));
        assert!(matches!(graph.scope(ScopeId(2)).parent, ScopeParent::Scope(ScopeId(1))));
        assert!(matches!(graph.lookup(ScopeId(2), &Key::of::<Mailer>()), Some(Slot::Node(NodeId(1)))));
        assert!(matches!(graph.lookup(absorbed_root, &Key::of::<Clock>()), Some(Slot::Node(NodeId(2)))));
        assert!(matches!(graph.lookup(root, &Key::of::<Clock>()), Some(Slot::Node(NodeId(0)))));
        assert_eq!(graph.node(NodeId(1)).scope, ScopeId(2));
    }

    #[test]
    #[traced_test]
    fn test_owns_only_own_current_handles() {
        let mut graph = Graph::new();
        let root = graph.add_scope(ScopeParent::None, false);
        let clock = graph.insert(instance(root), Key::of::<Clock>()).unwrap();
        let own = graph.handle(clock, Key::of::<Clock>());

        let mut bundle = Graph::new();
        let bundle_root = bundle.add_scope(ScopeParent::None, false);
        bundle.insert(instance(bundle_root), Key::of::<Mailer>()).unwrap();
        let bundle_clock = bundle.insert(instance(bundle_root), Key::of::<Clock>()).unwrap();
        let foreign = bundle.handle(bundle_clock, Key::of::<Clock>());

        assert!(graph.owns(&own));
        assert!(!graph.owns(&foreign));
        assert!(!graph.owns(&graph.handle(NodeId(7), Key::of::<Clock>())));
        assert!(!graph.owns(&graph.handle(clock, Key::of::<Mailer>())));

        graph.absorb(bundle, bundle_root);
        assert!(!graph.owns(&foreign));
    }
}
