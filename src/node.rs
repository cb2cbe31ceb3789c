use alloc::{sync::Arc, vec, vec::Vec};

use crate::{
    any::Instance,
    dependency::{Dependency, Slot},
    errors::ConfigErrorKind,
    graph::GraphId,
    instantiator::BoxedFactory,
    registry::ScopeId,
    runtime::RuntimeNode,
    Key, Provenance,
};

/// Instance-lifecycle policy of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BindingMode {
    /// A value created outside the container
    Instance,
    Prototype,
    EagerSingleton,
    LazySingleton,
}

/// Lifecycle a factory can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lifecycle {
    /// New instance on every lookup
    Prototype,
    /// Created once while the container is finalized
    EagerSingleton,
    /// Created once, on first lookup
    LazySingleton,
}

impl Lifecycle {
    #[inline]
    #[must_use]
    pub const fn is_singleton(self) -> bool {
        !matches!(self, Lifecycle::Prototype)
    }
}

impl From<Lifecycle> for BindingMode {
    fn from(lifecycle: Lifecycle) -> Self {
        match lifecycle {
            Lifecycle::Prototype => BindingMode::Prototype,
            Lifecycle::EagerSingleton => BindingMode::EagerSingleton,
            Lifecycle::LazySingleton => BindingMode::LazySingleton,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

/// Handle to a declared build node, returned by every declaration call.
/// Only valid with the builder that returned it.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct NodeHandle {
    pub(crate) graph: GraphId,
    pub(crate) id: NodeId,
    pub(crate) key: Key,
}

impl NodeHandle {
    #[inline]
    #[must_use]
    pub const fn key(&self) -> &Key {
        &self.key
    }
}

pub(crate) enum ImportTarget {
    /// Already materialized node of a finalized container
    Node(Arc<RuntimeNode>),
    /// Key of an absorbed bundle, looked up in the bundle's scope during resolution
    Scope(ScopeId),
}

pub(crate) enum BuildKind {
    Instance(Instance),
    Factory { lifecycle: Lifecycle, factory: BoxedFactory },
    /// "Provides" node: the first dependency slot is the owner node itself
    Derived { lifecycle: Lifecycle, method: BoxedFactory },
    Alias,
    Exposed { private_key: Key, private_scope: ScopeId },
    Imported { source_key: Key, target: ImportTarget },
}

pub(crate) struct BuildNode {
    key: Option<Key>,
    pub(crate) scope: ScopeId,
    pub(crate) provenance: Provenance,
    pub(crate) kind: BuildKind,
    pub(crate) dependencies: Vec<Dependency>,
    /// One entry per dependency descriptor, filled by the resolver
    pub(crate) slots: Vec<Slot>,
}

impl BuildNode {
    #[must_use]
    pub(crate) fn new(scope: ScopeId, provenance: Provenance, kind: BuildKind, dependencies: Vec<Dependency>) -> Self {
        let slots = vec![Slot::Empty; dependencies.len()];
        Self {
            key: None,
            scope,
            provenance,
            kind,
            dependencies,
            slots,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Keys are write-once.
    pub(crate) fn assign_key(&mut self, key: Key) -> Result<(), ConfigErrorKind> {
        if let Some(assigned) = &self.key {
            return Err(ConfigErrorKind::KeyAlreadyAssigned {
                key: assigned.clone(),
                provenance: self.provenance,
            });
        }
        self.key = Some(key);
        Ok(())
    }

    /// Scope in which the node's dependencies are looked up.
    #[inline]
    #[must_use]
    pub(crate) fn lookup_scope(&self) -> ScopeId {
        match &self.kind {
            BuildKind::Exposed { private_scope, .. } => *private_scope,
            BuildKind::Imported {
                target: ImportTarget::Scope(scope),
                ..
            } => *scope,
            _ => self.scope,
        }
    }

    /// Lifecycle declared on the node itself; delegating nodes have none.
    #[inline]
    #[must_use]
    pub(crate) fn own_mode(&self) -> Option<BindingMode> {
        match &self.kind {
            BuildKind::Instance(_) => Some(BindingMode::Instance),
            BuildKind::Factory { lifecycle, .. } | BuildKind::Derived { lifecycle, .. } => Some((*lifecycle).into()),
            BuildKind::Imported {
                target: ImportTarget::Node(node),
                ..
            } => Some(node.binding_mode()),
            BuildKind::Alias | BuildKind::Exposed { .. } | BuildKind::Imported { .. } => None,
        }
    }

    /// Moves the node into a bigger arena whose ids start at the given offsets.
    pub(crate) fn shift(&mut self, nodes: usize, scopes: usize) {
        self.scope.0 += scopes;
        match &mut self.kind {
            BuildKind::Exposed { private_scope, .. } => private_scope.0 += scopes,
            BuildKind::Imported {
                target: ImportTarget::Scope(scope),
                ..
            } => scope.0 += scopes,
            _ => {}
        }
        for slot in &mut self.slots {
            if let Slot::Node(id) = slot {
                id.0 += nodes;
            }
        }
    }

    /// Whether the slot at `position` was filled at declaration time rather than by a registry lookup.
    #[inline]
    #[must_use]
    pub(crate) fn is_prebound(&self, position: usize) -> bool {
        position == 0 && matches!(self.kind, BuildKind::Derived { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{BindingMode, BuildKind, BuildNode, Lifecycle};
    use crate::{errors::ConfigErrorKind, registry::ScopeId, Dependency, Key, Provenance};

    use alloc::{sync::Arc, vec};

    struct Clock;

    #[test]
    fn test_key_is_write_once() {
        let mut node = BuildNode::new(ScopeId(0), Provenance::caller(), BuildKind::Instance(Arc::new(Clock)), vec![]);
        assert!(node.key().is_none());

        node.assign_key(Key::of::<Clock>()).unwrap();
        assert!(matches!(
            node.assign_key(Key::named::<Clock>("utc")),
            Err(ConfigErrorKind::KeyAlreadyAssigned { key, .. }) if key == Key::of::<Clock>()
        ));
        assert_eq!(node.key(), Some(&Key::of::<Clock>()));
    }

    #[test]
    fn test_slots_match_dependencies() {
        let node = BuildNode::new(
            ScopeId(0),
            Provenance::caller(),
            BuildKind::Alias,
            vec![Dependency::required(Key::of::<Clock>())],
        );

        assert_eq!(node.slots.len(), node.dependencies.len());
        assert!(node.slots[0].is_empty());
        assert_eq!(node.own_mode(), None);
    }

    #[test]
    fn test_lifecycle_mode() {
        assert_eq!(BindingMode::from(Lifecycle::LazySingleton), BindingMode::LazySingleton);
        assert!(Lifecycle::EagerSingleton.is_singleton());
        assert!(!Lifecycle::Prototype.is_singleton());
    }
}
