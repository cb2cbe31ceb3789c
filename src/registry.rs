use alloc::{
    collections::{btree_map::Entry, BTreeMap, BTreeSet},
    sync::Arc,
    vec::Vec,
};

use crate::{node::NodeId, runtime::RuntimeNode, Key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct ScopeId(pub(crate) usize);

pub(crate) enum ScopeParent {
    None,
    Scope(ScopeId),
    /// Frozen registry of a parent container
    Container(Arc<Registry>),
}

/// Build-time registry of one scope. Only grows: there is no way to remove an entry.
pub(crate) struct NodeRegistry {
    entries: BTreeMap<Key, NodeId>,
    pub(crate) parent: ScopeParent,
    pub(crate) private: bool,
}

impl NodeRegistry {
    #[inline]
    #[must_use]
    pub(crate) const fn new(parent: ScopeParent, private: bool) -> Self {
        Self {
            entries: BTreeMap::new(),
            parent,
            private,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn get_local(&self, key: &Key) -> Option<NodeId> {
        self.entries.get(key).copied()
    }

    /// First writer wins. Returns the already registered node on conflict.
    pub(crate) fn put_if_absent(&mut self, key: Key, id: NodeId) -> Result<(), NodeId> {
        match self.entries.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(id);
                Ok(())
            }
            Entry::Occupied(entry) => Err(*entry.get()),
        }
    }

    #[inline]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, NodeId)> {
        self.entries.iter().map(|(key, id)| (key, *id))
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Moves the registry into a bigger arena whose ids start at the given offsets.
    pub(crate) fn shift(&mut self, nodes: usize, scopes: usize) {
        for id in self.entries.values_mut() {
            id.0 += nodes;
        }
        if let ScopeParent::Scope(parent) = &mut self.parent {
            parent.0 += scopes;
        }
    }

    /// Replaces every node with its runtime counterpart.
    #[must_use]
    pub(crate) fn freeze(self, mut to_runtime: impl FnMut(NodeId) -> Arc<RuntimeNode>) -> Registry {
        let parent = match self.parent {
            ScopeParent::Container(parent) => Some(parent),
            ScopeParent::None | ScopeParent::Scope(_) => None,
        };
        Registry {
            entries: self.entries.into_iter().map(|(key, id)| (key, to_runtime(id))).collect(),
            parent,
        }
    }
}

/// Frozen registry, optionally chained to the registry of a parent container.
pub(crate) struct Registry {
    entries: BTreeMap<Key, Arc<RuntimeNode>>,
    parent: Option<Arc<Registry>>,
}

impl Registry {
    #[inline]
    #[must_use]
    pub(crate) fn get_local(&self, key: &Key) -> Option<&Arc<RuntimeNode>> {
        self.entries.get(key)
    }

    /// Local entries first, then the parent chain: a child's binding hides the parent's one.
    #[must_use]
    pub(crate) fn get(&self, key: &Key) -> Option<&Arc<RuntimeNode>> {
        let mut registry = self;
        loop {
            if let Some(node) = registry.entries.get(key) {
                return Some(node);
            }
            registry = registry.parent.as_deref()?;
        }
    }

    /// Every key visible from this registry, local keys first.
    #[must_use]
    pub(crate) fn keys(&self) -> Vec<Key> {
        let mut seen = BTreeSet::new();
        let mut keys = Vec::new();
        let mut registry = Some(self);
        while let Some(current) = registry {
            for key in current.entries.keys() {
                if seen.insert(key) {
                    keys.push(key.clone());
                }
            }
            registry = current.parent.as_deref();
        }
        keys
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
