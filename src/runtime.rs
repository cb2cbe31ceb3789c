use alloc::{boxed::Box, sync::Arc, vec::Vec};
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    any::Instance,
    arguments::{Argument, Arguments},
    errors::InstantiateErrorKind,
    instantiator::BoxedFactory,
    service::Service as _,
    BindingMode, Context, Key, Provenance,
};

pub(crate) enum RuntimeSlot {
    Node(Arc<RuntimeNode>),
    /// Optional dependency that resolved to nothing
    Missing,
    Context,
}

/// Factory with its dependencies bound to runtime nodes.
pub(crate) struct Producer {
    factory: BoxedFactory,
    slots: Box<[RuntimeSlot]>,
}

impl Producer {
    #[inline]
    #[must_use]
    pub(crate) fn new(factory: BoxedFactory, slots: Box<[RuntimeSlot]>) -> Self {
        Self { factory, slots }
    }

    pub(crate) fn produce(&self, context: &Context) -> Result<Instance, InstantiateErrorKind> {
        let mut arguments = Vec::with_capacity(self.slots.len());
        for slot in self.slots.iter() {
            arguments.push(match slot {
                RuntimeSlot::Node(node) => Argument::Value(node.produce(context)?),
                RuntimeSlot::Missing => Argument::Missing,
                RuntimeSlot::Context => Argument::Context(context.clone()),
            });
        }
        self.factory.clone().call(Arguments::new(arguments))
    }
}

pub(crate) enum RuntimeKind {
    /// Held value: an instance binding or an eager singleton built while finalizing
    Value(Instance),
    Prototype(Producer),
    Lazy { producer: Producer, cell: Mutex<Option<Instance>> },
    Alias(Arc<RuntimeNode>),
    Exposed { private_key: Key, target: Arc<RuntimeNode> },
    Imported { source_key: Key, target: Arc<RuntimeNode> },
}

/// Immutable, finalized node. Shared between registries (and containers, through imports) by `Arc`.
pub(crate) struct RuntimeNode {
    key: Key,
    provenance: Provenance,
    mode: BindingMode,
    kind: RuntimeKind,
}

impl RuntimeNode {
    #[inline]
    #[must_use]
    pub(crate) fn new(key: Key, provenance: Provenance, mode: BindingMode, kind: RuntimeKind) -> Self {
        Self {
            key,
            provenance,
            mode,
            kind,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn instance(key: Key, provenance: Provenance, value: Instance) -> Self {
        Self::new(key, provenance, BindingMode::Instance, RuntimeKind::Value(value))
    }

    #[inline]
    #[must_use]
    pub(crate) fn lazy(key: Key, provenance: Provenance, mode: BindingMode, producer: Producer) -> Self {
        Self::new(
            key,
            provenance,
            mode,
            RuntimeKind::Lazy {
                producer,
                cell: Mutex::new(None),
            },
        )
    }

    #[inline]
    #[must_use]
    pub(crate) const fn key(&self) -> &Key {
        &self.key
    }

    #[inline]
    #[must_use]
    pub(crate) const fn binding_mode(&self) -> BindingMode {
        self.mode
    }

    /// Key the delegating node points at, if it's a re-exported or imported node.
    #[inline]
    #[must_use]
    pub(crate) fn origin_key(&self) -> Option<&Key> {
        match &self.kind {
            RuntimeKind::Exposed { private_key, .. } => Some(private_key),
            RuntimeKind::Imported { source_key, .. } => Some(source_key),
            RuntimeKind::Alias(target) => Some(target.key()),
            RuntimeKind::Value(_) | RuntimeKind::Prototype(_) | RuntimeKind::Lazy { .. } => None,
        }
    }

    pub(crate) fn produce(&self, context: &Context) -> Result<Instance, InstantiateErrorKind> {
        match &self.kind {
            RuntimeKind::Value(value) => Ok(value.clone()),
            RuntimeKind::Prototype(producer) => producer
                .produce(context)
                .map_err(|err| err.in_node(&self.key, self.provenance)),
            RuntimeKind::Lazy { producer, cell } => {
                // Held across construction, so concurrent first lookups build the value once
                let mut guard = cell.lock();
                if let Some(value) = guard.as_ref() {
                    return Ok(value.clone());
                }
                let value = producer
                    .produce(&Context::new())
                    .map_err(|err| err.in_node(&self.key, self.provenance))?;
                *guard = Some(value.clone());

                debug!(key = %self.key, "Cached");
                Ok(value)
            }
            RuntimeKind::Alias(target) | RuntimeKind::Exposed { target, .. } | RuntimeKind::Imported { target, .. } => {
                target.produce(context)
            }
        }
    }
}
