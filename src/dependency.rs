use alloc::sync::Arc;
use core::fmt::{self, Display, Formatter};

use crate::{node::NodeId, runtime::RuntimeNode, Key};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DependencyKind {
    Key(Key),
    Context,
}

/// Dependency descriptor: what a factory needs, and whether it can do without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub(crate) kind: DependencyKind,
    pub(crate) optional: bool,
}

impl Dependency {
    #[inline]
    #[must_use]
    pub const fn required(key: Key) -> Self {
        Self {
            kind: DependencyKind::Key(key),
            optional: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn optional(key: Key) -> Self {
        Self {
            kind: DependencyKind::Key(key),
            optional: true,
        }
    }

    /// The per-request [`crate::Context`]. Only prototypes may declare it.
    #[inline]
    #[must_use]
    pub const fn context() -> Self {
        Self {
            kind: DependencyKind::Context,
            optional: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        match &self.kind {
            DependencyKind::Key(key) => Some(key),
            DependencyKind::Context => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    #[inline]
    #[must_use]
    pub const fn is_context(&self) -> bool {
        matches!(self.kind, DependencyKind::Context)
    }
}

impl Display for Dependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DependencyKind::Key(key) => write!(f, "{key}")?,
            DependencyKind::Context => f.write_str("Context")?,
        }
        if self.optional {
            f.write_str("?")?;
        }
        Ok(())
    }
}

/// Resolution result for one dependency descriptor.
#[derive(Clone)]
pub(crate) enum Slot {
    /// Not resolved yet, or an optional dependency that found nothing
    Empty,
    Node(NodeId),
    /// Node of a finalized parent or imported container
    Foreign(Arc<RuntimeNode>),
    Context,
}

impl Slot {
    #[inline]
    #[must_use]
    pub(crate) const fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    #[inline]
    #[must_use]
    pub(crate) const fn node(&self) -> Option<NodeId> {
        match self {
            Slot::Node(id) => Some(*id),
            _ => None,
        }
    }
}
