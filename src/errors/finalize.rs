use alloc::{string::String, vec::Vec};
use core::fmt::{self, Display, Formatter};

use super::instantiate::InstantiateErrorKind;
use crate::{Key, Provenance};

#[derive(thiserror::Error, Debug)]
pub enum FinalizeErrorKind {
    #[error(transparent)]
    Unresolved(#[from] UnresolvedDependency),
    #[error("Cyclic dependency detected: {}", CyclePath(path))]
    CyclicDependency { path: Vec<Key> },
    #[error(transparent)]
    Instantiate(#[from] InstantiateErrorKind),
}

/// A mandatory dependency with no matching node in the visible registry chain.
#[derive(thiserror::Error, Debug)]
pub struct UnresolvedDependency {
    pub node: Key,
    pub provenance: Provenance,
    pub dependency: Key,
    /// Zero-based position in the declaring node's dependency list
    pub position: usize,
    /// All dependencies with the failing one marked, when there is more than one
    pub siblings: Option<String>,
}

impl Display for UnresolvedDependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unresolved dependency #{} `{}` of `{}` declared at {}",
            self.position, self.dependency, self.node, self.provenance
        )?;
        if let Some(siblings) = &self.siblings {
            write!(f, ". Dependencies: {siblings}")?;
        }
        Ok(())
    }
}

/// Renders a cycle as `A -> B -> A`.
pub(crate) struct CyclePath<'a>(pub(crate) &'a [Key]);

impl Display for CyclePath<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Some(first) = self.0.first() else {
            return Ok(());
        };
        for key in self.0 {
            write!(f, "{key} -> ")?;
        }
        write!(f, "{first}")
    }
}
