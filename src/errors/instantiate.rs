use alloc::boxed::Box;

use crate::{Key, Provenance};

#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
    #[error("Argument #{position} is missing")]
    MissingArgument { position: usize },
    #[error("Argument #{position} has incorrect type, expected `{expected}`")]
    IncorrectType { position: usize, expected: &'static str },
    #[error("Failed to instantiate `{key}` declared at {provenance}: {source}")]
    Node {
        key: Key,
        provenance: Provenance,
        source: Box<InstantiateErrorKind>,
    },
}

impl InstantiateErrorKind {
    #[inline]
    #[must_use]
    pub(crate) fn in_node(self, key: &Key, provenance: Provenance) -> Self {
        Self::Node {
            key: key.clone(),
            provenance,
            source: Box::new(self),
        }
    }
}
