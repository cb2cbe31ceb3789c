use alloc::vec::Vec;

use super::instantiate::InstantiateErrorKind;
use crate::{key::KeyList, Key};

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("No binding for `{key}`. Available keys: {}", KeyList(available))]
    NotFound { key: Key, available: Vec<Key> },
    #[error("Binding `{key}` doesn't provide `{expected}`")]
    IncorrectType { key: Key, expected: &'static str },
    #[error(transparent)]
    Instantiate(#[from] InstantiateErrorKind),
}
