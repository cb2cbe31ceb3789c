use crate::{node::Lifecycle, Key, Provenance};

/// Malformed binding declaration, raised by the declaration call itself.
#[derive(thiserror::Error, Debug)]
pub enum ConfigErrorKind {
    #[error("Key `{key}` is already bound in this scope. First declared at {first}, again at {second}")]
    DuplicateKey {
        key: Key,
        first: Provenance,
        second: Provenance,
    },
    #[error(
        "\
        `{key}` declared at {provenance} depends on the request context, \
        but its lifecycle is {lifecycle:?}. Only prototypes can receive per-request context\
        "
    )]
    ContextInSingleton {
        key: Key,
        lifecycle: Lifecycle,
        provenance: Provenance,
    },
    #[error("Node declared at {provenance} already has key `{key}`")]
    KeyAlreadyAssigned { key: Key, provenance: Provenance },
    #[error("Owner `{key}` passed at {provenance} wasn't declared by this builder")]
    UnknownOwner { key: Key, provenance: Provenance },
    #[error("`{key}` can't be exposed at {provenance}: the current scope isn't private")]
    NotPrivateScope { key: Key, provenance: Provenance },
}
