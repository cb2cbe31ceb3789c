mod config;
mod finalize;
mod instantiate;
mod resolve;

pub use config::ConfigErrorKind;
pub use finalize::{FinalizeErrorKind, UnresolvedDependency};
pub use instantiate::InstantiateErrorKind;
pub use resolve::ResolveErrorKind;

pub(crate) use finalize::CyclePath;
