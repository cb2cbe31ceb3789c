#![no_std]

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod arguments;
pub(crate) mod builder;
pub(crate) mod config;
pub(crate) mod container;
pub(crate) mod context;
pub(crate) mod cycle;
pub(crate) mod dependency;
pub(crate) mod dependency_resolver;
pub(crate) mod freeze;
pub(crate) mod graph;
pub(crate) mod import;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod key;
pub(crate) mod node;
pub(crate) mod provenance;
pub(crate) mod registry;
pub(crate) mod resolver;
pub(crate) mod runtime;
pub(crate) mod service;

pub mod errors;

pub use any::{Instance, TypeInfo};
pub use arguments::Arguments;
pub use builder::ContainerBuilder;
pub use config::Config;
pub use container::Container;
pub use context::Context;
pub use dependency::Dependency;
pub use dependency_resolver::DependencyResolver;
pub use errors::{ConfigErrorKind, FinalizeErrorKind, InstantiateErrorKind, ResolveErrorKind, UnresolvedDependency};
pub use import::{stage, Import, ImportStage, Rekey};
pub use inject::{Inject, InjectContext, InjectNamed, InjectOptional};
pub use instantiator::{Instantiator, Method};
pub use key::{Key, Qualifier};
pub use node::{BindingMode, Lifecycle, NodeHandle};
pub use provenance::Provenance;
