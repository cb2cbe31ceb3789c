use alloc::{boxed::Box, collections::BTreeSet, sync::Arc, vec, vec::Vec};
use tracing::{debug, error, info_span};

use crate::{
    builder::ContainerBuilder,
    errors::ConfigErrorKind,
    graph::Graph,
    node::{BuildKind, BuildNode, ImportTarget, NodeHandle},
    registry::{Registry, ScopeId},
    Container, Dependency, Key, Provenance,
};

/// What a stage does with one imported key.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(Debug))]
pub enum Rekey {
    Keep,
    Rename(Key),
    /// Leave the binding out of the import
    Drop,
}

/// One step of an import. Stages run in the order they were added,
/// each one seeing the key produced by the previous one.
pub trait ImportStage {
    fn rekey(&self, key: &Key) -> Rekey;
}

impl<F> ImportStage for F
where
    F: Fn(&Key) -> Rekey,
{
    #[inline]
    fn rekey(&self, key: &Key) -> Rekey {
        self(key)
    }
}

pub(crate) enum ImportSource {
    Container(Container),
    Bundle(ContainerBuilder),
}

/// Bindings of another container, or of a not yet finalized bundle, to register in the current scope.
///
/// # Examples
/// ```
/// use graft::{stage, ContainerBuilder, Import, Key};
///
/// let mut shared = ContainerBuilder::new();
/// shared.instance(8080u16).unwrap();
/// let shared = shared.build().unwrap();
///
/// let mut builder = ContainerBuilder::new();
/// builder
///     .import(Import::container(&shared).stage(stage::qualify("shared")))
///     .unwrap();
/// let container = builder.build().unwrap();
///
/// assert_eq!(*container.get_named::<u16>("shared").unwrap(), 8080);
/// assert!(!container.contains(&Key::of::<u16>()));
/// ```
pub struct Import {
    source: ImportSource,
    stages: Vec<Box<dyn ImportStage>>,
}

impl Import {
    /// Imports every binding visible from a finalized container. The imported nodes share
    /// their runtime state with the source, so singletons stay the same instances.
    #[inline]
    #[must_use]
    pub fn container(container: &Container) -> Self {
        Self {
            source: ImportSource::Container(container.clone()),
            stages: Vec::new(),
        }
    }

    /// Imports the root bindings of a builder. The bundle is finalized together with the importing
    /// builder, in its own scope: its dependencies are looked up among its own bindings only.
    #[inline]
    #[must_use]
    pub fn bundle(bundle: ContainerBuilder) -> Self {
        Self {
            source: ImportSource::Bundle(bundle),
            stages: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn stage(mut self, stage: impl ImportStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    fn rekey(&self, key: &Key) -> Option<Key> {
        let mut current = key.clone();
        for stage in &self.stages {
            match stage.rekey(&current) {
                Rekey::Keep => {}
                Rekey::Rename(key) => current = key,
                Rekey::Drop => return None,
            }
        }
        Some(current)
    }

    /// Registers a shadow node for every source binding that survives the stages.
    ///
    /// Either every shadow node is registered or, on a key collision, none is.
    pub(crate) fn apply(self, graph: &mut Graph, scope: ScopeId, provenance: Provenance) -> Result<Vec<NodeHandle>, ConfigErrorKind> {
        let span = info_span!("import", %provenance);
        let _guard = span.enter();

        let source_keys = match &self.source {
            ImportSource::Container(container) => container.registry().keys(),
            ImportSource::Bundle(bundle) => bundle.graph.scope(bundle.root).iter().map(|(key, _)| key.clone()).collect(),
        };

        let mut planned = Vec::with_capacity(source_keys.len());
        let mut seen = BTreeSet::new();
        for source_key in source_keys {
            let Some(key) = self.rekey(&source_key) else {
                debug!(%source_key, "Dropped by stage");
                continue;
            };
            if !seen.insert(key.clone()) {
                let err = ConfigErrorKind::DuplicateKey {
                    key,
                    first: provenance,
                    second: provenance,
                };
                error!("{}", err);
                return Err(err);
            }
            graph.check_vacant(scope, &key, provenance)?;
            planned.push((source_key, key));
        }

        let source = match self.source {
            ImportSource::Container(container) => Source::Registry(container.registry().clone()),
            ImportSource::Bundle(bundle) => Source::Scope(graph.absorb(bundle.graph, bundle.root)),
        };

        let mut handles = Vec::with_capacity(planned.len());
        for (source_key, key) in planned {
            let (target, dependencies) = match &source {
                Source::Registry(registry) => {
                    let Some(node) = registry.get(&source_key) else {
                        continue;
                    };
                    (ImportTarget::Node(node.clone()), vec![])
                }
                Source::Scope(bundle) => (ImportTarget::Scope(*bundle), vec![Dependency::required(source_key.clone())]),
            };
            let node = BuildNode::new(scope, provenance, BuildKind::Imported { source_key, target }, dependencies);
            let id = graph.insert(node, key.clone())?;
            handles.push(graph.handle(id, key));
        }

        debug!(imported = handles.len(), "Imported");
        Ok(handles)
    }
}

enum Source {
    Registry(Arc<Registry>),
    Scope(ScopeId),
}

/// Built-in import stages.
pub mod stage {
    use alloc::{borrow::Cow, collections::BTreeSet};

    use super::{ImportStage, Rekey};
    use crate::Key;

    /// Imports `from` under the key `to`.
    #[must_use]
    pub fn rename(from: Key, to: Key) -> impl ImportStage {
        move |key: &Key| {
            if *key == from {
                Rekey::Rename(to.clone())
            } else {
                Rekey::Keep
            }
        }
    }

    /// Drops every key not listed.
    #[must_use]
    pub fn only(keys: impl IntoIterator<Item = Key>) -> impl ImportStage {
        let keys = keys.into_iter().collect::<BTreeSet<_>>();
        move |key: &Key| if keys.contains(key) { Rekey::Keep } else { Rekey::Drop }
    }

    /// Drops every key listed.
    #[must_use]
    pub fn exclude(keys: impl IntoIterator<Item = Key>) -> impl ImportStage {
        let keys = keys.into_iter().collect::<BTreeSet<_>>();
        move |key: &Key| if keys.contains(key) { Rekey::Drop } else { Rekey::Keep }
    }

    /// Replaces the qualifier of every key.
    #[must_use]
    pub fn qualify(qualifier: impl Into<Cow<'static, str>>) -> impl ImportStage {
        let qualifier = qualifier.into();
        move |key: &Key| Rekey::Rename(key.clone().with_qualifier(qualifier.clone()))
    }

    /// Keeps the keys matching `predicate`.
    #[must_use]
    pub fn filter(predicate: impl Fn(&Key) -> bool) -> impl ImportStage {
        move |key: &Key| if predicate(key) { Rekey::Keep } else { Rekey::Drop }
    }
}
