use alloc::{sync::Arc, vec, vec::Vec};
use core::mem;
use tracing::{debug, error, info, info_span};

use crate::{
    config::Config,
    cycle,
    dependency::Slot,
    dependency_resolver::DependencyResolver,
    errors::{ConfigErrorKind, FinalizeErrorKind, InstantiateErrorKind},
    freeze,
    graph::Graph,
    instantiator::{boxed_factory_fn, boxed_instantiator, boxed_method, BoxedFactory, Instantiator, Method},
    node::{BuildKind, BuildNode, Lifecycle, NodeHandle},
    registry::{ScopeId, ScopeParent},
    resolver, Arguments, Container, Dependency, Import, Key, Provenance,
};

/// Accumulates binding declarations and finalizes them into a [`Container`].
///
/// Every declaration is checked on the spot and returns a [`NodeHandle`].
/// Dependencies are bound only by [`Self::build`], so declarations may come in any order.
///
/// # Examples
/// ```
/// use graft::{ContainerBuilder, Inject, Lifecycle};
/// use std::sync::Arc;
///
/// struct Clock(u64);
/// struct Service {
///     clock: Arc<Clock>,
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.instance(Clock(1_700_000_000)).unwrap();
/// builder
///     .provide(Lifecycle::EagerSingleton, |Inject(clock): Inject<Clock>| Ok(Service { clock }))
///     .unwrap();
/// let container = builder.build().unwrap();
///
/// let service = container.get::<Service>().unwrap();
/// assert!(Arc::ptr_eq(&service.clock, &container.get::<Clock>().unwrap()));
/// ```
pub struct ContainerBuilder {
    pub(crate) graph: Graph,
    pub(crate) root: ScopeId,
    current: ScopeId,
    config: Config,
}

impl ContainerBuilder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self::with_parent(ScopeParent::None, config)
    }

    /// Creates a builder whose bindings are looked up before the ones of `parent`,
    /// hiding the parent's bindings with the same keys.
    #[must_use]
    pub fn child_of(parent: &Container) -> Self {
        Self::with_parent(ScopeParent::Container(parent.registry().clone()), Config::default())
    }

    fn with_parent(parent: ScopeParent, config: Config) -> Self {
        let mut graph = Graph::new();
        let root = graph.add_scope(parent, false);
        Self {
            graph,
            root,
            current: root,
            config,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    fn declare(&mut self, key: Key, provenance: Provenance, kind: BuildKind, dependencies: Vec<Dependency>) -> Result<NodeHandle, ConfigErrorKind> {
        if let BuildKind::Factory { lifecycle, .. } | BuildKind::Derived { lifecycle, .. } = &kind {
            if lifecycle.is_singleton() && dependencies.iter().any(Dependency::is_context) {
                let err = ConfigErrorKind::ContextInSingleton {
                    key,
                    lifecycle: *lifecycle,
                    provenance,
                };
                error!("{}", err);
                return Err(err);
            }
        }

        let node = BuildNode::new(self.current, provenance, kind, dependencies);
        let id = self.graph.insert(node, key.clone())?;

        debug!(%key, %provenance, "Declared");
        Ok(self.graph.handle(id, key))
    }

    /// Binds a value created outside the container under its own type.
    ///
    /// # Errors
    /// Returns [`ConfigErrorKind::DuplicateKey`] if the type is already bound in the current scope.
    #[track_caller]
    pub fn instance<T: Send + Sync + 'static>(&mut self, value: T) -> Result<NodeHandle, ConfigErrorKind> {
        self.instance_keyed(Key::of::<T>(), value)
    }

    /// # Errors
    /// Returns [`ConfigErrorKind::DuplicateKey`] if the key is already bound in the current scope.
    #[track_caller]
    pub fn instance_keyed<T: Send + Sync + 'static>(&mut self, key: Key, value: T) -> Result<NodeHandle, ConfigErrorKind> {
        self.declare(key, Provenance::caller(), BuildKind::Instance(Arc::new(value)), vec![])
    }

    /// Binds a typed factory under the type it provides.
    /// Its dependencies are derived from the parameter types.
    ///
    /// # Errors
    /// - Returns [`ConfigErrorKind::ContextInSingleton`] if a singleton factory takes [`crate::InjectContext`]
    /// - Returns [`ConfigErrorKind::DuplicateKey`] if the type is already bound in the current scope
    #[track_caller]
    pub fn provide<Inst, Deps>(&mut self, lifecycle: Lifecycle, instantiator: Inst) -> Result<NodeHandle, ConfigErrorKind>
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind>,
        Deps: DependencyResolver,
    {
        self.provide_keyed(Key::of::<Inst::Provides>(), lifecycle, instantiator)
    }

    /// # Errors
    /// See [`Self::provide`].
    #[track_caller]
    pub fn provide_keyed<Inst, Deps>(&mut self, key: Key, lifecycle: Lifecycle, instantiator: Inst) -> Result<NodeHandle, ConfigErrorKind>
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind>,
        Deps: DependencyResolver,
    {
        self.factory(key, Provenance::caller(), lifecycle, boxed_instantiator(instantiator), Deps::dependencies())
    }

    /// Binds a factory with an explicit dependency list.
    /// The factory takes its arguments from [`Arguments`] in the same order.
    ///
    /// # Errors
    /// See [`Self::provide`].
    #[track_caller]
    pub fn provide_with<F, T>(&mut self, key: Key, lifecycle: Lifecycle, dependencies: Vec<Dependency>, factory: F) -> Result<NodeHandle, ConfigErrorKind>
    where
        F: FnMut(&mut Arguments) -> Result<T, InstantiateErrorKind> + Clone + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        self.factory(key, Provenance::caller(), lifecycle, boxed_factory_fn(factory), dependencies)
    }

    fn factory(
        &mut self,
        key: Key,
        provenance: Provenance,
        lifecycle: Lifecycle,
        factory: BoxedFactory,
        dependencies: Vec<Dependency>,
    ) -> Result<NodeHandle, ConfigErrorKind> {
        self.declare(key, provenance, BuildKind::Factory { lifecycle, factory }, dependencies)
    }

    /// Binds the result of a method called on the instance of `owner`.
    ///
    /// The owner is bound through the handle, not looked up by key,
    /// so it may live in a private scope that isn't visible from here.
    ///
    /// # Errors
    /// - Returns [`ConfigErrorKind::UnknownOwner`] if `owner` wasn't returned by this builder.
    ///   Handles of a bundle are invalid once it's imported, use the ones returned by [`Self::import`]
    /// - See [`Self::provide`] for the rest
    #[track_caller]
    pub fn provide_from<Owner, M, Deps>(&mut self, owner: &NodeHandle, lifecycle: Lifecycle, method: M) -> Result<NodeHandle, ConfigErrorKind>
    where
        Owner: Send + Sync + 'static,
        M: Method<Owner, Deps, Error = InstantiateErrorKind>,
        Deps: DependencyResolver,
    {
        self.provide_from_keyed(Key::of::<M::Provides>(), owner, lifecycle, method)
    }

    /// # Errors
    /// See [`Self::provide_from`].
    #[track_caller]
    pub fn provide_from_keyed<Owner, M, Deps>(
        &mut self,
        key: Key,
        owner: &NodeHandle,
        lifecycle: Lifecycle,
        method: M,
    ) -> Result<NodeHandle, ConfigErrorKind>
    where
        Owner: Send + Sync + 'static,
        M: Method<Owner, Deps, Error = InstantiateErrorKind>,
        Deps: DependencyResolver,
    {
        let provenance = Provenance::caller();

        if !self.graph.owns(owner) {
            let err = ConfigErrorKind::UnknownOwner {
                key: owner.key.clone(),
                provenance,
            };
            error!("{}", err);
            return Err(err);
        }

        let mut dependencies = vec![Dependency::required(owner.key.clone())];
        Deps::collect_dependencies(&mut dependencies);

        let handle = self.declare(
            key,
            provenance,
            BuildKind::Derived {
                lifecycle,
                method: boxed_method::<Owner, M, Deps>(method),
            },
            dependencies,
        )?;
        self.graph.nodes[handle.id.0].slots[0] = Slot::Node(owner.id);
        Ok(handle)
    }

    /// Binds `new` to whatever `existing` resolves to.
    ///
    /// # Errors
    /// Returns [`ConfigErrorKind::DuplicateKey`] if `new` is already bound in the current scope.
    #[track_caller]
    pub fn alias(&mut self, new: Key, existing: Key) -> Result<NodeHandle, ConfigErrorKind> {
        self.declare(new, Provenance::caller(), BuildKind::Alias, vec![Dependency::required(existing)])
    }

    /// Runs `f` inside a new private scope.
    ///
    /// Bindings declared in `f` can see the enclosing scopes, but aren't visible outside,
    /// except for the ones re-exported with [`Self::expose`] or [`Self::expose_as`].
    pub fn private<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let scope = self.graph.add_scope(ScopeParent::Scope(self.current), true);
        let enclosing = mem::replace(&mut self.current, scope);
        let result = f(self);
        self.current = enclosing;
        result
    }

    /// Makes a binding of the current private scope visible in the enclosing scope.
    ///
    /// # Errors
    /// - Returns [`ConfigErrorKind::NotPrivateScope`] outside of [`Self::private`]
    /// - Returns [`ConfigErrorKind::DuplicateKey`] if the key is already bound in the enclosing scope
    #[track_caller]
    pub fn expose(&mut self, key: Key) -> Result<NodeHandle, ConfigErrorKind> {
        self.expose_as(key.clone(), key)
    }

    /// Re-exports the private binding `private` under the key `public`.
    ///
    /// # Errors
    /// See [`Self::expose`].
    #[track_caller]
    pub fn expose_as(&mut self, private: Key, public: Key) -> Result<NodeHandle, ConfigErrorKind> {
        let provenance = Provenance::caller();

        let scope = self.graph.scope(self.current);
        let enclosing = match (&scope.parent, scope.private) {
            (ScopeParent::Scope(enclosing), true) => *enclosing,
            _ => {
                let err = ConfigErrorKind::NotPrivateScope { key: private, provenance };
                error!("{}", err);
                return Err(err);
            }
        };

        let private_scope = self.current;
        let node = BuildNode::new(
            enclosing,
            provenance,
            BuildKind::Exposed {
                private_key: private.clone(),
                private_scope,
            },
            vec![Dependency::required(private)],
        );
        let id = self.graph.insert(node, public.clone())?;

        debug!(key = %public, %provenance, "Exposed");
        Ok(self.graph.handle(id, public))
    }

    /// Registers the bindings of another container or bundle in the current scope.
    ///
    /// # Errors
    /// Returns [`ConfigErrorKind::DuplicateKey`] if two imported keys end up equal after the stages,
    /// or if one of them is already bound in the current scope. Nothing is registered then.
    #[track_caller]
    pub fn import(&mut self, import: Import) -> Result<Vec<NodeHandle>, ConfigErrorKind> {
        import.apply(&mut self.graph, self.current, Provenance::caller())
    }

    /// Resolves dependencies, checks for cycles, instantiates eager singletons and freezes the bindings.
    ///
    /// # Errors
    /// - Returns [`FinalizeErrorKind::Unresolved`] if a mandatory dependency isn't bound
    /// - Returns [`FinalizeErrorKind::CyclicDependency`] if bindings depend on each other in a cycle
    /// - Returns [`FinalizeErrorKind::Instantiate`] if an eager singleton fails to instantiate
    pub fn build(self) -> Result<Container, FinalizeErrorKind> {
        let Self { mut graph, root, config, .. } = self;

        let span = info_span!("finalize", nodes = graph.nodes.len());
        let _guard = span.enter();

        resolver::resolve(&mut graph, config.verify_slots)?;
        let order = cycle::topological_order(&graph)?;
        let registry = freeze::freeze(graph, root, &order, config.eager_init)?;

        info!(bindings = registry.len(), "Finalized");
        Ok(Container::new(registry))
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::ContainerBuilder;
    use crate::{
        errors::{ConfigErrorKind, FinalizeErrorKind, InstantiateErrorKind},
        BindingMode, Config, Dependency, Import, Inject, InjectContext, InjectOptional, Key, Lifecycle,
    };

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
        vec,
    };
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing_test::traced_test;

    struct Clock(u8);
    struct Mailer(Arc<Clock>);
    struct Report(Option<Arc<Mailer>>);
    struct Greeting(String);

    #[test]
    #[traced_test]
    fn test_context_in_singleton_fails_at_declaration() {
        let mut builder = ContainerBuilder::new();

        let err = builder
            .provide(Lifecycle::EagerSingleton, |InjectContext(_): InjectContext| Ok(Clock(1)))
            .err()
            .unwrap();

        assert!(matches!(
            err,
            ConfigErrorKind::ContextInSingleton { ref key, lifecycle: Lifecycle::EagerSingleton, .. } if *key == Key::of::<Clock>()
        ));
        assert!(err.to_string().contains("builder.rs"));
        assert!(builder.provide(Lifecycle::Prototype, |InjectContext(_): InjectContext| Ok(Clock(1))).is_ok());
    }

    #[test]
    #[traced_test]
    fn test_duplicate_names_both_sites() {
        let mut builder = ContainerBuilder::new();
        let first_line = line!() + 1;
        builder.instance(Clock(1)).unwrap();
        let second_line = line!() + 1;
        let err = builder.instance(Clock(2)).err().unwrap();

        let ConfigErrorKind::DuplicateKey { first, second, .. } = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(first.line(), first_line);
        assert_eq!(second.line(), second_line);
    }

    #[test]
    #[traced_test]
    fn test_private_scope_and_expose() {
        let mut builder = ContainerBuilder::new();
        builder.instance(Clock(4)).unwrap();
        builder
            .private(|builder| -> Result<_, ConfigErrorKind> {
                builder.provide(Lifecycle::LazySingleton, |Inject(clock): Inject<Clock>| Ok(Mailer(clock)))?;
                builder.expose_as(Key::of::<Mailer>(), Key::named::<Mailer>("outbox"))
            })
            .unwrap();

        let container = builder.build().unwrap();

        assert!(!container.contains(&Key::of::<Mailer>()));
        assert_eq!(container.get_named::<Mailer>("outbox").unwrap().0 .0, 4);
        assert_eq!(
            container.binding_mode(&Key::named::<Mailer>("outbox")),
            Some(BindingMode::LazySingleton)
        );
    }

    #[test]
    #[traced_test]
    fn test_expose_outside_private_scope() {
        let mut builder = ContainerBuilder::new();
        builder.instance(Clock(1)).unwrap();

        assert!(matches!(
            builder.expose(Key::of::<Clock>()),
            Err(ConfigErrorKind::NotPrivateScope { .. })
        ));
    }

    #[test]
    #[traced_test]
    fn test_optional_dependency() {
        let mut builder = ContainerBuilder::new();
        builder
            .provide(Lifecycle::Prototype, |InjectOptional(mailer): InjectOptional<Mailer>| Ok(Report(mailer)))
            .unwrap();

        let container = builder.build().unwrap();
        assert!(container.get::<Report>().unwrap().0.is_none());
    }

    #[test]
    #[traced_test]
    fn test_provide_from_owner() {
        let call_count = Arc::new(AtomicU8::new(0));

        let mut builder = ContainerBuilder::new();
        builder.instance(3u8).unwrap();
        let clock = builder
            .private(|builder| builder.provide(Lifecycle::LazySingleton, |Inject(tick): Inject<u8>| Ok(Clock(*tick))))
            .unwrap();
        builder
            .provide_from(&clock, Lifecycle::Prototype, {
                let call_count = call_count.clone();
                move |clock: Arc<Clock>, Inject(tick): Inject<u8>| {
                    call_count.fetch_add(1, Ordering::SeqCst);
                    Ok(Greeting(format!("{}:{}", clock.0, tick)))
                }
            })
            .unwrap();

        let container = builder.build().unwrap();

        assert_eq!(container.get::<Greeting>().unwrap().0, "3:3");
        assert_eq!(container.get::<Greeting>().unwrap().0, "3:3");
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
        assert!(!container.contains(&Key::of::<Clock>()));
    }

    #[test]
    #[traced_test]
    fn test_provide_from_rejects_owner_of_other_builder() {
        let mut other = ContainerBuilder::new();
        other.instance(1u8).unwrap();
        other.instance(Greeting(String::new())).unwrap();
        let clock = other.provide(Lifecycle::LazySingleton, || Ok(Clock(1))).unwrap();

        let mut builder = ContainerBuilder::new();
        builder.instance(2u8).unwrap();
        let err = builder
            .provide_from(&clock, Lifecycle::Prototype, |clock: Arc<Clock>, Inject(tick): Inject<u8>| {
                Ok(Greeting(format!("{}:{}", clock.0, tick)))
            })
            .err()
            .unwrap();

        assert!(matches!(err, ConfigErrorKind::UnknownOwner { ref key, .. } if *key == Key::of::<Clock>()));
        assert!(logs_contain("wasn't declared by this builder"));

        let container = builder.build().unwrap();
        assert!(!container.contains(&Key::of::<Greeting>()));
    }

    #[test]
    #[traced_test]
    fn test_provide_from_rejects_owner_of_imported_bundle() {
        struct Other;

        let mut bundle = ContainerBuilder::new();
        let clock = bundle.provide(Lifecycle::LazySingleton, || Ok(Clock(5))).unwrap();

        let mut builder = ContainerBuilder::new();
        builder.instance(Other).unwrap();
        builder.instance(6u8).unwrap();
        let imported = builder.import(Import::bundle(bundle)).unwrap();

        let greeting = |clock: Arc<Clock>, Inject(tick): Inject<u8>| {
            Ok::<_, InstantiateErrorKind>(Greeting(format!("{}:{}", clock.0, tick)))
        };
        assert!(matches!(
            builder.provide_from(&clock, Lifecycle::Prototype, greeting),
            Err(ConfigErrorKind::UnknownOwner { .. })
        ));

        // The handle returned by the import stands for the same node
        builder.provide_from(&imported[0], Lifecycle::Prototype, greeting).unwrap();
        let container = builder.build().unwrap();

        assert_eq!(container.get::<Greeting>().unwrap().0, "5:6");
    }

    #[test]
    #[traced_test]
    fn test_provide_with_explicit_dependencies() {
        let mut builder = ContainerBuilder::new();
        builder.instance(Clock(9)).unwrap();
        builder
            .provide_with(
                Key::named::<Mailer>("explicit"),
                Lifecycle::LazySingleton,
                vec![Dependency::required(Key::of::<Clock>())],
                |arguments| Ok(Mailer(arguments.next::<Clock>()?)),
            )
            .unwrap();

        let container = builder.build().unwrap();
        assert_eq!(container.get_named::<Mailer>("explicit").unwrap().0 .0, 9);
    }

    #[test]
    #[traced_test]
    fn test_alias_follows_target() {
        let mut builder = ContainerBuilder::new();
        builder.provide(Lifecycle::LazySingleton, || Ok(Clock(2))).unwrap();
        builder.alias(Key::named::<Clock>("utc"), Key::of::<Clock>()).unwrap();

        let container = builder.build().unwrap();

        assert!(Arc::ptr_eq(
            &container.get::<Clock>().unwrap(),
            &container.get_named::<Clock>("utc").unwrap()
        ));
        assert_eq!(container.binding_mode(&Key::named::<Clock>("utc")), Some(BindingMode::LazySingleton));
    }

    #[test]
    #[traced_test]
    fn test_unresolved_fails_build() {
        let mut builder = ContainerBuilder::new();
        builder
            .provide(Lifecycle::Prototype, |Inject(clock): Inject<Clock>| Ok(Mailer(clock)))
            .unwrap();

        let err = builder.build().err().unwrap();
        assert!(matches!(err, FinalizeErrorKind::Unresolved(ref err) if err.dependency == Key::of::<Clock>()));
        assert!(logs_contain("Unresolved dependency #0 `Clock` of `Mailer`"));
    }

    #[test]
    #[traced_test]
    fn test_lazy_eager_init() {
        let call_count = Arc::new(AtomicU8::new(0));

        let mut builder = ContainerBuilder::with_config(Config {
            eager_init: false,
            ..Config::default()
        });
        builder
            .provide(Lifecycle::EagerSingleton, {
                let call_count = call_count.clone();
                move || {
                    call_count.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, InstantiateErrorKind>(Clock(1))
                }
            })
            .unwrap();

        let container = builder.build().unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 0);

        let _ = container.get::<Clock>().unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert_eq!(container.binding_mode(&Key::of::<Clock>()), Some(BindingMode::EagerSingleton));
    }
}
