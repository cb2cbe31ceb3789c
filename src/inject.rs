use alloc::{sync::Arc, vec::Vec};
use core::marker::PhantomData;

use crate::{arguments::Arguments, dependency_resolver::DependencyResolver, errors::InstantiateErrorKind, Context, Dependency, Key, Qualifier};

/// Mandatory dependency on the binding keyed by `Dep`'s type.
pub struct Inject<Dep>(pub Arc<Dep>);

impl<Dep: Send + Sync + 'static> DependencyResolver for Inject<Dep> {
    #[inline]
    fn collect_dependencies(dependencies: &mut Vec<Dependency>) {
        dependencies.push(Dependency::required(Key::of::<Dep>()));
    }

    #[inline]
    fn resolve(arguments: &mut Arguments) -> Result<Self, InstantiateErrorKind> {
        arguments.next().map(Self)
    }
}

/// Optional dependency: `None` when nothing is bound for `Dep`.
pub struct InjectOptional<Dep>(pub Option<Arc<Dep>>);

impl<Dep: Send + Sync + 'static> DependencyResolver for InjectOptional<Dep> {
    #[inline]
    fn collect_dependencies(dependencies: &mut Vec<Dependency>) {
        dependencies.push(Dependency::optional(Key::of::<Dep>()));
    }

    #[inline]
    fn resolve(arguments: &mut Arguments) -> Result<Self, InstantiateErrorKind> {
        arguments.next_optional().map(Self)
    }
}

/// Mandatory dependency on the binding keyed by `Dep` qualified with `Q::NAME`.
pub struct InjectNamed<Dep, Q>(pub Arc<Dep>, pub PhantomData<Q>);

impl<Dep, Q> DependencyResolver for InjectNamed<Dep, Q>
where
    Dep: Send + Sync + 'static,
    Q: Qualifier,
{
    #[inline]
    fn collect_dependencies(dependencies: &mut Vec<Dependency>) {
        dependencies.push(Dependency::required(Key::named::<Dep>(Q::NAME)));
    }

    #[inline]
    fn resolve(arguments: &mut Arguments) -> Result<Self, InstantiateErrorKind> {
        arguments.next().map(|dependency| Self(dependency, PhantomData))
    }
}

/// Per-request context. Declaring it restricts the binding to the prototype lifecycle.
pub struct InjectContext(pub Context);

impl DependencyResolver for InjectContext {
    #[inline]
    fn collect_dependencies(dependencies: &mut Vec<Dependency>) {
        dependencies.push(Dependency::context());
    }

    #[inline]
    fn resolve(arguments: &mut Arguments) -> Result<Self, InstantiateErrorKind> {
        arguments.context().map(Self)
    }
}
