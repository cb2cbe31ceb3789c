use alloc::vec::Vec;

use crate::{arguments::Arguments, errors::InstantiateErrorKind, Dependency};

/// Typed factory parameter: declares the dependency it needs and extracts it from resolved [`Arguments`].
///
/// Implemented by the `Inject*` extractors and by tuples of them,
/// which is how a factory's dependency list is derived from its signature.
pub trait DependencyResolver: Sized {
    fn collect_dependencies(dependencies: &mut Vec<Dependency>);

    fn resolve(arguments: &mut Arguments) -> Result<Self, InstantiateErrorKind>;

    #[inline]
    #[must_use]
    fn dependencies() -> Vec<Dependency> {
        let mut dependencies = Vec::new();
        Self::collect_dependencies(&mut dependencies);
        dependencies
    }
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            #[inline]
            #[allow(unused_variables)]
            fn collect_dependencies(dependencies: &mut Vec<Dependency>) {
                $( $ty::collect_dependencies(dependencies); )*
            }

            #[inline]
            #[allow(unused_variables)]
            fn resolve(arguments: &mut Arguments) -> Result<Self, InstantiateErrorKind> {
                Ok(($($ty::resolve(arguments)?,)*))
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);
