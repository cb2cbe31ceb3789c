use alloc::sync::Arc;
use tracing::debug;

use crate::{
    any::Instance,
    arguments::Arguments,
    dependency_resolver::DependencyResolver,
    errors::InstantiateErrorKind,
    service::{service_fn, BoxCloneService},
};

/// Typed factory. Implemented for closures whose parameters are all [`DependencyResolver`]s.
pub trait Instantiator<Deps>: Clone + Send + Sync + 'static
where
    Deps: DependencyResolver,
{
    type Provides: Send + Sync + 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&mut self, dependencies: Deps) -> Result<Self::Provides, Self::Error>;
}

/// Typed "provides" method: receives the owner's instance first, then its own dependencies.
pub trait Method<Owner, Deps>: Clone + Send + Sync + 'static
where
    Deps: DependencyResolver,
{
    type Provides: Send + Sync + 'static;
    type Error: Into<InstantiateErrorKind>;

    fn call(&mut self, owner: Arc<Owner>, dependencies: Deps) -> Result<Self::Provides, Self::Error>;
}

pub(crate) type BoxedFactory = BoxCloneService<Arguments, Instance, InstantiateErrorKind>;

#[must_use]
pub(crate) fn boxed_instantiator<Inst, Deps>(instantiator: Inst) -> BoxedFactory
where
    Inst: Instantiator<Deps>,
    Deps: DependencyResolver,
{
    BoxCloneService::new(service_fn({
        move |mut arguments: Arguments| {
            let dependencies = Deps::resolve(&mut arguments)?;
            let provides = instantiator.clone().instantiate(dependencies).map_err(Into::into)?;

            debug!("Instantiated");

            Ok(Arc::new(provides) as Instance)
        }
    }))
}

#[must_use]
pub(crate) fn boxed_method<Owner, M, Deps>(method: M) -> BoxedFactory
where
    Owner: Send + Sync + 'static,
    M: Method<Owner, Deps>,
    Deps: DependencyResolver,
{
    BoxCloneService::new(service_fn({
        move |mut arguments: Arguments| {
            let owner = arguments.next::<Owner>()?;
            let dependencies = Deps::resolve(&mut arguments)?;
            let provides = method.clone().call(owner, dependencies).map_err(Into::into)?;

            debug!("Instantiated from owner");

            Ok(Arc::new(provides) as Instance)
        }
    }))
}

#[must_use]
pub(crate) fn boxed_factory_fn<F, T>(factory: F) -> BoxedFactory
where
    F: FnMut(&mut Arguments) -> Result<T, InstantiateErrorKind> + Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    BoxCloneService::new(service_fn({
        move |mut arguments: Arguments| {
            let provides = factory.clone()(&mut arguments)?;

            debug!("Instantiated");

            Ok(Arc::new(provides) as Instance)
        }
    }))
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, Err, $($ty,)*> Instantiator<($($ty,)*)> for F
        where
            F: FnMut($($ty,)*) -> Result<Response, Err> + Clone + Send + Sync + 'static,
            Response: Send + Sync + 'static,
            Err: Into<InstantiateErrorKind>,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;
            type Error = Err;

            #[inline]
            fn instantiate(&mut self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, Self::Error> {
                self($($ty,)*)
            }
        }

        #[allow(non_snake_case)]
        impl<F, Owner, Response, Err, $($ty,)*> Method<Owner, ($($ty,)*)> for F
        where
            F: FnMut(Arc<Owner>, $($ty,)*) -> Result<Response, Err> + Clone + Send + Sync + 'static,
            Response: Send + Sync + 'static,
            Err: Into<InstantiateErrorKind>,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;
            type Error = Err;

            #[inline]
            fn call(&mut self, owner: Arc<Owner>, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, Self::Error> {
                self(owner, $($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_instantiator);

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{boxed_factory_fn, boxed_instantiator, boxed_method};
    use crate::{
        any::Instance,
        arguments::{Argument, Arguments},
        errors::InstantiateErrorKind,
        service::Service as _,
        Inject, InjectOptional,
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
    struct Mailer;
    struct Scheduler(Arc<Clock>, bool);
    struct Tick(u8);

    #[test]
    #[traced_test]
    fn test_boxed_instantiator() {
        let call_count = Arc::new(AtomicU8::new(0));

        let mut factory = boxed_instantiator({
            let call_count = call_count.clone();
            move |Inject(clock): Inject<Clock>, InjectOptional(mailer): InjectOptional<Mailer>| {
                call_count.fetch_add(1, Ordering::SeqCst);
                Ok::<_, InstantiateErrorKind>(Scheduler(clock, mailer.is_some()))
            }
        });

        let clock: Instance = Arc::new(Clock(1));
        let scheduler = factory
            .call(Arguments::new(vec![Argument::Value(clock.clone()), Argument::Missing]))
            .unwrap()
            .downcast::<Scheduler>()
            .unwrap();
        let _ = factory
            .call(Arguments::new(vec![Argument::Value(clock), Argument::Missing]))
            .unwrap();

        assert_eq!(scheduler.0 .0, 1);
        assert!(!scheduler.1);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[traced_test]
    fn test_boxed_method_receives_owner_first() {
        let mut factory = boxed_method(|clock: Arc<Clock>, Inject(step): Inject<u8>| Ok::<_, InstantiateErrorKind>(Tick(clock.0 + *step)));

        let clock: Instance = Arc::new(Clock(40));
        let step: Instance = Arc::new(2u8);
        let tick = factory
            .call(Arguments::new(vec![Argument::Value(clock), Argument::Value(step)]))
            .unwrap()
            .downcast::<Tick>()
            .unwrap();

        assert_eq!(tick.0, 42);
    }

    #[test]
    #[traced_test]
    fn test_factory_error_propagates() {
        let mut factory = boxed_factory_fn(|arguments: &mut Arguments| {
            let clock = arguments.next::<Clock>()?;
            if clock.0 == 0 {
                return Err(anyhow::anyhow!("clock isn't started").into());
            }
            Ok(Tick(clock.0))
        });

        let stopped: Instance = Arc::new(Clock(0));
        let err = factory.call(Arguments::new(vec![Argument::Value(stopped)])).unwrap_err();

        assert!(matches!(err, InstantiateErrorKind::Custom(_)));
        assert_eq!(err.to_string(), "clock isn't started");
    }
}
