use alloc::{borrow::Cow, sync::Arc, vec::Vec};
use core::any::type_name;
use tracing::{debug, error, info_span};

use crate::{
    any::Instance,
    builder::ContainerBuilder,
    errors::ResolveErrorKind,
    registry::Registry,
    BindingMode, Context, Key,
};

/// Finalized, immutable set of bindings.
///
/// Cheap to clone and safe to share between threads: lookups only read the frozen registry,
/// lazy singletons are built under a per-binding lock.
#[derive(Clone)]
pub struct Container {
    registry: Arc<Registry>,
}

impl Container {
    #[inline]
    #[must_use]
    pub(crate) fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    #[inline]
    #[must_use]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    #[inline]
    #[must_use]
    pub(crate) const fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Gets an instance of the binding, or `None` if nothing is bound for the key.
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::Instantiate`] if a factory on the way fails.
    #[inline]
    pub fn find(&self, key: &Key) -> Result<Option<Instance>, ResolveErrorKind> {
        self.find_with(key, &Context::new())
    }

    /// Same as [`Self::find`], passing `context` to the prototypes that take it.
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind::Instantiate`] if a factory on the way fails.
    pub fn find_with(&self, key: &Key, context: &Context) -> Result<Option<Instance>, ResolveErrorKind> {
        let span = info_span!("find", %key);
        let _guard = span.enter();

        let Some(node) = self.registry.get(key) else {
            debug!("Not found");
            return Ok(None);
        };

        match node.produce(context) {
            Ok(instance) => {
                debug!(mode = ?node.binding_mode(), "Resolved");
                Ok(Some(instance))
            }
            Err(err) => {
                let err = ResolveErrorKind::Instantiate(err);
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Gets an instance of the binding.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NotFound`] with every visible key if nothing is bound for the key
    /// - Returns [`ResolveErrorKind::Instantiate`] if a factory on the way fails
    #[inline]
    pub fn resolve(&self, key: &Key) -> Result<Instance, ResolveErrorKind> {
        self.resolve_with(key, &Context::new())
    }

    /// Same as [`Self::resolve`], passing `context` to the prototypes that take it.
    ///
    /// # Errors
    /// See [`Self::resolve`].
    pub fn resolve_with(&self, key: &Key, context: &Context) -> Result<Instance, ResolveErrorKind> {
        match self.find_with(key, context)? {
            Some(instance) => Ok(instance),
            None => {
                let err = ResolveErrorKind::NotFound {
                    key: key.clone(),
                    available: self.keys(),
                };
                error!("{}", err);
                Err(err)
            }
        }
    }

    fn downcast<T: Send + Sync + 'static>(key: &Key, instance: Instance) -> Result<Arc<T>, ResolveErrorKind> {
        instance.downcast::<T>().map_err(|_| {
            let err = ResolveErrorKind::IncorrectType {
                key: key.clone(),
                expected: type_name::<T>(),
            };
            error!("{}", err);
            err
        })
    }

    /// Gets an instance of the binding keyed by `T`.
    ///
    /// # Errors
    /// See [`Self::resolve`].
    #[inline]
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.get_with(&Context::new())
    }

    /// Gets an instance of the binding keyed by `T` qualified with `qualifier`.
    ///
    /// # Errors
    /// See [`Self::resolve`].
    pub fn get_named<T: Send + Sync + 'static>(&self, qualifier: impl Into<Cow<'static, str>>) -> Result<Arc<T>, ResolveErrorKind> {
        let key = Key::named::<T>(qualifier);
        Self::downcast(&key, self.resolve(&key)?)
    }

    /// # Errors
    /// See [`Self::resolve`].
    pub fn get_with<T: Send + Sync + 'static>(&self, context: &Context) -> Result<Arc<T>, ResolveErrorKind> {
        let key = Key::of::<T>();
        Self::downcast(&key, self.resolve_with(&key, context)?)
    }

    /// Gets an instance of the binding keyed by `T`, or `None` if nothing is bound.
    ///
    /// # Errors
    /// See [`Self::find`].
    pub fn try_get<T: Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, ResolveErrorKind> {
        let key = Key::of::<T>();
        self.find(&key)?.map(|instance| Self::downcast(&key, instance)).transpose()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        self.registry.get(key).is_some()
    }

    /// Every key visible from this container, own keys first, then the ones of parent containers.
    #[inline]
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        self.registry.keys()
    }

    #[inline]
    #[must_use]
    pub fn binding_mode(&self, key: &Key) -> Option<BindingMode> {
        self.registry.get(key).map(|node| node.binding_mode())
    }

    /// Key the binding stands for when it's an alias, a re-exported or an imported binding.
    /// For an import it's the key in the source, before the stages renamed it.
    #[must_use]
    pub fn origin_key(&self, key: &Key) -> Option<Key> {
        self.registry.get(key).and_then(|node| node.origin_key().cloned())
    }
}
