use alloc::{sync::Arc, vec, vec::Vec};
use core::any::type_name;

use crate::{any::Instance, errors::InstantiateErrorKind, Context};

pub(crate) enum Argument {
    Value(Instance),
    /// Optional dependency that resolved to nothing
    Missing,
    Context(Context),
}

/// Resolved dependencies of one factory call, in declaration order.
///
/// Factories declared with [`crate::ContainerBuilder::provide_with`] pull their arguments
/// positionally, matching the dependency descriptors they were declared with.
pub struct Arguments {
    values: vec::IntoIter<Argument>,
    position: usize,
}

impl Arguments {
    #[inline]
    #[must_use]
    pub(crate) fn new(values: Vec<Argument>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Number of arguments not taken yet.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn take(&mut self) -> (usize, Option<Argument>) {
        let position = self.position;
        self.position += 1;
        (position, self.values.next())
    }

    /// Takes the next argument, which must be present.
    ///
    /// # Errors
    /// - [`InstantiateErrorKind::MissingArgument`] if the argument resolved to nothing or doesn't exist
    /// - [`InstantiateErrorKind::IncorrectType`] if the argument isn't a `T`
    pub fn next<T: Send + Sync + 'static>(&mut self) -> Result<Arc<T>, InstantiateErrorKind> {
        match self.next_optional::<T>()? {
            Some(value) => Ok(value),
            None => Err(InstantiateErrorKind::MissingArgument {
                position: self.position - 1,
            }),
        }
    }

    /// Takes the next argument of an optional dependency.
    ///
    /// # Errors
    /// - [`InstantiateErrorKind::MissingArgument`] if there are no arguments left
    /// - [`InstantiateErrorKind::IncorrectType`] if the argument isn't a `T`
    pub fn next_optional<T: Send + Sync + 'static>(&mut self) -> Result<Option<Arc<T>>, InstantiateErrorKind> {
        match self.take() {
            (_, Some(Argument::Missing)) => Ok(None),
            (position, Some(Argument::Value(instance))) => {
                instance
                    .downcast::<T>()
                    .map(Some)
                    .map_err(|_| InstantiateErrorKind::IncorrectType {
                        position,
                        expected: type_name::<T>(),
                    })
            }
            (position, Some(Argument::Context(_))) => Err(InstantiateErrorKind::IncorrectType {
                position,
                expected: type_name::<T>(),
            }),
            (position, None) => Err(InstantiateErrorKind::MissingArgument { position }),
        }
    }

    /// Takes the next argument, which must be the request context.
    ///
    /// # Errors
    /// - [`InstantiateErrorKind::MissingArgument`] if there are no arguments left
    /// - [`InstantiateErrorKind::IncorrectType`] if the argument isn't the context
    pub fn context(&mut self) -> Result<Context, InstantiateErrorKind> {
        match self.take() {
            (_, Some(Argument::Context(context))) => Ok(context),
            (position, Some(_)) => Err(InstantiateErrorKind::IncorrectType {
                position,
                expected: type_name::<Context>(),
            }),
            (position, None) => Err(InstantiateErrorKind::MissingArgument { position }),
        }
    }
}
