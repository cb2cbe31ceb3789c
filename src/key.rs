use alloc::borrow::Cow;
use core::fmt::{self, Display, Formatter};

use crate::any::TypeInfo;

/// Service identifier: declared type plus an optional qualifier tag.
///
/// Two keys are equal when both the type and the qualifier are equal,
/// so `Key::of::<Pool>()` and `Key::named::<Pool>("replica")` address different bindings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    type_info: TypeInfo,
    qualifier: Option<Cow<'static, str>>,
}

impl Key {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn named<T: ?Sized + 'static>(qualifier: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier: Some(qualifier.into()),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_qualifier(self, qualifier: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_info: self.type_info,
            qualifier: Some(qualifier.into()),
        }
    }

    #[inline]
    #[must_use]
    pub fn without_qualifier(self) -> Self {
        Self {
            type_info: self.type_info,
            qualifier: None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    #[inline]
    #[must_use]
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_info == TypeInfo::of::<T>()
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_info.short_name())?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, "@{qualifier}")?;
        }
        Ok(())
    }
}

/// Type-level qualifier, used by [`crate::InjectNamed`] to request a qualified key.
///
/// ```rust
/// use graft::{Key, Qualifier};
///
/// struct Replica;
///
/// impl Qualifier for Replica {
///     const NAME: &'static str = "replica";
/// }
///
/// assert_eq!(Key::named::<u8>(Replica::NAME), Key::named::<u8>("replica"));
/// ```
pub trait Qualifier: 'static {
    const NAME: &'static str;
}

/// Renders keys as `[A, B, C]`.
pub(crate) struct KeyList<'a>(pub(crate) &'a [Key]);

impl Display for KeyList<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, key) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}")?;
        }
        f.write_str("]")
    }
}
