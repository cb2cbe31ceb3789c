use alloc::{collections::BTreeMap, sync::Arc};
use core::{
    any::{type_name, Any, TypeId},
    cmp::Ordering,
    hash::{Hash, Hasher},
};

/// Type-erased, shareable service value.
pub type Instance = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered by name first, so registries list keys in the same order on every build.
impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(other.name).then_with(|| self.id.cmp(&other.id))
    }
}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    /// Type name without its module path, generics kept as is.
    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let path = self.name.split_once('<').map_or(self.name, |(path, _)| path);
        match path.rsplit_once("::") {
            Some((prefix, _)) => &self.name[prefix.len() + 2..],
            None => self.name,
        }
    }
}

pub(crate) type Map = BTreeMap<TypeId, Instance>;

#[cfg(test)]
mod tests {
    use super::TypeInfo;

    struct Clock;

    #[test]
    fn test_short_name() {
        assert_eq!(TypeInfo::of::<Clock>().short_name(), "Clock");
        assert_eq!(TypeInfo::of::<u8>().short_name(), "u8");
        assert_eq!(
            TypeInfo::of::<alloc::vec::Vec<Clock>>().short_name(),
            "Vec<graft::any::tests::Clock>"
        );
    }

    #[test]
    fn test_eq_by_id() {
        assert_eq!(TypeInfo::of::<Clock>(), TypeInfo::of::<Clock>());
        assert_ne!(TypeInfo::of::<Clock>(), TypeInfo::of::<u8>());
    }
}
