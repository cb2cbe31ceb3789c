/// Config for finalizing a container
/// ## Fields
/// - `eager_init`:
///   If `true`, eager singletons are instantiated while the container is finalized,
///   and a failing factory fails the finalization.
///
///   If `false`, they are created on first lookup like lazy singletons,
///   but still report [`crate::BindingMode::EagerSingleton`].
/// - `verify_slots`:
///   If `true`, every mandatory dependency slot is checked once more after resolution.
#[derive(Clone, Copy)]
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct Config {
    pub eager_init: bool,
    pub verify_slots: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            eager_init: true,
            verify_slots: true,
        }
    }
}
