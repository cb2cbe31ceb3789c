use core::{
    fmt::{self, Display, Formatter},
    panic::Location,
};

/// Declaration site of a binding, captured with `#[track_caller]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provenance {
    location: &'static Location<'static>,
}

impl Provenance {
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        Self {
            location: Location::caller(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn file(&self) -> &'static str {
        self.location.file()
    }

    #[inline]
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.location.line()
    }
}

impl Display for Provenance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.location.file(), self.location.line(), self.location.column())
    }
}

#[cfg(test)]
mod tests {
    use super::Provenance;

    #[track_caller]
    fn declare() -> Provenance {
        Provenance::caller()
    }

    #[test]
    fn test_caller_location() {
        let line = line!() + 1;
        let provenance = declare();

        assert_eq!(provenance.line(), line);
        assert!(provenance.file().ends_with("provenance.rs"));
    }
}
