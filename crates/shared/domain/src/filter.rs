use bitflags::bitflags;

bitflags! {
    /// Widens model listings beyond the default set.
    ///
    /// By default auto-created models (implicit many-to-many through tables)
    /// and swapped-out models are left out of listings.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ModelFilter: u8 {
        const INCLUDE_AUTO_CREATED = 1 << 0;
        const INCLUDE_SWAPPED = 1 << 1;

        const ALL = Self::INCLUDE_AUTO_CREATED.bits() | Self::INCLUDE_SWAPPED.bits();
    }
}

impl ModelFilter {
    /// Builds a filter from the two boolean switches.
    #[must_use]
    pub fn new(include_auto_created: bool, include_swapped: bool) -> Self {
        let mut filter = Self::empty();
        filter.set(Self::INCLUDE_AUTO_CREATED, include_auto_created);
        filter.set(Self::INCLUDE_SWAPPED, include_swapped);
        filter
    }

    #[must_use]
    pub const fn auto_created(self) -> bool {
        self.contains(Self::INCLUDE_AUTO_CREATED)
    }

    #[must_use]
    pub const fn swapped(self) -> bool {
        self.contains(Self::INCLUDE_SWAPPED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switches_map_onto_flags() {
        assert_eq!(ModelFilter::new(false, false), ModelFilter::empty());
        assert_eq!(ModelFilter::new(true, true), ModelFilter::ALL);

        let auto_only = ModelFilter::new(true, false);
        assert!(auto_only.auto_created());
        assert!(!auto_only.swapped());
    }
}
