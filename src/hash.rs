//! Zero-sized hash builder for prop maps.
//!
//! Provides `FastHashBuilder`, a zero-sized `BuildHasher` that uses foldhash
//! with a fixed seed. Prop names are short strings supplied by the caller's own
//! descriptions, so HashDoS resistance is not needed here.

use std::hash::BuildHasher;

pub use foldhash::fast::{FixedState, FoldHasher};

/// A zero-sized BuildHasher that uses foldhash with a fixed seed.
///
/// Used as the hasher of every [`Props`](crate::Props) and
/// [`ValueMap`](crate::ValueMap), so cloning props never carries per-map
/// hasher state and two maps built from the same entries hash identically.
#[derive(Clone, Copy, Debug, Default)]
pub struct FastHashBuilder;

impl BuildHasher for FastHashBuilder {
    type Hasher = FoldHasher<'static>;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        FixedState::with_seed(0x9e3779b97f4a7c15).build_hasher()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn fast_hash_builder_is_zero_sized() {
        assert_eq!(std::mem::size_of::<FastHashBuilder>(), 0);
    }

    #[test]
    fn prop_names_hash_the_same_across_maps() {
        let hash1 = FastHashBuilder.hash_one("onClick");
        let hash2 = FastHashBuilder.hash_one("onClick");
        assert_eq!(hash1, hash2);

        let mut map: IndexMap<&str, i32, FastHashBuilder> = IndexMap::default();
        map.insert("id", 1);
        map.insert("class", 2);
        assert_eq!(map.get("class"), Some(&2));
    }
}
