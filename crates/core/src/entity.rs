//! Entity trait: records identified by id rather than by value.

use std::collections::BTreeSet;

/// A stored record with a stable identity.
pub trait Entity {
    /// Strongly-typed identifier, ordered so id sets iterate deterministically.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> Self::Id;
}

/// Ids of `records`, deduplicated and ordered.
pub fn collect_ids<'a, E, I>(records: I) -> BTreeSet<E::Id>
where
    E: Entity + 'a,
    I: IntoIterator<Item = &'a E>,
{
    records.into_iter().map(Entity::id).collect()
}
