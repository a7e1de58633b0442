use std::any::TypeId;
use std::collections::btree_set;
use std::collections::BTreeSet;

use smallvec::SmallVec;

use super::{Component, EntityId};

/// A tuple of component types usable as a query filter.
pub trait ComponentSet {
    fn type_ids() -> SmallVec<[TypeId; 12]>;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn type_ids() -> SmallVec<[TypeId; 12]> {
                let mut ids = SmallVec::new();
                $(ids.push(TypeId::of::<$name>());)+
                ids
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);
impl_component_set!(A, B, C, D, E, F, G, H, I);
impl_component_set!(A, B, C, D, E, F, G, H, I, J);
impl_component_set!(A, B, C, D, E, F, G, H, I, J, K);
impl_component_set!(A, B, C, D, E, F, G, H, I, J, K, L);

/// Lazy, finite walk over the entities matching a query.
///
/// The smallest reverse-index set drives the walk (it is already in
/// creation order) and every other set is only checked for membership, so the
/// cost is proportional to the smallest matching set.
pub struct EntityQuery<'w> {
    driver: Option<btree_set::Iter<'w, EntityId>>,
    filters: SmallVec<[&'w BTreeSet<EntityId>; 12]>,
}

impl<'w> EntityQuery<'w> {
    pub(super) fn all(entities: &'w BTreeSet<EntityId>) -> Self {
        Self {
            driver: Some(entities.iter()),
            filters: SmallVec::new(),
        }
    }

    pub(super) fn empty() -> Self {
        Self {
            driver: None,
            filters: SmallVec::new(),
        }
    }

    /// `sets` must be sorted smallest first.
    pub(super) fn intersect(mut sets: SmallVec<[&'w BTreeSet<EntityId>; 12]>) -> Self {
        if sets.is_empty() {
            return Self::empty();
        }
        let smallest = sets.remove(0);
        Self {
            driver: Some(smallest.iter()),
            filters: sets,
        }
    }
}

impl Iterator for EntityQuery<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<EntityId> {
        let filters = &self.filters;
        let driver = self.driver.as_mut()?;
        driver
            .by_ref()
            .copied()
            .find(|id| filters.iter().all(|set| set.contains(id)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.driver {
            Some(driver) => (0, driver.size_hint().1),
            None => (0, Some(0)),
        }
    }
}
