//! Entity-component store.
//!
//! Entities are opaque monotonically increasing ids. Each component type lives
//! in its own column keyed by entity, and every column has a reverse index
//! (an ordered id set) so multi-type queries only walk the smallest matching
//! set. Because ids are handed out in increasing order, ordered id sets double
//! as the creation-order list and queries come back in a stable order.

mod query;

use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use tracing::trace;

pub use query::{ComponentSet, EntityQuery};

/// Opaque entity handle. Ids are never reused within one [`World`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Anything plain enough to be stored as a component.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Type-erased view of one component column.
trait ComponentColumn: Send + Sync {
    fn remove_entity(&mut self, id: EntityId);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Column<T> {
    rows: HashMap<EntityId, T>,
}

impl<T: Component> Column<T> {
    fn new() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<T: Component> ComponentColumn for Column<T> {
    fn remove_entity(&mut self, id: EntityId) {
        self.rows.remove(&id);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The shared data substrate every system reads and writes.
pub struct World {
    next_id: u64,
    /// Live entities in creation order.
    entities: BTreeSet<EntityId>,
    /// Which component types each entity carries, for O(k) destroy.
    owned: HashMap<EntityId, Vec<TypeId>>,
    columns: HashMap<TypeId, Box<dyn ComponentColumn>>,
    /// Reverse index: component type -> entities holding it.
    index: HashMap<TypeId, BTreeSet<EntityId>>,
}

impl World {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entities: BTreeSet::new(),
            owned: HashMap::new(),
            columns: HashMap::new(),
            index: HashMap::new(),
        }
    }

    // -- Entity lifecycle ---------------------------------------------------

    /// Create an empty entity.
    pub fn create_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id);
        self.owned.insert(id, Vec::new());
        id
    }

    /// Remove an entity and detach every component it carries.
    ///
    /// Unknown ids are ignored.
    pub fn destroy_entity(&mut self, id: EntityId) {
        let Some(types) = self.owned.remove(&id) else {
            return;
        };
        for type_id in types {
            if let Some(column) = self.columns.get_mut(&type_id) {
                column.remove_entity(id);
            }
            self.unindex(type_id, id);
        }
        self.entities.remove(&id);
        trace!(entity = %id, "entity destroyed");
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Every live entity in creation order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().copied()
    }

    // -- Components ---------------------------------------------------------

    /// Attach a component, replacing any previous value of the same type.
    ///
    /// Attaching to an unknown entity does nothing.
    pub fn add_component<T: Component>(&mut self, id: EntityId, component: T) {
        let Some(types) = self.owned.get_mut(&id) else {
            trace!(entity = %id, "add_component on unknown entity ignored");
            return;
        };
        let type_id = TypeId::of::<T>();
        if !types.contains(&type_id) {
            types.push(type_id);
        }
        let Some(column) = self.column_mut::<T>() else {
            return;
        };
        column.rows.insert(id, component);
        self.index.entry(type_id).or_default().insert(id);
    }

    /// Detach a component, returning it if it was present.
    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> Option<T> {
        let type_id = TypeId::of::<T>();
        let removed = self
            .columns
            .get_mut(&type_id)
            .and_then(|c| c.as_any_mut().downcast_mut::<Column<T>>())
            .and_then(|c| c.rows.remove(&id))?;
        if let Some(types) = self.owned.get_mut(&id) {
            types.retain(|t| *t != type_id);
        }
        self.unindex(type_id, id);
        Some(removed)
    }

    pub fn get_component<T: Component>(&self, id: EntityId) -> Option<&T> {
        self.column::<T>()?.rows.get(&id)
    }

    pub fn get_component_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        self.columns
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<Column<T>>()?
            .rows
            .get_mut(&id)
    }

    pub fn has_component<T: Component>(&self, id: EntityId) -> bool {
        self.index
            .get(&TypeId::of::<T>())
            .map_or(false, |set| set.contains(&id))
    }

    /// Number of entities currently holding a `T`.
    pub fn count_with<T: Component>(&self) -> usize {
        self.index.get(&TypeId::of::<T>()).map_or(0, |set| set.len())
    }

    // -- Queries ------------------------------------------------------------

    /// Entities holding every component type in `types`, in creation order.
    ///
    /// An empty slice yields every entity. The returned iterator is lazy and
    /// can be recreated as often as needed within a tick.
    pub fn entities_with(&self, types: &[TypeId]) -> EntityQuery<'_> {
        if types.is_empty() {
            return EntityQuery::all(&self.entities);
        }
        let mut sets = smallvec::SmallVec::<[&BTreeSet<EntityId>; 12]>::new();
        for type_id in types {
            match self.index.get(type_id) {
                Some(set) if !set.is_empty() => sets.push(set),
                _ => return EntityQuery::empty(),
            }
        }
        sets.sort_by_key(|set| set.len());
        EntityQuery::intersect(sets)
    }

    /// Typed form of [`World::entities_with`]: `world.query::<(Position, Velocity)>()`.
    pub fn query<Q: ComponentSet>(&self) -> EntityQuery<'_> {
        self.entities_with(&Q::type_ids())
    }

    // -- Internal helpers ---------------------------------------------------

    fn column<T: Component>(&self) -> Option<&Column<T>> {
        self.columns
            .get(&TypeId::of::<T>())
            .and_then(|c| c.as_any().downcast_ref::<Column<T>>())
    }

    /// Column for `T`, created on first use.
    fn column_mut<T: Component>(&mut self) -> Option<&mut Column<T>> {
        self.columns
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Column::<T>::new()))
            .as_any_mut()
            .downcast_mut::<Column<T>>()
    }

    fn unindex(&mut self, type_id: TypeId, id: EntityId) {
        if let Some(set) = self.index.get_mut(&type_id) {
            set.remove(&id);
            if set.is_empty() {
                self.index.remove(&type_id);
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
