//! Dense, ID-indexed storage for module contents.
//!
//! Items are appended and never removed, so an ID doubles as the item's
//! declaration position.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Trait for opaque ID types used as arena keys.
pub trait ArenaId: Copy {
    /// Creates an ID from a raw `u32` index.
    fn from_raw(index: u32) -> Self;

    /// Returns the raw `u32` index.
    fn as_raw(self) -> u32;
}

/// An append-only, ID-indexed container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena<I: ArenaId, T> {
    items: Vec<T>,
    #[serde(skip)]
    _marker: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Returns the ID the next [`alloc`](Self::alloc) will hand out.
    pub fn next_id(&self) -> I {
        I::from_raw(self.items.len() as u32)
    }

    /// Appends an item and returns its ID.
    pub fn alloc(&mut self, item: T) -> I {
        let id = self.next_id();
        self.items.push(item);
        id
    }

    /// Returns the item with the given ID, or `None` if it is out of bounds.
    pub fn get(&self, id: I) -> Option<&T> {
        self.items.get(id.as_raw() as usize)
    }

    /// Returns the item with the given ID mutably, or `None` if out of bounds.
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.items.get_mut(id.as_raw() as usize)
    }

    /// Returns the number of items in the arena.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the arena contains no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over `(ID, &T)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_raw(i as u32), item))
    }

    /// Iterates over references to items in allocation order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    fn index(&self, id: I) -> &T {
        &self.items[id.as_raw() as usize]
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.as_raw() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{InstanceId, ModuleId};

    #[test]
    fn alloc_and_index() {
        let mut arena: Arena<ModuleId, &str> = Arena::new();
        let a = arena.alloc("Adder");
        let b = arena.alloc("Top");
        assert_eq!(arena[a], "Adder");
        assert_eq!(arena[b], "Top");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn next_id_predicts_alloc() {
        let mut arena: Arena<InstanceId, u32> = Arena::new();
        let predicted = arena.next_id();
        let actual = arena.alloc(7);
        assert_eq!(predicted, actual);
        assert_eq!(arena.next_id().as_raw(), 1);
    }

    #[test]
    fn get_out_of_bounds_is_none() {
        let mut arena: Arena<ModuleId, u32> = Arena::new();
        arena.alloc(1);
        assert_eq!(arena.get(ModuleId::from_raw(0)), Some(&1));
        assert!(arena.get(ModuleId::from_raw(5)).is_none());
    }

    #[test]
    fn iter_preserves_allocation_order() {
        let mut arena: Arena<ModuleId, &str> = Arena::new();
        arena.alloc("c");
        arena.alloc("a");
        arena.alloc("b");
        let collected: Vec<_> = arena.iter().map(|(id, v)| (id.as_raw(), *v)).collect();
        assert_eq!(collected, vec![(0, "c"), (1, "a"), (2, "b")]);
    }

    #[test]
    fn serde_roundtrip() {
        let mut arena: Arena<ModuleId, String> = Arena::new();
        arena.alloc("first".to_string());
        arena.alloc("second".to_string());
        let json = serde_json::to_string(&arena).unwrap();
        let restored: Arena<ModuleId, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[ModuleId::from_raw(1)], "second");
    }
}
