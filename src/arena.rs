//! Ordered slot arena with stable, generation-checked handles.
//!
//! Listener, emitter and effect lists are kept here instead of in intrusive
//! linked lists. Slots form a doubly-linked list by index, so appending at the
//! tail and removing by handle are both O(1), and iteration follows insertion
//! order. A removed slot goes onto a free list and its generation is bumped,
//! which turns any handle still pointing at it into a miss instead of an alias.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed handle into an [`Arena`].
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    const fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index, stable for the lifetime of the entry.
    pub const fn index(&self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    generation: u32,
    prev: Option<u32>,
    next: Option<u32>,
}

/// Insertion-ordered collection addressed by [`Handle`].
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Appends `value` at the tail.
    pub fn push_back(&mut self, value: T) -> Handle<T> {
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.value = Some(value);
                slot.prev = self.tail;
                slot.next = None;
                index
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    value: Some(value),
                    generation: 0,
                    prev: self.tail,
                    next: None,
                });
                index
            }
        };

        match self.tail {
            Some(tail) => self.slots[tail as usize].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;

        Handle::new(index, self.slots[index as usize].generation)
    }

    /// Unlinks and returns the entry, or `None` for a stale handle.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }
        let index = handle.index;
        let (prev, next) = {
            let slot = &self.slots[index as usize];
            (slot.prev, slot.next)
        };

        match prev {
            Some(prev) => self.slots[prev as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slots[next as usize].prev = prev,
            None => self.tail = prev,
        }

        let slot = &mut self.slots[index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.prev = None;
        slot.next = None;
        self.free.push(index);
        self.len -= 1;
        slot.value.take()
    }

    /// Whether `handle` refers to a live entry.
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.slots
            .get(handle.index())
            .is_some_and(|slot| slot.generation == handle.generation && slot.value.is_some())
    }

    /// Shared access by handle.
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    /// Mutable access by handle.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Handle of the first entry.
    pub fn head(&self) -> Option<Handle<T>> {
        self.head.map(|index| self.handle_at(index))
    }

    /// Handle of the last entry.
    pub fn tail(&self) -> Option<Handle<T>> {
        self.tail.map(|index| self.handle_at(index))
    }

    /// Number of live entries.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the arena is empty.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            arena: self,
            cursor: self.head,
        }
    }

    /// Handles of every entry in insertion order.
    pub fn handles(&self) -> impl Iterator<Item = Handle<T>> + '_ {
        self.iter().map(|(handle, _)| handle)
    }

    /// Visits every entry mutably in insertion order.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(Handle<T>, &mut T)) {
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let slot = &mut self.slots[index as usize];
            cursor = slot.next;
            let handle = Handle::new(index, slot.generation);
            if let Some(value) = slot.value.as_mut() {
                f(handle, value);
            }
        }
    }

    /// Drops every entry. Outstanding handles become stale.
    pub fn clear(&mut self) {
        let handles: Vec<Handle<T>> = self.handles().collect();
        for handle in handles {
            self.remove(handle);
        }
    }

    fn handle_at(&self, index: u32) -> Handle<T> {
        Handle::new(index, self.slots[index as usize].generation)
    }
}

/// Iterator over an [`Arena`] in insertion order.
pub struct Iter<'a, T> {
    arena: &'a Arena<T>,
    cursor: Option<u32>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle<T>, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let slot = &self.arena.slots[index as usize];
        self.cursor = slot.next;
        slot.value
            .as_ref()
            .map(|value| (Handle::new(index, slot.generation), value))
    }
}
