//! Generational handles and the table that validates them.
//!
//! A [`Handle`] is a 64-bit value that packs a *generation* counter in the
//! high 32 bits and a slot *index* in the low 32 bits. The [`HandleTable`]
//! keeps one entry per arena slot; unregistering a handle bumps the entry's
//! generation, so every outstanding copy of that handle goes stale at once.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::arena::SlotIndex;
use crate::entity::Entity;
use crate::world::World;

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// A weak, copyable reference to an entity.
///
/// Layout: `[generation: u32 | index: u32]`. [`Handle::NULL`] never
/// validates.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle(u64);

impl Handle {
    /// The handle that refers to nothing.
    pub const NULL: Handle = Handle(u64::MAX);

    /// Pack a slot index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The index portion (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation portion (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Whether this is [`Handle::NULL`].
    #[inline]
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    /// The packed `generation << 32 | index` value.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Unpack a value produced by [`to_raw`](Self::to_raw).
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Whether this handle still refers to a live entity of `world`.
    pub fn is_valid(self, world: &World) -> bool {
        world.is_valid(self)
    }

    /// The entity this handle refers to, if it is still alive.
    pub fn get(self, world: &World) -> Option<&Entity> {
        world.get(self)
    }

    /// Mutable access to the entity, if the handle is still valid.
    pub fn get_mut(self, world: &mut World) -> Option<&mut Entity> {
        world.get_mut(self)
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("Handle(null)")
        } else {
            write!(f, "Handle({}v{})", self.index(), self.generation())
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

// ---------------------------------------------------------------------------
// HandleTable
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    generation: u32,
    target: Option<SlotIndex>,
}

/// Issues and validates [`Handle`]s for a fixed number of slots.
///
/// Entry `i` mirrors arena slot `i`, so a handle's index is also the slot it
/// resolves to. Generations survive [`resize`](Self::resize), so a handle
/// invalidated before a resize never validates again.
#[derive(Debug, Default)]
pub struct HandleTable {
    /// Never shrinks; entries past `capacity` only keep their generation.
    entries: Vec<Entry>,
    capacity: usize,
    live: usize,
}

impl HandleTable {
    /// Create a table with `capacity` unused entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![Entry::default(); capacity],
            capacity,
            live: 0,
        }
    }

    /// Change the number of usable entries, keeping every generation.
    ///
    /// # Panics
    ///
    /// Panics if any handle is still live.
    pub fn resize(&mut self, capacity: usize) {
        assert_eq!(self.live, 0, "cannot resize a handle table with live handles");
        if capacity > self.entries.len() {
            self.entries.resize(capacity, Entry::default());
        }
        self.capacity = capacity;
    }

    /// Number of usable entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of handles that currently validate.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no handle is live.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Issue a handle for `target`.
    ///
    /// Returns `None` if the slot is out of range or already has a live
    /// handle.
    pub fn register(&mut self, target: SlotIndex) -> Option<Handle> {
        let index = target.get() as usize;
        if index >= self.capacity {
            return None;
        }
        let entry = self.entries.get_mut(index)?;
        if entry.target.is_some() {
            return None;
        }
        entry.target = Some(target);
        self.live += 1;
        Some(Handle::new(target.get(), entry.generation))
    }

    /// Invalidate `handle` and every copy of it.
    ///
    /// Returns `false` (and changes nothing) if the handle was already stale.
    pub fn unregister(&mut self, handle: Handle) -> bool {
        let Some(entry) = self.entry_mut(handle) else {
            return false;
        };
        entry.target = None;
        entry.generation = entry.generation.wrapping_add(1);
        self.live -= 1;
        true
    }

    /// The slot `handle` refers to, if the handle is still valid.
    pub fn get(&self, handle: Handle) -> Option<SlotIndex> {
        let entry = self.entries.get(handle.index() as usize)?;
        if entry.generation != handle.generation() {
            return None;
        }
        entry.target
    }

    /// Whether `handle` still refers to a live slot.
    pub fn is_valid(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Every handle that currently validates, in slot order.
    pub fn live_handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.entries.iter().filter_map(|entry| {
            entry
                .target
                .map(|target| Handle::new(target.get(), entry.generation))
        })
    }

    fn entry_mut(&mut self, handle: Handle) -> Option<&mut Entry> {
        let entry = self.entries.get_mut(handle.index() as usize)?;
        (entry.target.is_some() && entry.generation == handle.generation()).then_some(entry)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
