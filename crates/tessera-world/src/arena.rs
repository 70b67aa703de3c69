//! Fixed-capacity slot arena.
//!
//! All slots are allocated up front. Free slots form an intrusive singly
//! linked list threaded through the slot array, so [`Arena::insert`] and
//! [`Arena::remove`] are O(1) and the arena never grows. Every slot carries
//! a generation counter that is bumped when the slot is freed.

use std::fmt;

// ---------------------------------------------------------------------------
// SlotIndex
// ---------------------------------------------------------------------------

/// Position of a slot in an [`Arena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(pub(crate) u32);

impl SlotIndex {
    /// Raw slot number.
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    #[inline]
    fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotIndex({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Slot<T> {
    Free { next_free: Option<u32>, generation: u32 },
    Occupied { value: T, generation: u32 },
}

impl<T> Slot<T> {
    fn generation(&self) -> u32 {
        match self {
            Slot::Free { generation, .. } | Slot::Occupied { generation, .. } => *generation,
        }
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// Fixed-capacity storage with O(1) allocate and free.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Arena<T> {
    /// Allocate `capacity` free slots. The arena never grows past this.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` does not fit in a 32-bit slot index.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity < u32::MAX as usize,
            "arena capacity {capacity} exceeds the 32-bit slot index range"
        );
        let slots = (0..capacity as u32)
            .map(|index| Slot::Free {
                next_free: (index + 1 < capacity as u32).then_some(index + 1),
                generation: 0,
            })
            .collect();
        Self {
            slots,
            free_head: (capacity > 0).then_some(0),
            len: 0,
        }
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.free_head.is_none()
    }

    /// Place `value` in a free slot.
    ///
    /// Returns `None` when every slot is occupied; `value` is dropped and no
    /// existing slot is touched.
    pub fn insert(&mut self, value: T) -> Option<SlotIndex> {
        let index = self.free_head?;
        let slot = &mut self.slots[index as usize];
        let Slot::Free {
            next_free,
            generation,
        } = *slot
        else {
            unreachable!("free list points at an occupied slot {index}");
        };
        *slot = Slot::Occupied { value, generation };
        self.free_head = next_free;
        self.len += 1;
        Some(SlotIndex(index))
    }

    /// Free the slot at `index` and return its value.
    ///
    /// The slot's generation is bumped and the slot becomes the next one
    /// handed out by [`insert`](Self::insert). Freeing a slot that is already
    /// free (or out of range) returns `None` and changes nothing.
    pub fn remove(&mut self, index: SlotIndex) -> Option<T> {
        let slot = self.slots.get_mut(index.as_usize())?;
        if matches!(slot, Slot::Free { .. }) {
            return None;
        }
        let generation = slot.generation().wrapping_add(1);
        let previous = std::mem::replace(
            slot,
            Slot::Free {
                next_free: self.free_head,
                generation,
            },
        );
        self.free_head = Some(index.0);
        self.len -= 1;
        match previous {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Free { .. } => None,
        }
    }

    /// The value in `index`, if occupied.
    pub fn get(&self, index: SlotIndex) -> Option<&T> {
        match self.slots.get(index.as_usize())? {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Free { .. } => None,
        }
    }

    /// Mutable access to the value in `index`, if occupied.
    pub fn get_mut(&mut self, index: SlotIndex) -> Option<&mut T> {
        match self.slots.get_mut(index.as_usize())? {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Free { .. } => None,
        }
    }

    /// Whether `index` is occupied.
    pub fn contains(&self, index: SlotIndex) -> bool {
        self.get(index).is_some()
    }

    /// Current generation of the slot, free or occupied.
    pub fn generation(&self, index: SlotIndex) -> Option<u32> {
        self.slots.get(index.as_usize()).map(Slot::generation)
    }

    /// Occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied { value, .. } => Some((SlotIndex(index as u32), value)),
                Slot::Free { .. } => None,
            })
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_in_index_order_until_full() {
        let mut arena = Arena::new(3);
        assert_eq!(arena.insert("a"), Some(SlotIndex(0)));
        assert_eq!(arena.insert("b"), Some(SlotIndex(1)));
        assert_eq!(arena.insert("c"), Some(SlotIndex(2)));
        assert!(arena.is_full());
        assert_eq!(arena.insert("d"), None);
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.get(SlotIndex(2)), Some(&"c"));
    }

    #[test]
    fn zero_capacity_is_always_full() {
        let mut arena: Arena<u8> = Arena::new(0);
        assert!(arena.is_full());
        assert_eq!(arena.insert(1), None);
    }

    #[test]
    fn remove_bumps_generation_and_recycles_lifo() {
        let mut arena = Arena::new(4);
        let a = arena.insert(10).unwrap();
        let b = arena.insert(20).unwrap();
        assert_eq!(arena.generation(a), Some(0));

        assert_eq!(arena.remove(a), Some(10));
        assert_eq!(arena.generation(a), Some(1));
        assert!(!arena.contains(a));

        assert_eq!(arena.remove(b), Some(20));
        // Most recently freed slot is reused first.
        assert_eq!(arena.insert(30), Some(b));
        assert_eq!(arena.insert(40), Some(a));
        assert_eq!(arena.generation(a), Some(1));
    }

    #[test]
    fn double_remove_is_a_no_op() {
        let mut arena = Arena::new(2);
        let a = arena.insert('x').unwrap();
        assert_eq!(arena.remove(a), Some('x'));
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.generation(a), Some(1));
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn out_of_range_access() {
        let mut arena: Arena<i32> = Arena::new(1);
        assert_eq!(arena.get(SlotIndex(5)), None);
        assert_eq!(arena.remove(SlotIndex(5)), None);
        assert_eq!(arena.generation(SlotIndex(5)), None);
    }

    #[test]
    fn capacity_exhaustion_does_not_corrupt_existing_values() {
        let mut arena = Arena::new(2);
        let a = arena.insert(String::from("first")).unwrap();
        let b = arena.insert(String::from("second")).unwrap();
        assert!(arena.insert(String::from("third")).is_none());
        assert_eq!(arena.get(a).map(String::as_str), Some("first"));
        assert_eq!(arena.get(b).map(String::as_str), Some("second"));
    }

    #[test]
    fn iter_yields_occupied_slots() {
        let mut arena = Arena::new(4);
        let _a = arena.insert(1).unwrap();
        let b = arena.insert(2).unwrap();
        let _c = arena.insert(3).unwrap();
        arena.remove(b);
        let values: Vec<_> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![1, 3]);
    }
}
