use crate::bridge::handle::Handle;

/// Slot indices stop below `u32::MAX` so no packed handle equals
/// [`Handle::NULL`].
const MAX_SLOTS: usize = u32::MAX as usize;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational arena mapping handles to owned values.
///
/// Removing a value bumps its slot's generation, so a handle that outlives
/// its value misses on lookup instead of reaching whatever reuses the slot.
pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    len: usize,
    limit: usize,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandleTable<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            limit: MAX_SLOTS,
        }
    }

    #[cfg(test)]
    fn with_limit(limit: usize) -> Self {
        Self {
            limit: limit.min(MAX_SLOTS),
            ..Self::new()
        }
    }

    /// Stores `value` and returns its handle, or `None` when every slot is
    /// taken.
    pub fn insert(&mut self, value: T) -> Option<Handle> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.value = Some(value);
            self.len += 1;
            return Some(Handle::pack(index, slot.generation));
        }
        if self.slots.len() >= self.limit {
            return None;
        }
        self.len += 1;
        self.slots.push(Slot {
            generation: 1,
            value: Some(value),
        });
        Some(Handle::pack(self.slots.len() - 1, 1))
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let (index, generation) = handle.unpack()?;
        let slot = self.slots.get(index)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let (index, generation) = handle.unpack()?;
        let slot = self.slots.get_mut(index)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.value.take()?;
        // Generations start at 1 and skip 0 on wrap-around.
        slot.generation = slot.generation.wrapping_add(1).max(1);
        self.free.push(index);
        self.len -= 1;
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every value, leaving outstanding handles stale.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len);
        for index in 0..self.slots.len() {
            let slot = &mut self.slots[index];
            if let Some(value) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1).max(1);
                self.free.push(index);
                values.push(value);
            }
        }
        self.len = 0;
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut table = HandleTable::new();
        let a = table.insert("a").unwrap();
        let b = table.insert("b").unwrap();

        assert_ne!(a, b);
        assert_eq!(table.get(a), Some(&"a"));
        assert_eq!(table.get(b), Some(&"b"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_null_handle_misses() {
        let mut table = HandleTable::new();
        table.insert(1).unwrap();
        assert_eq!(table.get(Handle::NULL), None);
        assert_eq!(table.remove(Handle::NULL), None);
    }

    #[test]
    fn test_remove_returns_value_once() {
        let mut table = HandleTable::new();
        let h = table.insert(5).unwrap();

        assert_eq!(table.remove(h), Some(5));
        assert_eq!(table.remove(h), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_stale_handle_does_not_alias_reused_slot() {
        let mut table = HandleTable::new();
        let old = table.insert("old").unwrap();
        table.remove(old);
        let new = table.insert("new").unwrap();

        assert_ne!(old, new);
        assert_eq!(old.unpack().map(|(i, _)| i), new.unpack().map(|(i, _)| i));
        assert_eq!(table.get(old), None);
        assert_eq!(table.remove(old), None);
        assert_eq!(table.get(new), Some(&"new"));
    }

    #[test]
    fn test_unknown_index_misses() {
        let table: HandleTable<u8> = HandleTable::new();
        assert_eq!(table.get(Handle::pack(99, 1)), None);
    }

    #[test]
    fn test_drain_empties_and_invalidates() {
        let mut table = HandleTable::new();
        let a = table.insert(1).unwrap();
        let b = table.insert(2).unwrap();

        let mut values = table.drain();
        values.sort();

        assert_eq!(values, vec![1, 2]);
        assert!(table.is_empty());
        assert_eq!(table.get(a), None);
        assert_eq!(table.get(b), None);
    }

    #[test]
    fn test_full_table_refuses_new_slots_but_reuses_freed_ones() {
        let mut table = HandleTable::with_limit(2);
        let a = table.insert('a').unwrap();
        table.insert('b').unwrap();

        assert_eq!(table.insert('c'), None);
        assert_eq!(table.len(), 2);

        table.remove(a);
        let c = table.insert('c').unwrap();
        assert_eq!(table.get(c), Some(&'c'));
    }

    #[test]
    fn test_last_slot_index_is_not_null() {
        let last = Handle::pack(MAX_SLOTS - 1, 1);
        assert!(!last.is_null());
        assert_eq!(last.unpack(), Some((MAX_SLOTS - 1, 1)));
        assert_eq!(HandleTable::<u8>::with_limit(usize::MAX).limit, MAX_SLOTS);
    }
}
