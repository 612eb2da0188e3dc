//! Generational slab used as the scheduler's task arena.
//!
//! Slots are recycled through a free list. Every slot carries a generation
//! counter that is bumped on removal, so a [`Key`] handed out for an old
//! occupant never resolves to the slot's new occupant.

/// Stable address of a slab entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Key {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

pub(crate) struct Slab<T> {
    items: Vec<Slot<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Slab<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn insert(&mut self, item: T) -> Key {
        let index = if let Some(i) = self.free.pop() {
            i
        } else {
            self.items.push(Slot {
                generation: 0,
                value: None,
            });
            self.items.len() - 1
        };

        let slot = &mut self.items[index];
        slot.value = Some(item);
        self.len += 1;

        Key {
            index,
            generation: slot.generation,
        }
    }

    pub(crate) fn get(&self, key: Key) -> Option<&T> {
        self.items
            .get(key.index)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        self.items
            .get_mut(key.index)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub(crate) fn remove(&mut self, key: Key) -> Option<T> {
        let slot = self.items.get_mut(key.index)?;
        if slot.generation != key.generation {
            return None;
        }

        let item = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        self.len -= 1;

        Some(item)
    }

    /// Removes every live entry, leaving all keys stale.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut drained = Vec::with_capacity(self.len);

        for (index, slot) in self.items.iter_mut().enumerate() {
            if let Some(item) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index);
                drained.push(item);
            }
        }

        self.len = 0;
        drained
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut slab = Slab::with_capacity(2);
        let a = slab.insert("a");
        let b = slab.insert("b");

        assert_eq!(slab.get(a), Some(&"a"));
        assert_eq!(slab.get(b), Some(&"b"));
        assert_eq!(slab.len(), 2);
    }

    #[test]
    fn test_stale_key_after_reuse() {
        let mut slab = Slab::with_capacity(1);
        let old = slab.insert(1);
        assert_eq!(slab.remove(old), Some(1));

        let new = slab.insert(2);
        assert_eq!(new.index, old.index, "free slot should be reused");
        assert_eq!(slab.get(old), None, "stale key must not see the new occupant");
        assert_eq!(slab.remove(old), None);
        assert_eq!(slab.get(new), Some(&2));
    }

    #[test]
    fn test_drain_invalidates_keys() {
        let mut slab = Slab::with_capacity(4);
        let keys: Vec<_> = (0..4).map(|i| slab.insert(i)).collect();

        let mut drained = slab.drain();
        drained.sort();

        assert_eq!(drained, vec![0, 1, 2, 3]);
        assert_eq!(slab.len(), 0);
        assert!(keys.iter().all(|k| slab.get(*k).is_none()));
    }
}
