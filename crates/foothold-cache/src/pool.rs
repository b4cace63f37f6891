//! Recycling object pool over a `SlotMap`.
//!
//! Live values sit in the slot map; released values are recycled and parked
//! on a stash, so steady-state acquire/release does not allocate. Handles
//! are versioned slot-map keys and stop resolving once released.

use std::ops::{Index, IndexMut};

use slotmap::{Key, KeyData, SlotMap, new_key_type};

/// Reset hook run when a value goes back to the pool.
pub trait Recycle {
    fn recycle(&mut self);
}

new_key_type! {
    pub struct PoolHandle;
}

impl PoolHandle {
    /// Packs the handle into one integer (slot index in the low half).
    #[inline]
    pub fn to_bits(self) -> u64 {
        self.data().as_ffi()
    }

    #[inline]
    pub fn from_bits(bits: u64) -> Self {
        KeyData::from_ffi(bits).into()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub allocated: usize,
    pub in_use: usize,
    pub free: usize,
}

pub struct ObjectPool<T> {
    live: SlotMap<PoolHandle, T>,
    stash: Vec<T>,
    grow_by: usize,
}

impl<T: Default + Recycle> ObjectPool<T> {
    /// Pre-allocates `initial` values; an empty stash grows by `grow_by`.
    pub fn with_capacity(initial: usize, grow_by: usize) -> Self {
        let mut pool = Self {
            live: SlotMap::with_capacity_and_key(initial),
            stash: Vec::with_capacity(initial),
            grow_by: grow_by.max(1),
        };
        pool.grow(initial);
        pool
    }

    /// Takes a recycled value out of the pool, growing it when exhausted.
    pub fn acquire(&mut self) -> PoolHandle {
        if self.stash.is_empty() {
            log::debug!(
                "pool exhausted at {} values; growing by {}",
                self.allocated(),
                self.grow_by
            );
            self.grow(self.grow_by);
        }
        let value = self.stash.pop().unwrap_or_default();
        self.live.insert(value)
    }

    fn grow(&mut self, n: usize) {
        self.stash.reserve(n);
        self.live.reserve(n);
        self.stash.extend((0..n).map(|_| T::default()));
    }
}

impl<T: Recycle> ObjectPool<T> {
    /// Returns the value to the pool. Stale or foreign handles are ignored and
    /// yield `false`.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        let Some(mut value) = self.live.remove(handle) else {
            return false;
        };
        value.recycle();
        self.stash.push(value);
        true
    }
}

impl<T> ObjectPool<T> {
    #[inline]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.live.get(handle)
    }

    #[inline]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.live.get_mut(handle)
    }

    #[inline]
    pub fn is_live(&self, handle: PoolHandle) -> bool {
        self.live.contains_key(handle)
    }

    /// Values currently handed out.
    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &T)> + '_ {
        self.live.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PoolHandle, &mut T)> + '_ {
        self.live.iter_mut()
    }

    #[inline]
    pub fn allocated(&self) -> usize {
        self.live.len() + self.stash.len()
    }

    #[inline]
    pub fn in_use(&self) -> usize {
        self.live.len()
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.stash.len()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.allocated(),
            in_use: self.in_use(),
            free: self.free_count(),
        }
    }
}

impl<T> Index<PoolHandle> for ObjectPool<T> {
    type Output = T;

    #[inline]
    fn index(&self, handle: PoolHandle) -> &Self::Output {
        match self.get(handle) {
            Some(v) => v,
            None => panic!("stale pool handle {:?}", handle),
        }
    }
}

impl<T> IndexMut<PoolHandle> for ObjectPool<T> {
    #[inline]
    fn index_mut(&mut self, handle: PoolHandle) -> &mut Self::Output {
        match self.get_mut(handle) {
            Some(v) => v,
            None => panic!("stale pool handle {:?}", handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug)]
    struct Scratch {
        data: Vec<u32>,
        recycled: u32,
    }

    impl Recycle for Scratch {
        fn recycle(&mut self) {
            self.data.clear();
            self.recycled += 1;
        }
    }

    fn assert_balanced<T>(pool: &ObjectPool<T>) {
        assert_eq!(pool.allocated(), pool.in_use() + pool.free_count());
    }

    #[test]
    fn prewarmed_pool_hands_out_without_growing() {
        let mut pool: ObjectPool<Scratch> = ObjectPool::with_capacity(4, 2);
        let hs: Vec<_> = (0..4).map(|_| pool.acquire()).collect();
        assert_eq!(pool.allocated(), 4);
        assert_eq!(pool.in_use(), 4);
        assert_eq!(pool.free_count(), 0);
        assert!(hs.iter().all(|&h| pool.is_live(h)));
        assert_balanced(&pool);
    }

    #[test]
    fn exhausted_pool_grows_by_step() {
        let mut pool: ObjectPool<Scratch> = ObjectPool::with_capacity(2, 3);
        for _ in 0..3 {
            pool.acquire();
        }
        assert_eq!(pool.allocated(), 5);
        assert_eq!(pool.free_count(), 2);
        assert_balanced(&pool);
    }

    #[test]
    fn release_recycles_and_invalidates_handle() {
        let mut pool: ObjectPool<Scratch> = ObjectPool::with_capacity(1, 1);
        let h = pool.acquire();
        pool[h].data.extend([1, 2, 3]);
        assert!(pool.release(h));
        assert!(pool.get(h).is_none());
        assert!(!pool.release(h), "double release is rejected");

        let h2 = pool.acquire();
        assert_ne!(h2, h);
        assert!(pool[h2].data.is_empty());
        assert_eq!(pool[h2].recycled, 1);
        assert!(pool.get(h).is_none(), "old handle does not alias the new value");
        assert_eq!(pool.allocated(), 1);
        assert_balanced(&pool);
    }

    #[test]
    fn handle_bits_round_trip() {
        let mut pool: ObjectPool<Scratch> = ObjectPool::with_capacity(3, 1);
        let a = pool.acquire();
        pool.release(a);
        let b = pool.acquire();
        assert_eq!(PoolHandle::from_bits(b.to_bits()), b);
    }

    #[test]
    fn iter_lists_only_live_values() {
        let mut pool: ObjectPool<Scratch> = ObjectPool::with_capacity(4, 1);
        let a = pool.acquire();
        let b = pool.acquire();
        pool.release(a);
        let live: Vec<_> = pool.iter().map(|(h, _)| h).collect();
        assert_eq!(live, vec![b]);
    }

    #[test]
    fn iter_mut_updates_in_place() {
        let mut pool: ObjectPool<Scratch> = ObjectPool::with_capacity(3, 1);
        let a = pool.acquire();
        let b = pool.acquire();
        for (_, v) in pool.iter_mut() {
            v.data.push(9);
        }
        assert_eq!(pool[a].data, vec![9]);
        assert_eq!(pool[b].data, vec![9]);
    }

    #[test]
    #[should_panic(expected = "stale pool handle")]
    fn indexing_with_stale_handle_panics() {
        let mut pool: ObjectPool<Scratch> = ObjectPool::with_capacity(1, 1);
        let h = pool.acquire();
        pool.release(h);
        let _ = &pool[h];
    }
}
