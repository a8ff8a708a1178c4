//! Generic object pool keyed by kind
//!
//! One pool serves every kind of transient object (entities, particles).
//! `acquire` hands out ownership and `release` takes it back, so an object
//! that has been released can no longer be touched by its former owner.
//! Each kind has a fixed free-list capacity; objects released past that
//! capacity are dropped instead of growing the pool.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Objects that can be recycled through a [`Pool`]
pub trait Poolable {
    /// Clear per-use state before the object goes back on the free list
    fn recycle(&mut self);
}

/// Allocation counters, mostly useful for tuning capacities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Objects built by the factory
    pub created: u64,
    /// Acquisitions served from a free list
    pub reused: u64,
    /// Releases dropped because the free list was full
    pub discarded: u64,
}

pub struct Pool<K, T> {
    factory: fn(K) -> T,
    default_capacity: usize,
    capacities: HashMap<K, usize>,
    free: HashMap<K, Vec<T>>,
    in_use: HashMap<K, usize>,
    stats: PoolStats,
}

impl<K, T> fmt::Debug for Pool<K, T>
where
    K: fmt::Debug + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let free: HashMap<&K, usize> = self.free.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("Pool")
            .field("default_capacity", &self.default_capacity)
            .field("capacities", &self.capacities)
            .field("free", &free)
            .field("in_use", &self.in_use)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<K, T> Pool<K, T>
where
    K: Copy + Eq + Hash,
    T: Poolable,
{
    /// Create a pool where every kind holds at most `default_capacity` free objects
    pub fn new(factory: fn(K) -> T, default_capacity: usize) -> Self {
        Self {
            factory,
            default_capacity,
            capacities: HashMap::new(),
            free: HashMap::new(),
            in_use: HashMap::new(),
            stats: PoolStats::default(),
        }
    }

    /// Override the free-list capacity for one kind
    pub fn with_capacity(mut self, kind: K, capacity: usize) -> Self {
        self.capacities.insert(kind, capacity);
        self
    }

    /// Take an object of `kind`, recycling a free one when available
    pub fn acquire(&mut self, kind: K) -> T {
        *self.in_use.entry(kind).or_insert(0) += 1;
        match self.free.get_mut(&kind).and_then(Vec::pop) {
            Some(obj) => {
                self.stats.reused += 1;
                obj
            }
            None => {
                self.stats.created += 1;
                (self.factory)(kind)
            }
        }
    }

    /// Give an object back. Returns false if it was dropped because the
    /// kind's free list is already full.
    pub fn release(&mut self, mut obj: T, kind: K) -> bool {
        if let Some(count) = self.in_use.get_mut(&kind) {
            *count = count.saturating_sub(1);
        }

        let capacity = self.capacity(kind);
        let free = self.free.entry(kind).or_default();
        if free.len() < capacity {
            obj.recycle();
            free.push(obj);
            true
        } else {
            self.stats.discarded += 1;
            false
        }
    }

    /// Free-list capacity for a kind
    pub fn capacity(&self, kind: K) -> usize {
        self.capacities
            .get(&kind)
            .copied()
            .unwrap_or(self.default_capacity)
    }

    pub fn free_count(&self, kind: K) -> usize {
        self.free.get(&kind).map_or(0, Vec::len)
    }

    pub fn in_use_count(&self, kind: K) -> usize {
        self.in_use.get(&kind).copied().unwrap_or(0)
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Build objects up front so the first frames don't allocate
    pub fn prewarm(&mut self, kind: K, count: usize) {
        let target = count.min(self.capacity(kind));
        let factory = self.factory;
        let free = self.free.entry(kind).or_default();
        while free.len() < target {
            free.push(factory(kind));
            self.stats.created += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Spark,
        Drop,
    }

    #[derive(Debug, PartialEq)]
    struct Blob {
        kind: Kind,
        dirty: bool,
    }

    impl Poolable for Blob {
        fn recycle(&mut self) {
            self.dirty = false;
        }
    }

    fn make(kind: Kind) -> Blob {
        Blob { kind, dirty: false }
    }

    #[test]
    fn test_acquire_constructs_then_reuses() {
        let mut pool = Pool::new(make, 4);
        let mut a = pool.acquire(Kind::Spark);
        a.dirty = true;
        assert_eq!(pool.in_use_count(Kind::Spark), 1);
        assert!(pool.release(a, Kind::Spark));
        assert_eq!(pool.in_use_count(Kind::Spark), 0);
        assert_eq!(pool.free_count(Kind::Spark), 1);

        let b = pool.acquire(Kind::Spark);
        assert!(!b.dirty, "recycled object must be reset");
        assert_eq!(pool.stats().created, 1);
        assert_eq!(pool.stats().reused, 1);
    }

    #[test]
    fn test_kinds_do_not_share_free_lists() {
        let mut pool = Pool::new(make, 4);
        let a = pool.acquire(Kind::Spark);
        pool.release(a, Kind::Spark);
        let b = pool.acquire(Kind::Drop);
        assert_eq!(b.kind, Kind::Drop);
        assert_eq!(pool.free_count(Kind::Spark), 1);
    }

    #[test]
    fn test_release_past_capacity_discards() {
        let mut pool = Pool::new(make, 8).with_capacity(Kind::Drop, 2);
        let objs: Vec<_> = (0..5).map(|_| pool.acquire(Kind::Drop)).collect();
        let kept = objs
            .into_iter()
            .map(|o| pool.release(o, Kind::Drop))
            .filter(|kept| *kept)
            .count();
        assert_eq!(kept, 2);
        assert_eq!(pool.free_count(Kind::Drop), 2);
        assert_eq!(pool.stats().discarded, 3);
    }

    #[test]
    fn test_prewarm_respects_capacity() {
        let mut pool = Pool::new(make, 3);
        pool.prewarm(Kind::Spark, 10);
        assert_eq!(pool.free_count(Kind::Spark), 3);
        let _ = pool.acquire(Kind::Spark);
        assert_eq!(pool.stats().reused, 1);
    }

    proptest! {
        #[test]
        fn prop_pool_never_fails_or_grows_past_cap(cap in 0usize..16, n in 0usize..64) {
            let mut pool = Pool::new(make, cap);
            let objs: Vec<_> = (0..n).map(|_| pool.acquire(Kind::Spark)).collect();
            prop_assert_eq!(objs.len(), n);
            prop_assert!(objs.iter().all(|o| o.kind == Kind::Spark));
            prop_assert_eq!(pool.in_use_count(Kind::Spark), n);
            for o in objs {
                pool.release(o, Kind::Spark);
            }
            prop_assert_eq!(pool.free_count(Kind::Spark), n.min(cap));
            prop_assert_eq!(pool.in_use_count(Kind::Spark), 0);
        }
    }
}
