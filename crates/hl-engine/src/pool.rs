//! Pool: fixed-size reusable instance storage with on-demand growth.

use log::warn;
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Generational handle to a pooled instance. Stale handles never alias a reused slot.
    pub struct InstanceId;
}

/// Reusable storage for note and effect instances.
///
/// Storage for `capacity` instances is reserved up front. Acquiring past the
/// capacity logs a warning and grows the capacity by exactly one, so the
/// per-frame path only allocates when the pool genuinely runs dry.
pub struct Pool<T> {
    items: SlotMap<InstanceId, T>,
    capacity: usize,
    grown: usize,
    name: &'static str,
}

impl<T> Pool<T> {
    pub fn with_capacity(name: &'static str, capacity: usize) -> Self {
        Self {
            items: SlotMap::with_capacity_and_key(capacity),
            capacity,
            grown: 0,
            name,
        }
    }

    /// Take an instance slot for `value`, growing the pool by one if it is full.
    pub fn acquire(&mut self, value: T) -> InstanceId {
        if self.items.len() >= self.capacity {
            #[cfg(feature = "alloc_check")]
            assert_no_alloc::permit_alloc(|| self.grow());
            #[cfg(not(feature = "alloc_check"))]
            self.grow();
        }
        self.items.insert(value)
    }

    fn grow(&mut self) {
        self.capacity += 1;
        self.grown += 1;
        warn!("{} pool exhausted, growing to {}", self.name, self.capacity);
        self.items.reserve(1);
    }

    /// Return an instance to the pool. Releasing an already-free handle is a no-op.
    pub fn release(&mut self, id: InstanceId) -> Option<T> {
        self.items.remove(id)
    }

    pub fn get(&self, id: InstanceId) -> Option<&T> {
        self.items.get(id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut T> {
        self.items.get_mut(id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.items.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &T)> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (InstanceId, &mut T)> {
        self.items.iter_mut()
    }

    /// Release every instance for which `keep` returns false.
    pub fn retain<F: FnMut(InstanceId, &mut T) -> bool>(&mut self, keep: F) {
        self.items.retain(keep);
    }

    /// Return every instance to the pool.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of instances in use.
    pub fn active_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Instances the pool can hold without growing.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many times the pool has grown past its initial size.
    pub fn grown(&self) -> usize {
        self.grown
    }
}
