use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Numeric handle for a native cursor resource; `ResourceId::NONE` means no resource
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(u64);

impl ResourceId {
    pub const NONE: ResourceId = ResourceId(0);

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Slot in a zero-based native resource table, `None` for the null id
    pub fn slot(self) -> Option<usize> {
        usize::try_from(self.0).ok()?.checked_sub(1)
    }

    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource#{}", self.0)
    }
}

/// Recycling id generator
///
/// Released ids are reissued smallest first before the counter advances.
/// Zero is reserved and never issued.
#[derive(Debug, Default)]
pub struct ResourceIdAllocator {
    last_issued: u64,
    deleted: BTreeSet<u64>,
}

impl ResourceIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> ResourceId {
        if let Some(id) = self.deleted.pop_first() {
            return ResourceId(id);
        }

        self.last_issued += 1;
        ResourceId(self.last_issued)
    }

    pub fn release(&mut self, id: ResourceId) {
        assert!(!id.is_none(), "resource id 0 is reserved and cannot be released");
        debug_assert!(
            id.0 <= self.last_issued,
            "releasing {id} which was never issued"
        );

        let inserted = self.deleted.insert(id.0);
        debug_assert!(inserted, "{id} released twice");
    }

    pub fn is_live(&self, id: ResourceId) -> bool {
        !id.is_none() && id.0 <= self.last_issued && !self.deleted.contains(&id.0)
    }
}

/// Allocator shared between the game thread (cursor creation) and the native thread
#[derive(Clone, Debug, Default)]
pub struct ResourceIds {
    inner: Arc<Mutex<ResourceIdAllocator>>,
}

impl ResourceIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&self) -> ResourceId {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .allocate()
    }

    pub fn release(&self, id: ResourceId) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .release(id)
    }

    pub fn is_live(&self, id: ResourceId) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_live(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn first_id_is_one() {
        let mut ids = ResourceIdAllocator::new();
        assert_eq!(ids.allocate(), ResourceId(1));
        assert_eq!(ids.allocate(), ResourceId(2));
    }

    #[test]
    fn released_ids_are_reused_smallest_first() {
        let mut ids = ResourceIdAllocator::new();
        for _ in 0..5 {
            ids.allocate();
        }

        ids.release(ResourceId(3));
        ids.release(ResourceId(1));
        ids.release(ResourceId(2));

        assert_eq!(ids.allocate(), ResourceId(1));
        assert_eq!(ids.allocate(), ResourceId(2));
        assert_eq!(ids.allocate(), ResourceId(3));
        assert_eq!(ids.allocate(), ResourceId(6));
    }

    #[test]
    fn live_ids_are_never_issued_twice() {
        let mut ids = ResourceIdAllocator::new();
        let mut live: HashSet<ResourceId> = HashSet::new();

        // deterministic mix of allocations and releases
        for step in 0u64..500 {
            if step % 3 == 2 && !live.is_empty() {
                let victim = *live.iter().min_by_key(|id| (id.0 * 7919) % 13).unwrap();
                live.remove(&victim);
                ids.release(victim);
                assert!(!ids.is_live(victim));
            } else {
                let id = ids.allocate();
                assert!(!id.is_none());
                assert!(live.insert(id), "{id} issued while still live");
                assert!(ids.is_live(id));
            }
        }
    }

    #[test]
    #[should_panic(expected = "reserved")]
    fn releasing_zero_panics() {
        let mut ids = ResourceIdAllocator::new();
        ids.release(ResourceId::NONE);
    }

    #[test]
    fn slot_is_zero_based() {
        assert_eq!(ResourceId::NONE.slot(), None);
        assert_eq!(ResourceId(1).slot(), Some(0));
        assert_eq!(ResourceId(4).slot(), Some(3));
    }

    #[test]
    fn shared_allocator_is_one_sequence() {
        let ids = ResourceIds::new();
        let other = ids.clone();
        assert_eq!(ids.allocate(), ResourceId(1));
        assert_eq!(other.allocate(), ResourceId(2));
        other.release(ResourceId(1));
        assert_eq!(ids.allocate(), ResourceId(1));
    }
}
