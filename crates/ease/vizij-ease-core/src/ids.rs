//! Identifiers and simple allocators for engine entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one animation entry (one target object of one `add` call).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EntryId(pub u32);

/// Identity of a registered event listener.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry#{}", self.0)
    }
}

/// Monotonic allocator for EntryId.
/// IDs are never reused within one manager, so a stale handle can never alias
/// a newer entry.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_entry: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_entry(&mut self) -> EntryId {
        let id = EntryId(self.next_entry);
        self.next_entry = self.next_entry.wrapping_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_entry(), EntryId(0));
        assert_eq!(alloc.alloc_entry(), EntryId(1));
        assert_eq!(alloc.alloc_entry().to_string(), "entry#2");
    }
}
