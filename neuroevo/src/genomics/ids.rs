use serde::{Deserialize, Serialize};

/// Monotonic source of identifiers for a single evolutionary run.
///
/// Gene innovations, organism ids and specie ids are all drawn from
/// the same counter, so every number handed out by a run is unique.
/// The first id issued is `1`.
///
/// # Examples
/// ```
/// use neuroevo::IdAllocator;
///
/// let mut ids = IdAllocator::new();
/// assert_eq!(ids.next_id(), 1);
/// assert_eq!(ids.next_id(), 2);
///
/// let mut resumed = IdAllocator::resume_after(ids.last_issued());
/// assert_eq!(resumed.next_id(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    last: u64,
}

impl IdAllocator {
    /// Returns an allocator which has issued nothing yet.
    pub fn new() -> IdAllocator {
        IdAllocator { last: 0 }
    }

    /// Returns an allocator that continues after `last`,
    /// used when resuming a persisted run.
    pub fn resume_after(last: u64) -> IdAllocator {
        IdAllocator { last }
    }

    /// Issues the next id.
    pub fn next_id(&mut self) -> u64 {
        self.last += 1;
        self.last
    }

    /// Returns the most recently issued id, or `0`
    /// if none has been issued.
    pub fn last_issued(&self) -> u64 {
        self.last
    }

    /// Ensures ids issued from now on are greater than `id`.
    pub fn observe(&mut self, id: u64) {
        self.last = self.last.max(id);
    }
}
