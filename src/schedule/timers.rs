//! Deadline queue keyed by caller-supplied ids
//!
//! Each key has at most one pending deadline. Scheduling an existing key
//! replaces its deadline; cancelling an absent key does nothing.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::time::Instant;

/// Pending deadlines ordered by due time
#[derive(Debug)]
pub struct TimerQueue<K> {
    /// (deadline, sequence) -> key; the sequence keeps equal deadlines FIFO
    by_deadline: BTreeMap<(Instant, u64), K>,
    /// key -> (deadline, sequence)
    by_key: HashMap<K, (Instant, u64)>,
    next_seq: u64,
}

impl<K> TimerQueue<K>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            by_deadline: BTreeMap::new(),
            by_key: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `key` to fire at `deadline`
    pub fn schedule(&mut self, key: K, deadline: Instant) {
        self.cancel(&key);

        let slot = (deadline, self.next_seq);
        self.next_seq += 1;

        self.by_deadline.insert(slot, key.clone());
        self.by_key.insert(key, slot);
    }

    /// Cancel the pending deadline for `key`.
    ///
    /// Returns true if something was cancelled.
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.by_key.remove(key) {
            Some(slot) => {
                self.by_deadline.remove(&slot);
                true
            }
            None => false,
        }
    }

    /// Cancel everything
    pub fn clear(&mut self) {
        self.by_deadline.clear();
        self.by_key.clear();
    }

    /// Remove and return every key due at or before `now`, earliest first
    pub fn pop_due(&mut self, now: Instant) -> Vec<K> {
        let mut due = Vec::new();

        while let Some(entry) = self.by_deadline.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let key = entry.remove();
            self.by_key.remove(&key);
            due.push(key);
        }

        due
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.by_deadline.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Deadline pending for `key`
    pub fn deadline_of(&self, key: &K) -> Option<Instant> {
        self.by_key.get(key).map(|(deadline, _)| *deadline)
    }

    /// Number of pending deadlines
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// True when nothing is pending
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl<K> Default for TimerQueue<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
