//! Counting maps with totals, normalization and ranking

use crate::io::error::{Result, computation_error};
use num_traits::{Float, Num};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

/// Map from keys to numeric counts where missing keys count as zero
#[derive(Debug, Clone)]
pub struct Counter<K, N = f64> {
    entries: HashMap<K, N>,
}

impl<K: Eq + Hash, N: PartialEq> PartialEq for Counter<K, N> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K, N> Default for Counter<K, N> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, N: Num + Copy> Counter<K, N> {
    /// Create an empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys with a recorded count
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Number of keys with a recorded count
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key has been counted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` has a recorded count
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Count for `key`, zero if it was never counted
    pub fn count(&self, key: &K) -> N {
        self.entries.get(key).copied().unwrap_or_else(N::zero)
    }

    /// Overwrite the count for `key`
    pub fn set_count(&mut self, key: K, count: N) {
        self.entries.insert(key, count);
    }

    /// Add `increment` to the count for `key`
    pub fn increment_count(&mut self, key: K, increment: N) {
        match self.entries.entry(key) {
            Entry::Occupied(mut entry) => {
                let updated = *entry.get() + increment;
                entry.insert(updated);
            }
            Entry::Vacant(entry) => {
                entry.insert(increment);
            }
        }
    }

    /// Sum of all counts
    pub fn total_count(&self) -> N {
        self.entries
            .values()
            .fold(N::zero(), |total, &count| total + count)
    }

    /// Keys and counts, highest count first and ties in descending key order
    pub fn sorted(&self) -> Vec<(K, N)>
    where
        K: Ord + Clone,
        N: PartialOrd,
    {
        let mut items: Vec<(K, N)> = self
            .entries
            .iter()
            .map(|(key, &count)| (key.clone(), count))
            .collect();
        items.sort_by(|(key_a, count_a), (key_b, count_b)| {
            count_b
                .partial_cmp(count_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| key_b.cmp(key_a))
        });
        items
    }
}

impl<K: Eq + Hash, N: Float> Counter<K, N> {
    /// Divide every count by the total so that the counts sum to one
    ///
    /// # Errors
    ///
    /// Returns an error if the total count is zero
    pub fn normalize(&mut self) -> Result<()> {
        let total = self.total_count();
        if total.is_zero() {
            return Err(computation_error("normalize", &"total count is zero"));
        }
        for count in self.entries.values_mut() {
            *count = *count / total;
        }
        Ok(())
    }
}

/// Two-level counter keyed first by `K` and then by `V`
#[derive(Debug, Clone)]
pub struct CounterMap<K, V, N = f64> {
    counters: HashMap<K, Counter<V, N>>,
}

impl<K: Eq + Hash, V: Eq + Hash, N: PartialEq> PartialEq for CounterMap<K, V, N> {
    fn eq(&self, other: &Self) -> bool {
        self.counters == other.counters
    }
}

impl<K, V, N> Default for CounterMap<K, V, N> {
    fn default() -> Self {
        Self {
            counters: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V: Eq + Hash, N: Num + Copy> CounterMap<K, V, N> {
    /// Create an empty counter map
    pub fn new() -> Self {
        Self::default()
    }

    /// Outer keys
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.counters.keys()
    }

    /// Overwrite the count for `(key, value)`
    pub fn set_count(&mut self, key: K, value: V, count: N) {
        self.counter(key).set_count(value, count);
    }

    /// Add `increment` to the count for `(key, value)`
    pub fn increment_count(&mut self, key: K, value: V, increment: N) {
        self.counter(key).increment_count(value, increment);
    }

    /// Count for `(key, value)`, zero if never counted
    pub fn count(&self, key: &K, value: &V) -> N {
        self.counters
            .get(key)
            .map_or_else(N::zero, |counter| counter.count(value))
    }

    /// Inner counter for `key`, created empty if missing
    pub fn counter(&mut self, key: K) -> &mut Counter<V, N> {
        self.counters.entry(key).or_default()
    }

    /// Inner counter for `key` if one exists
    pub fn get(&self, key: &K) -> Option<&Counter<V, N>> {
        self.counters.get(key)
    }

    /// Sum of every inner counter's total
    pub fn total_count(&self) -> N {
        self.counters
            .values()
            .fold(N::zero(), |total, counter| total + counter.total_count())
    }

    /// Number of `(key, value)` entries across all inner counters
    pub fn total_size(&self) -> usize {
        self.counters.values().map(Counter::len).sum()
    }

    /// Number of outer keys
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether there are no outer keys
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

impl<K: Eq + Hash, V: Eq + Hash, N: Float> CounterMap<K, V, N> {
    /// Normalize each inner counter independently
    ///
    /// # Errors
    ///
    /// Returns an error if any inner counter totals zero
    pub fn normalize(&mut self) -> Result<()> {
        self.counters.values_mut().try_for_each(Counter::normalize)
    }
}
