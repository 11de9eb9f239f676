//! Open-addressing term dictionary.
//!
//! A flat bucket array probed linearly. Deleted buckets become tombstones:
//! lookups probe past them and stop at the first never-used bucket, inserts
//! reuse the first tombstone seen. When live plus tombstoned buckets would
//! exceed 70% of capacity the table doubles and rehashes, dropping tombstones.
//!
//! The same structure backs both phases of the index: `TermMap<Vec<DocId>>`
//! while postings are accumulated, `TermMap<TermInfo>` once the dictionary
//! artifact is loaded for querying.

use std::mem;

const DEFAULT_CAPACITY: usize = 1024;
const MIN_CAPACITY: usize = 8;

/// Load factor limit as a ratio, kept integral to avoid float rounding
const MAX_LOAD_NUM: usize = 7;
const MAX_LOAD_DEN: usize = 10;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over the key bytes
#[inline]
pub fn fnv1a(key: &str) -> u64 {
    let mut hash = FNV_OFFSET;
    for &byte in key.as_bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum BucketState {
    #[default]
    Empty,
    Tombstone,
    Occupied,
}

#[derive(Debug, Clone, Default)]
struct Bucket<V> {
    state: BucketState,
    hash: u64,
    key: String,
    value: V,
}

/// String-keyed hash map with linear probing and tombstone deletion
#[derive(Debug, Clone)]
pub struct TermMap<V> {
    buckets: Vec<Bucket<V>>,
    len: usize,
    tombstones: usize,
}

/// Outcome of a probe: the key's bucket, or where it would be inserted
enum Probe {
    Found(usize),
    Vacant(usize),
}

impl<V: Default> Default for TermMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Default> TermMap<V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a table with at least `capacity` buckets (rounded up to a power of two)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY).next_power_of_two();
        Self {
            buckets: Self::empty_buckets(capacity),
            len: 0,
            tombstones: 0,
        }
    }

    fn empty_buckets(capacity: usize) -> Vec<Bucket<V>> {
        let mut buckets = Vec::with_capacity(capacity);
        buckets.resize_with(capacity, Bucket::default);
        buckets
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Number of tombstoned buckets awaiting the next rehash
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    fn probe(&self, hash: u64, key: &str) -> Probe {
        let mask = self.buckets.len() - 1;
        let mut idx = (hash as usize) & mask;
        let mut first_tombstone = None;

        for _ in 0..self.buckets.len() {
            let bucket = &self.buckets[idx];
            match bucket.state {
                BucketState::Empty => return Probe::Vacant(first_tombstone.unwrap_or(idx)),
                BucketState::Tombstone => {
                    first_tombstone.get_or_insert(idx);
                }
                BucketState::Occupied => {
                    if bucket.hash == hash && bucket.key == key {
                        return Probe::Found(idx);
                    }
                }
            }
            idx = (idx + 1) & mask;
        }

        // No empty bucket left; cannot happen under the load limit
        Probe::Vacant(first_tombstone.unwrap_or(idx))
    }

    /// Look up a key without allocating
    pub fn find(&self, key: &str) -> Option<&V> {
        match self.probe(fnv1a(key), key) {
            Probe::Found(idx) => Some(&self.buckets[idx].value),
            Probe::Vacant(_) => None,
        }
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut V> {
        match self.probe(fnv1a(key), key) {
            Probe::Found(idx) => Some(&mut self.buckets[idx].value),
            Probe::Vacant(_) => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Mutable handle to the value for `key`, inserting `default` if it is absent
    pub fn get_or_insert(&mut self, key: &str, default: V) -> &mut V {
        self.get_or_insert_with(key, || default)
    }

    /// Like [`get_or_insert`](Self::get_or_insert) but only builds the default on insertion
    pub fn get_or_insert_with(&mut self, key: &str, default: impl FnOnce() -> V) -> &mut V {
        let hash = fnv1a(key);
        let idx = match self.probe(hash, key) {
            Probe::Found(idx) => idx,
            Probe::Vacant(mut idx) => {
                if self.would_exceed_load(&self.buckets[idx]) {
                    self.resize(self.buckets.len() * 2);
                    if let Probe::Vacant(fresh) = self.probe(hash, key) {
                        idx = fresh;
                    }
                }
                self.occupy(idx, hash, key, default());
                idx
            }
        };
        &mut self.buckets[idx].value
    }

    /// Insert or replace, returning the previous value
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        let hash = fnv1a(key);
        if let Probe::Found(idx) = self.probe(hash, key) {
            return Some(mem::replace(&mut self.buckets[idx].value, value));
        }
        self.get_or_insert(key, value);
        None
    }

    /// Remove a key, leaving a tombstone in its bucket
    pub fn remove(&mut self, key: &str) -> Option<V> {
        match self.probe(fnv1a(key), key) {
            Probe::Found(idx) => {
                let bucket = &mut self.buckets[idx];
                bucket.state = BucketState::Tombstone;
                bucket.key = String::new();
                self.len -= 1;
                self.tombstones += 1;
                Some(mem::take(&mut bucket.value))
            }
            Probe::Vacant(_) => None,
        }
    }

    /// Inserting into `target` adds a used bucket unless it recycles a tombstone
    fn would_exceed_load(&self, target: &Bucket<V>) -> bool {
        let used_after =
            self.len + self.tombstones + usize::from(target.state == BucketState::Empty);
        used_after * MAX_LOAD_DEN > self.buckets.len() * MAX_LOAD_NUM
    }

    fn occupy(&mut self, idx: usize, hash: u64, key: &str, value: V) {
        let bucket = &mut self.buckets[idx];
        if bucket.state == BucketState::Tombstone {
            self.tombstones -= 1;
        }
        bucket.state = BucketState::Occupied;
        bucket.hash = hash;
        bucket.key = key.to_string();
        bucket.value = value;
        self.len += 1;
    }

    fn resize(&mut self, new_capacity: usize) {
        let old = mem::replace(&mut self.buckets, Self::empty_buckets(new_capacity));
        self.tombstones = 0;
        let mask = new_capacity - 1;

        for bucket in old {
            if bucket.state != BucketState::Occupied {
                continue;
            }
            let mut idx = (bucket.hash as usize) & mask;
            while self.buckets[idx].state != BucketState::Empty {
                idx = (idx + 1) & mask;
            }
            self.buckets[idx] = bucket;
        }
    }

    /// Iterate live entries in bucket order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.buckets
            .iter()
            .filter(|b| b.state == BucketState::Occupied)
            .map(|b| (b.key.as_str(), &b.value))
    }

    /// Consume the table, returning live entries sorted by key bytes
    pub fn into_sorted(self) -> Vec<(String, V)> {
        let mut entries: Vec<(String, V)> = self
            .buckets
            .into_iter()
            .filter(|b| b.state == BucketState::Occupied)
            .map(|b| (b.key, b.value))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        entries
    }
}
