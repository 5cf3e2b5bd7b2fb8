//! Memoization of computed grid points keyed by the full parameter vector.
//!
//! Each registered model owns one `ResultCache`; all caches created by the
//! same registry draw from one shared `CacheBudget`. Entries are never
//! updated or evicted: an insert either adds a new entry, loses to an
//! existing equal key, or is dropped because the budget is exhausted.

use crate::grid::Point;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::mem::size_of;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

/// Identity of a computed point: every parameter value, then every bound
/// variable value.
#[derive(Debug, Clone)]
pub struct CacheKey {
    values: Vec<f64>,
    num_parameters: usize,
}

impl CacheKey {
    pub fn new(
        parameters: impl IntoIterator<Item = f64>,
        variables: impl IntoIterator<Item = f64>,
    ) -> Self {
        let mut values: Vec<f64> = parameters.into_iter().collect();
        let num_parameters = values.len();
        values.extend(variables);
        Self {
            values,
            num_parameters,
        }
    }

    pub fn parameters(&self) -> &[f64] {
        &self.values[..self.num_parameters]
    }

    pub fn variables(&self) -> &[f64] {
        &self.values[self.num_parameters..]
    }

    /// Number of values making up the key.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Estimated bytes one map entry holds, including its share of B-tree node
    /// bookkeeping.
    fn footprint(&self) -> usize {
        size_of::<CacheKey>()
            + size_of::<Point>()
            + self.values.len() * size_of::<f64>()
            + NODE_OVERHEAD_PER_ENTRY
    }
}

// A B-tree node stores up to 11 entries next to a parent pointer, child
// edges and length fields; spread over its entries this is about two words each.
const NODE_OVERHEAD_PER_ENTRY: usize = 2 * size_of::<usize>();

fn compare_lexicographic(left: &[f64], right: &[f64]) -> Ordering {
    for (l, r) in left.iter().zip(right) {
        match l.total_cmp(r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    left.len().cmp(&right.len())
}

impl Ord for CacheKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_lexicographic(self.parameters(), other.parameters())
            .then_with(|| compare_lexicographic(self.variables(), other.variables()))
    }
}

impl PartialOrd for CacheKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CacheKey {}

/// Byte ceiling shared by a family of caches.
#[derive(Debug)]
pub struct CacheBudget {
    capacity_bytes: usize,
    allocated_bytes: AtomicUsize,
    exhausted: AtomicBool,
}

impl CacheBudget {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            allocated_bytes: AtomicUsize::new(0),
            exhausted: AtomicBool::new(false),
        }
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes.load(AtomicOrdering::Acquire)
    }

    /// Atomically claims `bytes`; rolls the claim back if it would exceed the capacity.
    fn try_reserve(&self, bytes: usize) -> bool {
        let previous = self.allocated_bytes.fetch_add(bytes, AtomicOrdering::AcqRel);
        if previous.saturating_add(bytes) > self.capacity_bytes {
            self.allocated_bytes.fetch_sub(bytes, AtomicOrdering::AcqRel);
            if !self.exhausted.swap(true, AtomicOrdering::Relaxed) {
                tracing::warn!(
                    capacity_bytes = self.capacity_bytes,
                    "result cache budget exhausted; further points are computed uncached"
                );
            }
            return false;
        }
        true
    }

    fn release(&self, bytes: usize) {
        self.allocated_bytes.fetch_sub(bytes, AtomicOrdering::AcqRel);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheInsert {
    Inserted,
    /// An equal key was already present; the stored point was kept.
    Duplicate,
    /// The budget had no room; nothing was stored.
    OverBudget,
}

/// Concurrent append-only map from `CacheKey` to `Point`.
///
/// The lock is held for a single lookup or a single insert only, never
/// across a calculation.
#[derive(Debug)]
pub struct ResultCache {
    entries: Mutex<BTreeMap<CacheKey, Point>>,
    budget: Arc<CacheBudget>,
}

impl ResultCache {
    pub fn new(budget: Arc<CacheBudget>) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            budget,
        }
    }

    pub fn with_capacity_bytes(capacity_bytes: usize) -> Self {
        Self::new(Arc::new(CacheBudget::new(capacity_bytes)))
    }

    pub fn lookup(&self, key: &CacheKey) -> Option<Point> {
        self.entries.lock().get(key).copied()
    }

    pub fn insert(&self, key: CacheKey, point: Point) -> CacheInsert {
        let mut entries = self.entries.lock();
        if entries.contains_key(&key) {
            return CacheInsert::Duplicate;
        }
        if !self.budget.try_reserve(key.footprint()) {
            return CacheInsert::OverBudget;
        }
        entries.insert(key, point);
        CacheInsert::Inserted
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn budget(&self) -> &Arc<CacheBudget> {
        &self.budget
    }
}
