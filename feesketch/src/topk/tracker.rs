// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::amount::Amount;
use crate::countmin::CountMinSketch;
use crate::error::Error;
use crate::topk::heap::IndexedMinHeap;

/// Largest gap between a cached total and the live estimate that is not reported.
pub const DISCREPANCY_TOLERANCE: Amount = Amount::from_cents(1);

/// A key currently held in the top-K collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntry {
    pub(crate) key: String,
    pub(crate) estimated_total: Amount,
    pub(crate) event_count: u64,
    pub(crate) sequence: u64,
}

impl TrackedEntry {
    /// Returns the tracked key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the sketch estimate cached at the key's most recent event.
    pub fn estimated_total(&self) -> Amount {
        self.estimated_total
    }

    /// Returns the exact number of events seen for the key.
    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Returns true if `self` is listed after `other` in a top-K listing.
    ///
    /// Lower totals rank lower; on equal totals the entry that reached its total later ranks
    /// lower.
    pub(crate) fn ranks_below(&self, other: &TrackedEntry) -> bool {
        match self.estimated_total.cmp(&other.estimated_total) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => self.sequence > other.sequence,
        }
    }
}

/// One row of a ranked top-K listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    rank: usize,
    key: String,
    estimated_total: Amount,
    event_count: u64,
}

impl RankedEntry {
    /// Returns the 1-based rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Returns the key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the estimated total.
    pub fn estimated_total(&self) -> Amount {
        self.estimated_total
    }

    /// Returns the exact number of events seen for the key.
    pub fn event_count(&self) -> u64 {
        self.event_count
    }
}

/// A tracked entry whose cached total no longer matches the sketch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    /// The tracked key.
    pub key: String,
    /// Total cached in the top-K collection.
    pub tracked_total: Amount,
    /// Live estimate read from the sketch.
    pub sketch_estimate: Amount,
    /// Absolute difference between the two.
    pub difference: Amount,
}

/// Consistency report produced by [`TopKTracker::verify_accuracy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccuracyReport {
    /// Number of entries in the top-K collection.
    pub tracked: usize,
    /// Number of distinct keys ever seen.
    pub distinct_keys: usize,
    /// Exact sum of all amounts in the sketch.
    pub total_sum: Amount,
    /// Per-key overestimation bound of the sketch.
    pub max_error_estimate: Amount,
    /// Entries whose cached total drifted from the sketch by more than
    /// [`DISCREPANCY_TOLERANCE`].
    pub discrepancies: Vec<Discrepancy>,
}

impl AccuracyReport {
    /// Returns true if no discrepancies were found.
    pub fn is_consistent(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tracked: {}, distinct keys: {}, total: {}, max error: {}, discrepancies: {}",
            self.tracked,
            self.distinct_keys,
            self.total_sum,
            self.max_error_estimate,
            self.discrepancies.len()
        )?;
        for d in &self.discrepancies {
            write!(
                f,
                "\n  {}: tracked {}, sketch {}, difference {}",
                d.key, d.tracked_total, d.sketch_estimate, d.difference
            )?;
        }
        Ok(())
    }
}

/// Tracks the `k` keys with the largest estimated totals.
///
/// Every event is folded into an internal [`CountMinSketch`]; the key's fresh estimate then
/// decides whether it enters, stays in, or is kept out of a bounded min-heap of size `k`. The heap
/// never sums amounts itself, it only caches what the sketch reports.
///
/// # Examples
///
/// ```
/// # use feesketch::amount::Amount;
/// # use feesketch::topk::TopKTracker;
/// let mut tracker = TopKTracker::new(2, 2719, 5).unwrap();
/// tracker.add_event("npi1", Amount::from_cents(10000));
/// tracker.add_event("npi2", Amount::from_cents(15000));
/// tracker.add_event("npi3", Amount::from_cents(20000));
///
/// let top = tracker.top_k();
/// assert_eq!(top[0].key(), "npi3");
/// assert_eq!(top[1].key(), "npi2");
/// ```
#[derive(Debug, Clone)]
pub struct TopKTracker {
    k: usize,
    sketch: CountMinSketch,
    heap: IndexedMinHeap,
    event_counts: HashMap<String, u64>,
    sequence: u64,
}

impl TopKTracker {
    /// Creates a tracker of size `k` over a new sketch of the given dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidConfig`](crate::error::ErrorKind::InvalidConfig) if `k`,
    /// `width` or `depth` is zero.
    pub fn new(k: usize, width: usize, depth: usize) -> Result<Self, Error> {
        Self::with_sketch(k, CountMinSketch::new(width, depth)?)
    }

    /// Creates a tracker of size `k` over an existing sketch.
    ///
    /// Keys already accumulated in `sketch` are not tracked until their next event.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidConfig`](crate::error::ErrorKind::InvalidConfig) if `k` is
    /// zero.
    pub fn with_sketch(k: usize, sketch: CountMinSketch) -> Result<Self, Error> {
        check_k(k)?;
        Ok(Self {
            k,
            sketch,
            heap: IndexedMinHeap::with_capacity(k),
            event_counts: HashMap::new(),
            sequence: 0,
        })
    }

    /// Returns the capacity of the top-K collection.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Returns the number of tracked entries, at most `k`.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.heap.len() == 0
    }

    /// Returns the number of distinct keys ever seen.
    pub fn distinct_keys(&self) -> usize {
        self.event_counts.len()
    }

    /// Returns the underlying sketch.
    pub fn sketch(&self) -> &CountMinSketch {
        &self.sketch
    }

    /// Returns the sketch estimate for `key`, tracked or not.
    pub fn estimate(&self, key: &str) -> Amount {
        self.sketch.estimate(key)
    }

    /// Returns the exact number of events seen for `key`.
    pub fn event_count(&self, key: &str) -> u64 {
        self.event_counts.get(key).copied().unwrap_or(0)
    }

    /// Returns the tracked entry for `key`, if it is currently in the top-K collection.
    pub fn get(&self, key: &str) -> Option<&TrackedEntry> {
        self.heap.get(key)
    }

    /// Records one event of `amount` for `key`.
    pub fn add_event(&mut self, key: &str, amount: Amount) {
        self.sketch.add(key, amount);

        let event_count = match self.event_counts.get_mut(key) {
            Some(count) => {
                *count = count.saturating_add(1);
                *count
            }
            None => {
                self.event_counts.insert(key.to_string(), 1);
                1
            }
        };
        self.sequence += 1;

        let estimated_total = self.sketch.estimate(key);
        self.admit(key, estimated_total, event_count);
    }

    fn admit(&mut self, key: &str, estimated_total: Amount, event_count: u64) {
        let sequence = self.sequence;
        if self.heap.update(key, estimated_total, event_count, sequence) {
            trace!(key, total = %estimated_total, "refreshed tracked entry");
            return;
        }

        let entry = TrackedEntry {
            key: key.to_string(),
            estimated_total,
            event_count,
            sequence,
        };
        if self.heap.len() < self.k {
            trace!(key, total = %estimated_total, "admitted entry");
            self.heap.push(entry);
            return;
        }

        // Ties keep the incumbent.
        let Some(min_total) = self.heap.peek_min().map(|min| min.estimated_total) else {
            return;
        };
        if estimated_total <= min_total {
            return;
        }
        if let Some(evicted) = self.heap.pop_min() {
            debug!(
                evicted = %evicted.key,
                evicted_total = %evicted.estimated_total,
                admitted = key,
                admitted_total = %estimated_total,
                "evicted entry"
            );
        }
        self.heap.push(entry);
    }

    /// Returns all tracked entries, highest estimated total first.
    pub fn top_k(&self) -> Vec<TrackedEntry> {
        let mut entries: Vec<TrackedEntry> = self.heap.iter().cloned().collect();
        entries.sort_by(|a, b| {
            b.estimated_total
                .cmp(&a.estimated_total)
                .then(a.sequence.cmp(&b.sequence))
        });
        entries
    }

    /// Returns at most `limit` tracked entries with their 1-based rank.
    pub fn top_k_ranked(&self, limit: usize) -> Vec<RankedEntry> {
        self.top_k()
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, entry)| RankedEntry {
                rank: i + 1,
                key: entry.key,
                estimated_total: entry.estimated_total,
                event_count: entry.event_count,
            })
            .collect()
    }

    /// Cross-checks every tracked entry against the live sketch estimate.
    pub fn verify_accuracy(&self) -> AccuracyReport {
        let discrepancies: Vec<Discrepancy> = self
            .heap
            .iter()
            .filter_map(|entry| {
                let sketch_estimate = self.sketch.estimate(&entry.key);
                let difference = sketch_estimate.abs_diff(entry.estimated_total);
                (difference > DISCREPANCY_TOLERANCE).then(|| Discrepancy {
                    key: entry.key.clone(),
                    tracked_total: entry.estimated_total,
                    sketch_estimate,
                    difference,
                })
            })
            .collect();
        if !discrepancies.is_empty() {
            warn!(
                count = discrepancies.len(),
                "tracked totals drifted from sketch estimates"
            );
        }
        AccuracyReport {
            tracked: self.heap.len(),
            distinct_keys: self.event_counts.len(),
            total_sum: self.sketch.total_sum(),
            max_error_estimate: self.sketch.error_estimate(),
            discrepancies,
        }
    }

    /// Merges another sketch into the tracker's sketch.
    ///
    /// The top-K collection is left as is; call [`TopKTracker::refresh`] to pull the merged
    /// estimates into it.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DimensionMismatch`](crate::error::ErrorKind::DimensionMismatch) if
    /// the sketches are incompatible.
    pub fn merge_sketch(&mut self, other: &CountMinSketch) -> Result<(), Error> {
        self.sketch.merge(other)
    }

    /// Re-reads the live estimate of every tracked entry and restores the heap order.
    pub fn refresh(&mut self) {
        let sketch = &self.sketch;
        self.heap.refresh_all(|key| sketch.estimate(key));
    }

    /// Resets the sketch, the top-K collection and all event counts.
    pub fn clear(&mut self) {
        self.sketch.clear();
        self.heap.clear();
        self.event_counts.clear();
        self.sequence = 0;
    }
}

fn check_k(k: usize) -> Result<(), Error> {
    if k == 0 {
        return Err(Error::invalid_config("k must be at least 1"));
    }
    Ok(())
}
