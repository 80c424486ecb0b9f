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

use std::sync::Arc;

use parking_lot::RwLock;

use crate::amount::Amount;
use crate::countmin::CountMinSketch;
use crate::error::Error;
use crate::topk::AccuracyReport;
use crate::topk::RankedEntry;
use crate::topk::TopKTracker;
use crate::topk::TrackedEntry;

/// Cloneable handle to one [`TopKTracker`] shared between request handlers.
///
/// Construct it once at startup and hand clones to whoever records or queries events. Each
/// [`add_event`](Self::add_event) holds the write lock for the sketch update, the count update
/// and the admission decision together, so concurrent writers can never overfill the collection
/// or evict against a stale minimum. Queries take the read lock and never observe a half-applied
/// event.
///
/// # Examples
///
/// ```
/// # use feesketch::amount::Amount;
/// # use feesketch::topk::SharedTopKTracker;
/// # use feesketch::topk::TopKTrackerBuilder;
/// let tracker = SharedTopKTracker::new(TopKTrackerBuilder::default().k(3).build().unwrap());
/// let handle = tracker.clone();
/// handle.add_event("1234567890", Amount::from_cents(2500));
/// assert_eq!(tracker.top_k_ranked(10)[0].rank(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SharedTopKTracker {
    inner: Arc<RwLock<TopKTracker>>,
}

impl SharedTopKTracker {
    /// Wraps a tracker for shared use.
    pub fn new(tracker: TopKTracker) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tracker)),
        }
    }

    /// See [`TopKTracker::add_event`].
    pub fn add_event(&self, key: &str, amount: Amount) {
        self.inner.write().add_event(key, amount);
    }

    /// See [`TopKTracker::top_k`].
    pub fn top_k(&self) -> Vec<TrackedEntry> {
        self.inner.read().top_k()
    }

    /// See [`TopKTracker::top_k_ranked`].
    pub fn top_k_ranked(&self, limit: usize) -> Vec<RankedEntry> {
        self.inner.read().top_k_ranked(limit)
    }

    /// See [`TopKTracker::verify_accuracy`].
    pub fn verify_accuracy(&self) -> AccuracyReport {
        self.inner.read().verify_accuracy()
    }

    /// See [`TopKTracker::estimate`].
    pub fn estimate(&self, key: &str) -> Amount {
        self.inner.read().estimate(key)
    }

    /// See [`TopKTracker::event_count`].
    pub fn event_count(&self, key: &str) -> u64 {
        self.inner.read().event_count(key)
    }

    /// See [`TopKTracker::merge_sketch`].
    pub fn merge_sketch(&self, other: &CountMinSketch) -> Result<(), Error> {
        self.inner.write().merge_sketch(other)
    }

    /// See [`TopKTracker::refresh`].
    pub fn refresh(&self) {
        self.inner.write().refresh();
    }

    /// Clears the shared tracker for every handle.
    pub fn reset(&self) {
        self.inner.write().clear();
    }

    /// Returns a point-in-time copy of the tracker.
    pub fn snapshot(&self) -> TopKTracker {
        self.inner.read().clone()
    }
}

impl From<TopKTracker> for SharedTopKTracker {
    fn from(tracker: TopKTracker) -> Self {
        Self::new(tracker)
    }
}
