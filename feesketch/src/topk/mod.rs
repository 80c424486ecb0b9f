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

//! Top-K tracking of keys by estimated running total.
//!
//! # Overview
//!
//! [`TopKTracker`] pairs a [`CountMinSketch`](crate::countmin::CountMinSketch), which holds an
//! approximate total for every key ever seen in fixed memory, with an exact collection of the `k`
//! keys whose estimates are currently largest. Each event is first added to the sketch; the
//! key's fresh estimate is then offered to the collection:
//!
//! * A key already tracked has its cached total and event count replaced in place.
//! * A new key is admitted while fewer than `k` keys are tracked.
//! * Otherwise the new key replaces the lowest-ranked entry only if its estimate is strictly
//!   larger. Ties keep the incumbent.
//!
//! Event counts are exact for every key, tracked or not.
//!
//! # Ordering
//!
//! Entries are ranked by estimated total, highest first. Equal totals are ranked by which entry
//! reached its total first. The entry evicted on admission is always the one that would be
//! listed last.
//!
//! # Accuracy
//!
//! Because the collection only caches what the sketch reports, [`TopKTracker::verify_accuracy`]
//! is a consistency check: after events alone it finds nothing, while a
//! [`merge_sketch`](TopKTracker::merge_sketch) leaves tracked totals stale until
//! [`refresh`](TopKTracker::refresh) is called. The ranking itself is only as good as the
//! sketch: keys whose true totals differ by less than
//! [`error_estimate`](crate::countmin::CountMinSketch::error_estimate) may be ranked in either
//! order.
//!
//! # Examples
//!
//! ```
//! # use feesketch::topk::TopKTrackerBuilder;
//! let mut tracker = TopKTrackerBuilder::with_accuracy(0.001, 0.01).k(3).build().unwrap();
//! tracker.add_event("npi1", "100.00".parse().unwrap());
//! tracker.add_event("npi2", "200.00".parse().unwrap());
//! tracker.add_event("npi3", "150.00".parse().unwrap());
//! tracker.add_event("npi1", "50.00".parse().unwrap());
//!
//! let ranked = tracker.top_k_ranked(10);
//! assert_eq!(ranked[0].key(), "npi2");
//! assert_eq!(ranked[0].estimated_total().to_string(), "200.00");
//! assert_eq!(ranked[2].key(), "npi1");
//! assert_eq!(ranked[2].event_count(), 2);
//! assert!(tracker.verify_accuracy().is_consistent());
//! ```

mod builder;
mod heap;
mod shared;
mod tracker;

pub use self::builder::DEFAULT_K;
pub use self::builder::TopKTrackerBuilder;
pub use self::shared::SharedTopKTracker;
pub use self::tracker::AccuracyReport;
pub use self::tracker::DISCREPANCY_TOLERANCE;
pub use self::tracker::Discrepancy;
pub use self::tracker::RankedEntry;
pub use self::tracker::TopKTracker;
pub use self::tracker::TrackedEntry;
