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

use feesketch::amount::Amount;
use feesketch::countmin::CountMinSketch;
use feesketch::error::ErrorKind;
use feesketch::topk::DEFAULT_K;
use feesketch::topk::TopKTracker;
use feesketch::topk::TopKTrackerBuilder;
use googletest::assert_that;
use googletest::prelude::ge;
use insta::assert_snapshot;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

fn amount(s: &str) -> Amount {
    s.parse().unwrap()
}

fn tracker(k: usize) -> TopKTracker {
    TopKTrackerBuilder::default().k(k).build().unwrap()
}

fn listing(tracker: &TopKTracker) -> Vec<(String, String)> {
    tracker
        .top_k()
        .iter()
        .map(|e| (e.key().to_string(), e.estimated_total().to_string()))
        .collect()
}

fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_tracker_initialization() {
    let tracker = TopKTrackerBuilder::default().build().unwrap();
    assert_eq!(tracker.k(), DEFAULT_K);
    assert_eq!(tracker.sketch().width(), 2719);
    assert_eq!(tracker.sketch().depth(), 5);
    assert!(tracker.is_empty());
    assert_eq!(tracker.len(), 0);
    assert_eq!(tracker.distinct_keys(), 0);
    assert!(tracker.top_k().is_empty());
}

#[test]
fn test_invalid_configuration() {
    let err = TopKTracker::new(0, 100, 5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    assert_eq!(err.message(), "k must be at least 1");

    let err = TopKTracker::new(3, 0, 5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);

    let err = TopKTrackerBuilder::default().k(0).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);

    let err = TopKTrackerBuilder::with_accuracy(0.0, 0.01).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);

    let err = TopKTrackerBuilder::with_dimensions(100, 0).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}

#[test]
fn test_eviction() {
    let mut tracker = tracker(2);
    tracker.add_event("npi1", amount("100.00"));
    tracker.add_event("npi2", amount("150.00"));
    tracker.add_event("npi3", amount("200.00"));

    assert_eq!(
        listing(&tracker),
        pairs(&[("npi3", "200.00"), ("npi2", "150.00")])
    );
    assert!(tracker.get("npi1").is_none());
    // The evicted key is still counted.
    assert_eq!(tracker.event_count("npi1"), 1);
    assert_eq!(tracker.distinct_keys(), 3);
}

#[test]
fn test_running_update_and_tie_order() {
    let mut tracker = tracker(3);
    tracker.add_event("npi1", amount("100.00"));
    tracker.add_event("npi2", amount("200.00"));
    tracker.add_event("npi3", amount("150.00"));
    tracker.add_event("npi1", amount("50.00"));
    tracker.add_event("npi4", amount("50.00"));

    let top = tracker.top_k();
    assert_eq!(top.len(), 3);
    assert_eq!(top[0].key(), "npi2");
    assert_eq!(top[0].estimated_total(), amount("200.00"));
    assert_eq!(top[1].key(), "npi3");
    assert_eq!(top[1].estimated_total(), amount("150.00"));
    assert_eq!(top[2].key(), "npi1");
    assert_that!(top[2].estimated_total(), ge(amount("150.00")));
    assert_eq!(top[2].event_count(), 2);
    assert!(tracker.get("npi4").is_none());
}

#[test]
fn test_zero_amount_event_keeps_tie_position() {
    let mut tracker = tracker(2);
    tracker.add_event("a", amount("100.00"));
    tracker.add_event("b", amount("100.00"));
    assert_eq!(
        listing(&tracker),
        pairs(&[("a", "100.00"), ("b", "100.00")])
    );

    tracker.add_event("a", Amount::ZERO);
    assert_eq!(
        listing(&tracker),
        pairs(&[("a", "100.00"), ("b", "100.00")])
    );
    assert_eq!(tracker.get("a").unwrap().event_count(), 2);

    // "b" reached 100.00 later, so it is the one evicted.
    tracker.add_event("c", amount("100.01"));
    assert_eq!(
        listing(&tracker),
        pairs(&[("c", "100.01"), ("a", "100.00")])
    );
    assert!(tracker.get("b").is_none());
}

#[test]
fn test_event_count_tracking() {
    let mut tracker = tracker(2);
    tracker.add_event("npi1", amount("100.00"));
    tracker.add_event("npi1", amount("50.00"));
    tracker.add_event("npi1", amount("25.00"));

    assert_eq!(tracker.event_count("npi1"), 3);
    assert_eq!(tracker.event_count("unknown"), 0);
    let top = tracker.top_k();
    assert_eq!(top[0].event_count(), 3);
    assert_eq!(top[0].estimated_total().to_string(), "175.00");
}

#[test]
fn test_fewer_keys_than_k() {
    let mut tracker = tracker(10);
    for key in ["a", "b", "c"] {
        tracker.add_event(key, amount("10.00"));
        tracker.add_event(key, amount("10.00"));
    }
    assert_eq!(tracker.top_k().len(), 3);
    assert_eq!(tracker.len(), 3);
}

#[test]
fn test_tie_at_eviction_threshold_keeps_incumbent() {
    let mut tracker = tracker(2);
    tracker.add_event("low", amount("100.00"));
    tracker.add_event("high", amount("200.00"));
    tracker.add_event("challenger", amount("100.00"));

    assert_eq!(
        listing(&tracker),
        pairs(&[("high", "200.00"), ("low", "100.00")])
    );

    // One more cent makes the challenger strictly larger.
    tracker.add_event("challenger", amount("0.01"));
    assert_eq!(
        listing(&tracker),
        pairs(&[("high", "200.00"), ("challenger", "100.01")])
    );
    assert_eq!(tracker.get("challenger").unwrap().event_count(), 2);
}

#[test]
fn test_admission_matches_true_ranking() {
    // True totals are 100.00, 200.00, ..., 4000.00, each split over four events in random order.
    let mut events = vec![];
    for i in 1..=40u64 {
        for _ in 0..4 {
            events.push((format!("provider_{i:02}"), Amount::from_cents(i * 2500)));
        }
    }
    events.shuffle(&mut StdRng::seed_from_u64(2024));

    let mut tracker = tracker(5);
    for (key, value) in &events {
        tracker.add_event(key, *value);
    }

    assert_eq!(
        listing(&tracker),
        pairs(&[
            ("provider_40", "4000.00"),
            ("provider_39", "3900.00"),
            ("provider_38", "3800.00"),
            ("provider_37", "3700.00"),
            ("provider_36", "3600.00"),
        ])
    );
    assert!(tracker.top_k().iter().all(|e| e.event_count() == 4));
    assert_eq!(tracker.distinct_keys(), 40);
    assert!(tracker.verify_accuracy().is_consistent());
}

#[test]
fn test_ranked_listing() {
    let mut tracker = tracker(4);
    for (key, total) in [("a", "40.00"), ("b", "30.00"), ("c", "20.00"), ("d", "10.00")] {
        tracker.add_event(key, amount(total));
    }

    let ranked = tracker.top_k_ranked(2);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].rank(), 1);
    assert_eq!(ranked[0].key(), "a");
    assert_eq!(ranked[1].rank(), 2);
    assert_eq!(ranked[1].key(), "b");
    assert_eq!(ranked[1].estimated_total().to_string(), "30.00");
    assert_eq!(ranked[1].event_count(), 1);

    assert_eq!(tracker.top_k_ranked(100).len(), 4);
    assert!(tracker.top_k_ranked(0).is_empty());
}

#[test]
fn test_verify_accuracy() {
    let mut tracker = tracker(3);
    tracker.add_event("npi1", amount("100.00"));
    tracker.add_event("npi2", amount("200.00"));

    let report = tracker.verify_accuracy();
    assert_eq!(report.tracked, 2);
    assert_eq!(report.distinct_keys, 2);
    assert_eq!(report.total_sum.to_string(), "300.00");
    assert!(report.is_consistent());
    assert_snapshot!(
        report,
        @"tracked: 2, distinct keys: 2, total: 300.00, max error: 0.30, discrepancies: 0"
    );
}

#[test]
fn test_merge_leaves_stale_entries_until_refresh() {
    let mut tracker = tracker(3);
    tracker.add_event("npi1", amount("100.00"));
    tracker.add_event("npi2", amount("200.00"));

    let mut remote = CountMinSketch::default();
    remote.add("npi1", amount("25.00"));
    tracker.merge_sketch(&remote).unwrap();

    let report = tracker.verify_accuracy();
    assert_eq!(report.discrepancies.len(), 1);
    let discrepancy = &report.discrepancies[0];
    assert_eq!(discrepancy.key, "npi1");
    assert_eq!(discrepancy.tracked_total, amount("100.00"));
    assert_eq!(discrepancy.sketch_estimate, amount("125.00"));
    assert_eq!(discrepancy.difference, amount("25.00"));
    assert_eq!(
        report.to_string(),
        "tracked: 2, distinct keys: 2, total: 325.00, max error: 0.33, discrepancies: 1\n  \
         npi1: tracked 100.00, sketch 125.00, difference 25.00"
    );

    tracker.refresh();
    assert!(tracker.verify_accuracy().is_consistent());
    assert_eq!(
        listing(&tracker),
        pairs(&[("npi2", "200.00"), ("npi1", "125.00")])
    );
}

#[test]
fn test_merge_rejects_mismatched_sketch() {
    let mut tracker = tracker(3);
    tracker.add_event("npi1", amount("100.00"));
    let err = tracker
        .merge_sketch(&CountMinSketch::new(100, 5).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    assert_eq!(tracker.sketch().total_sum(), amount("100.00"));
}

#[test]
fn test_clear() {
    let mut tracker = tracker(2);
    tracker.add_event("npi1", amount("100.00"));
    tracker.add_event("npi2", amount("200.00"));
    tracker.clear();

    assert!(tracker.is_empty());
    assert_eq!(tracker.distinct_keys(), 0);
    assert_eq!(tracker.event_count("npi1"), 0);
    assert_eq!(tracker.estimate("npi2"), Amount::ZERO);
    assert_eq!(tracker.sketch().total_sum(), Amount::ZERO);

    tracker.add_event("npi3", amount("1.00"));
    assert_eq!(listing(&tracker), pairs(&[("npi3", "1.00")]));
}

#[test]
fn test_with_sketch_does_not_track_existing_mass() {
    let mut sketch = CountMinSketch::default();
    sketch.add("npi1", amount("500.00"));
    let mut tracker = TopKTracker::with_sketch(1, sketch).unwrap();
    assert!(tracker.is_empty());

    tracker.add_event("npi1", amount("1.00"));
    assert_eq!(listing(&tracker), pairs(&[("npi1", "501.00")]));
    assert_eq!(tracker.event_count("npi1"), 1);
}
