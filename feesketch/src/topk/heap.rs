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

//! Indexed min-heap of tracked entries.
//!
//! The heap keeps its entries in a binary-heap ordered vector and a key -> position index beside
//! it. Both are updated by the same swaps, so membership checks are O(1) and an entry whose total
//! changed can be sifted into place in O(log k).

use std::collections::HashMap;

use crate::amount::Amount;
use crate::topk::TrackedEntry;

/// Min-heap keyed by entry key, with the lowest-ranked entry at the root.
#[derive(Debug, Clone, Default)]
pub(super) struct IndexedMinHeap {
    entries: Vec<TrackedEntry>,
    positions: HashMap<String, usize>,
}

impl IndexedMinHeap {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&TrackedEntry> {
        self.positions.get(key).map(|&pos| &self.entries[pos])
    }

    /// Returns the lowest-ranked entry.
    pub fn peek_min(&self) -> Option<&TrackedEntry> {
        self.entries.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedEntry> {
        self.entries.iter()
    }

    /// Inserts an entry whose key is not yet in the heap.
    pub fn push(&mut self, entry: TrackedEntry) {
        debug_assert!(!self.contains(&entry.key), "duplicate heap key");
        let pos = self.entries.len();
        self.positions.insert(entry.key.clone(), pos);
        self.entries.push(entry);
        self.sift_up(pos);
    }

    /// Removes and returns the lowest-ranked entry.
    pub fn pop_min(&mut self) -> Option<TrackedEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.swap(0, last);
        let entry = self.entries.pop()?;
        self.positions.remove(&entry.key);
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        Some(entry)
    }

    /// Overwrites the cached total and count of a tracked key and restores heap order.
    ///
    /// `sequence` is only recorded when the total changes, so an entry keeps the position it
    /// earned among equal totals. Returns false if the key is not tracked.
    pub fn update(
        &mut self,
        key: &str,
        estimated_total: Amount,
        event_count: u64,
        sequence: u64,
    ) -> bool {
        let Some(&pos) = self.positions.get(key) else {
            return false;
        };
        let entry = &mut self.entries[pos];
        entry.event_count = event_count;
        if entry.estimated_total == estimated_total {
            return true;
        }
        entry.estimated_total = estimated_total;
        entry.sequence = sequence;
        self.sift_up(pos);
        // sift_up is a no-op if the entry did not move up, then it may need to move down.
        if let Some(&pos) = self.positions.get(key) {
            self.sift_down(pos);
        }
        true
    }

    /// Recomputes every cached total with `estimate` and rebuilds the heap.
    pub fn refresh_all(&mut self, mut estimate: impl FnMut(&str) -> Amount) {
        for entry in self.entries.iter_mut() {
            entry.estimated_total = estimate(&entry.key);
        }
        for pos in (0..self.entries.len() / 2).rev() {
            self.sift_down(pos);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.entries[pos].ranks_below(&self.entries[parent]) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;
            if left < len && self.entries[left].ranks_below(&self.entries[smallest]) {
                smallest = left;
            }
            if right < len && self.entries[right].ranks_below(&self.entries[smallest]) {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.entries.swap(a, b);
        if let Some(p) = self.positions.get_mut(self.entries[a].key.as_str()) {
            *p = a;
        }
        if let Some(p) = self.positions.get_mut(self.entries[b].key.as_str()) {
            *p = b;
        }
    }
}
