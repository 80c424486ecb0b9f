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

use crate::countmin::CountMinSketch;
use crate::countmin::DEFAULT_DEPTH;
use crate::countmin::DEFAULT_UPDATE_SEED;
use crate::countmin::DEFAULT_WIDTH;
use crate::error::Error;
use crate::topk::TopKTracker;

/// Default number of tracked keys.
pub const DEFAULT_K: usize = 10;

#[derive(Debug, Clone, Copy)]
enum Sizing {
    Dimensions { width: usize, depth: usize },
    Accuracy { epsilon: f64, delta: f64 },
}

/// Builder for creating [`TopKTracker`] instances.
///
/// Provides two ways to size the underlying sketch:
/// - [`with_accuracy()`](Self::with_accuracy): Specify a target relative error and failure
///   probability
/// - [`with_dimensions()`](Self::with_dimensions): Specify the table width and depth directly
///
/// Parameters are validated once, in [`build()`](Self::build).
#[derive(Debug, Clone)]
pub struct TopKTrackerBuilder {
    k: usize,
    sizing: Sizing,
    seed: u64,
}

impl Default for TopKTrackerBuilder {
    /// Top 10 over a sketch with 0.1% relative error at 99% confidence.
    fn default() -> Self {
        Self::with_dimensions(DEFAULT_WIDTH, DEFAULT_DEPTH)
    }
}

impl TopKTrackerBuilder {
    /// Creates a builder whose sketch is sized for the given accuracy.
    ///
    /// # Arguments
    ///
    /// - `epsilon`: Overestimation bound as a fraction of the total sum (e.g., 0.001)
    /// - `delta`: Probability that the bound does not hold for a key (e.g., 0.01)
    ///
    /// # Examples
    ///
    /// ```
    /// # use feesketch::topk::TopKTrackerBuilder;
    /// let tracker = TopKTrackerBuilder::with_accuracy(0.001, 0.01)
    ///     .k(5)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(tracker.k(), 5);
    /// assert_eq!(tracker.sketch().width(), 2719);
    /// ```
    pub fn with_accuracy(epsilon: f64, delta: f64) -> Self {
        TopKTrackerBuilder {
            k: DEFAULT_K,
            sizing: Sizing::Accuracy { epsilon, delta },
            seed: DEFAULT_UPDATE_SEED,
        }
    }

    /// Creates a builder with an explicit sketch width and depth.
    pub fn with_dimensions(width: usize, depth: usize) -> Self {
        TopKTrackerBuilder {
            k: DEFAULT_K,
            sizing: Sizing::Dimensions { width, depth },
            seed: DEFAULT_UPDATE_SEED,
        }
    }

    /// Sets the number of tracked keys (default: 10).
    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Sets the sketch hash seed (default: 9001).
    ///
    /// **Important**: Sketches with different seeds cannot be merged.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builds the tracker.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidConfig`](crate::error::ErrorKind::InvalidConfig) if `k`,
    /// the dimensions, or the accuracy targets are out of range.
    pub fn build(self) -> Result<TopKTracker, Error> {
        let (width, depth) = match self.sizing {
            Sizing::Dimensions { width, depth } => (width, depth),
            Sizing::Accuracy { epsilon, delta } => (
                CountMinSketch::suggest_width(epsilon)?,
                CountMinSketch::suggest_depth(delta)?,
            ),
        };
        let sketch = CountMinSketch::with_seed(width, depth, self.seed)?;
        TopKTracker::with_sketch(self.k, sketch)
    }
}
