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

use std::f64::consts::E;

use tracing::debug;

use crate::amount::Amount;
use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::hash::make_row_seeds;
use crate::hash::murmurhash3_x64_128;

const MAX_TABLE_ENTRIES: usize = 1 << 30;

/// Default number of counters per row: `ceil(e / 0.001)`, a 0.1% relative error.
pub const DEFAULT_WIDTH: usize = 2719;

/// Default number of rows: `ceil(ln(1 / 0.01))`, a 99% confidence.
pub const DEFAULT_DEPTH: usize = 5;

/// Count-Min sketch accumulating monetary totals per key.
///
/// The table holds `depth` rows of `width` counters. Every key maps to one counter per row, and
/// its estimate is the smallest of those counters. Counters only ever grow, so an estimate never
/// undercounts the true total for a key; collisions with other keys can only inflate it.
#[derive(Debug, Clone, PartialEq)]
pub struct CountMinSketch {
    width: usize,
    depth: usize,
    seed: u64,
    total_sum: Amount,
    counts: Vec<u64>,
    row_seeds: Vec<u64>,
}

impl Default for CountMinSketch {
    fn default() -> Self {
        Self::make(DEFAULT_WIDTH, DEFAULT_DEPTH, DEFAULT_UPDATE_SEED)
    }
}

impl CountMinSketch {
    /// Creates a new sketch with the default seed.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidConfig`](crate::error::ErrorKind::InvalidConfig) if `width`
    /// or `depth` is zero, or if the table would exceed the supported size.
    pub fn new(width: usize, depth: usize) -> Result<Self, Error> {
        Self::with_seed(width, depth, DEFAULT_UPDATE_SEED)
    }

    /// Creates a new sketch with the provided seed.
    ///
    /// # Errors
    ///
    /// Same as [`CountMinSketch::new`].
    pub fn with_seed(width: usize, depth: usize, seed: u64) -> Result<Self, Error> {
        check_dimensions(width, depth)?;
        let sketch = Self::make(width, depth, seed);
        debug!(
            width,
            depth,
            seed,
            epsilon = sketch.relative_error(),
            confidence = sketch.confidence(),
            "created count-min sketch"
        );
        Ok(sketch)
    }

    /// Creates a new sketch sized for the target relative error and failure probability.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidConfig`](crate::error::ErrorKind::InvalidConfig) if
    /// `epsilon` or `delta` is not in `(0, 1)`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use feesketch::countmin::CountMinSketch;
    /// let sketch = CountMinSketch::with_accuracy(0.001, 0.01).unwrap();
    /// assert_eq!(sketch.width(), 2719);
    /// assert_eq!(sketch.depth(), 5);
    /// ```
    pub fn with_accuracy(epsilon: f64, delta: f64) -> Result<Self, Error> {
        Self::new(Self::suggest_width(epsilon)?, Self::suggest_depth(delta)?)
    }

    /// Suggests the number of counters per row for the given relative error.
    ///
    /// # Errors
    ///
    /// Returns an error if `epsilon` is not in `(0, 1)`.
    pub fn suggest_width(epsilon: f64) -> Result<usize, Error> {
        check_fraction("epsilon", epsilon)?;
        Ok((E / epsilon).ceil() as usize)
    }

    /// Suggests the number of rows for the given failure probability.
    ///
    /// # Errors
    ///
    /// Returns an error if `delta` is not in `(0, 1)`.
    pub fn suggest_depth(delta: f64) -> Result<usize, Error> {
        check_fraction("delta", delta)?;
        Ok(((1.0 / delta).ln().ceil() as usize).max(1))
    }

    /// Returns the number of counters per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the number of rows.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the seed used by the sketch.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the exact sum of all amounts added to the sketch.
    pub fn total_sum(&self) -> Amount {
        self.total_sum
    }

    /// Returns true if nothing has been added since construction or the last clear.
    pub fn is_empty(&self) -> bool {
        self.total_sum.is_zero()
    }

    /// Returns the relative error (epsilon) implied by the width.
    pub fn relative_error(&self) -> f64 {
        E / self.width as f64
    }

    /// Returns the probability that [`CountMinSketch::error_estimate`] holds for a given key.
    pub fn confidence(&self) -> f64 {
        1.0 - (-(self.depth as f64)).exp()
    }

    /// Adds `amount` to the running total of `key`.
    pub fn add(&mut self, key: &str, amount: Amount) {
        if amount.is_zero() {
            return;
        }
        self.total_sum = self.total_sum.saturating_add(amount);
        for row in 0..self.depth {
            let index = self.cell_index(key, row);
            self.counts[index] = self.counts[index].saturating_add(amount.cents());
        }
    }

    /// Returns the estimated running total of `key`.
    ///
    /// The estimate is never lower than the true total.
    pub fn estimate(&self, key: &str) -> Amount {
        let min = (0..self.depth)
            .map(|row| self.counts[self.cell_index(key, row)])
            .min()
            .unwrap_or(0);
        Amount::from_cents(min)
    }

    /// Returns a lower bound on the true total of `key` that holds with
    /// [`CountMinSketch::confidence`].
    pub fn lower_bound(&self, key: &str) -> Amount {
        self.estimate(key).saturating_sub(self.error_estimate())
    }

    /// Returns the bound on how far any single estimate overshoots its true total.
    ///
    /// This is `total_sum * e / width`, rounded up to the cent, and holds with probability
    /// [`CountMinSketch::confidence`].
    pub fn error_estimate(&self) -> Amount {
        self.total_sum.scale_ceil(self.relative_error())
    }

    /// Merges another sketch into this one.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DimensionMismatch`](crate::error::ErrorKind::DimensionMismatch) if
    /// the sketches differ in width, depth or seed. Nothing is modified in that case.
    pub fn merge(&mut self, other: &CountMinSketch) -> Result<(), Error> {
        if self.width != other.width {
            return Err(Error::dimension_mismatch("width", self.width, other.width));
        }
        if self.depth != other.depth {
            return Err(Error::dimension_mismatch("depth", self.depth, other.depth));
        }
        if self.seed != other.seed {
            return Err(Error::dimension_mismatch("seed", self.seed, other.seed));
        }
        for (dst, src) in self.counts.iter_mut().zip(other.counts.iter()) {
            *dst = dst.saturating_add(*src);
        }
        self.total_sum = self.total_sum.saturating_add(other.total_sum);
        debug!(
            width = self.width,
            depth = self.depth,
            merged = %other.total_sum,
            total = %self.total_sum,
            "merged count-min sketch"
        );
        Ok(())
    }

    /// Resets all counters and the total to zero.
    pub fn clear(&mut self) {
        self.counts.fill(0);
        self.total_sum = Amount::ZERO;
        debug!(width = self.width, depth = self.depth, "cleared count-min sketch");
    }

    fn make(width: usize, depth: usize, seed: u64) -> Self {
        CountMinSketch {
            width,
            depth,
            seed,
            total_sum: Amount::ZERO,
            counts: vec![0u64; width * depth],
            row_seeds: make_row_seeds(seed, depth),
        }
    }

    fn cell_index(&self, key: &str, row: usize) -> usize {
        let (h1, _) = murmurhash3_x64_128(key.as_bytes(), self.row_seeds[row]);
        row * self.width + (h1 % self.width as u64) as usize
    }
}

fn check_dimensions(width: usize, depth: usize) -> Result<(), Error> {
    if width == 0 {
        return Err(Error::invalid_config("width must be at least 1"));
    }
    if depth == 0 {
        return Err(Error::invalid_config("depth must be at least 1"));
    }
    match width.checked_mul(depth) {
        Some(entries) if entries < MAX_TABLE_ENTRIES => Ok(()),
        _ => Err(Error::invalid_config(format!(
            "width * depth must be < {MAX_TABLE_ENTRIES}"
        ))
        .with_context("width", width)
        .with_context("depth", depth)),
    }
}

fn check_fraction(name: &'static str, value: f64) -> Result<(), Error> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(Error::invalid_config(format!("{name} must be in (0, 1)")).with_context(name, value))
    }
}
