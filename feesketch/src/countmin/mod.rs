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

//! Count-Min sketch for accumulating monetary totals per key.
//!
//! The Count-Min sketch keeps a fixed `depth x width` table of counters no matter how many
//! distinct keys it sees. Estimates never undercount; with probability `1 - e^-depth` an estimate
//! overshoots the true total by at most `total_sum * e / width`.
//!
//! # Usage
//!
//! ```rust
//! # use feesketch::amount::Amount;
//! # use feesketch::countmin::CountMinSketch;
//! let mut sketch = CountMinSketch::new(256, 5).unwrap();
//! sketch.add("1234567890", "100.00".parse().unwrap());
//! sketch.add("1234567890", Amount::from_cents(5000));
//! assert!(sketch.estimate("1234567890") >= Amount::from_cents(15000));
//! ```
//!
//! # Configuration Helpers
//!
//! ```rust
//! # use feesketch::countmin::CountMinSketch;
//! let width = CountMinSketch::suggest_width(0.01).unwrap();
//! let depth = CountMinSketch::suggest_depth(0.01).unwrap();
//! let _sketch = CountMinSketch::new(width, depth).unwrap();
//! ```

mod sketch;
pub use self::sketch::CountMinSketch;
pub use self::sketch::DEFAULT_DEPTH;
pub use self::sketch::DEFAULT_WIDTH;

pub use crate::hash::DEFAULT_UPDATE_SEED;
