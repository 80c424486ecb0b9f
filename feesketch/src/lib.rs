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

//! Approximate per-key running totals and top-K ranking in fixed memory.
//!
//! * [`countmin`]: a Count-Min sketch accumulating monetary [`amount::Amount`]s per key.
//! * [`topk`]: the `k` keys with the largest estimated totals, kept consistent with the sketch.
//!
//! The crate performs no I/O. Diagnostics are emitted through [`tracing`]; install a subscriber
//! to see them.

#![deny(missing_docs)]

pub mod amount;
pub mod countmin;
pub mod error;
pub mod topk;

mod hash;
