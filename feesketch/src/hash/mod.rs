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

mod murmurhash;

pub(crate) use self::murmurhash::murmurhash3_x64_128;

/// The seed 9001 is the conventional default for sketch hashing.
///
/// Two sketches can only be merged when they share a seed: the seed decides which column every
/// key lands in, so sketches with different seeds lay out the same key differently.
pub const DEFAULT_UPDATE_SEED: u64 = 9001;

/// Derives one independent hash seed per sketch row from the sketch seed.
///
/// Each row seed acts as the salt for that row's hash function.
pub(crate) fn make_row_seeds(seed: u64, depth: usize) -> Vec<u64> {
    (0..depth as u64)
        .map(|row| murmurhash3_x64_128(&row.to_le_bytes(), seed).0)
        .collect()
}

/// Reads an u64 from a byte slice in little-endian order.
///
/// # Panics
///
/// Panics if `bytes.len()` is greater than 8.
fn read_u64_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_seeds_are_distinct_and_stable() {
        let seeds = make_row_seeds(DEFAULT_UPDATE_SEED, 8);
        assert_eq!(seeds.len(), 8);
        for (i, a) in seeds.iter().enumerate() {
            for b in &seeds[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(seeds, make_row_seeds(DEFAULT_UPDATE_SEED, 8));
        assert_ne!(seeds, make_row_seeds(DEFAULT_UPDATE_SEED + 1, 8));
    }

    #[test]
    fn test_read_u64_le_pads_short_input() {
        assert_eq!(read_u64_le(&[]), 0);
        assert_eq!(read_u64_le(&[0x01, 0x02]), 0x0201);
        assert_eq!(read_u64_le(&u64::MAX.to_le_bytes()), u64::MAX);
    }
}
