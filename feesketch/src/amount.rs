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

//! Fixed-point monetary amounts.
//!
//! An [`Amount`] is a non-negative number of cents. Sketch counters and running totals are kept
//! in cents so accumulation is exact and reconciles to the cent with the totals it summarizes.

use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

use crate::error::Error;

const CENTS_PER_UNIT: u64 = 100;
const FRACTION_DIGITS: usize = 2;

/// A non-negative monetary amount with two fractional digits.
///
/// # Examples
///
/// ```
/// # use feesketch::amount::Amount;
/// let fee: Amount = "150.5".parse().unwrap();
/// assert_eq!(fee.cents(), 15050);
/// assert_eq!(fee.to_string(), "150.50");
/// assert!("-1.00".parse::<Amount>().is_err());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u64);

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount(0);

    /// The largest representable amount.
    pub const MAX: Amount = Amount(u64::MAX);

    /// Creates an amount from a number of cents.
    pub const fn from_cents(cents: u64) -> Self {
        Amount(cents)
    }

    /// Creates an amount from a signed number of cents.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidAmount`](crate::error::ErrorKind::InvalidAmount) if `cents`
    /// is negative.
    pub fn try_from_cents(cents: i64) -> Result<Self, Error> {
        u64::try_from(cents).map(Amount).map_err(|_| {
            Error::invalid_amount("amount must not be negative").with_context("cents", cents)
        })
    }

    /// Returns the amount in cents.
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Returns true if the amount is zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Converts into `f64` units (not cents).
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / CENTS_PER_UNIT as f64
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Adds two amounts, clamping at [`Amount::MAX`].
    ///
    /// Clamping keeps every sum an over-approximation, never an under-approximation.
    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    /// Subtracts `other`, clamping at zero.
    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Returns the absolute difference between two amounts.
    pub fn abs_diff(self, other: Amount) -> Amount {
        Amount(self.0.abs_diff(other.0))
    }

    /// Scales the amount by a non-negative factor, rounding up to the next cent.
    pub(crate) fn scale_ceil(self, factor: f64) -> Amount {
        let scaled = (self.0 as f64 * factor).ceil();
        if scaled >= u64::MAX as f64 {
            Amount::MAX
        } else {
            Amount(scaled as u64)
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / CENTS_PER_UNIT,
            self.0 % CENTS_PER_UNIT
        )
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn malformed(input: &str, msg: &str) -> Error {
            Error::invalid_amount(msg.to_string()).with_context("input", input)
        }

        let trimmed = s.trim();
        if trimmed.starts_with('-') {
            return Err(malformed(s, "amount must not be negative"));
        }
        let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let (units, fraction) = match unsigned.split_once('.') {
            Some((units, fraction)) => (units, fraction),
            None => (unsigned, ""),
        };
        if units.is_empty() && fraction.is_empty() {
            return Err(malformed(s, "amount has no digits"));
        }
        if !units.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed(s, "amount contains non-digit characters"));
        }
        if fraction.len() > FRACTION_DIGITS {
            return Err(malformed(s, "amount has more than two fractional digits"));
        }

        let overflow = || malformed(s, "amount is too large");
        let units: u64 = if units.is_empty() {
            0
        } else {
            units.parse().map_err(|_| overflow())?
        };
        let mut fraction_cents: u64 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().map_err(|_| overflow())?
        };
        if fraction.len() == 1 {
            fraction_cents *= 10;
        }
        units
            .checked_mul(CENTS_PER_UNIT)
            .and_then(|cents| cents.checked_add(fraction_cents))
            .map(Amount)
            .ok_or_else(overflow)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Amount::saturating_add)
    }
}

impl From<Amount> for u64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
