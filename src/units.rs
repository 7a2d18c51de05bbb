//! Unit-aware value objects.
//!
//! Each wrapper stores exactly one canonical value and derives every other
//! unit from it. Nothing here does I/O or changes after construction.

use serde::{Deserialize, Serialize};

const DECIMAL: f64 = 1000.0;
const BINARY: f64 = 1024.0;

/// A size in bytes.
///
/// Decimal accessors divide by powers of 1000, binary accessors by powers of 1024.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ByteSize(u64);

impl ByteSize {
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Size from a count of 1 KiB blocks (`/proc/meminfo`, `/proc/partitions`).
    pub const fn from_kib(kib: u64) -> Self {
        Self(kib.saturating_mul(1024))
    }

    /// Size from a count of 512-byte sectors (sysfs `size` and `start`).
    pub const fn from_sectors(sectors: u64) -> Self {
        Self(sectors.saturating_mul(512))
    }

    pub const fn b(&self) -> u64 {
        self.0
    }

    pub fn kb(&self) -> f64 {
        self.0 as f64 / DECIMAL
    }

    pub fn mb(&self) -> f64 {
        self.0 as f64 / DECIMAL.powi(2)
    }

    pub fn gb(&self) -> f64 {
        self.0 as f64 / DECIMAL.powi(3)
    }

    pub fn tb(&self) -> f64 {
        self.0 as f64 / DECIMAL.powi(4)
    }

    pub fn kib(&self) -> f64 {
        self.0 as f64 / BINARY
    }

    pub fn mib(&self) -> f64 {
        self.0 as f64 / BINARY.powi(2)
    }

    pub fn gib(&self) -> f64 {
        self.0 as f64 / BINARY.powi(3)
    }

    pub fn tib(&self) -> f64 {
        self.0 as f64 / BINARY.powi(4)
    }
}

impl From<u64> for ByteSize {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

/// A clock frequency, stored in kHz (the unit cpufreq reports in).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frequency(u64);

impl Frequency {
    pub const fn from_khz(khz: u64) -> Self {
        Self(khz)
    }

    /// Converts an MHz reading (as printed in `/proc/cpuinfo`) to whole kHz.
    ///
    /// Negative and non-finite inputs collapse to zero.
    pub fn from_mhz(mhz: f64) -> Self {
        if mhz.is_finite() && mhz > 0.0 {
            Self((mhz * DECIMAL).round() as u64)
        } else {
            Self(0)
        }
    }

    pub const fn khz(&self) -> u64 {
        self.0
    }

    pub fn mhz(&self) -> f64 {
        self.0 as f64 / DECIMAL
    }

    pub fn ghz(&self) -> f64 {
        self.0 as f64 / DECIMAL.powi(2)
    }

    /// Arithmetic mean of a set of frequencies, `None` when the set is empty.
    pub fn mean<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = Frequency>,
    {
        let (sum, count) = values
            .into_iter()
            .fold((0u128, 0u128), |(sum, count), f| (sum + f.0 as u128, count + 1));
        if count == 0 {
            return None;
        }
        Some(Self(((sum + count / 2) / count) as u64))
    }
}
