//! Timestamps and coarse-granularity comparison.
//!
//! Timestamps are stored as signed microseconds since the Unix epoch. The
//! remote service rounds revision dates below the millisecond, so two
//! observations of the same remote state may differ by a few hundred
//! microseconds. Comparisons that decide sync direction therefore go
//! through [`Timestamp::quantize`], which maps a timestamp onto a bucket
//! of [`Granularity`] width.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const MICROS_PER_MILLI: i64 = 1_000;

/// A point in time with microsecond precision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Self = Self(0);

    /// The earliest representable timestamp.
    pub const MIN: Self = Self(i64::MIN);

    /// Create a timestamp from microseconds since the epoch.
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Create a timestamp from milliseconds since the epoch.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(MICROS_PER_MILLI))
    }

    /// Microseconds since the epoch.
    pub const fn as_micros(&self) -> i64 {
        self.0
    }

    /// Milliseconds since the epoch, rounded towards negative infinity.
    pub const fn as_millis(&self) -> i64 {
        self.0.div_euclid(MICROS_PER_MILLI)
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let micros = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_micros()).unwrap_or(i64::MAX),
            Err(e) => -i64::try_from(e.duration().as_micros()).unwrap_or(i64::MAX),
        };
        Self(micros)
    }

    /// Map this timestamp onto its bucket index at the given granularity.
    ///
    /// The timestamp is first floored to whole milliseconds, then rounded
    /// to the nearest bucket. Ties round towards positive infinity, so
    /// `150ms` lands in bucket `2` at the default 100ms granularity.
    pub fn quantize(&self, granularity: Granularity) -> i64 {
        let millis = self.as_millis() as i128;
        let width = granularity.as_millis() as i128;
        (2 * millis + width).div_euclid(2 * width) as i64
    }

    /// Returns `self + duration`, saturating at the representable bounds.
    pub fn saturating_add(&self, duration: Duration) -> Self {
        let micros = i64::try_from(duration.as_micros()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(micros))
    }

    /// Returns `self - duration`, saturating at the representable bounds.
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        let micros = i64::try_from(duration.as_micros()).unwrap_or(i64::MAX);
        Self(self.0.saturating_sub(micros))
    }

    /// Time elapsed from `earlier` to `self`, or `None` if `earlier` is later.
    pub fn duration_since(&self, earlier: Timestamp) -> Option<Duration> {
        let delta = self.0.checked_sub(earlier.0)?;
        u64::try_from(delta).ok().map(Duration::from_micros)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}us)", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.as_millis();
        let sub = self.0.rem_euclid(MICROS_PER_MILLI);
        write!(f, "{}.{:03}ms", millis, sub)
    }
}

/// Bucket width used when comparing timestamps coarsely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Granularity(NonZeroU32);

impl Granularity {
    /// 100ms, wide enough to absorb the remote service's rounding.
    pub const DEFAULT: Self = match NonZeroU32::new(100) {
        Some(ms) => Self(ms),
        None => unreachable!(),
    };

    /// Create a granularity of `millis` milliseconds. Returns `None` for zero.
    pub fn from_millis(millis: u32) -> Option<Self> {
        NonZeroU32::new(millis).map(Self)
    }

    /// Bucket width in milliseconds.
    pub fn as_millis(&self) -> u32 {
        self.0.get()
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A record's effective date: its deletion date if later than the
/// revision date, otherwise the revision date.
pub fn effective_date(revision_date: Timestamp, deleted_date: Option<Timestamp>) -> Timestamp {
    match deleted_date {
        Some(deleted) => deleted.max(revision_date),
        None => revision_date,
    }
}
