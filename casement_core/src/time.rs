// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time and the clock seam.
//!
//! [`HostTime`] is a point on the host's monotonic clock expressed in
//! microsecond ticks, the resolution browsers report through
//! `performance.now()`. Spans between two host times are plain
//! [`core::time::Duration`] values, so budgets and intervals compose with the
//! rest of the ecosystem.
//!
//! [`Clock`] is how the belt and windows read time. Backends provide a real
//! clock (`performance.now()`, [`StdClock`] with the `std` feature); tests,
//! demos, and replays drive a [`ManualClock`].

use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;
use core::ops::Add;
use core::time::Duration;

/// A point in time expressed as monotonic microsecond ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// The clock origin.
    pub const ZERO: Self = Self(0);

    /// Returns the raw microsecond tick value.
    #[inline]
    #[must_use]
    pub const fn micros(self) -> u64 {
        self.0
    }

    /// Creates a host time from a millisecond timestamp such as a
    /// `DOMHighResTimeStamp`.
    ///
    /// Negative and NaN inputs map to [`HostTime::ZERO`].
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "millisecond timestamps are small positive f64; µs fits in u64"
    )]
    pub fn from_millis_f64(ms: f64) -> Self {
        if ms.is_nan() || ms <= 0.0 {
            return Self::ZERO;
        }
        Self((ms * 1000.0) as u64)
    }

    /// Returns the time elapsed since `earlier`, or zero if `earlier` is
    /// after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }

    /// Checked addition of a duration, truncated to whole microseconds.
    #[inline]
    #[must_use]
    pub fn checked_add(self, duration: Duration) -> Option<Self> {
        let micros = u64::try_from(duration.as_micros()).ok()?;
        self.0.checked_add(micros).map(Self)
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    /// Saturates at `u64::MAX` microseconds.
    #[inline]
    fn add(self, rhs: Duration) -> Self {
        self.checked_add(rhs).unwrap_or(Self(u64::MAX))
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({}µs)", self.0)
    }
}

/// A monotonic time source.
pub trait Clock {
    /// Returns the current host time.
    fn now(&self) -> HostTime;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> HostTime {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    #[inline]
    fn now(&self) -> HostTime {
        (**self).now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can hand one clone to a
/// belt and keep another to simulate work that consumes time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: HostTime) -> Self {
        Self {
            now: Rc::new(Cell::new(start.0)),
        }
    }

    /// Sets the current time.
    pub fn set(&self, t: HostTime) {
        self.now.set(t.0);
    }

    /// Moves the clock forward by `d`.
    pub fn advance(&self, d: Duration) {
        self.set(HostTime(self.now.get()) + d);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> HostTime {
        HostTime(self.now.get())
    }
}

/// A clock backed by [`std::time::Instant`], measured from construction.
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Creates a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now(&self) -> HostTime {
        let micros = self.origin.elapsed().as_micros();
        HostTime(u64::try_from(micros).unwrap_or(u64::MAX))
    }
}
