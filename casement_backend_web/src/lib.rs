// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for casement.
//!
//! This crate hosts a [`TimingBelt`](casement_core::belt::TimingBelt) in the
//! browser:
//!
//! - [`PerformanceClock`]: a [`Clock`] reading `performance.now()`
//! - [`BeltDriver`]: runs cycles from `requestAnimationFrame` and idle passes
//!   from `setTimeout`
//! - [`DomSurface`]: a [`Surface`](casement_core::window::Surface) that lays
//!   out one positioned `<div>` per component slot

#![no_std]

extern crate alloc;

mod driver;
mod surface;

pub use driver::BeltDriver;
pub use surface::{DomError, DomSurface};

use casement_core::time::{Clock, HostTime};

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks.
#[must_use]
pub fn now() -> HostTime {
    HostTime::from_millis_f64(driver::performance_now())
}

/// A [`Clock`] backed by `performance.now()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerformanceClock;

impl Clock for PerformanceClock {
    #[inline]
    fn now(&self) -> HostTime {
        now()
    }
}
