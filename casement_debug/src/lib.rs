// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, logging, and Chrome trace export for casement
//! diagnostics.
//!
//! This crate provides [`TraceSink`](casement_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`log::TracingSink`]: forwards events to the `tracing` ecosystem.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//!
//! [`FanOut`] sends each event to several sinks at once.

pub mod chrome;
pub mod log;
pub mod pretty;
pub mod recorder;

use casement_core::trace::{
    CycleBeginEvent, CycleSummary, IdleJobErrorEvent, IdleRunEvent, IdleSuppressedEvent,
    PhaseBeginEvent, PhaseEndEvent, TraceSink, WindowTickEvent, WindowTimeoutEvent,
};

/// A [`TraceSink`] that forwards every event to each inner sink in order.
pub struct FanOut<'a> {
    sinks: Vec<&'a mut dyn TraceSink>,
}

impl std::fmt::Debug for FanOut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOut")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl<'a> FanOut<'a> {
    /// Creates a fan-out over `sinks`.
    #[must_use]
    pub fn new(sinks: Vec<&'a mut dyn TraceSink>) -> Self {
        Self { sinks }
    }
}

macro_rules! fan_out {
    ($($method:ident($ty:ty)),* $(,)?) => {
        impl TraceSink for FanOut<'_> {
            $(
                fn $method(&mut self, e: &$ty) {
                    for sink in &mut self.sinks {
                        sink.$method(e);
                    }
                }
            )*
        }
    };
}

fan_out!(
    on_cycle_begin(CycleBeginEvent),
    on_window_tick(WindowTickEvent),
    on_phase_begin(PhaseBeginEvent),
    on_phase_end(PhaseEndEvent),
    on_window_timeout(WindowTimeoutEvent),
    on_idle_run(IdleRunEvent),
    on_idle_suppressed(IdleSuppressedEvent),
    on_idle_job_error(IdleJobErrorEvent),
    on_cycle_summary(CycleSummary),
);

#[cfg(test)]
mod tests {
    use casement_core::time::HostTime;

    use super::*;
    use crate::recorder::{RecorderSink, decode};

    #[test]
    fn fan_out_reaches_every_sink() {
        let mut a = RecorderSink::new();
        let mut b = RecorderSink::new();
        {
            let sinks: Vec<&mut dyn TraceSink> = vec![&mut a, &mut b];
            let mut fan = FanOut::new(sinks);
            fan.on_cycle_begin(&CycleBeginEvent {
                cycle_index: 1,
                start: HostTime(10),
                window_count: 0,
            });
        }
        assert_eq!(decode(a.as_bytes()).count(), 1);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }
}
