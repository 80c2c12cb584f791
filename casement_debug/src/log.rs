// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structured logging through `tracing`.
//!
//! [`TracingSink`] forwards belt events to whatever `tracing` subscriber the
//! host installed, under the `casement::belt` target. Per-window events log
//! at `TRACE`, cycle summaries and idle passes at `DEBUG`, timeouts at `WARN`,
//! and failed idle jobs at `ERROR`.

use casement_core::trace::{
    CycleBeginEvent, CycleSummary, IdleJobErrorEvent, IdleRunEvent, IdleSuppressedEvent,
    PhaseBeginEvent, PhaseEndEvent, TraceSink, WindowTickEvent, WindowTimeoutEvent,
};
use tracing::{debug, error, trace, warn};

const TARGET: &str = "casement::belt";

/// A [`TraceSink`] that emits `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Creates a sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TraceSink for TracingSink {
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        trace!(
            target: TARGET,
            cycle = e.cycle_index,
            start_us = e.start.micros(),
            windows = e.window_count,
            "cycle begin"
        );
    }

    fn on_window_tick(&mut self, e: &WindowTickEvent) {
        trace!(
            target: TARGET,
            cycle = e.cycle_index,
            window = e.window.0,
            changed_scene = e.changed_scene,
            "window ticked"
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        trace!(
            target: TARGET,
            cycle = e.cycle_index,
            window = e.window.0,
            phase = ?e.phase,
            budget = ?e.budget,
            "phase begin"
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        trace!(
            target: TARGET,
            cycle = e.cycle_index,
            window = e.window.0,
            phase = ?e.phase,
            needs_update = e.needs_update,
            "phase end"
        );
    }

    fn on_window_timeout(&mut self, e: &WindowTimeoutEvent) {
        warn!(
            target: TARGET,
            cycle = e.cycle_index,
            window = e.window.0,
            at = ?e.timestamp,
            elapsed = ?e.elapsed,
            skipped = e.skipped,
            "cycle ran past its interval"
        );
    }

    fn on_idle_run(&mut self, e: &IdleRunEvent) {
        debug!(
            target: TARGET,
            steps = e.steps,
            remaining_jobs = e.remaining_jobs,
            took = ?e.end.saturating_duration_since(e.start),
            budget = ?e.budget,
            "idle pass"
        );
    }

    fn on_idle_suppressed(&mut self, e: &IdleSuppressedEvent) {
        trace!(
            target: TARGET,
            reason = ?e.reason,
            queued_jobs = e.queued_jobs,
            "idle pass suppressed"
        );
    }

    fn on_idle_job_error(&mut self, e: &IdleJobErrorEvent) {
        error!(target: TARGET, job = e.job.0, "idle job failed");
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        debug!(
            target: TARGET,
            cycle = s.cycle_index,
            order = ?s.order,
            tick = ?s.tick,
            paint = ?s.paint,
            render = ?s.render,
            processed = s.windows_processed,
            skipped = s.windows_skipped,
            rescheduled = s.rescheduled,
            idle_armed = s.idle_armed,
            "cycle done"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use casement_core::id::{JobId, WindowId};
    use casement_core::time::HostTime;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(level: tracing::Level, f: impl FnOnce(&mut TracingSink)) -> String {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .without_time()
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || f(&mut TracingSink::new()));
        let bytes = out.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn timeouts_log_as_warnings() {
        let out = capture(tracing::Level::WARN, |sink| {
            sink.on_window_timeout(&WindowTimeoutEvent {
                cycle_index: 4,
                window: WindowId(1),
                timestamp: HostTime(4_000),
                elapsed: Duration::from_millis(18),
                skipped: 2,
            });
            sink.on_cycle_begin(&CycleBeginEvent {
                cycle_index: 5,
                start: HostTime(0),
                window_count: 2,
            });
        });
        assert!(out.contains("WARN"), "got: {out}");
        assert!(out.contains("cycle ran past its interval"), "got: {out}");
        assert!(out.contains("skipped=2"), "got: {out}");
        assert!(!out.contains("cycle begin"), "trace events are filtered: {out}");
    }

    #[test]
    fn job_errors_log_as_errors() {
        let out = capture(tracing::Level::ERROR, |sink| {
            sink.on_idle_job_error(&IdleJobErrorEvent {
                timestamp: HostTime(10),
                job: JobId(6),
            });
        });
        assert!(out.contains("ERROR"), "got: {out}");
        assert!(out.contains("job=6"), "got: {out}");
        assert!(out.contains(TARGET), "got: {out}");
    }
}
