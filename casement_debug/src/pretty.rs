// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;
use std::time::Duration;

use casement_core::time::HostTime;
use casement_core::trace::{
    CycleBeginEvent, CycleSummary, IdleJobErrorEvent, IdleRunEvent, IdleSuppressedEvent,
    PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink, WindowTickEvent, WindowTimeoutEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.micros() as f64 / 1000.0
}

fn dur_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Tick => "tick",
        PhaseKind::Paint => "paint",
        PhaseKind::Render => "render",
        PhaseKind::Idle => "idle",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[cycle] #{} at {:.3}ms windows={}",
            e.cycle_index,
            ms(e.start),
            e.window_count,
        );
    }

    fn on_window_tick(&mut self, e: &WindowTickEvent) {
        let changed = if e.changed_scene { " CHANGED" } else { "" };
        let _ = writeln!(
            self.writer,
            "[tick] #{} window={} at {:.3}ms{changed}",
            e.cycle_index,
            e.window.0,
            ms(e.timestamp),
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[{}:begin] #{} window={} at {:.3}ms budget={:.3}ms",
            phase_name(e.phase),
            e.cycle_index,
            e.window.0,
            ms(e.timestamp),
            dur_ms(e.budget),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let more = if e.needs_update { " more" } else { "" };
        let _ = writeln!(
            self.writer,
            "[{}:end] #{} window={} at {:.3}ms{more}",
            phase_name(e.phase),
            e.cycle_index,
            e.window.0,
            ms(e.timestamp),
        );
    }

    fn on_window_timeout(&mut self, e: &WindowTimeoutEvent) {
        let _ = writeln!(
            self.writer,
            "[timeout] #{} window={} at {:.3}ms after {:.3}ms skipped={}",
            e.cycle_index,
            e.window.0,
            ms(e.timestamp),
            dur_ms(e.elapsed),
            e.skipped,
        );
    }

    fn on_idle_run(&mut self, e: &IdleRunEvent) {
        let _ = writeln!(
            self.writer,
            "[idle] {:.3}ms..{:.3}ms budget={:.3}ms steps={} left={}",
            ms(e.start),
            ms(e.end),
            dur_ms(e.budget),
            e.steps,
            e.remaining_jobs,
        );
    }

    fn on_idle_suppressed(&mut self, e: &IdleSuppressedEvent) {
        let _ = writeln!(
            self.writer,
            "[idle:skip] at {:.3}ms reason={:?} queued={}",
            ms(e.timestamp),
            e.reason,
            e.queued_jobs,
        );
    }

    fn on_idle_job_error(&mut self, e: &IdleJobErrorEvent) {
        let _ = writeln!(
            self.writer,
            "[idle:error] job={} at {:.3}ms",
            e.job.0,
            ms(e.timestamp),
        );
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        let status = match (s.windows_skipped, s.rescheduled) {
            (0, false) => "settled",
            (0, true) => "rescheduled",
            _ => "TIMEOUT",
        };
        let _ = writeln!(
            self.writer,
            "[summary] #{} {:?} tick={:.3}ms paint={:.3}ms render={:.3}ms \
             windows={}/{} idle_armed={} {status}",
            s.cycle_index,
            s.order,
            dur_ms(s.tick),
            dur_ms(s.paint),
            dur_ms(s.render),
            s.windows_processed,
            s.window_count,
            s.idle_armed,
        );
    }
}
