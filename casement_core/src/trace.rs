// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the belt.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! belt calls at each stage of a cycle and of an idle pass. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`CycleSummaryBuilder`] collects phase timings during a cycle and produces
//! the [`CycleSummary`] that [`TimingBelt::cycle`](crate::belt::TimingBelt::cycle)
//! returns.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use core::time::Duration;

use crate::id::{JobId, WindowId};
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of the belt is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Windows consume input and advance animations.
    Tick,
    /// Windows spend their time budget on incremental work.
    Paint,
    /// Windows draw their components.
    Render,
    /// Idle jobs run.
    Idle,
}

/// The order in which each window is painted and rendered during a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CycleOrder {
    /// Input changed the scene: show it first, then paint.
    RenderThenPaint,
    /// Nothing changed: paint first, then render.
    PaintThenRender,
}

impl CycleOrder {
    /// Returns the two per-window phases in execution order.
    #[must_use]
    pub const fn phases(self) -> [PhaseKind; 2] {
        match self {
            Self::RenderThenPaint => [PhaseKind::Render, PhaseKind::Paint],
            Self::PaintThenRender => [PhaseKind::Paint, PhaseKind::Render],
        }
    }
}

/// Why an idle pass did not run any job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdleSuppression {
    /// The budget was zero or already spent.
    NoTimeRemaining,
    /// The governor saw a previous idle pass within the budget window.
    TooRecent,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a cycle starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleBeginEvent {
    /// Monotonic cycle counter.
    pub cycle_index: u64,
    /// Host time at the start of the cycle.
    pub start: HostTime,
    /// Number of windows registered at the start of the cycle.
    pub window_count: u32,
}

/// Emitted after each window is ticked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowTickEvent {
    /// Cycle counter.
    pub cycle_index: u64,
    /// The ticked window.
    pub window: WindowId,
    /// Host time after the tick returned.
    pub timestamp: HostTime,
    /// Whether the tick changed the scene.
    pub changed_scene: bool,
}

/// Marks the beginning of a paint or render call on one window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseBeginEvent {
    /// Cycle counter.
    pub cycle_index: u64,
    /// The window being processed.
    pub window: WindowId,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
    /// The paint budget handed to the window (zero for render).
    pub budget: Duration,
}

/// Marks the end of a paint or render call on one window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseEndEvent {
    /// Cycle counter.
    pub cycle_index: u64,
    /// The window that was processed.
    pub window: WindowId,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
    /// Whether the window asked for another cycle.
    pub needs_update: bool,
}

/// Emitted when a cycle runs out of time before processing every window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowTimeoutEvent {
    /// Cycle counter.
    pub cycle_index: u64,
    /// The window that would have been processed next.
    pub window: WindowId,
    /// When the overrun was detected.
    pub timestamp: HostTime,
    /// Time spent in the cycle so far.
    pub elapsed: Duration,
    /// Windows left without a complete paint and render this cycle.
    pub skipped: u32,
}

/// Emitted after an idle pass ran at least one job step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdleRunEvent {
    /// Host time at the start of the pass.
    pub start: HostTime,
    /// Host time at the end of the pass.
    pub end: HostTime,
    /// The budget the pass was given.
    pub budget: Duration,
    /// Number of job steps run.
    pub steps: u32,
    /// Jobs still queued afterwards.
    pub remaining_jobs: u32,
}

/// Emitted when an idle pass declined to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdleSuppressedEvent {
    /// Host time of the decision.
    pub timestamp: HostTime,
    /// Why nothing ran.
    pub reason: IdleSuppression,
    /// Jobs waiting in the queue.
    pub queued_jobs: u32,
}

/// Emitted when an idle job fails and is dropped from the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdleJobErrorEvent {
    /// Host time of the failure.
    pub timestamp: HostTime,
    /// The failed job.
    pub job: JobId,
}

/// Per-cycle summary produced by [`CycleSummaryBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleSummary {
    /// Cycle counter.
    pub cycle_index: u64,
    /// Host time at the start of the cycle.
    pub start: HostTime,
    /// Host time at the end of the cycle.
    pub end: HostTime,
    /// Paint/render order chosen for this cycle.
    pub order: CycleOrder,
    /// Windows registered at the start of the cycle.
    pub window_count: u32,
    /// Windows that completed both paint and render.
    pub windows_processed: u32,
    /// Windows cut off by the interval.
    pub windows_skipped: u32,
    /// Time spent ticking.
    pub tick: Duration,
    /// Time spent painting, summed over windows.
    pub paint: Duration,
    /// Time spent rendering, summed over windows.
    pub render: Duration,
    /// Whether any window's tick changed the scene.
    pub input_changed_scene: bool,
    /// Whether any window asked for another cycle or the interval ran out.
    pub needs_update: bool,
    /// Whether the cycle requested another cycle.
    pub rescheduled: bool,
    /// Whether the host should schedule [`on_idle_timer`](crate::belt::TimingBelt::on_idle_timer).
    pub idle_armed: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the belt.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a cycle starts.
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        _ = e;
    }

    /// Called after each window tick.
    fn on_window_tick(&mut self, e: &WindowTickEvent) {
        _ = e;
    }

    /// Called before a window is painted or rendered.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called after a window is painted or rendered.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when the interval runs out mid-cycle.
    fn on_window_timeout(&mut self, e: &WindowTimeoutEvent) {
        _ = e;
    }

    /// Called after an idle pass ran jobs.
    fn on_idle_run(&mut self, e: &IdleRunEvent) {
        _ = e;
    }

    /// Called when an idle pass was suppressed.
    fn on_idle_suppressed(&mut self, e: &IdleSuppressedEvent) {
        _ = e;
    }

    /// Called when an idle job fails.
    fn on_idle_job_error(&mut self, e: &IdleJobErrorEvent) {
        _ = e;
    }

    /// Called with the summary at the end of each cycle.
    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

/// Dispatches one event to the sink when tracing is compiled in.
macro_rules! dispatch {
    ($self:ident, $method:ident, $e:ident) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    }};
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`CycleBeginEvent`].
    #[inline]
    pub fn cycle_begin(&mut self, e: &CycleBeginEvent) {
        dispatch!(self, on_cycle_begin, e);
    }

    /// Emits a [`WindowTickEvent`].
    #[inline]
    pub fn window_tick(&mut self, e: &WindowTickEvent) {
        dispatch!(self, on_window_tick, e);
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        dispatch!(self, on_phase_begin, e);
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        dispatch!(self, on_phase_end, e);
    }

    /// Emits a [`WindowTimeoutEvent`].
    #[inline]
    pub fn window_timeout(&mut self, e: &WindowTimeoutEvent) {
        dispatch!(self, on_window_timeout, e);
    }

    /// Emits an [`IdleRunEvent`].
    #[inline]
    pub fn idle_run(&mut self, e: &IdleRunEvent) {
        dispatch!(self, on_idle_run, e);
    }

    /// Emits an [`IdleSuppressedEvent`].
    #[inline]
    pub fn idle_suppressed(&mut self, e: &IdleSuppressedEvent) {
        dispatch!(self, on_idle_suppressed, e);
    }

    /// Emits an [`IdleJobErrorEvent`].
    #[inline]
    pub fn idle_job_error(&mut self, e: &IdleJobErrorEvent) {
        dispatch!(self, on_idle_job_error, e);
    }

    /// Emits a [`CycleSummary`].
    #[inline]
    pub fn cycle_summary(&mut self, s: &CycleSummary) {
        dispatch!(self, on_cycle_summary, s);
    }
}

// ---------------------------------------------------------------------------
// CycleSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timings during a cycle and produces a [`CycleSummary`].
#[derive(Debug)]
pub struct CycleSummaryBuilder {
    cycle_index: u64,
    start: HostTime,
    window_count: u32,
    order: CycleOrder,
    phase_totals: [Duration; 4],
    windows_processed: u32,
    windows_skipped: u32,
    input_changed_scene: bool,
    needs_update: bool,
    rescheduled: bool,
    idle_armed: bool,
}

impl CycleSummaryBuilder {
    /// Starts building a summary for the given cycle.
    #[must_use]
    pub fn new(begin: &CycleBeginEvent) -> Self {
        Self {
            cycle_index: begin.cycle_index,
            start: begin.start,
            window_count: begin.window_count,
            order: CycleOrder::PaintThenRender,
            phase_totals: [Duration::ZERO; 4],
            windows_processed: 0,
            windows_skipped: 0,
            input_changed_scene: false,
            needs_update: false,
            rescheduled: false,
            idle_armed: false,
        }
    }

    /// Adds the time between `begin` and `end` to a phase total.
    pub fn add_phase(&mut self, phase: PhaseKind, begin: HostTime, end: HostTime) {
        self.phase_totals[phase_index(phase)] += end.saturating_duration_since(begin);
    }

    /// Records the order chosen after the tick phase.
    pub fn set_order(&mut self, order: CycleOrder, input_changed_scene: bool) {
        self.order = order;
        self.input_changed_scene = input_changed_scene;
    }

    /// Counts a window that completed paint and render.
    pub fn window_processed(&mut self) {
        self.windows_processed += 1;
    }

    /// Records windows cut off by the interval.
    pub fn set_skipped(&mut self, skipped: u32) {
        self.windows_skipped = skipped;
    }

    /// Records the cycle's outcome.
    pub fn set_outcome(&mut self, needs_update: bool, rescheduled: bool, idle_armed: bool) {
        self.needs_update = needs_update;
        self.rescheduled = rescheduled;
        self.idle_armed = idle_armed;
    }

    /// Consumes the builder and produces the final [`CycleSummary`].
    #[must_use]
    pub fn finish(self, end: HostTime) -> CycleSummary {
        CycleSummary {
            cycle_index: self.cycle_index,
            start: self.start,
            end,
            order: self.order,
            window_count: self.window_count,
            windows_processed: self.windows_processed,
            windows_skipped: self.windows_skipped,
            tick: self.phase_totals[phase_index(PhaseKind::Tick)],
            paint: self.phase_totals[phase_index(PhaseKind::Paint)],
            render: self.phase_totals[phase_index(PhaseKind::Render)],
            input_changed_scene: self.input_changed_scene,
            needs_update: self.needs_update,
            rescheduled: self.rescheduled,
            idle_armed: self.idle_armed,
        }
    }
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Tick => 0,
        PhaseKind::Paint => 1,
        PhaseKind::Render => 2,
        PhaseKind::Idle => 3,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
