// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records: a one-byte tag followed by
//! the event fields. Durations are stored as whole microseconds. [`decode`]
//! reads them back as an iterator of [`RecordedEvent`].

use core::time::Duration;

use casement_core::id::{JobId, WindowId};
use casement_core::time::HostTime;
use casement_core::trace::{
    CycleBeginEvent, CycleOrder, CycleSummary, IdleJobErrorEvent, IdleRunEvent,
    IdleSuppressedEvent, IdleSuppression, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
    WindowTickEvent, WindowTimeoutEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_CYCLE_BEGIN: u8 = 1;
const TAG_WINDOW_TICK: u8 = 2;
const TAG_PHASE_BEGIN: u8 = 3;
const TAG_PHASE_END: u8 = 4;
const TAG_WINDOW_TIMEOUT: u8 = 5;
const TAG_IDLE_RUN: u8 = 6;
const TAG_IDLE_SUPPRESSED: u8 = 7;
const TAG_IDLE_JOB_ERROR: u8 = 8;
const TAG_CYCLE_SUMMARY: u8 = 9;

const FLAG_INPUT_CHANGED: u8 = 1;
const FLAG_NEEDS_UPDATE: u8 = 1 << 1;
const FLAG_RESCHEDULED: u8 = 1 << 2;
const FLAG_IDLE_ARMED: u8 = 1 << 3;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_time(&mut self, t: HostTime) {
        self.write_u64(t.micros());
    }

    fn write_duration(&mut self, d: Duration) {
        self.write_u64(u64::try_from(d.as_micros()).unwrap_or(u64::MAX));
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Tick => 0,
            PhaseKind::Paint => 1,
            PhaseKind::Render => 2,
            PhaseKind::Idle => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        self.write_u8(TAG_CYCLE_BEGIN);
        self.write_u64(e.cycle_index);
        self.write_time(e.start);
        self.write_u32(e.window_count);
    }

    fn on_window_tick(&mut self, e: &WindowTickEvent) {
        self.write_u8(TAG_WINDOW_TICK);
        self.write_u64(e.cycle_index);
        self.write_u32(e.window.0);
        self.write_time(e.timestamp);
        self.write_bool(e.changed_scene);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.cycle_index);
        self.write_u32(e.window.0);
        self.write_phase(e.phase);
        self.write_time(e.timestamp);
        self.write_duration(e.budget);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.cycle_index);
        self.write_u32(e.window.0);
        self.write_phase(e.phase);
        self.write_time(e.timestamp);
        self.write_bool(e.needs_update);
    }

    fn on_window_timeout(&mut self, e: &WindowTimeoutEvent) {
        self.write_u8(TAG_WINDOW_TIMEOUT);
        self.write_u64(e.cycle_index);
        self.write_u32(e.window.0);
        self.write_time(e.timestamp);
        self.write_duration(e.elapsed);
        self.write_u32(e.skipped);
    }

    fn on_idle_run(&mut self, e: &IdleRunEvent) {
        self.write_u8(TAG_IDLE_RUN);
        self.write_time(e.start);
        self.write_time(e.end);
        self.write_duration(e.budget);
        self.write_u32(e.steps);
        self.write_u32(e.remaining_jobs);
    }

    fn on_idle_suppressed(&mut self, e: &IdleSuppressedEvent) {
        self.write_u8(TAG_IDLE_SUPPRESSED);
        self.write_time(e.timestamp);
        self.write_u8(match e.reason {
            IdleSuppression::NoTimeRemaining => 0,
            IdleSuppression::TooRecent => 1,
        });
        self.write_u32(e.queued_jobs);
    }

    fn on_idle_job_error(&mut self, e: &IdleJobErrorEvent) {
        self.write_u8(TAG_IDLE_JOB_ERROR);
        self.write_time(e.timestamp);
        self.write_u32(e.job.0);
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        self.write_u8(TAG_CYCLE_SUMMARY);
        self.write_u64(s.cycle_index);
        self.write_time(s.start);
        self.write_time(s.end);
        self.write_u8(match s.order {
            CycleOrder::PaintThenRender => 0,
            CycleOrder::RenderThenPaint => 1,
        });
        self.write_u32(s.window_count);
        self.write_u32(s.windows_processed);
        self.write_u32(s.windows_skipped);
        self.write_duration(s.tick);
        self.write_duration(s.paint);
        self.write_duration(s.render);
        let mut flags = 0;
        for (set, flag) in [
            (s.input_changed_scene, FLAG_INPUT_CHANGED),
            (s.needs_update, FLAG_NEEDS_UPDATE),
            (s.rescheduled, FLAG_RESCHEDULED),
            (s.idle_armed, FLAG_IDLE_ARMED),
        ] {
            if set {
                flags |= flag;
            }
        }
        self.write_u8(flags);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`CycleBeginEvent`].
    CycleBegin(CycleBeginEvent),
    /// A [`WindowTickEvent`].
    WindowTick(WindowTickEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`WindowTimeoutEvent`].
    WindowTimeout(WindowTimeoutEvent),
    /// An [`IdleRunEvent`].
    IdleRun(IdleRunEvent),
    /// An [`IdleSuppressedEvent`].
    IdleSuppressed(IdleSuppressedEvent),
    /// An [`IdleJobErrorEvent`].
    IdleJobError(IdleJobErrorEvent),
    /// A [`CycleSummary`].
    CycleSummary(CycleSummary),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|b| b != 0)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_duration(&mut self) -> Option<Duration> {
        self.read_u64().map(Duration::from_micros)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Tick,
            1 => PhaseKind::Paint,
            2 => PhaseKind::Render,
            _ => PhaseKind::Idle,
        })
    }

    fn decode_cycle_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CycleBegin(CycleBeginEvent {
            cycle_index: self.read_u64()?,
            start: self.read_time()?,
            window_count: self.read_u32()?,
        }))
    }

    fn decode_window_tick(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::WindowTick(WindowTickEvent {
            cycle_index: self.read_u64()?,
            window: WindowId(self.read_u32()?),
            timestamp: self.read_time()?,
            changed_scene: self.read_bool()?,
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            cycle_index: self.read_u64()?,
            window: WindowId(self.read_u32()?),
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
            budget: self.read_duration()?,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            cycle_index: self.read_u64()?,
            window: WindowId(self.read_u32()?),
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
            needs_update: self.read_bool()?,
        }))
    }

    fn decode_window_timeout(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::WindowTimeout(WindowTimeoutEvent {
            cycle_index: self.read_u64()?,
            window: WindowId(self.read_u32()?),
            timestamp: self.read_time()?,
            elapsed: self.read_duration()?,
            skipped: self.read_u32()?,
        }))
    }

    fn decode_idle_run(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::IdleRun(IdleRunEvent {
            start: self.read_time()?,
            end: self.read_time()?,
            budget: self.read_duration()?,
            steps: self.read_u32()?,
            remaining_jobs: self.read_u32()?,
        }))
    }

    fn decode_idle_suppressed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::IdleSuppressed(IdleSuppressedEvent {
            timestamp: self.read_time()?,
            reason: match self.read_u8()? {
                0 => IdleSuppression::NoTimeRemaining,
                _ => IdleSuppression::TooRecent,
            },
            queued_jobs: self.read_u32()?,
        }))
    }

    fn decode_idle_job_error(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::IdleJobError(IdleJobErrorEvent {
            timestamp: self.read_time()?,
            job: JobId(self.read_u32()?),
        }))
    }

    fn decode_cycle_summary(&mut self) -> Option<RecordedEvent> {
        let cycle_index = self.read_u64()?;
        let start = self.read_time()?;
        let end = self.read_time()?;
        let order = match self.read_u8()? {
            0 => CycleOrder::PaintThenRender,
            _ => CycleOrder::RenderThenPaint,
        };
        let window_count = self.read_u32()?;
        let windows_processed = self.read_u32()?;
        let windows_skipped = self.read_u32()?;
        let tick = self.read_duration()?;
        let paint = self.read_duration()?;
        let render = self.read_duration()?;
        let flags = self.read_u8()?;
        Some(RecordedEvent::CycleSummary(CycleSummary {
            cycle_index,
            start,
            end,
            order,
            window_count,
            windows_processed,
            windows_skipped,
            tick,
            paint,
            render,
            input_changed_scene: flags & FLAG_INPUT_CHANGED != 0,
            needs_update: flags & FLAG_NEEDS_UPDATE != 0,
            rescheduled: flags & FLAG_RESCHEDULED != 0,
            idle_armed: flags & FLAG_IDLE_ARMED != 0,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_CYCLE_BEGIN => self.decode_cycle_begin(),
            TAG_WINDOW_TICK => self.decode_window_tick(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_WINDOW_TIMEOUT => self.decode_window_timeout(),
            TAG_IDLE_RUN => self.decode_idle_run(),
            TAG_IDLE_SUPPRESSED => self.decode_idle_suppressed(),
            TAG_IDLE_JOB_ERROR => self.decode_idle_job_error(),
            TAG_CYCLE_SUMMARY => self.decode_cycle_summary(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
