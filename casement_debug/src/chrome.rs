// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Belt-wide events sit on track 0, window `n` on track `n + 1`, and idle
//! passes on a track of their own.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};
use std::time::Duration;

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

const BELT_TID: u32 = 0;
const WINDOW_TID_BASE: u32 = 1;
const IDLE_TID: u32 = u32::MAX;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Host times are already microseconds and are written as-is.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::CycleBegin(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "CycleBegin",
                    "cat": "Belt",
                    "ts": e.start.micros(),
                    "pid": 0,
                    "tid": BELT_TID,
                    "s": "g",
                    "args": {
                        "cycle_index": e.cycle_index,
                        "window_count": e.window_count,
                    }
                }));
            }
            RecordedEvent::WindowTick(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Tick",
                    "cat": "Window",
                    "ts": e.timestamp.micros(),
                    "pid": 0,
                    "tid": window_tid(e.window.0),
                    "s": "t",
                    "args": {
                        "cycle_index": e.cycle_index,
                        "changed_scene": e.changed_scene,
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}", e.phase),
                    "cat": "Window",
                    "ts": e.timestamp.micros(),
                    "pid": 0,
                    "tid": window_tid(e.window.0),
                    "args": {
                        "cycle_index": e.cycle_index,
                        "budget_us": us(e.budget),
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": format!("{:?}", e.phase),
                    "cat": "Window",
                    "ts": e.timestamp.micros(),
                    "pid": 0,
                    "tid": window_tid(e.window.0),
                    "args": {
                        "cycle_index": e.cycle_index,
                        "needs_update": e.needs_update,
                    }
                }));
            }
            RecordedEvent::WindowTimeout(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Timeout",
                    "cat": "Belt",
                    "ts": e.timestamp.micros(),
                    "pid": 0,
                    "tid": window_tid(e.window.0),
                    "s": "p",
                    "args": {
                        "cycle_index": e.cycle_index,
                        "elapsed_us": us(e.elapsed),
                        "skipped": e.skipped,
                    }
                }));
            }
            RecordedEvent::IdleRun(e) => {
                events.push(json!({
                    "ph": "X",
                    "name": "Idle",
                    "cat": "Idle",
                    "ts": e.start.micros(),
                    "dur": us(e.end.saturating_duration_since(e.start)),
                    "pid": 0,
                    "tid": IDLE_TID,
                    "args": {
                        "budget_us": us(e.budget),
                        "steps": e.steps,
                        "remaining_jobs": e.remaining_jobs,
                    }
                }));
            }
            RecordedEvent::IdleSuppressed(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "IdleSuppressed",
                    "cat": "Idle",
                    "ts": e.timestamp.micros(),
                    "pid": 0,
                    "tid": IDLE_TID,
                    "s": "t",
                    "args": {
                        "reason": format!("{:?}", e.reason),
                        "queued_jobs": e.queued_jobs,
                    }
                }));
            }
            RecordedEvent::IdleJobError(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "IdleJobError",
                    "cat": "Idle",
                    "ts": e.timestamp.micros(),
                    "pid": 0,
                    "tid": IDLE_TID,
                    "s": "t",
                    "args": {
                        "job": e.job.0,
                    }
                }));
            }
            RecordedEvent::CycleSummary(s) => {
                events.push(json!({
                    "ph": "X",
                    "name": "Cycle",
                    "cat": "Summary",
                    "ts": s.start.micros(),
                    "dur": us(s.end.saturating_duration_since(s.start)),
                    "pid": 0,
                    "tid": BELT_TID,
                    "args": {
                        "cycle_index": s.cycle_index,
                        "order": format!("{:?}", s.order),
                        "tick_us": us(s.tick),
                        "paint_us": us(s.paint),
                        "render_us": us(s.render),
                        "windows_processed": s.windows_processed,
                        "windows_skipped": s.windows_skipped,
                        "rescheduled": s.rescheduled,
                        "idle_armed": s.idle_armed,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn window_tid(window: u32) -> u32 {
    window.saturating_add(WINDOW_TID_BASE)
}

fn us(d: Duration) -> f64 {
    d.as_micros() as f64
}
