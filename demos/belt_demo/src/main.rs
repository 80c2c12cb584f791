// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated host loop that exercises the belt and the diagnostics pipeline.
//!
//! Drives two windows and a few idle jobs through 120 display frames on a
//! [`ManualClock`], as a browser host would: a frame callback whenever the
//! belt requests an update, and an idle timer whenever a cycle arms one.
//! Every tenth frame the host delivers simulated input, which wakes the
//! belt. Components burn simulated time; one input frame deliberately
//! overruns the interval. Events go to a
//! [`PrettyPrintSink`](casement_debug::pretty::PrettyPrintSink), a
//! [`TracingSink`](casement_debug::log::TracingSink) (filter with
//! `RUST_LOG`), and a [`RecorderSink`](casement_debug::recorder::RecorderSink)
//! whose recording is exported as a Chrome trace.
//!
//! Usage: `belt_demo [OUTPUT]` (default `trace.json`).

use std::cell::Cell;
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;
use std::time::Duration;

use casement_core::belt::{BeltConfig, TimingBelt};
use casement_core::component::ProxyComponent;
use casement_core::time::{Clock, HostTime, ManualClock};
use casement_core::trace::{TraceSink, Tracer};
use casement_core::window::{FixedSurface, Window};
use casement_debug::FanOut;
use casement_debug::log::TracingSink;
use casement_debug::pretty::PrettyPrintSink;
use casement_debug::recorder::RecorderSink;
use tracing::info;
use tracing_subscriber::EnvFilter;

const FRAME_COUNT: u64 = 120;
/// ≈60 Hz display.
const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);
/// Frames between simulated input events.
const INPUT_EVERY: u64 = 10;
/// The frame whose render overruns the belt interval.
const SPIKE_FRAME: u64 = 30;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "trace.json".into());

    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut log = TracingSink::new();
    let mut recorder = RecorderSink::new();
    let sinks: Vec<&mut dyn TraceSink> = vec![&mut pretty, &mut log, &mut recorder];
    let stats = simulate(&mut FanOut::new(sinks))?;

    info!(
        requests = stats.requests,
        coalesced = stats.coalesced,
        timeouts = stats.timeouts,
        jobs_left = stats.jobs_left,
        "simulation finished"
    );

    // -- export Chrome trace -----------------------------------------------
    let mut writer = BufWriter::new(File::create(&path)?);
    casement_debug::chrome::export(recorder.as_bytes(), &mut writer)?;
    println!("Wrote {path} ({FRAME_COUNT} frames)");
    Ok(())
}

/// Counters reported at the end of a run.
#[derive(Clone, Copy, Debug)]
struct Stats {
    requests: u64,
    coalesced: u64,
    timeouts: u32,
    jobs_left: usize,
}

/// Runs [`FRAME_COUNT`] simulated display frames, reporting to `sink`.
fn simulate(sink: &mut dyn TraceSink) -> Result<Stats, Box<dyn Error>> {
    let clock = ManualClock::new(HostTime::from_millis_f64(1_000.0));
    let frame = Rc::new(Cell::new(0_u64));

    let mut belt = TimingBelt::new(BeltConfig::DEFAULT, clock.clone());
    let chart = belt.allocate_window_id();
    belt.add_window(chart_window(chart, &clock, &frame)?)?;
    let timeline = belt.allocate_window_id();
    belt.add_window(timeline_window(timeline, &clock)?)?;
    queue_jobs(&mut belt, &clock);

    let mut tracer = Tracer::new(sink);
    let mut idle_at: Option<HostTime> = None;
    let mut timeouts = 0;
    for n in 0..FRAME_COUNT {
        frame.set(n);
        let vsync = HostTime::from_millis_f64(1_000.0) + FRAME_INTERVAL * u32::try_from(n)?;
        if clock.now() < vsync {
            clock.set(vsync);
        }

        if n % INPUT_EVERY == 0 {
            belt.schedule_update();
        }

        if idle_at.is_some_and(|at| clock.now() >= at) {
            idle_at = None;
            if let Err(e) = belt.on_idle_timer_with(&mut tracer) {
                tracing::error!(error = %e, "idle job failed");
            }
            // Jobs left with no cycle pending would never be armed again.
            if belt.num_jobs() > 0 && !belt.updates().is_pending() {
                idle_at = Some(clock.now() + belt.config().interval);
            }
        }

        let Some(summary) = belt.run_frame_with(&mut tracer)? else {
            continue;
        };
        if summary.windows_skipped > 0 {
            timeouts += 1;
        }
        if summary.idle_armed && idle_at.is_none() {
            idle_at = Some(clock.now() + belt.config().interval);
        }
    }

    Ok(Stats {
        requests: belt.updates().requests(),
        coalesced: belt.updates().coalesced(),
        timeouts,
        jobs_left: belt.num_jobs(),
    })
}

/// Plot with a legend below it and an axis strip to the right.
fn chart_window(
    id: casement_core::id::WindowId,
    clock: &ManualClock,
    frame: &Rc<Cell<u64>>,
) -> Result<Window, Box<dyn Error>> {
    let mut window = Window::new(id, FixedSurface::new(800.0, 600.0)?);

    let (c, f) = (clock.clone(), frame.clone());
    let plot = window.add_horizontal(
        ProxyComponent::new("plot")
            // Input frames change the scene.
            .with_ticker(move |_| Ok(f.get() % INPUT_EVERY == 0))
            .with_renderer({
                let f = frame.clone();
                move |_, _, _| {
                    let cost = if f.get() == SPIKE_FRAME { 24 } else { 3 };
                    c.advance(Duration::from_millis(cost));
                    Ok(false)
                }
            }),
        None,
    )?;

    let c = clock.clone();
    window.add_vertical(
        ProxyComponent::new("legend").with_renderer(move |_, _, _| {
            c.advance(Duration::from_micros(400));
            Ok(false)
        }),
        Some(plot),
    )?;
    window.add_horizontal(ProxyComponent::new("axis"), None)?;
    Ok(window)
}

/// A progressive heat map that paints in slices until done.
fn timeline_window(
    id: casement_core::id::WindowId,
    clock: &ManualClock,
) -> Result<Window, Box<dyn Error>> {
    let mut window = Window::new(id, FixedSurface::new(400.0, 300.0)?);
    let mut remaining = Duration::from_millis(40);
    let c = clock.clone();
    window.add_horizontal(
        ProxyComponent::new("heatmap").with_painter(move |timeout| {
            let slice = remaining.min(timeout).max(Duration::from_micros(100));
            remaining = remaining.saturating_sub(slice);
            c.advance(slice);
            Ok(!remaining.is_zero())
        }),
        None,
    )?;
    Ok(window)
}

/// An indexing job that runs in 3 ms chunks and queues a follow-up when done.
fn queue_jobs(belt: &mut TimingBelt<Window, ManualClock>, clock: &ManualClock) {
    let c = clock.clone();
    let mut chunks = 6;
    belt.queue_job(move |cx| {
        c.advance(Duration::from_millis(3).min(cx.remaining()));
        chunks -= 1;
        if chunks == 0 {
            let c = c.clone();
            cx.queue(move |_| {
                c.advance(Duration::from_millis(1));
                Ok(false)
            });
        }
        Ok(chunks > 0)
    });
}

#[cfg(test)]
mod tests {
    use casement_core::trace::NoopSink;
    use casement_debug::recorder::{RecordedEvent, decode};

    use super::*;

    #[test]
    fn run_overruns_and_drains_every_job() {
        let stats = simulate(&mut NoopSink).unwrap();
        assert!(stats.timeouts >= 1, "the spike frame overruns: {stats:?}");
        assert_eq!(stats.jobs_left, 0, "follow-up jobs run: {stats:?}");
    }

    #[test]
    fn input_keeps_the_belt_cycling() {
        let mut recorder = RecorderSink::new();
        simulate(&mut recorder).unwrap();
        let cycles = decode(recorder.as_bytes())
            .filter(|e| matches!(e, RecordedEvent::CycleBegin(_)))
            .count();
        let inputs = usize::try_from(FRAME_COUNT / INPUT_EVERY).unwrap();
        assert!(cycles > inputs, "only {cycles} cycles");
    }
}
