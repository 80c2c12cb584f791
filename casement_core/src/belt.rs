// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The timing belt: a cooperative, deadline-aware frame loop.
//!
//! A [`TimingBelt`] owns a set of render targets and runs them through one
//! cycle at a time:
//!
//! ```text
//!   run_frame ──► tick every window ──► paint/render each window ──► outcome
//!                        │                (rotating start, abort             │
//!                        │                 once the interval is spent)       │
//!                        ▼                                                   ▼
//!              input changed the scene?                        needs update? reschedule
//!              yes: render, then paint                         jobs queued?  arm idle timer
//!              no:  paint, then render
//! ```
//!
//! The belt never blocks or sleeps. Hosts drive it:
//!
//! - install a waker on [`updates`](TimingBelt::updates) that arms a frame
//!   callback, and call [`run_frame`](TimingBelt::run_frame) from it;
//! - when a cycle reports [`idle_armed`](CycleSummary::idle_armed), call
//!   [`on_idle_timer`](TimingBelt::on_idle_timer) after the configured
//!   interval.
//!
//! Every window and component requests cycles through the same
//! [`UpdateChannel`], so any number of requests between frames produces a
//! single cycle.

use alloc::vec::Vec;
use core::time::Duration;

use crate::error::{BeltError, JobError};
use crate::id::{IdAllocator, JobId, WindowId};
use crate::idle::{IdleContext, IdleQueue, Step};
use crate::time::{Clock, HostTime};
use crate::trace::{
    CycleBeginEvent, CycleOrder, CycleSummary, CycleSummaryBuilder, IdleJobErrorEvent,
    IdleRunEvent, IdleSuppressedEvent, IdleSuppression, PhaseBeginEvent, PhaseEndEvent,
    PhaseKind, Tracer, WindowTickEvent, WindowTimeoutEvent,
};
use crate::update::UpdateChannel;
use crate::window::RenderTarget;

/// Configuration for the [`TimingBelt`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BeltConfig {
    /// Throttle idle passes to at most one per idle budget.
    pub governor: bool,
    /// Let one idle pass drain several jobs while time remains.
    pub burst_idle: bool,
    /// Time budget for one cycle; also the idle timer delay.
    pub interval: Duration,
    /// Subtracted from `interval` to get the idle pass budget.
    pub idle_margin: Duration,
}

impl BeltConfig {
    /// Governor on, burst off, 15 ms interval, 1 ms idle margin.
    pub const DEFAULT: Self = Self {
        governor: true,
        burst_idle: false,
        interval: Duration::from_millis(15),
        idle_margin: Duration::from_millis(1),
    };

    /// Runs idle work as fast as the interval allows: governor off, burst on.
    #[must_use]
    pub const fn unthrottled() -> Self {
        Self {
            governor: false,
            burst_idle: true,
            ..Self::DEFAULT
        }
    }

    /// The budget of an idle pass started by the idle timer.
    #[must_use]
    pub const fn idle_budget(&self) -> Duration {
        self.interval.saturating_sub(self.idle_margin)
    }
}

impl Default for BeltConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What an idle pass did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdleOutcome {
    /// No jobs were queued.
    Empty,
    /// Job steps ran.
    Ran {
        /// Number of job steps run.
        steps: u32,
    },
    /// The pass declined to run.
    Suppressed(IdleSuppression),
}

/// A cooperative scheduler that cycles a set of render targets.
#[derive(Debug)]
pub struct TimingBelt<W, C> {
    config: BeltConfig,
    clock: C,
    windows: Vec<W>,
    window_ids: IdAllocator,
    jobs: IdleQueue,
    updates: UpdateChannel,
    last_idle: Option<HostTime>,
    last_render: Option<HostTime>,
    cycle_index: u64,
    rotation: usize,
}

impl<W: RenderTarget, C: Clock> TimingBelt<W, C> {
    /// Creates an empty belt reading time from `clock`.
    pub fn new(config: BeltConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            windows: Vec::new(),
            window_ids: IdAllocator::new(),
            jobs: IdleQueue::new(),
            updates: UpdateChannel::new(),
            last_idle: None,
            last_render: None,
            cycle_index: 0,
            rotation: 0,
        }
    }

    // -- Configuration --

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> &BeltConfig {
        &self.config
    }

    /// Sets whether idle passes are throttled to one per idle budget.
    pub fn set_governor(&mut self, governor: bool) {
        self.config.governor = governor;
    }

    /// Sets whether one idle pass may drain several jobs.
    pub fn set_burst_idle(&mut self, burst_idle: bool) {
        self.config.burst_idle = burst_idle;
    }

    /// Sets the cycle budget and idle timer delay.
    pub fn set_interval(&mut self, interval: Duration) {
        self.config.interval = interval;
    }

    /// Sets the margin subtracted from the interval for idle passes.
    pub fn set_idle_margin(&mut self, idle_margin: Duration) {
        self.config.idle_margin = idle_margin;
    }

    /// Returns the clock.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    // -- Windows --

    /// Returns a fresh window id for constructing a target.
    pub fn allocate_window_id(&mut self) -> WindowId {
        WindowId(self.window_ids.allocate())
    }

    /// Registers a window, connects its update requests, and requests a
    /// cycle.
    ///
    /// # Errors
    ///
    /// Returns [`BeltError::DuplicateWindow`] if a window with the same id is
    /// already registered.
    pub fn add_window(&mut self, mut window: W) -> Result<WindowId, BeltError> {
        let id = window.id();
        if self.windows.iter().any(|w| w.id() == id) {
            return Err(BeltError::DuplicateWindow(id));
        }
        window.set_update_sender(Some(self.updates.sender()));
        self.windows.push(window);
        self.schedule_update();
        Ok(id)
    }

    /// Unregisters a window and disconnects its update requests.
    pub fn remove_window(&mut self, id: WindowId) -> Option<W> {
        let index = self.windows.iter().position(|w| w.id() == id)?;
        let mut window = self.windows.remove(index);
        window.set_update_sender(None);
        Some(window)
    }

    /// Returns a registered window.
    #[must_use]
    pub fn window(&self, id: WindowId) -> Option<&W> {
        self.windows.iter().find(|w| w.id() == id)
    }

    /// Returns a registered window mutably.
    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut W> {
        self.windows.iter_mut().find(|w| w.id() == id)
    }

    /// Iterates over the registered windows in registration order.
    pub fn windows(&self) -> impl Iterator<Item = &W> {
        self.windows.iter()
    }

    /// Number of registered windows.
    #[must_use]
    pub fn num_windows(&self) -> usize {
        self.windows.len()
    }

    // -- Updates --

    /// The channel through which cycles are requested.
    ///
    /// Hosts install their frame-callback waker here.
    #[must_use]
    pub fn updates(&self) -> &UpdateChannel {
        &self.updates
    }

    /// Requests a cycle. Returns `true` if this call made a request pending.
    pub fn schedule_update(&self) -> bool {
        self.updates.request()
    }

    /// Host time at the end of the most recent cycle.
    #[must_use]
    pub fn last_render(&self) -> Option<HostTime> {
        self.last_render
    }

    // -- Idle jobs --

    /// Queues an idle job and requests a cycle.
    pub fn queue_job(
        &mut self,
        job: impl FnMut(&mut IdleContext) -> Result<bool, JobError> + 'static,
    ) -> JobId {
        let id = self.jobs.push(job);
        self.schedule_update();
        id
    }

    /// Number of queued idle jobs.
    #[must_use]
    pub fn num_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Runs an idle pass with the configured idle budget.
    ///
    /// # Errors
    ///
    /// See [`idle`](Self::idle).
    pub fn on_idle_timer(&mut self) -> Result<IdleOutcome, BeltError> {
        self.on_idle_timer_with(&mut Tracer::none())
    }

    /// Like [`on_idle_timer`](Self::on_idle_timer), reporting to `tracer`.
    ///
    /// # Errors
    ///
    /// See [`idle`](Self::idle).
    pub fn on_idle_timer_with(&mut self, tracer: &mut Tracer<'_>) -> Result<IdleOutcome, BeltError> {
        self.idle_with(self.config.idle_budget(), tracer)
    }

    /// Runs queued idle jobs for up to `budget`.
    ///
    /// # Errors
    ///
    /// Returns [`BeltError::IdleJob`] if a job fails. The job is dequeued and
    /// a cycle is requested before returning.
    pub fn idle(&mut self, budget: Duration) -> Result<IdleOutcome, BeltError> {
        self.idle_with(budget, &mut Tracer::none())
    }

    /// Like [`idle`](Self::idle), reporting to `tracer`.
    ///
    /// # Errors
    ///
    /// See [`idle`](Self::idle).
    pub fn idle_with(
        &mut self,
        budget: Duration,
        tracer: &mut Tracer<'_>,
    ) -> Result<IdleOutcome, BeltError> {
        if self.jobs.is_empty() {
            return Ok(IdleOutcome::Empty);
        }
        let start = self.clock.now();
        let too_recent = self.config.governor
            && self
                .last_idle
                .is_some_and(|last| start.saturating_duration_since(last) <= budget);
        if budget.is_zero() || too_recent {
            let reason = if budget.is_zero() {
                IdleSuppression::NoTimeRemaining
            } else {
                IdleSuppression::TooRecent
            };
            tracer.idle_suppressed(&IdleSuppressedEvent {
                timestamp: start,
                reason,
                queued_jobs: count_u32(self.jobs.len()),
            });
            return Ok(IdleOutcome::Suppressed(reason));
        }

        let mut steps = 0;
        loop {
            let remaining = budget.saturating_sub(self.clock.now().saturating_duration_since(start));
            let Some((step, follow_ups)) = self.jobs.step(remaining) else {
                break;
            };
            steps += 1;
            if follow_ups > 0 {
                self.schedule_update();
            }
            match step {
                Step::Resume => {
                    self.schedule_update();
                }
                Step::Done => {}
                Step::Failed(job, source) => {
                    self.schedule_update();
                    tracer.idle_job_error(&IdleJobErrorEvent {
                        timestamp: self.clock.now(),
                        job,
                    });
                    return Err(BeltError::IdleJob { job, source });
                }
            }
            let elapsed = self.clock.now().saturating_duration_since(start);
            if !self.config.burst_idle || elapsed >= budget || self.jobs.is_empty() {
                break;
            }
        }

        let end = self.clock.now();
        if !self.jobs.is_empty() && self.config.governor {
            self.last_idle = Some(end);
        }
        tracer.idle_run(&IdleRunEvent {
            start,
            end,
            budget,
            steps,
            remaining_jobs: count_u32(self.jobs.len()),
        });
        Ok(IdleOutcome::Ran { steps })
    }

    // -- Cycles --

    /// Consumes a pending update request and runs one cycle.
    ///
    /// Returns `None` when no cycle was requested.
    ///
    /// # Errors
    ///
    /// See [`cycle`](Self::cycle).
    pub fn run_frame(&mut self) -> Result<Option<CycleSummary>, BeltError> {
        self.run_frame_with(&mut Tracer::none())
    }

    /// Like [`run_frame`](Self::run_frame), reporting to `tracer`.
    ///
    /// # Errors
    ///
    /// See [`cycle`](Self::cycle).
    pub fn run_frame_with(
        &mut self,
        tracer: &mut Tracer<'_>,
    ) -> Result<Option<CycleSummary>, BeltError> {
        if !self.updates.take() {
            return Ok(None);
        }
        self.cycle_with(tracer).map(Some)
    }

    /// Runs one cycle over every registered window.
    ///
    /// # Errors
    ///
    /// Returns [`BeltError::Window`] if a window fails. The cycle stops at
    /// that point; windows already processed keep their changes.
    pub fn cycle(&mut self) -> Result<CycleSummary, BeltError> {
        self.cycle_with(&mut Tracer::none())
    }

    /// Like [`cycle`](Self::cycle), reporting to `tracer`.
    ///
    /// # Errors
    ///
    /// See [`cycle`](Self::cycle).
    pub fn cycle_with(&mut self, tracer: &mut Tracer<'_>) -> Result<CycleSummary, BeltError> {
        let start = self.clock.now();
        self.cycle_index += 1;
        let cycle_index = self.cycle_index;
        let count = self.windows.len();
        let begin = CycleBeginEvent {
            cycle_index,
            start,
            window_count: count_u32(count),
        };
        tracer.cycle_begin(&begin);
        let mut summary = CycleSummaryBuilder::new(&begin);

        let mut input_changed_scene = false;
        for window in &mut self.windows {
            let id = window.id();
            let changed = window.tick(start).map_err(|source| BeltError::Window {
                window: id,
                phase: PhaseKind::Tick,
                source,
            })?;
            input_changed_scene |= changed;
            tracer.window_tick(&WindowTickEvent {
                cycle_index,
                window: id,
                timestamp: self.clock.now(),
                changed_scene: changed,
            });
        }
        let ticked = self.clock.now();
        summary.add_phase(PhaseKind::Tick, start, ticked);

        let order = if input_changed_scene {
            CycleOrder::RenderThenPaint
        } else {
            CycleOrder::PaintThenRender
        };
        summary.set_order(order, input_changed_scene);

        let interval = self.config.interval;
        let window_budget = match u32::try_from(count) {
            Ok(0) => Duration::ZERO,
            Ok(n) => interval.saturating_sub(ticked.saturating_duration_since(start)) / n,
            Err(_) => Duration::ZERO,
        };
        let offset = if count == 0 { 0 } else { self.rotation % count };
        self.rotation = self.rotation.wrapping_add(1);

        let mut needs_update = false;
        'windows: for i in 0..count {
            let window = &mut self.windows[(offset + i) % count];
            let id = window.id();
            for phase in order.phases() {
                let now = self.clock.now();
                let elapsed = now.saturating_duration_since(start);
                if elapsed > interval {
                    let skipped = count_u32(count - i);
                    tracer.window_timeout(&WindowTimeoutEvent {
                        cycle_index,
                        window: id,
                        timestamp: now,
                        elapsed,
                        skipped,
                    });
                    summary.set_skipped(skipped);
                    needs_update = true;
                    break 'windows;
                }

                let budget = if phase == PhaseKind::Paint {
                    window_budget
                } else {
                    Duration::ZERO
                };
                tracer.phase_begin(&PhaseBeginEvent {
                    cycle_index,
                    window: id,
                    phase,
                    timestamp: now,
                    budget,
                });
                let result = if phase == PhaseKind::Paint {
                    window.paint(budget, &self.clock)
                } else {
                    window.render()
                };
                let more = result.map_err(|source| BeltError::Window {
                    window: id,
                    phase,
                    source,
                })?;
                let end = self.clock.now();
                tracer.phase_end(&PhaseEndEvent {
                    cycle_index,
                    window: id,
                    phase,
                    timestamp: end,
                    needs_update: more,
                });
                summary.add_phase(phase, now, end);
                needs_update |= more;
            }
            summary.window_processed();
        }

        let idle_armed = !self.jobs.is_empty() && !needs_update;
        let rescheduled = needs_update || input_changed_scene;
        if rescheduled {
            self.schedule_update();
        }
        let end = self.clock.now();
        self.last_render = Some(end);

        summary.set_outcome(needs_update, rescheduled, idle_armed);
        let summary = summary.finish(end);
        tracer.cycle_summary(&summary);
        Ok(summary)
    }
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::{Cell, RefCell};

    use super::*;
    use crate::component::ProxyComponent;
    use crate::error::RenderError;
    use crate::time::ManualClock;
    use crate::update::UpdateSender;
    use crate::window::{FixedSurface, Window};

    const MS: Duration = Duration::from_millis(1);

    #[derive(Debug, thiserror::Error)]
    #[error("failed")]
    struct Failed;

    /// Counts calls and optionally burns time on the shared clock.
    #[derive(Debug)]
    struct Probe {
        id: WindowId,
        clock: ManualClock,
        log: Rc<RefCell<Vec<(WindowId, PhaseKind)>>>,
        tick_changes: bool,
        paint_cost: Duration,
        render_needs_update: bool,
        sender: Option<UpdateSender>,
    }

    impl Probe {
        fn new(id: u32, clock: &ManualClock, log: &Rc<RefCell<Vec<(WindowId, PhaseKind)>>>) -> Self {
            Self {
                id: WindowId(id),
                clock: clock.clone(),
                log: log.clone(),
                tick_changes: false,
                paint_cost: Duration::ZERO,
                render_needs_update: false,
                sender: None,
            }
        }
    }

    impl RenderTarget for Probe {
        fn id(&self) -> WindowId {
            self.id
        }

        fn tick(&mut self, _now: HostTime) -> Result<bool, RenderError> {
            self.log.borrow_mut().push((self.id, PhaseKind::Tick));
            Ok(self.tick_changes)
        }

        fn paint(&mut self, _budget: Duration, _clock: &dyn Clock) -> Result<bool, RenderError> {
            self.log.borrow_mut().push((self.id, PhaseKind::Paint));
            self.clock.advance(self.paint_cost);
            Ok(false)
        }

        fn render(&mut self) -> Result<bool, RenderError> {
            self.log.borrow_mut().push((self.id, PhaseKind::Render));
            Ok(self.render_needs_update)
        }

        fn num_components(&self) -> usize {
            0
        }

        fn set_update_sender(&mut self, sender: Option<UpdateSender>) {
            self.sender = sender;
        }
    }

    type Log = Rc<RefCell<Vec<(WindowId, PhaseKind)>>>;

    fn belt() -> (TimingBelt<Probe, ManualClock>, ManualClock, Log) {
        let clock = ManualClock::new(HostTime(1_000_000));
        let belt = TimingBelt::new(BeltConfig::DEFAULT, clock.clone());
        (belt, clock, Rc::new(RefCell::new(Vec::new())))
    }

    fn phases(log: &Log, phase: PhaseKind) -> Vec<WindowId> {
        log.borrow()
            .iter()
            .filter(|(_, p)| *p == phase)
            .map(|(w, _)| *w)
            .collect()
    }

    #[test]
    fn config_defaults() {
        let config = BeltConfig::default();
        assert!(config.governor);
        assert!(!config.burst_idle);
        assert_eq!(config.interval, 15 * MS);
        assert_eq!(config.idle_margin, MS);
        assert_eq!(config.idle_budget(), 14 * MS);

        let fast = BeltConfig::unthrottled();
        assert!(!fast.governor);
        assert!(fast.burst_idle);
        assert_eq!(fast.interval, 15 * MS);
    }

    #[test]
    fn many_requests_produce_one_cycle() {
        let (mut belt, clock, log) = belt();
        let wakes = Rc::new(Cell::new(0));
        let w = wakes.clone();
        belt.updates().set_waker(move || w.set(w.get() + 1));

        belt.add_window(Probe::new(0, &clock, &log)).unwrap();
        for _ in 0..10 {
            belt.schedule_update();
        }
        let sender = belt.window(WindowId(0)).unwrap().sender.clone().unwrap();
        sender.request();

        assert_eq!(wakes.get(), 1);
        let summary = belt.run_frame().unwrap().expect("a cycle was requested");
        assert!(!summary.rescheduled);
        assert!(belt.run_frame().unwrap().is_none());
        assert_eq!(phases(&log, PhaseKind::Tick).len(), 1);
    }

    #[test]
    fn quiet_cycle_paints_then_renders() {
        let (mut belt, clock, log) = belt();
        belt.add_window(Probe::new(0, &clock, &log)).unwrap();
        let summary = belt.cycle().unwrap();

        assert_eq!(summary.order, CycleOrder::PaintThenRender);
        assert_eq!(
            *log.borrow(),
            vec![
                (WindowId(0), PhaseKind::Tick),
                (WindowId(0), PhaseKind::Paint),
                (WindowId(0), PhaseKind::Render),
            ]
        );
        assert!(!summary.needs_update);
        assert_eq!(belt.last_render(), Some(clock.now()));
    }

    #[test]
    fn input_change_renders_first_and_reschedules() {
        let (mut belt, clock, log) = belt();
        let mut probe = Probe::new(0, &clock, &log);
        probe.tick_changes = true;
        belt.add_window(probe).unwrap();
        belt.updates().take();

        let summary = belt.cycle().unwrap();
        assert_eq!(summary.order, CycleOrder::RenderThenPaint);
        assert_eq!(log.borrow()[1], (WindowId(0), PhaseKind::Render));
        assert!(summary.input_changed_scene);
        assert!(summary.rescheduled);
        assert!(belt.updates().is_pending());
    }

    #[test]
    fn render_needing_update_reschedules() {
        let (mut belt, clock, log) = belt();
        let mut probe = Probe::new(0, &clock, &log);
        probe.render_needs_update = true;
        belt.add_window(probe).unwrap();
        belt.updates().take();

        let summary = belt.cycle().unwrap();
        assert!(summary.needs_update);
        assert!(summary.rescheduled);
        assert!(belt.updates().is_pending());
    }

    #[test]
    fn slow_window_cuts_the_cycle_short() {
        let (mut belt, clock, log) = belt();
        let mut slow = Probe::new(0, &clock, &log);
        slow.paint_cost = 20 * MS;
        belt.add_window(slow).unwrap();
        belt.add_window(Probe::new(1, &clock, &log)).unwrap();
        belt.updates().take();

        let summary = belt.cycle().unwrap();
        assert_eq!(phases(&log, PhaseKind::Paint), vec![WindowId(0)]);
        assert!(phases(&log, PhaseKind::Render).is_empty());
        assert_eq!(summary.windows_skipped, 2);
        assert_eq!(summary.windows_processed, 0);
        assert!(summary.needs_update);
        assert!(summary.rescheduled);
        assert!(belt.updates().is_pending());
    }

    #[test]
    fn start_window_rotates_each_cycle() {
        let (mut belt, clock, log) = belt();
        for id in 0..3 {
            belt.add_window(Probe::new(id, &clock, &log)).unwrap();
        }
        for _ in 0..3 {
            belt.cycle().unwrap();
        }
        assert_eq!(
            phases(&log, PhaseKind::Paint),
            vec![
                WindowId(0),
                WindowId(1),
                WindowId(2),
                WindowId(1),
                WindowId(2),
                WindowId(0),
                WindowId(2),
                WindowId(0),
                WindowId(1),
            ]
        );
    }

    #[test]
    fn paint_budget_is_split_across_windows() {
        let clock = ManualClock::new(HostTime::ZERO);
        let mut belt = TimingBelt::new(BeltConfig::DEFAULT, clock.clone());
        let budgets = Rc::new(RefCell::new(Vec::new()));
        for _ in 0..3 {
            let id = belt.allocate_window_id();
            let mut window = Window::new(id, FixedSurface::new(10.0, 10.0).unwrap());
            let b = budgets.clone();
            window
                .add_horizontal(
                    ProxyComponent::new("p").with_painter(move |share| {
                        b.borrow_mut().push(share);
                        Ok(false)
                    }),
                    None,
                )
                .unwrap();
            belt.add_window(window).unwrap();
        }
        belt.cycle().unwrap();
        assert_eq!(*budgets.borrow(), vec![5 * MS; 3]);
    }

    #[test]
    fn component_requests_reach_the_belt() {
        let clock = ManualClock::new(HostTime::ZERO);
        let mut belt = TimingBelt::new(BeltConfig::DEFAULT, clock);
        let id = belt.allocate_window_id();
        let mut window = Window::new(id, FixedSurface::new(10.0, 10.0).unwrap());
        let c = window
            .add_horizontal(ProxyComponent::new("p").with_renderer(|_, _, _| Ok(true)), None)
            .unwrap();
        belt.add_window(window).unwrap();
        assert!(belt.run_frame().unwrap().is_some());
        // The renderer asked for more, so another frame is pending.
        assert!(belt.run_frame().unwrap().is_some());

        let mut window = belt.remove_window(id).unwrap();
        belt.updates().take();
        assert!(window.remove_component(c).is_some());
        assert!(!belt.updates().is_pending());
    }

    #[test]
    fn duplicate_window_is_rejected() {
        let (mut belt, clock, log) = belt();
        belt.add_window(Probe::new(0, &clock, &log)).unwrap();
        assert!(matches!(
            belt.add_window(Probe::new(0, &clock, &log)),
            Err(BeltError::DuplicateWindow(WindowId(0)))
        ));
        assert_eq!(belt.num_windows(), 1);
        assert!(belt.remove_window(WindowId(0)).is_some());
        assert!(belt.remove_window(WindowId(0)).is_none());
    }

    #[test]
    fn window_errors_abort_the_cycle() {
        struct Broken;
        impl RenderTarget for Broken {
            fn id(&self) -> WindowId {
                WindowId(9)
            }
            fn tick(&mut self, _now: HostTime) -> Result<bool, RenderError> {
                Err(Box::new(Failed))
            }
            fn paint(&mut self, _b: Duration, _c: &dyn Clock) -> Result<bool, RenderError> {
                Ok(false)
            }
            fn render(&mut self) -> Result<bool, RenderError> {
                Ok(false)
            }
            fn num_components(&self) -> usize {
                0
            }
            fn set_update_sender(&mut self, _sender: Option<UpdateSender>) {}
        }

        let mut belt: TimingBelt<Box<dyn RenderTarget>, _> =
            TimingBelt::new(BeltConfig::DEFAULT, ManualClock::default());
        belt.add_window(Box::new(Broken)).unwrap();
        let err = belt.cycle().unwrap_err();
        assert!(matches!(
            err,
            BeltError::Window {
                window: WindowId(9),
                phase: PhaseKind::Tick,
                ..
            }
        ));
        assert!(belt.last_render().is_none());
    }

    #[test]
    fn idle_timer_is_armed_only_when_settled() {
        let (mut belt, clock, log) = belt();
        let mut probe = Probe::new(0, &clock, &log);
        probe.render_needs_update = true;
        belt.add_window(probe).unwrap();
        belt.queue_job(|_| Ok(false));
        assert!(!belt.cycle().unwrap().idle_armed);

        belt.window_mut(WindowId(0)).unwrap().render_needs_update = false;
        assert!(belt.cycle().unwrap().idle_armed);
    }

    #[test]
    fn governor_runs_one_job_per_interval_in_fifo_order() {
        let (mut belt, clock, _) = belt();
        let order = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let o = order.clone();
            belt.queue_job(move |_| {
                o.borrow_mut().push(n);
                Ok(false)
            });
        }

        assert_eq!(belt.on_idle_timer().unwrap(), IdleOutcome::Ran { steps: 1 });
        assert_eq!(
            belt.on_idle_timer().unwrap(),
            IdleOutcome::Suppressed(IdleSuppression::TooRecent)
        );
        clock.advance(15 * MS);
        assert_eq!(belt.on_idle_timer().unwrap(), IdleOutcome::Ran { steps: 1 });
        clock.advance(15 * MS);
        assert_eq!(belt.on_idle_timer().unwrap(), IdleOutcome::Ran { steps: 1 });
        assert_eq!(belt.on_idle_timer().unwrap(), IdleOutcome::Empty);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn without_governor_idle_runs_back_to_back() {
        let (mut belt, _, _) = belt();
        belt.set_governor(false);
        belt.queue_job(|_| Ok(false));
        belt.queue_job(|_| Ok(false));
        assert_eq!(belt.on_idle_timer().unwrap(), IdleOutcome::Ran { steps: 1 });
        assert_eq!(belt.on_idle_timer().unwrap(), IdleOutcome::Ran { steps: 1 });
        assert_eq!(belt.num_jobs(), 0);
    }

    #[test]
    fn burst_drains_quick_jobs_in_one_pass() {
        let (mut belt, _, _) = belt();
        belt.set_burst_idle(true);
        for _ in 0..4 {
            belt.queue_job(|_| Ok(false));
        }
        assert_eq!(belt.on_idle_timer().unwrap(), IdleOutcome::Ran { steps: 4 });
        assert_eq!(belt.num_jobs(), 0);
    }

    #[test]
    fn burst_stops_when_the_budget_is_spent() {
        let (mut belt, clock, _) = belt();
        belt.set_burst_idle(true);
        for _ in 0..3 {
            let c = clock.clone();
            belt.queue_job(move |cx| {
                c.advance(cx.remaining());
                Ok(false)
            });
        }
        assert_eq!(belt.idle(10 * MS).unwrap(), IdleOutcome::Ran { steps: 1 });
        assert_eq!(belt.num_jobs(), 2);
    }

    #[test]
    fn resumable_job_stays_queued_and_reschedules() {
        let (mut belt, _, _) = belt();
        belt.set_governor(false);
        let mut calls = 0;
        belt.queue_job(move |_| {
            calls += 1;
            Ok(calls < 2)
        });
        belt.updates().take();

        assert_eq!(belt.on_idle_timer().unwrap(), IdleOutcome::Ran { steps: 1 });
        assert_eq!(belt.num_jobs(), 1);
        assert!(belt.updates().is_pending());
        belt.on_idle_timer().unwrap();
        assert_eq!(belt.num_jobs(), 0);
    }

    #[test]
    fn follow_up_jobs_request_a_cycle() {
        let (mut belt, _, _) = belt();
        belt.queue_job(|cx| {
            cx.queue(|_| Ok(false));
            Ok(false)
        });
        belt.updates().take();

        assert_eq!(belt.on_idle_timer().unwrap(), IdleOutcome::Ran { steps: 1 });
        assert_eq!(belt.num_jobs(), 1);
        assert!(belt.updates().is_pending(), "the follow-up must wake the host");
    }

    #[test]
    fn governor_paces_resumable_jobs_that_spend_their_budget() {
        let (mut belt, clock, _) = belt();
        let order = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let (o, c) = (order.clone(), clock.clone());
            let mut calls = 0;
            belt.queue_job(move |cx| {
                c.advance(cx.remaining());
                o.borrow_mut().push(n);
                calls += 1;
                Ok(calls < 2)
            });
        }

        for _ in 0..6 {
            assert_eq!(belt.on_idle_timer().unwrap(), IdleOutcome::Ran { steps: 1 });
            if belt.num_jobs() > 0 {
                assert_eq!(
                    belt.on_idle_timer().unwrap(),
                    IdleOutcome::Suppressed(IdleSuppression::TooRecent)
                );
            }
            clock.advance(belt.config().interval);
        }
        assert_eq!(belt.num_jobs(), 0);
        assert_eq!(*order.borrow(), vec![0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn failing_job_is_dropped_and_reported() {
        let (mut belt, _, _) = belt();
        let bad = belt.queue_job(|_| Err(Box::new(Failed)));
        belt.queue_job(|_| Ok(false));
        belt.updates().take();

        let err = belt.on_idle_timer().unwrap_err();
        assert!(matches!(err, BeltError::IdleJob { job, .. } if job == bad));
        assert_eq!(belt.num_jobs(), 1);
        assert!(belt.updates().is_pending());
    }

    #[test]
    fn zero_budget_suppresses_idle() {
        let (mut belt, _, _) = belt();
        belt.set_idle_margin(15 * MS);
        belt.queue_job(|_| Ok(false));
        assert_eq!(
            belt.on_idle_timer().unwrap(),
            IdleOutcome::Suppressed(IdleSuppression::NoTimeRemaining)
        );
        belt.set_interval(30 * MS);
        assert_eq!(belt.on_idle_timer().unwrap(), IdleOutcome::Ran { steps: 1 });
    }
}
