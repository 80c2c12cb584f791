// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser host for the timing belt.
//!
//! [`BeltDriver`] owns a [`TimingBelt`] and connects it to the browser's
//! scheduling primitives:
//!
//! - the belt's update waker requests one `requestAnimationFrame` callback,
//!   which runs [`TimingBelt::run_frame`];
//! - a cycle that reports [`idle_armed`](casement_core::trace::CycleSummary::idle_armed)
//!   sets a `setTimeout` for the configured interval, which runs
//!   [`TimingBelt::on_idle_timer`].
//!
//! Only one frame callback and one idle timer are outstanding at a time.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};
use core::time::Duration;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use casement_core::belt::TimingBelt;
use casement_core::error::BeltError;
use casement_core::trace::{TraceSink, Tracer};
use casement_core::window::RenderTarget;

use crate::PerformanceClock;

// Direct global bindings instead of `web_sys::Window` methods: avoids
// fetching (and unwrapping) the Window/Performance objects on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

type Belt<W> = TimingBelt<W, PerformanceClock>;
type ErrorHandler = Box<dyn FnMut(BeltError)>;

/// Drives a [`TimingBelt`] from `requestAnimationFrame` and `setTimeout`.
///
/// Create with [`BeltDriver::new`], then call [`start`](Self::start). Use
/// [`with_belt`](Self::with_belt) to add windows and queue jobs; those
/// requests arm the next frame automatically. Dropping the driver cancels
/// any outstanding callbacks.
pub struct BeltDriver<W: RenderTarget + 'static> {
    inner: Rc<Inner<W>>,
}

struct Inner<W: RenderTarget + 'static> {
    belt: RefCell<Belt<W>>,
    frame: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    idle: RefCell<Option<Closure<dyn FnMut()>>>,
    sink: RefCell<Option<Box<dyn TraceSink>>>,
    on_error: RefCell<ErrorHandler>,
    running: Cell<bool>,
    raf_id: Cell<Option<i32>>,
    timeout_id: Cell<Option<i32>>,
}

impl<W: RenderTarget + 'static> BeltDriver<W> {
    /// Wraps `belt`. The driver is **not yet running**.
    ///
    /// Errors from cycles and idle jobs are dropped until
    /// [`set_error_handler`](Self::set_error_handler) installs a handler.
    pub fn new(belt: Belt<W>) -> Self {
        let inner = Rc::new(Inner {
            belt: RefCell::new(belt),
            frame: RefCell::new(None),
            idle: RefCell::new(None),
            sink: RefCell::new(None),
            on_error: RefCell::new(Box::new(|_| {})),
            running: Cell::new(false),
            raf_id: Cell::new(None),
            timeout_id: Cell::new(None),
        });

        // The closures hold weak references so the driver owns the only
        // strong one.
        let weak = Rc::downgrade(&inner);
        *inner.frame.borrow_mut() = Some(Closure::wrap(Box::new(move |_timestamp_ms: f64| {
            if let Some(inner) = weak.upgrade() {
                inner.raf_id.set(None);
                inner.run_frame();
            }
        }) as Box<dyn FnMut(f64)>));

        let weak = Rc::downgrade(&inner);
        *inner.idle.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.timeout_id.set(None);
                inner.run_idle();
            }
        }) as Box<dyn FnMut()>));

        let weak: Weak<Inner<W>> = Rc::downgrade(&inner);
        inner.belt.borrow().updates().set_waker(move || {
            if let Some(inner) = weak.upgrade() {
                inner.request_frame();
            }
        });

        Self { inner }
    }

    /// Starts responding to update requests.
    ///
    /// If a cycle is already pending, a frame is requested immediately. If
    /// already running, this is a no-op.
    pub fn start(&self) {
        if self.inner.running.replace(true) {
            return;
        }
        if self.inner.belt.borrow().updates().is_pending() {
            self.inner.request_frame();
        }
    }

    /// Cancels outstanding callbacks. Update requests keep accumulating and
    /// are served after the next [`start`](Self::start).
    pub fn stop(&self) {
        if !self.inner.running.replace(false) {
            return;
        }
        if let Some(id) = self.inner.raf_id.take() {
            cancel_animation_frame(id);
        }
        if let Some(id) = self.inner.timeout_id.take() {
            clear_timeout(id);
        }
    }

    /// Returns `true` if the driver is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Runs `f` with mutable access to the belt.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a window, component, or idle job while
    /// the driver is running a cycle.
    pub fn with_belt<R>(&self, f: impl FnOnce(&mut Belt<W>) -> R) -> R {
        f(&mut self.inner.belt.borrow_mut())
    }

    /// Sends trace events from every cycle and idle pass to `sink`.
    pub fn set_trace_sink(&self, sink: Option<Box<dyn TraceSink>>) {
        *self.inner.sink.borrow_mut() = sink;
    }

    /// Installs the handler that receives cycle and idle job errors.
    pub fn set_error_handler(&self, handler: impl FnMut(BeltError) + 'static) {
        *self.inner.on_error.borrow_mut() = Box::new(handler);
    }
}

impl<W: RenderTarget + 'static> Inner<W> {
    fn request_frame(&self) {
        if !self.running.get() || self.raf_id.get().is_some() {
            return;
        }
        if let Some(closure) = self.frame.borrow().as_ref() {
            self.raf_id
                .set(Some(request_animation_frame(closure.as_ref().unchecked_ref())));
        }
    }

    fn arm_idle(&self, delay: Duration) {
        if !self.running.get() || self.timeout_id.get().is_some() {
            return;
        }
        let ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        if let Some(closure) = self.idle.borrow().as_ref() {
            self.timeout_id
                .set(Some(set_timeout(closure.as_ref().unchecked_ref(), ms)));
        }
    }

    fn run_frame(&self) {
        if !self.running.get() {
            return;
        }
        let result = {
            let mut belt = self.belt.borrow_mut();
            let mut sink = self.sink.borrow_mut();
            let mut tracer = match sink.as_deref_mut() {
                Some(sink) => Tracer::new(sink),
                None => Tracer::none(),
            };
            belt.run_frame_with(&mut tracer)
                .map(|summary| summary.filter(|s| s.idle_armed).map(|_| belt.config().interval))
        };
        match result {
            Ok(Some(delay)) => self.arm_idle(delay),
            Ok(None) => {}
            Err(e) => self.report(e),
        }
    }

    fn run_idle(&self) {
        if !self.running.get() {
            return;
        }
        let (result, rearm) = {
            let mut belt = self.belt.borrow_mut();
            let mut sink = self.sink.borrow_mut();
            let mut tracer = match sink.as_deref_mut() {
                Some(sink) => Tracer::new(sink),
                None => Tracer::none(),
            };
            let result = belt.on_idle_timer_with(&mut tracer);
            // Jobs left behind with no cycle pending would otherwise wait
            // for an unrelated update.
            let rearm = (belt.num_jobs() > 0 && !belt.updates().is_pending())
                .then(|| belt.config().interval);
            (result, rearm)
        };
        if let Some(delay) = rearm {
            self.arm_idle(delay);
        }
        if let Err(e) = result {
            self.report(e);
        }
    }

    fn report(&self, e: BeltError) {
        (self.on_error.borrow_mut())(e);
    }
}

impl<W: RenderTarget + 'static> Drop for BeltDriver<W> {
    fn drop(&mut self) {
        self.stop();
        self.inner.belt.borrow().updates().clear_waker();
        // Drop the JS closures so they don't leak.
        self.inner.frame.borrow_mut().take();
        self.inner.idle.borrow_mut().take();
    }
}

impl<W: RenderTarget + 'static> core::fmt::Debug for BeltDriver<W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BeltDriver")
            .field("running", &self.inner.running.get())
            .field("frame_requested", &self.inner.raf_id.get().is_some())
            .field("idle_armed", &self.inner.timeout_id.get().is_some())
            .finish_non_exhaustive()
    }
}
