// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The component contract and a closure-backed component.
//!
//! A [`Component`] is a visual unit placed in a window's layout. The window
//! calls it once per cycle phase:
//!
//! - [`tick`](Component::tick) with the time since the window's previous
//!   tick; returns whether the scene changed.
//! - [`paint`](Component::paint) with a slice of the window's time budget for
//!   incremental work; returns whether more work remains.
//! - [`render`](Component::render) with the size of its layout slot; returns
//!   whether it wants another cycle.
//!
//! All methods default to no-ops, so a component implements only what it
//! needs. [`ProxyComponent`] stores optional closures for each capability
//! instead of requiring a new type.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;
use core::time::Duration;

use crate::error::RenderError;
use crate::id::{ComponentId, WindowId};
use crate::update::UpdateRelay;

/// What a component receives when it is added to a window.
#[derive(Clone, Debug)]
pub struct MountContext {
    /// The owning window.
    pub window: WindowId,
    /// The id the window assigned to this component.
    pub component: ComponentId,
    /// Requests a cycle from the belt while the component stays mounted.
    pub updates: UpdateRelay,
}

/// A visual unit placed in a window's layout.
pub trait Component {
    /// Advances the component by `elapsed`. Returns whether the scene changed.
    ///
    /// # Errors
    ///
    /// Errors abort the current cycle and surface to the belt's caller.
    fn tick(&mut self, elapsed: Duration) -> Result<bool, RenderError> {
        _ = elapsed;
        Ok(false)
    }

    /// Spends up to `timeout` on incremental work. Returns whether more work
    /// remains.
    ///
    /// # Errors
    ///
    /// Errors abort the current cycle and surface to the belt's caller.
    fn paint(&mut self, timeout: Duration) -> Result<bool, RenderError> {
        _ = timeout;
        Ok(false)
    }

    /// Draws into a `width` × `height` slot. Returns whether the component
    /// wants another cycle.
    ///
    /// `avoid_if_possible` hints that the frame may be skipped when nothing
    /// changed.
    ///
    /// # Errors
    ///
    /// Errors abort the current cycle and surface to the belt's caller.
    fn render(
        &mut self,
        width: f64,
        height: f64,
        avoid_if_possible: bool,
    ) -> Result<bool, RenderError> {
        _ = (width, height, avoid_if_possible);
        Ok(false)
    }

    /// Called when the rendering context is lost (`true`) or restored.
    fn context_changed(&mut self, lost: bool) {
        _ = lost;
    }

    /// Called after the component is placed in a window.
    fn mount(&mut self, cx: &MountContext) {
        _ = cx;
    }

    /// Called after the component is removed from `window`.
    fn unmount(&mut self, window: WindowId) {
        _ = window;
    }
}

type StepFn = Box<dyn FnMut(Duration) -> Result<bool, RenderError>>;
type RenderFn = Box<dyn FnMut(f64, f64, bool) -> Result<bool, RenderError>>;
type MountFn = Box<dyn FnMut(&MountContext)>;
type UnmountFn = Box<dyn FnMut(WindowId)>;
type ContextFn = Box<dyn FnMut(bool)>;

/// A component assembled from optional closures.
///
/// Missing capabilities behave like the [`Component`] defaults. When the
/// painter or renderer returns `true`, the proxy also requests a cycle
/// through the relay it received at mount.
#[derive(Default)]
pub struct ProxyComponent {
    peer_type: String,
    ticker: Option<StepFn>,
    painter: Option<StepFn>,
    renderer: Option<RenderFn>,
    on_mount: Option<MountFn>,
    on_unmount: Option<UnmountFn>,
    on_context_changed: Option<ContextFn>,
    updates: Option<UpdateRelay>,
}

impl fmt::Debug for ProxyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyComponent")
            .field("peer_type", &self.peer_type)
            .field("ticker", &self.ticker.is_some())
            .field("painter", &self.painter.is_some())
            .field("renderer", &self.renderer.is_some())
            .field("on_mount", &self.on_mount.is_some())
            .field("on_unmount", &self.on_unmount.is_some())
            .field("on_context_changed", &self.on_context_changed.is_some())
            .field("mounted", &self.updates.is_some())
            .finish()
    }
}

impl ProxyComponent {
    /// Creates a proxy with no behavior, labeled with `peer_type`.
    #[must_use]
    pub fn new(peer_type: impl Into<String>) -> Self {
        Self {
            peer_type: peer_type.into(),
            ..Self::default()
        }
    }

    /// Returns the label identifying what this proxy stands in for.
    #[must_use]
    pub fn peer_type(&self) -> &str {
        &self.peer_type
    }

    /// Sets the tick callback.
    #[must_use]
    pub fn with_ticker(
        mut self,
        f: impl FnMut(Duration) -> Result<bool, RenderError> + 'static,
    ) -> Self {
        self.ticker = Some(Box::new(f));
        self
    }

    /// Sets the paint callback.
    #[must_use]
    pub fn with_painter(
        mut self,
        f: impl FnMut(Duration) -> Result<bool, RenderError> + 'static,
    ) -> Self {
        self.painter = Some(Box::new(f));
        self
    }

    /// Sets the render callback.
    #[must_use]
    pub fn with_renderer(
        mut self,
        f: impl FnMut(f64, f64, bool) -> Result<bool, RenderError> + 'static,
    ) -> Self {
        self.renderer = Some(Box::new(f));
        self
    }

    /// Sets the mount callback.
    #[must_use]
    pub fn with_mount(mut self, f: impl FnMut(&MountContext) + 'static) -> Self {
        self.on_mount = Some(Box::new(f));
        self
    }

    /// Sets the unmount callback.
    #[must_use]
    pub fn with_unmount(mut self, f: impl FnMut(WindowId) + 'static) -> Self {
        self.on_unmount = Some(Box::new(f));
        self
    }

    /// Sets the context-changed callback.
    #[must_use]
    pub fn with_context_changed(mut self, f: impl FnMut(bool) + 'static) -> Self {
        self.on_context_changed = Some(Box::new(f));
        self
    }

    /// Requests a cycle. Returns `false` when unmounted or already pending.
    pub fn schedule_update(&self) -> bool {
        self.updates.as_ref().is_some_and(UpdateRelay::request)
    }

    fn request_if(&self, more: bool) -> bool {
        if more {
            self.schedule_update();
        }
        more
    }
}

impl Component for ProxyComponent {
    fn tick(&mut self, elapsed: Duration) -> Result<bool, RenderError> {
        match &mut self.ticker {
            Some(f) => f(elapsed),
            None => Ok(false),
        }
    }

    fn paint(&mut self, timeout: Duration) -> Result<bool, RenderError> {
        let more = match &mut self.painter {
            Some(f) => f(timeout)?,
            None => false,
        };
        Ok(self.request_if(more))
    }

    fn render(
        &mut self,
        width: f64,
        height: f64,
        avoid_if_possible: bool,
    ) -> Result<bool, RenderError> {
        let more = match &mut self.renderer {
            Some(f) => f(width, height, avoid_if_possible)?,
            None => false,
        };
        Ok(self.request_if(more))
    }

    fn context_changed(&mut self, lost: bool) {
        if let Some(f) = &mut self.on_context_changed {
            f(lost);
        }
    }

    fn mount(&mut self, cx: &MountContext) {
        self.updates = Some(cx.updates.clone());
        if let Some(f) = &mut self.on_mount {
            f(cx);
        }
    }

    fn unmount(&mut self, window: WindowId) {
        self.updates = None;
        if let Some(f) = &mut self.on_unmount {
            f(window);
        }
    }
}
