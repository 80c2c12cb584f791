// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Windows: a surface, a layout, and the components placed in it.
//!
//! A [`Window`] owns a [`Surface`] and a [`LayoutTree`] rooted in a horizontal
//! partition. Each cycle it splits the surface rectangle among its components
//! and forwards tick, paint, and render calls to them in layout order.
//!
//! The belt drives windows through the [`RenderTarget`] trait, which other
//! target types can implement as well.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use core::fmt;
use core::time::Duration;

use kurbo::{Rect, Size};

use crate::component::{Component, MountContext};
use crate::error::{LayoutError, RenderError, WindowError};
use crate::id::{ComponentId, IdAllocator, WindowId};
use crate::layout::{LayoutTree, LayoutType};
use crate::time::{Clock, HostTime};
use crate::update::{UpdateRelay, UpdateSender};

/// Where a window draws.
///
/// Surfaces report their size and bracket each component's drawing with a
/// clip to its layout slot. Everything but [`size`](Self::size) defaults to a
/// no-op.
pub trait Surface {
    /// The full drawable rectangle.
    fn size(&self) -> Rect;

    /// Prepares a frame before any component renders. Returns whether the
    /// surface itself wants another cycle.
    ///
    /// # Errors
    ///
    /// Errors abort the render of this window.
    fn begin_frame(&mut self) -> Result<bool, RenderError> {
        Ok(false)
    }

    /// Restricts drawing to `rect`.
    fn clip(&mut self, rect: Rect) {
        _ = rect;
    }

    /// Lifts the clip set by [`clip`](Self::clip).
    fn unclip(&mut self) {}

    /// Called when the rendering context is lost (`true`) or restored.
    fn context_changed(&mut self, lost: bool) {
        _ = lost;
    }
}

/// A headless surface with an explicit size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedSurface {
    size: Size,
}

impl FixedSurface {
    /// Creates a surface of `width` × `height`.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidSize`] unless both dimensions are
    /// positive and finite.
    pub fn new(width: f64, height: f64) -> Result<Self, WindowError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(WindowError::InvalidSize { width, height });
        }
        Ok(Self {
            size: Size::new(width, height),
        })
    }
}

impl Surface for FixedSurface {
    fn size(&self) -> Rect {
        self.size.to_rect()
    }
}

/// What the belt drives each cycle.
pub trait RenderTarget {
    /// The id the target was created with.
    fn id(&self) -> WindowId;

    /// Advances the target to `now`. Returns whether input changed the scene.
    ///
    /// # Errors
    ///
    /// Errors abort the cycle.
    fn tick(&mut self, now: HostTime) -> Result<bool, RenderError>;

    /// Spends up to `budget`, measured with `clock`, on incremental work.
    /// Returns whether more work remains.
    ///
    /// # Errors
    ///
    /// Errors abort the cycle.
    fn paint(&mut self, budget: Duration, clock: &dyn Clock) -> Result<bool, RenderError>;

    /// Draws a frame. Returns whether the target wants another cycle.
    ///
    /// # Errors
    ///
    /// Errors abort the cycle.
    fn render(&mut self) -> Result<bool, RenderError>;

    /// Number of components placed in the target.
    fn num_components(&self) -> usize;

    /// Connects the target's update requests to a belt, or disconnects them.
    fn set_update_sender(&mut self, sender: Option<UpdateSender>);
}

impl<T: RenderTarget + ?Sized> RenderTarget for Box<T> {
    fn id(&self) -> WindowId {
        (**self).id()
    }

    fn tick(&mut self, now: HostTime) -> Result<bool, RenderError> {
        (**self).tick(now)
    }

    fn paint(&mut self, budget: Duration, clock: &dyn Clock) -> Result<bool, RenderError> {
        (**self).paint(budget, clock)
    }

    fn render(&mut self) -> Result<bool, RenderError> {
        (**self).render()
    }

    fn num_components(&self) -> usize {
        (**self).num_components()
    }

    fn set_update_sender(&mut self, sender: Option<UpdateSender>) {
        (**self).set_update_sender(sender);
    }
}

struct Slot {
    component: Box<dyn Component>,
    updates: UpdateRelay,
}

/// A surface partitioned among components by a split-tree.
pub struct Window<S = FixedSurface> {
    id: WindowId,
    surface: S,
    layout: LayoutTree,
    slots: BTreeMap<ComponentId, Slot>,
    component_ids: IdAllocator,
    updates: UpdateRelay,
    last_tick: Option<HostTime>,
}

impl<S: fmt::Debug> fmt::Debug for Window<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("surface", &self.surface)
            .field("layout", &self.layout)
            .field("components", &self.slots.len())
            .field("component_ids", &self.component_ids)
            .field("updates", &self.updates)
            .field("last_tick", &self.last_tick)
            .finish()
    }
}

impl<S: Surface> Window<S> {
    /// Creates an empty window drawing to `surface`.
    pub fn new(id: WindowId, surface: S) -> Self {
        Self {
            id,
            surface,
            layout: LayoutTree::horizontal(),
            slots: BTreeMap::new(),
            component_ids: IdAllocator::new(),
            updates: UpdateRelay::new(),
            last_tick: None,
        }
    }

    /// Returns the window's id.
    #[must_use]
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Returns the surface.
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Returns the surface mutably.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Returns the layout tree.
    #[must_use]
    pub fn layout_tree(&self) -> &LayoutTree {
        &self.layout
    }

    // -- Components --

    /// Places `component` to the right, beside `sibling` or at the root.
    ///
    /// # Errors
    ///
    /// See [`add_with_type`](Self::add_with_type).
    pub fn add_horizontal(
        &mut self,
        component: impl Component + 'static,
        sibling: Option<ComponentId>,
    ) -> Result<ComponentId, WindowError> {
        self.add_with_type(Box::new(component), LayoutType::Horizontal, sibling)
    }

    /// Places `component` below, beside `sibling` or at the root.
    ///
    /// # Errors
    ///
    /// See [`add_with_type`](Self::add_with_type).
    pub fn add_vertical(
        &mut self,
        component: impl Component + 'static,
        sibling: Option<ComponentId>,
    ) -> Result<ComponentId, WindowError> {
        self.add_with_type(Box::new(component), LayoutType::Vertical, sibling)
    }

    /// Places `component` along `layout_type`, mounts it, and requests a
    /// cycle.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::SiblingNotFound`] if `sibling` is not in this window.
    /// - [`LayoutError::InvalidLayoutType`] for [`LayoutType::Entry`].
    pub fn add_with_type(
        &mut self,
        mut component: Box<dyn Component>,
        layout_type: LayoutType,
        sibling: Option<ComponentId>,
    ) -> Result<ComponentId, WindowError> {
        let at = match sibling {
            Some(s) => self
                .layout
                .contains(s)
                .ok_or(LayoutError::SiblingNotFound(s))?,
            None => self.layout.root(),
        };
        let id = ComponentId(self.component_ids.allocate());
        self.layout.add_with_type(at, id, layout_type)?;

        let updates = self.updates.child();
        component.mount(&MountContext {
            window: self.id,
            component: id,
            updates: updates.clone(),
        });
        self.slots.insert(id, Slot { component, updates });
        self.schedule_update();
        Ok(id)
    }

    /// Removes a component, returning it if it was present.
    ///
    /// Requests a cycle, then disconnects and unmounts the component.
    pub fn remove_component(&mut self, id: ComponentId) -> Option<Box<dyn Component>> {
        self.schedule_update();
        let Slot {
            mut component,
            updates,
        } = self.slots.remove(&id)?;
        updates.detach();
        component.unmount(self.id);
        self.layout.remove(id);
        Some(component)
    }

    /// Returns a component by id.
    #[must_use]
    pub fn component(&self, id: ComponentId) -> Option<&dyn Component> {
        self.slots.get(&id).map(|slot| &*slot.component)
    }

    /// Returns a component by id, mutably.
    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component> {
        // Spelled out so the trait object lifetime can shorten to the borrow.
        match self.slots.get_mut(&id) {
            Some(slot) => Some(&mut *slot.component),
            None => None,
        }
    }

    /// Number of components in the window.
    #[must_use]
    pub fn num_components(&self) -> usize {
        self.slots.len()
    }

    /// Returns the component before `id` in layout order.
    #[must_use]
    pub fn previous(&self, id: ComponentId) -> Option<ComponentId> {
        self.layout.previous(id)
    }

    /// Returns the component after `id` in layout order.
    #[must_use]
    pub fn next(&self, id: ComponentId) -> Option<ComponentId> {
        self.layout.next(id)
    }

    // -- Geometry --

    /// Visits every component with its slot of the surface, in layout order.
    ///
    /// The visitor returns `true` to stop; the result reports whether it did.
    pub fn for_each(&self, visit: impl FnMut(ComponentId, Rect) -> bool) -> bool {
        self.layout.for_each_rect(self.surface.size(), visit)
    }

    /// Returns the slot of the surface allotted to `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::TargetNotFound`] if `id` is not in this window.
    pub fn layout(&self, id: ComponentId) -> Result<Rect, LayoutError> {
        self.layout
            .layout_of(id, self.surface.size())
            .ok_or(LayoutError::TargetNotFound(id))
    }

    // -- Lifecycle --

    /// Requests a cycle from the belt. Returns `false` when not attached or
    /// already pending.
    pub fn schedule_update(&self) -> bool {
        self.updates.request()
    }

    /// Forwards a context loss or restore to the surface and components.
    pub fn context_changed(&mut self, lost: bool) {
        self.surface.context_changed(lost);
        for id in self.layout.leaves() {
            if let Some(slot) = self.slots.get_mut(&id) {
                slot.component.context_changed(lost);
            }
        }
    }

    fn component_error(component: ComponentId, source: RenderError) -> RenderError {
        Box::new(WindowError::Component { component, source })
    }
}

impl<S: Surface> RenderTarget for Window<S> {
    fn id(&self) -> WindowId {
        self.id
    }

    fn tick(&mut self, now: HostTime) -> Result<bool, RenderError> {
        let elapsed = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_tick = Some(now);

        let mut changed = false;
        for id in self.layout.leaves() {
            if let Some(slot) = self.slots.get_mut(&id) {
                changed |= slot
                    .component
                    .tick(elapsed)
                    .map_err(|e| Self::component_error(id, e))?;
            }
        }
        Ok(changed)
    }

    fn paint(&mut self, budget: Duration, clock: &dyn Clock) -> Result<bool, RenderError> {
        let count = u32::try_from(self.layout.count()).unwrap_or(u32::MAX);
        if count == 0 {
            return Ok(false);
        }
        let start = clock.now();
        let mut remaining = budget;
        let mut needs_update = false;
        loop {
            let share = remaining / count;
            let pass_start = clock.now();
            let mut more = false;
            for id in self.layout.leaves() {
                if let Some(slot) = self.slots.get_mut(&id) {
                    more |= slot
                        .component
                        .paint(share)
                        .map_err(|e| Self::component_error(id, e))?;
                }
            }
            needs_update |= more;
            let now = clock.now();
            remaining = budget.saturating_sub(now.saturating_duration_since(start));
            // A pass that took no measurable time would spin.
            if !more || remaining.is_zero() || now == pass_start {
                return Ok(needs_update);
            }
        }
    }

    fn render(&mut self) -> Result<bool, RenderError> {
        let mut needs_update = self.surface.begin_frame()?;
        for (id, rect) in self.layout.rects(self.surface.size()) {
            let Some(slot) = self.slots.get_mut(&id) else {
                continue;
            };
            self.surface.clip(rect);
            let result = slot.component.render(rect.width(), rect.height(), false);
            self.surface.unclip();
            needs_update |= result.map_err(|e| Self::component_error(id, e))?;
        }
        Ok(needs_update)
    }

    fn num_components(&self) -> usize {
        self.slots.len()
    }

    fn set_update_sender(&mut self, sender: Option<UpdateSender>) {
        self.updates.connect(sender);
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::*;
    use crate::component::ProxyComponent;
    use crate::time::ManualClock;
    use crate::update::UpdateChannel;

    #[derive(Debug, thiserror::Error)]
    #[error("broken")]
    struct Broken;

    #[derive(Debug, Default)]
    struct RecordingSurface {
        log: Vec<&'static str>,
        clips: Vec<Rect>,
        lost: Option<bool>,
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> Rect {
            Rect::new(0.0, 0.0, 200.0, 100.0)
        }

        fn begin_frame(&mut self) -> Result<bool, RenderError> {
            self.log.push("begin");
            Ok(false)
        }

        fn clip(&mut self, rect: Rect) {
            self.log.push("clip");
            self.clips.push(rect);
        }

        fn unclip(&mut self) {
            self.log.push("unclip");
        }

        fn context_changed(&mut self, lost: bool) {
            self.lost = Some(lost);
        }
    }

    fn window() -> Window<FixedSurface> {
        Window::new(WindowId(0), FixedSurface::new(400.0, 100.0).unwrap())
    }

    #[test]
    fn fixed_surface_requires_a_size() {
        assert!(matches!(
            FixedSurface::new(0.0, 10.0),
            Err(WindowError::InvalidSize { .. })
        ));
        assert!(FixedSurface::new(10.0, f64::NAN).is_err());
        let surface = FixedSurface::new(640.0, 480.0).unwrap();
        assert_eq!(surface.size(), Rect::new(0.0, 0.0, 640.0, 480.0));
    }

    #[test]
    fn components_split_the_surface() {
        let mut w = window();
        let a = w.add_horizontal(ProxyComponent::new("a"), None).unwrap();
        let b = w.add_horizontal(ProxyComponent::new("b"), None).unwrap();
        let c = w.add_vertical(ProxyComponent::new("c"), Some(b)).unwrap();

        assert_eq!(w.num_components(), 3);
        assert_eq!(w.layout(a).unwrap(), Rect::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(w.layout(b).unwrap(), Rect::new(200.0, 50.0, 400.0, 100.0));
        assert_eq!(w.layout(c).unwrap(), Rect::new(200.0, 0.0, 400.0, 50.0));
        assert_eq!(w.previous(c), Some(b));
        assert_eq!(w.next(a), Some(b));

        let mut order = Vec::new();
        assert!(!w.for_each(|id, _| {
            order.push(id);
            false
        }));
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn unknown_references_are_errors() {
        let mut w = window();
        let missing = ComponentId(99);
        assert!(matches!(
            w.add_horizontal(ProxyComponent::new("a"), Some(missing)),
            Err(WindowError::Layout(LayoutError::SiblingNotFound(id))) if id == missing
        ));
        assert_eq!(w.layout(missing), Err(LayoutError::TargetNotFound(missing)));
        assert_eq!(w.num_components(), 0);
        assert!(w.remove_component(missing).is_none());
    }

    #[test]
    fn add_and_remove_request_updates_and_mount() {
        let channel = UpdateChannel::new();
        let mut w = window();
        w.set_update_sender(Some(channel.sender()));

        let events = Rc::new(RefCell::new(Vec::new()));
        let (m, u) = (events.clone(), events.clone());
        let proxy = ProxyComponent::new("a")
            .with_mount(move |cx| m.borrow_mut().push(("mount", cx.window)))
            .with_unmount(move |w| u.borrow_mut().push(("unmount", w)));
        let a = w.add_horizontal(proxy, None).unwrap();
        assert!(channel.take());

        assert!(w.remove_component(a).is_some());
        assert!(channel.take());
        assert_eq!(
            *events.borrow(),
            vec![("mount", WindowId(0)), ("unmount", WindowId(0))]
        );
        assert!(w.layout_tree().is_empty());
    }

    #[test]
    fn removed_component_cannot_request_updates() {
        let channel = UpdateChannel::new();
        let mut w = window();
        w.set_update_sender(Some(channel.sender()));

        let relay = Rc::new(RefCell::new(None));
        let r = relay.clone();
        let a = w
            .add_horizontal(
                ProxyComponent::new("a").with_mount(move |cx| *r.borrow_mut() = Some(cx.updates.clone())),
                None,
            )
            .unwrap();
        let relay = relay.borrow_mut().take().unwrap();
        channel.take();
        assert!(relay.request());
        channel.take();

        w.remove_component(a).unwrap();
        channel.take();
        assert!(!relay.request());
        assert!(!channel.is_pending());

        w.set_update_sender(None);
        assert!(!w.schedule_update());
    }

    #[test]
    fn tick_passes_elapsed_time_and_aggregates() {
        let mut w = window();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        w.add_horizontal(
            ProxyComponent::new("a").with_ticker(move |elapsed| {
                s.borrow_mut().push(elapsed);
                Ok(false)
            }),
            None,
        )
        .unwrap();
        w.add_horizontal(
            ProxyComponent::new("b").with_ticker(|elapsed| Ok(elapsed > Duration::ZERO)),
            None,
        )
        .unwrap();

        assert!(!w.tick(HostTime(1_000)).unwrap());
        assert!(w.tick(HostTime(17_000)).unwrap());
        assert_eq!(
            *seen.borrow(),
            vec![Duration::ZERO, Duration::from_millis(16)]
        );
    }

    #[test]
    fn paint_shares_the_budget_and_repeats_while_busy() {
        let clock = ManualClock::new(HostTime::ZERO);
        let mut w = window();
        let shares = Rc::new(RefCell::new(Vec::new()));
        let (s, c) = (shares.clone(), clock.clone());
        let mut passes = 0;
        w.add_horizontal(
            ProxyComponent::new("a").with_painter(move |share| {
                s.borrow_mut().push(share);
                c.advance(Duration::from_millis(2));
                passes += 1;
                Ok(passes < 3)
            }),
            None,
        )
        .unwrap();
        w.add_horizontal(ProxyComponent::new("b"), None).unwrap();

        assert!(w.paint(Duration::from_millis(10), &clock).unwrap());
        assert_eq!(
            *shares.borrow(),
            vec![
                Duration::from_millis(5),
                Duration::from_millis(4),
                Duration::from_millis(3),
            ]
        );
    }

    #[test]
    fn paint_stops_when_the_clock_does_not_move() {
        let clock = ManualClock::new(HostTime::ZERO);
        let mut w = window();
        w.add_horizontal(ProxyComponent::new("a").with_painter(|_| Ok(true)), None)
            .unwrap();
        assert!(w.paint(Duration::from_millis(10), &clock).unwrap());
    }

    #[test]
    fn render_clips_each_component() {
        let mut w = Window::new(WindowId(1), RecordingSurface::default());
        let sizes = Rc::new(RefCell::new(Vec::new()));
        let s = sizes.clone();
        w.add_horizontal(
            ProxyComponent::new("a").with_renderer(move |width, height, avoid| {
                assert!(!avoid, "windows never ask to skip");
                s.borrow_mut().push((width, height));
                Ok(false)
            }),
            None,
        )
        .unwrap();
        w.add_vertical(ProxyComponent::new("b").with_renderer(|_, _, _| Ok(true)), None)
            .unwrap();

        assert!(w.render().unwrap());
        assert_eq!(
            w.surface().log,
            vec!["begin", "clip", "unclip", "clip", "unclip"]
        );
        assert_eq!(w.surface().clips[0], Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(*sizes.borrow(), vec![(100.0, 100.0)]);
    }

    #[test]
    fn component_errors_name_the_component() {
        let mut w = window();
        w.add_horizontal(ProxyComponent::new("ok"), None).unwrap();
        let bad = w
            .add_horizontal(
                ProxyComponent::new("bad").with_renderer(|_, _, _| Err(Box::new(Broken))),
                None,
            )
            .unwrap();

        let err = w.render().unwrap_err();
        let err = err.downcast_ref::<WindowError>().unwrap();
        assert!(matches!(err, WindowError::Component { component, .. } if *component == bad));
    }

    #[test]
    fn context_changes_reach_surface_and_components() {
        let mut w = Window::new(WindowId(2), RecordingSurface::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        for _ in 0..2 {
            let s = seen.clone();
            w.add_horizontal(
                ProxyComponent::new("gl").with_context_changed(move |lost| s.borrow_mut().push(lost)),
                None,
            )
            .unwrap();
        }
        w.context_changed(true);
        assert_eq!(w.surface().lost, Some(true));
        assert_eq!(*seen.borrow(), vec![true, true]);
    }
}
