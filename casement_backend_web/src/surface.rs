// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM container surface.
//!
//! [`DomSurface`] maps a window's layout onto absolutely positioned `<div>`
//! slots inside a container element. Each `clip` call during a frame claims
//! the next slot and moves it to the component's rectangle; slots left over
//! from a previous, larger frame are removed at the start of the next one.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use casement_core::error::RenderError;
use casement_core::window::Surface;
use kurbo::Rect;
use thiserror::Error;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::HtmlElement;

/// A failed DOM call, carrying the JavaScript exception's debug form.
#[derive(Clone, Debug, Error)]
#[error("DOM operation failed: {0}")]
pub struct DomError(pub String);

impl From<JsValue> for DomError {
    fn from(value: JsValue) -> Self {
        Self(format!("{value:?}"))
    }
}

/// A [`Surface`] backed by a container `HtmlElement`.
pub struct DomSurface {
    container: HtmlElement,
    slots: Vec<HtmlElement>,
    used: usize,
    error: Option<DomError>,
}

impl core::fmt::Debug for DomSurface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomSurface")
            .field("container", &"HtmlElement")
            .field("slots", &self.slots.len())
            .field("used", &self.used)
            .field("error", &self.error)
            .finish()
    }
}

impl DomSurface {
    /// Creates a surface that manages child elements of `container`.
    #[must_use]
    pub fn new(container: HtmlElement) -> Self {
        let _ = container.style().set_property("position", "relative");
        Self {
            container,
            slots: Vec::new(),
            used: 0,
            error: None,
        }
    }

    /// Returns a reference to the container element.
    #[must_use]
    pub fn container(&self) -> &HtmlElement {
        &self.container
    }

    /// Returns the slot element claimed by the `index`th component rendered
    /// in the current frame.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&HtmlElement> {
        self.slots.get(index).filter(|_| index < self.used)
    }

    fn create_slot(&self) -> Result<HtmlElement, DomError> {
        let doc = self
            .container
            .owner_document()
            .ok_or_else(|| DomError(String::from("container has no owner document")))?;
        let el: HtmlElement = doc.create_element("div")?.unchecked_into();
        let s = el.style();
        let _ = s.set_property("position", "absolute");
        let _ = s.set_property("overflow", "hidden");
        self.container.append_child(&el)?;
        Ok(el)
    }
}

/// Flips a layout rectangle (origin bottom-left) into CSS box coordinates
/// (origin top-left) within a container `height` pixels tall.
fn css_box(rect: Rect, height: f64) -> Rect {
    Rect::new(rect.x0, height - rect.y1, rect.x1, height - rect.y0)
}

impl Surface for DomSurface {
    fn size(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            f64::from(self.container.client_width().max(0)),
            f64::from(self.container.client_height().max(0)),
        )
    }

    fn begin_frame(&mut self) -> Result<bool, RenderError> {
        for el in self.slots.drain(self.used..) {
            el.remove();
        }
        self.used = 0;
        match self.error.take() {
            Some(e) => Err(e.into()),
            None => Ok(false),
        }
    }

    fn clip(&mut self, rect: Rect) {
        if self.used == self.slots.len() {
            match self.create_slot() {
                Ok(el) => self.slots.push(el),
                Err(e) => {
                    // Surfaced from the next `begin_frame`.
                    self.error.get_or_insert(e);
                    return;
                }
            }
        }
        let placed = css_box(rect, self.size().height());
        let s = self.slots[self.used].style();
        let _ = s.set_property("left", &format!("{}px", placed.x0));
        let _ = s.set_property("top", &format!("{}px", placed.y0));
        let _ = s.set_property("width", &format!("{}px", placed.width()));
        let _ = s.set_property("height", &format!("{}px", placed.height()));
        self.used += 1;
    }

    fn context_changed(&mut self, lost: bool) {
        let style = self.container.style();
        let _ = if lost {
            style.set_property("visibility", "hidden")
        } else {
            style.remove_property("visibility").map(|_| ())
        };
    }
}

#[cfg(test)]
mod tests {
    use casement_core::id::ComponentId;
    use casement_core::layout::LayoutTree;

    use super::*;

    #[test]
    fn first_vertical_child_is_placed_at_the_top() {
        let mut tree = LayoutTree::vertical();
        tree.add_vertical(ComponentId(0)).unwrap();
        tree.add_vertical(ComponentId(1)).unwrap();
        let container = Rect::new(0.0, 0.0, 300.0, 200.0);

        let rects = tree.rects(container);
        let top = css_box(rects[0].1, container.height());
        let bottom = css_box(rects[1].1, container.height());
        assert_eq!(top, Rect::new(0.0, 0.0, 300.0, 100.0));
        assert_eq!(bottom, Rect::new(0.0, 100.0, 300.0, 200.0));
    }

    #[test]
    fn horizontal_slices_keep_their_columns() {
        let rect = Rect::new(100.0, 0.0, 200.0, 50.0);
        assert_eq!(css_box(rect, 50.0), rect);
    }
}
