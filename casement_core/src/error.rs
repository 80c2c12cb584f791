// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Structural errors ([`LayoutError`], [`WindowError`]) indicate misuse of the
//! layout API and are returned from the call that caused them. Failures
//! raised by components and idle jobs are opaque boxed errors that the belt
//! wraps in [`BeltError`] together with where they happened.

use alloc::boxed::Box;

use thiserror::Error;

use crate::id::{ComponentId, JobId, WindowId};
use crate::layout::EntryId;
use crate::trace::PhaseKind;

/// An error raised by a component or render target while ticking, painting,
/// or rendering.
pub type RenderError = Box<dyn core::error::Error + Send + Sync>;

/// An error raised by an idle job.
pub type JobError = Box<dyn core::error::Error + Send + Sync>;

/// Errors from [`LayoutTree`](crate::layout::LayoutTree) operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Components can only be added along a partition axis.
    #[error("layout type must be horizontal or vertical, not entry")]
    InvalidLayoutType,

    /// The component is already placed in this tree.
    #[error("component {0:?} is already in the layout")]
    DuplicateComponent(ComponentId),

    /// The sibling reference passed to an add call is not in the tree.
    #[error("layout must contain the reference component {0:?}")]
    SiblingNotFound(ComponentId),

    /// The component whose rectangle was requested is not in the tree.
    #[error("component {0:?} is not in the layout")]
    TargetNotFound(ComponentId),

    /// The entry handle refers to a removed entry.
    #[error("stale entry handle {0:?}")]
    StaleEntry(EntryId),
}

/// Errors from [`Window`](crate::window::Window) construction and mutation.
#[derive(Debug, Error)]
pub enum WindowError {
    /// Headless surfaces need an explicit, non-empty size.
    #[error("surface size must be positive, got {width}x{height}")]
    InvalidSize {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },

    /// A layout operation failed.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// A component failed while being ticked, painted, or rendered.
    #[error("component {component:?} failed")]
    Component {
        /// The failing component.
        component: ComponentId,
        /// What the component reported.
        #[source]
        source: RenderError,
    },
}

/// Errors surfaced by [`TimingBelt`](crate::belt::TimingBelt).
#[derive(Debug, Error)]
pub enum BeltError {
    /// A window failed during a cycle. The cycle was aborted at that point.
    #[error("window {window:?} failed during {phase:?}")]
    Window {
        /// The failing window.
        window: WindowId,
        /// The phase that was running.
        phase: PhaseKind,
        /// What the window reported.
        #[source]
        source: RenderError,
    },

    /// An idle job failed. The job has been dequeued.
    #[error("idle job {job:?} failed")]
    IdleJob {
        /// The failing job.
        job: JobId,
        /// What the job reported.
        #[source]
        source: JobError,
    },

    /// A window with this id is already registered.
    #[error("window {0:?} is already registered")]
    DuplicateWindow(WindowId),
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn layout_messages_name_the_component() {
        let e = LayoutError::SiblingNotFound(ComponentId(4));
        assert_eq!(
            e.to_string(),
            "layout must contain the reference component ComponentId(4)"
        );
    }

    #[test]
    fn window_error_wraps_layout_error() {
        let e = WindowError::from(LayoutError::InvalidLayoutType);
        assert!(matches!(e, WindowError::Layout(LayoutError::InvalidLayoutType)));
        assert_eq!(
            e.to_string(),
            "layout type must be horizontal or vertical, not entry"
        );
    }

    #[test]
    fn belt_error_exposes_source() {
        use core::error::Error as _;

        let e = BeltError::IdleJob {
            job: JobId(2),
            source: Box::new(Boom),
        };
        assert_eq!(e.to_string(), "idle job JobId(2) failed");
        let source = e.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("boom"));
    }
}
