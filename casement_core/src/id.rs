// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window, component, and job identity types.
//!
//! Identifiers are plain integers handed out by an [`IdAllocator`] owned by
//! whoever owns the identified values: the belt allocates window ids, each
//! window allocates its component ids, and the idle queue allocates job ids.

use core::fmt;

/// Identifies a window registered with a belt.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(pub u32);

impl fmt::Debug for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowId({})", self.0)
    }
}

/// Identifies a component within the window that owns it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(pub u32);

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// Identifies a queued idle job.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u32);

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({})", self.0)
    }
}

/// Hands out monotonically increasing raw ids.
#[derive(Clone, Debug, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    /// Creates an allocator whose first id is 0.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Returns the next raw id.
    ///
    /// # Panics
    ///
    /// Panics if the `u32` id space is exhausted.
    pub fn allocate(&mut self) -> u32 {
        assert!(self.next != u32::MAX, "id space exhausted");
        let id = self.next;
        self.next += 1;
        id
    }

    /// Returns how many ids have been handed out.
    #[must_use]
    pub const fn allocated(&self) -> u32 {
        self.next
    }
}
