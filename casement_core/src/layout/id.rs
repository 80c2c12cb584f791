// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entry identity and layout kinds.

use core::fmt;

/// Sentinel value indicating "no entry" in index fields.
pub const INVALID: u32 = u32::MAX;

/// How an entry lays out its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutType {
    /// Children are slices of the width, left to right.
    Horizontal,
    /// Children are slices of the height, first child on top.
    Vertical,
    /// A leaf holding exactly one component.
    Entry,
}

impl LayoutType {
    /// Returns whether this is a partition axis rather than a leaf.
    #[inline]
    #[must_use]
    pub const fn is_partition(self) -> bool {
        !matches!(self, Self::Entry)
    }
}

/// A handle to an entry in a [`LayoutTree`](super::LayoutTree).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after an entry is removed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl EntryId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({}@gen{})", self.idx, self.generation)
    }
}
