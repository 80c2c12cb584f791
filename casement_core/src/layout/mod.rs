// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Split-tree layout.
//!
//! A [`LayoutTree`] divides a rectangle among an ordered set of components by
//! nesting horizontal and vertical partitions:
//!
//! - Each entry is identified by an [`EntryId`], a generational handle that
//!   becomes stale when the entry is removed and its slot reused.
//! - A *partition* splits its rectangle equally among its direct children
//!   along its axis. Horizontal partitions slice left to right; vertical
//!   partitions slice top to bottom in a bottom-left-origin coordinate system,
//!   so the first child gets the highest `y`.
//! - A *leaf* holds exactly one [`ComponentId`](crate::id::ComponentId).
//!
//! Adding along the axis a partition already uses extends it; adding across it
//! nests a new partition. Removing the last child of a partition prunes the
//! partition, chaining up to (but never removing) the root.
//!
//! ```text
//!   add_horizontal(A), add_horizontal(B), add_vertical(C) beside B
//!
//!   H ─┬─ A            ┌─────┬─────┐
//!      └─ V ─┬─ B      │     │  B  │
//!            └─ C      │  A  ├─────┤
//!                      │     │  C  │
//!                      └─────┴─────┘
//! ```

mod id;
mod traverse;
mod tree;

pub use id::{EntryId, INVALID, LayoutType};
pub use traverse::{Children, Leaves};
pub use tree::LayoutTree;
