// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays split-tree storage with insertion, removal, and geometry.

use alloc::vec::Vec;

use kurbo::Rect;

use super::id::{EntryId, INVALID, LayoutType};
use super::traverse::{Children, Leaves};
use crate::error::LayoutError;
use crate::id::ComponentId;

/// The root always occupies slot 0 and is never freed.
const ROOT: u32 = 0;

/// A recursive split-tree partitioning a rectangle among components.
///
/// Every entry is either a partition (horizontal or vertical) with an ordered
/// list of children, or a leaf holding exactly one [`ComponentId`]. Entries
/// live in parallel arrays addressed by [`EntryId`] handles; removed entries
/// are recycled via a free list and generation counters catch stale handles.
///
/// The root is always a partition. Partitions emptied by a removal are pruned
/// immediately, but the root survives even when empty.
#[derive(Debug)]
pub struct LayoutTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Entry data --
    pub(crate) layout_type: Vec<LayoutType>,
    pub(crate) component: Vec<Option<ComponentId>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::horizontal()
    }
}

impl LayoutTree {
    /// Creates an empty tree whose root splits horizontally.
    #[must_use]
    pub fn horizontal() -> Self {
        Self::with_root(LayoutType::Horizontal)
    }

    /// Creates an empty tree whose root splits vertically.
    #[must_use]
    pub fn vertical() -> Self {
        Self::with_root(LayoutType::Vertical)
    }

    /// Creates an empty tree with the given root axis.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidLayoutType`] for [`LayoutType::Entry`].
    pub fn new(root: LayoutType) -> Result<Self, LayoutError> {
        if root.is_partition() {
            Ok(Self::with_root(root))
        } else {
            Err(LayoutError::InvalidLayoutType)
        }
    }

    fn with_root(root: LayoutType) -> Self {
        let mut tree = Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            layout_type: Vec::new(),
            component: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        };
        let idx = tree.alloc(root, None);
        debug_assert_eq!(idx, ROOT, "root must occupy the first slot");
        tree
    }

    // -- Insertion --

    /// Adds `component` along `layout_type` at the root.
    ///
    /// See [`add_with_type`](Self::add_with_type) for the placement rules.
    ///
    /// # Errors
    ///
    /// As for [`add_with_type`](Self::add_with_type).
    pub fn add(
        &mut self,
        component: ComponentId,
        layout_type: LayoutType,
    ) -> Result<EntryId, LayoutError> {
        self.add_with_type(self.root(), component, layout_type)
    }

    /// Adds `component` to the right of the existing leaves at the root.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::DuplicateComponent`] if the component is already
    /// in the tree.
    pub fn add_horizontal(&mut self, component: ComponentId) -> Result<EntryId, LayoutError> {
        self.add(component, LayoutType::Horizontal)
    }

    /// Adds `component` below the existing leaves at the root.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::DuplicateComponent`] if the component is already
    /// in the tree.
    pub fn add_vertical(&mut self, component: ComponentId) -> Result<EntryId, LayoutError> {
        self.add(component, LayoutType::Vertical)
    }

    /// Adds `component` beside `sibling`, splitting along `layout_type`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::SiblingNotFound`] if `sibling` is not in the
    /// tree, plus the errors of [`add_with_type`](Self::add_with_type).
    pub fn add_beside(
        &mut self,
        component: ComponentId,
        layout_type: LayoutType,
        sibling: ComponentId,
    ) -> Result<EntryId, LayoutError> {
        let at = self
            .contains(sibling)
            .ok_or(LayoutError::SiblingNotFound(sibling))?;
        self.add_with_type(at, component, layout_type)
    }

    /// Adds `component` at entry `at`, splitting along `layout_type`.
    ///
    /// When `at` is a leaf:
    /// - if its parent already splits along `layout_type`, the new leaf is
    ///   spliced in right after it;
    /// - otherwise the leaf turns into a partition of `layout_type` holding
    ///   the original component followed by the new one.
    ///
    /// When `at` is a partition:
    /// - if it splits along `layout_type`, is empty, or holds exactly one
    ///   child that is itself a partition, it takes on `layout_type` and the
    ///   new leaf is appended;
    /// - otherwise a nested partition of `layout_type` is appended and the
    ///   component is added to it.
    ///
    /// Returns the handle of the new leaf.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::InvalidLayoutType`] if `layout_type` is
    ///   [`LayoutType::Entry`].
    /// - [`LayoutError::StaleEntry`] if `at` was removed.
    /// - [`LayoutError::DuplicateComponent`] if the component is already in
    ///   the tree.
    pub fn add_with_type(
        &mut self,
        at: EntryId,
        component: ComponentId,
        layout_type: LayoutType,
    ) -> Result<EntryId, LayoutError> {
        if !layout_type.is_partition() {
            return Err(LayoutError::InvalidLayoutType);
        }
        if !self.is_alive(at) {
            return Err(LayoutError::StaleEntry(at));
        }
        if self.contains(component).is_some() {
            return Err(LayoutError::DuplicateComponent(component));
        }
        let leaf = self.insert(at.idx, component, layout_type);
        Ok(self.handle(leaf))
    }

    fn insert(&mut self, idx: u32, component: ComponentId, axis: LayoutType) -> u32 {
        let i = idx as usize;
        if self.layout_type[i] == LayoutType::Entry {
            let parent = self.parent[i];
            if parent != INVALID && self.layout_type[parent as usize] == axis {
                let leaf = self.alloc(LayoutType::Entry, Some(component));
                self.insert_after(leaf, idx);
                return leaf;
            }
            // Split the leaf in place; its component moves to a new first child.
            let original = self.component[i].take();
            self.layout_type[i] = axis;
            let first = self.alloc(LayoutType::Entry, original);
            self.append_child(idx, first);
            let leaf = self.alloc(LayoutType::Entry, Some(component));
            self.append_child(idx, leaf);
            return leaf;
        }

        let first = self.first_child[i];
        let lone_partition = first != INVALID
            && self.next_sibling[first as usize] == INVALID
            && self.layout_type[first as usize].is_partition();
        if self.layout_type[i] == axis || first == INVALID || lone_partition {
            self.layout_type[i] = axis;
            let leaf = self.alloc(LayoutType::Entry, Some(component));
            self.append_child(idx, leaf);
            leaf
        } else {
            let nested = self.alloc(axis, None);
            self.append_child(idx, nested);
            self.insert(nested, component, axis)
        }
    }

    // -- Removal --

    /// Removes `component`, pruning partitions it leaves empty.
    ///
    /// Pruning chains upward but never removes the root. Returns `false` if
    /// the component was not in the tree.
    pub fn remove(&mut self, component: ComponentId) -> bool {
        let Some(mut idx) = self.find(component) else {
            return false;
        };
        loop {
            let parent = self.parent[idx as usize];
            self.unlink_from_parent(idx);
            self.free(idx);
            if parent == ROOT || self.first_child[parent as usize] != INVALID {
                break;
            }
            idx = parent;
        }
        true
    }

    // -- Queries --

    /// Returns the handle of the root partition.
    #[must_use]
    pub fn root(&self) -> EntryId {
        self.handle(ROOT)
    }

    /// Returns the leaf holding `component`, if present.
    #[must_use]
    pub fn contains(&self, component: ComponentId) -> Option<EntryId> {
        self.find(component).map(|idx| self.handle(idx))
    }

    /// Returns the number of components in the tree.
    #[must_use]
    pub fn count(&self) -> usize {
        self.leaves().count()
    }

    /// Returns whether the tree holds no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaves().next().is_none()
    }

    /// Returns whether the given handle refers to a live entry.
    #[must_use]
    pub fn is_alive(&self, id: EntryId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Returns how the entry lays out its children.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn layout_type(&self, id: EntryId) -> LayoutType {
        self.validate(id);
        self.layout_type[id.idx as usize]
    }

    /// Returns the component held by a leaf, or `None` for a partition.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn component(&self, id: EntryId) -> Option<ComponentId> {
        self.validate(id);
        self.component[id.idx as usize]
    }

    /// Returns the parent partition of an entry, or `None` for the root.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn parent(&self, id: EntryId) -> Option<EntryId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(self.handle(p))
        }
    }

    /// Returns an iterator over the direct children of an entry.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn children(&self, id: EntryId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the components in depth-first child order.
    #[must_use]
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves::new(self, ROOT)
    }

    /// Returns the component visited just before `component`.
    #[must_use]
    pub fn previous(&self, component: ComponentId) -> Option<ComponentId> {
        let mut previous = None;
        for c in self.leaves() {
            if c == component {
                return previous;
            }
            previous = Some(c);
        }
        None
    }

    /// Returns the component visited just after `component`.
    #[must_use]
    pub fn next(&self, component: ComponentId) -> Option<ComponentId> {
        let mut leaves = self.leaves();
        leaves.find(|&c| c == component)?;
        leaves.next()
    }

    // -- Geometry --

    /// Visits every component depth-first in child order.
    ///
    /// With `root` set, each partition divides its rectangle equally among its
    /// direct children: horizontal partitions slice the width left to right,
    /// vertical partitions slice the height with the first child on top
    /// (highest `y`, bottom-left origin). Without `root`, the visitor receives
    /// `None`.
    ///
    /// The visitor returns `true` to stop. The result reports whether the
    /// traversal stopped early.
    pub fn for_each<F>(&self, root: Option<Rect>, mut visit: F) -> bool
    where
        F: FnMut(ComponentId, Option<Rect>) -> bool,
    {
        self.visit(ROOT, root, &mut visit)
    }

    /// Like [`for_each`](Self::for_each) with a known root rectangle.
    pub fn for_each_rect<F>(&self, root: Rect, mut visit: F) -> bool
    where
        F: FnMut(ComponentId, Rect) -> bool,
    {
        self.visit(ROOT, Some(root), &mut |c, rect: Option<Rect>| {
            visit(c, rect.unwrap_or(root))
        })
    }

    /// Returns every component paired with its slice of `root`.
    #[must_use]
    pub fn rects(&self, root: Rect) -> Vec<(ComponentId, Rect)> {
        let mut out = Vec::new();
        self.for_each_rect(root, |c, rect| {
            out.push((c, rect));
            false
        });
        out
    }

    /// Returns the slice of `root` allotted to `component`.
    #[must_use]
    pub fn layout_of(&self, component: ComponentId, root: Rect) -> Option<Rect> {
        let mut found = None;
        self.for_each_rect(root, |c, rect| {
            if c == component {
                found = Some(rect);
                true
            } else {
                false
            }
        });
        found
    }

    fn visit<F>(&self, idx: u32, rect: Option<Rect>, visit: &mut F) -> bool
    where
        F: FnMut(ComponentId, Option<Rect>) -> bool,
    {
        let axis = self.layout_type[idx as usize];
        if axis == LayoutType::Entry {
            return match self.component[idx as usize] {
                Some(c) => visit(c, rect),
                None => false,
            };
        }
        let n = self.child_count(idx);
        let mut child = self.first_child[idx as usize];
        let mut i = 0;
        while child != INVALID {
            let sub = rect.map(|r| slice(r, axis, i, n));
            if self.visit(child, sub, visit) {
                return true;
            }
            child = self.next_sibling[child as usize];
            i += 1;
        }
        false
    }

    // -- Internal helpers --

    fn handle(&self, idx: u32) -> EntryId {
        EntryId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn find(&self, component: ComponentId) -> Option<u32> {
        let idx = self.component.iter().position(|&c| c == Some(component))?;
        u32::try_from(idx).ok()
    }

    fn child_count(&self, idx: u32) -> usize {
        let mut n = 0;
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            n += 1;
            child = self.next_sibling[child as usize];
        }
        n
    }

    fn alloc(&mut self, layout_type: LayoutType, component: Option<ComponentId>) -> u32 {
        if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.layout_type[i] = layout_type;
            self.component[i] = component;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.layout_type.push(layout_type);
            self.component.push(component);
            self.generation.push(0);
            idx
        }
    }

    /// Releases a detached, childless slot.
    fn free(&mut self, idx: u32) {
        debug_assert_ne!(idx, ROOT, "the root is never freed");
        let i = idx as usize;
        debug_assert_eq!(self.first_child[i], INVALID, "freed entry has children");
        self.component[i] = None;
        // Bump generation so old handles immediately fail validation.
        self.generation[i] += 1;
        self.free_list.push(idx);
    }

    fn append_child(&mut self, parent: u32, child: u32) {
        self.parent[child as usize] = parent;
        let first = self.first_child[parent as usize];
        if first == INVALID {
            self.first_child[parent as usize] = child;
            return;
        }
        let mut last = first;
        while self.next_sibling[last as usize] != INVALID {
            last = self.next_sibling[last as usize];
        }
        self.next_sibling[last as usize] = child;
        self.prev_sibling[child as usize] = last;
    }

    fn insert_after(&mut self, child: u32, sibling: u32) {
        let next = self.next_sibling[sibling as usize];
        self.parent[child as usize] = self.parent[sibling as usize];
        self.prev_sibling[child as usize] = sibling;
        self.next_sibling[child as usize] = next;
        self.next_sibling[sibling as usize] = child;
        if next != INVALID {
            self.prev_sibling[next as usize] = child;
        }
    }

    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: EntryId) {
        assert!(self.is_alive(id), "stale EntryId: {id:?}");
    }
}

/// Returns the `i`th of `n` equal slices of `rect` along `axis`.
fn slice(rect: Rect, axis: LayoutType, i: usize, n: usize) -> Rect {
    let n = n as f64;
    match axis {
        LayoutType::Horizontal => {
            let w = rect.width() / n;
            Rect::from_origin_size((rect.x0 + i as f64 * w, rect.y0), (w, rect.height()))
        }
        LayoutType::Vertical => {
            let h = rect.height() / n;
            let row = n - 1.0 - i as f64;
            Rect::from_origin_size((rect.x0, rect.y0 + row * h), (rect.width(), h))
        }
        LayoutType::Entry => rect,
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;

    const A: ComponentId = ComponentId(0);
    const B: ComponentId = ComponentId(1);
    const C: ComponentId = ComponentId(2);
    const D: ComponentId = ComponentId(3);

    fn leaves(tree: &LayoutTree) -> Vec<ComponentId> {
        tree.leaves().collect()
    }

    fn kinds(tree: &LayoutTree, id: EntryId) -> Vec<LayoutType> {
        tree.children(id).map(|c| tree.layout_type(c)).collect()
    }

    #[test]
    fn same_axis_adds_are_flat() {
        let mut tree = LayoutTree::horizontal();
        tree.add_horizontal(A).unwrap();
        tree.add_horizontal(B).unwrap();
        tree.add_horizontal(C).unwrap();

        assert_eq!(leaves(&tree), vec![A, B, C]);
        assert_eq!(tree.count(), 3);
        assert_eq!(kinds(&tree, tree.root()), vec![LayoutType::Entry; 3]);
    }

    #[test]
    fn empty_root_takes_the_requested_axis() {
        let mut tree = LayoutTree::horizontal();
        tree.add_vertical(A).unwrap();
        assert_eq!(tree.layout_type(tree.root()), LayoutType::Vertical);
        assert_eq!(leaves(&tree), vec![A]);
    }

    #[test]
    fn perpendicular_add_at_root_nests_a_partition() {
        let mut tree = LayoutTree::horizontal();
        tree.add_horizontal(A).unwrap();
        tree.add_vertical(B).unwrap();

        let root = tree.root();
        assert_eq!(tree.layout_type(root), LayoutType::Horizontal);
        assert_eq!(
            kinds(&tree, root),
            vec![LayoutType::Entry, LayoutType::Vertical]
        );
        assert_eq!(leaves(&tree), vec![A, B]);

        // The root still holds a leaf, so another perpendicular add nests again.
        tree.add_vertical(C).unwrap();
        assert_eq!(tree.count(), 3);
        assert_eq!(
            kinds(&tree, root),
            vec![LayoutType::Entry, LayoutType::Vertical, LayoutType::Vertical]
        );
    }

    #[test]
    fn perpendicular_add_beside_leaf_splits_it() {
        let mut tree = LayoutTree::horizontal();
        let a = tree.add_horizontal(A).unwrap();
        let b = tree.add_beside(B, LayoutType::Vertical, A).unwrap();

        assert!(tree.contains(B).is_some());
        assert_eq!(tree.count(), 2);

        // A's old entry became a vertical partition holding [A, B].
        assert_eq!(tree.layout_type(a), LayoutType::Vertical);
        assert_eq!(tree.component(a), None);
        assert_eq!(tree.parent(b), Some(a));
        assert_eq!(tree.parent(a), Some(tree.root()));
        assert_eq!(leaves(&tree), vec![A, B]);
    }

    #[test]
    fn same_axis_add_beside_leaf_splices_after_it() {
        let mut tree = LayoutTree::horizontal();
        tree.add_horizontal(A).unwrap();
        tree.add_horizontal(C).unwrap();
        tree.add_beside(B, LayoutType::Horizontal, A).unwrap();
        assert_eq!(leaves(&tree), vec![A, B, C]);
    }

    #[test]
    fn lone_partition_child_repurposes_root() {
        let mut tree = LayoutTree::horizontal();
        tree.add_horizontal(A).unwrap();
        tree.add_vertical(B).unwrap();
        // Root is H[A, V[B]]; dropping A leaves a single partition child.
        assert!(tree.remove(A));
        tree.add_vertical(C).unwrap();

        assert_eq!(tree.layout_type(tree.root()), LayoutType::Vertical);
        assert_eq!(
            kinds(&tree, tree.root()),
            vec![LayoutType::Vertical, LayoutType::Entry]
        );
        assert_eq!(leaves(&tree), vec![B, C]);
    }

    #[test]
    fn horizontal_partition_slices_width() {
        let mut tree = LayoutTree::horizontal();
        for c in [A, B, C, D] {
            tree.add_horizontal(c).unwrap();
        }
        let rects = tree.rects(Rect::new(0.0, 0.0, 400.0, 100.0));
        let xs: Vec<f64> = rects.iter().map(|(_, r)| r.x0).collect();
        assert_eq!(xs, vec![0.0, 100.0, 200.0, 300.0]);
        for (_, r) in &rects {
            assert_eq!(r.width(), 100.0);
            assert_eq!(r.height(), 100.0);
            assert_eq!(r.y0, 0.0);
        }
    }

    #[test]
    fn vertical_partition_puts_first_child_on_top() {
        let mut tree = LayoutTree::vertical();
        tree.add_vertical(A).unwrap();
        tree.add_vertical(B).unwrap();
        let root = Rect::new(10.0, 0.0, 110.0, 200.0);
        assert_eq!(
            tree.layout_of(A, root),
            Some(Rect::new(10.0, 100.0, 110.0, 200.0))
        );
        assert_eq!(
            tree.layout_of(B, root),
            Some(Rect::new(10.0, 0.0, 110.0, 100.0))
        );
    }

    #[test]
    fn nested_partitions_subdivide_their_slice() {
        let mut tree = LayoutTree::horizontal();
        tree.add_horizontal(A).unwrap();
        tree.add_horizontal(B).unwrap();
        tree.add_beside(C, LayoutType::Vertical, B).unwrap();
        let root = Rect::new(0.0, 0.0, 200.0, 100.0);
        assert_eq!(tree.layout_of(A, root), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(tree.layout_of(B, root), Some(Rect::new(100.0, 50.0, 200.0, 100.0)));
        assert_eq!(tree.layout_of(C, root), Some(Rect::new(100.0, 0.0, 200.0, 50.0)));
        assert_eq!(tree.layout_of(D, root), None);
    }

    #[test]
    fn for_each_without_rect_passes_none_and_short_circuits() {
        let mut tree = LayoutTree::horizontal();
        for c in [A, B, C] {
            tree.add_horizontal(c).unwrap();
        }
        let mut seen = Vec::new();
        let stopped = tree.for_each(None, |c, rect| {
            assert!(rect.is_none(), "no root rect was given");
            seen.push(c);
            c == B
        });
        assert!(stopped);
        assert_eq!(seen, vec![A, B]);
        assert!(!tree.for_each(None, |_, _| false));
    }

    #[test]
    fn remove_prunes_emptied_partitions() {
        let mut tree = LayoutTree::horizontal();
        tree.add_horizontal(A).unwrap();
        tree.add_vertical(B).unwrap();
        let nested = tree.parent(tree.contains(B).unwrap()).unwrap();

        assert!(tree.remove(B));
        assert!(!tree.is_alive(nested));
        assert_eq!(kinds(&tree, tree.root()), vec![LayoutType::Entry]);

        assert!(tree.remove(A));
        assert!(tree.is_empty());
        assert!(tree.is_alive(tree.root()));
        assert!(!tree.remove(A));
    }

    #[test]
    fn remove_keeps_partitions_with_remaining_children() {
        let mut tree = LayoutTree::horizontal();
        tree.add_horizontal(A).unwrap();
        tree.add_beside(B, LayoutType::Vertical, A).unwrap();
        tree.add_beside(C, LayoutType::Vertical, B).unwrap();
        assert!(tree.remove(B));
        assert_eq!(leaves(&tree), vec![A, C]);
        assert_eq!(tree.count(), 2);
    }

    #[test]
    fn previous_and_next_follow_traversal_order() {
        let mut tree = LayoutTree::horizontal();
        tree.add_horizontal(A).unwrap();
        tree.add_vertical(B).unwrap();
        tree.add_horizontal(C).unwrap();
        assert_eq!(leaves(&tree), vec![A, B, C]);
        assert_eq!(tree.previous(A), None);
        assert_eq!(tree.previous(C), Some(B));
        assert_eq!(tree.next(A), Some(B));
        assert_eq!(tree.next(C), None);
        assert_eq!(tree.next(D), None);
    }

    #[test]
    fn duplicate_component_is_rejected() {
        let mut tree = LayoutTree::horizontal();
        tree.add_horizontal(A).unwrap();
        assert_eq!(
            tree.add_vertical(A),
            Err(LayoutError::DuplicateComponent(A))
        );
        assert_eq!(tree.count(), 1);
    }

    #[test]
    fn entry_axis_is_rejected() {
        let mut tree = LayoutTree::horizontal();
        assert_eq!(
            tree.add(A, LayoutType::Entry),
            Err(LayoutError::InvalidLayoutType)
        );
        assert!(matches!(
            LayoutTree::new(LayoutType::Entry),
            Err(LayoutError::InvalidLayoutType)
        ));
    }

    #[test]
    fn missing_sibling_is_rejected() {
        let mut tree = LayoutTree::horizontal();
        assert_eq!(
            tree.add_beside(A, LayoutType::Horizontal, B),
            Err(LayoutError::SiblingNotFound(B))
        );
    }

    #[test]
    fn stale_entry_is_rejected_after_reuse() {
        let mut tree = LayoutTree::horizontal();
        let a = tree.add_horizontal(A).unwrap();
        tree.remove(A);
        let b = tree.add_horizontal(B).unwrap();
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert_eq!(
            tree.add_with_type(a, C, LayoutType::Horizontal),
            Err(LayoutError::StaleEntry(a))
        );
    }

    #[test]
    #[should_panic(expected = "stale EntryId")]
    fn stale_handle_panics_on_query() {
        let mut tree = LayoutTree::horizontal();
        let a = tree.add_horizontal(A).unwrap();
        tree.remove(A);
        let _ = tree.layout_type(a);
    }
}
