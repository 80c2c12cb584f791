// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec;
use alloc::vec::Vec;

use super::id::{EntryId, INVALID, LayoutType};
use super::tree::LayoutTree;
use crate::id::ComponentId;

/// An iterator over the direct children of a partition.
///
/// Created by [`LayoutTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a LayoutTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a LayoutTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = EntryId;

    fn next(&mut self) -> Option<EntryId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(EntryId {
            idx,
            generation: self.tree.generation[idx as usize],
        })
    }
}

/// A depth-first iterator over the components of a tree, in child order.
///
/// Created by [`LayoutTree::leaves`]. This is the same order in which
/// [`LayoutTree::for_each`] visits leaves.
#[derive(Debug)]
pub struct Leaves<'a> {
    tree: &'a LayoutTree,
    // One sibling cursor per open partition.
    cursors: Vec<u32>,
}

impl<'a> Leaves<'a> {
    pub(crate) fn new(tree: &'a LayoutTree, root: u32) -> Self {
        Self {
            tree,
            cursors: vec![tree.first_child[root as usize]],
        }
    }
}

impl Iterator for Leaves<'_> {
    type Item = ComponentId;

    fn next(&mut self) -> Option<ComponentId> {
        loop {
            let cursor = self.cursors.last_mut()?;
            let idx = *cursor;
            if idx == INVALID {
                self.cursors.pop();
                continue;
            }
            *cursor = self.tree.next_sibling[idx as usize];
            match self.tree.layout_type[idx as usize] {
                LayoutType::Entry => {
                    if let Some(component) = self.tree.component[idx as usize] {
                        return Some(component);
                    }
                }
                _ => self.cursors.push(self.tree.first_child[idx as usize]),
            }
        }
    }
}
