// CLASSIFICATION: COMMUNITY
// Filename: refresh.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-16

//! Re-derivation of existing nodes after structural changes.
//!
//! A node's label depends only on its parent's current label, so a subtree
//! is refreshed top-down: each node is rewritten before any of its children
//! are visited. Children are enumerated from a snapshot; no children lock is
//! held while a child is being refreshed.

use std::sync::Arc;

use log::debug;

use crate::ids::AppIdentity;
use crate::node::Node;
use crate::perm::derive;

pub struct SubtreeRefresher<'a> {
    ids: &'a dyn AppIdentity,
}

impl<'a> SubtreeRefresher<'a> {
    pub fn new(ids: &'a dyn AppIdentity) -> Self {
        Self { ids }
    }

    /// Re-derive `node` from its parent's current state.
    ///
    /// The mount root is seeded at mount time and is never re-derived, and
    /// a detached node has nothing to derive from. Returns false when
    /// nothing was rewritten. A derivation overtaken by a rename of `node`
    /// or a relabel of its parent is discarded and recomputed.
    pub fn refresh_node(&self, node: &Arc<Node>) -> bool {
        if node.is_root() {
            return false;
        }
        loop {
            let seen = node.version();
            let parent = match node.parent() {
                Some(p) => p,
                None => return false,
            };
            let parent_seen = parent.version();
            let parent_state = parent.state();
            let state = derive(
                &parent_state,
                &Arc::downgrade(node),
                &node.name(),
                node.is_dir(),
                self.ids,
            );
            if node.commit_state_if_current(state, seen, &parent, parent_seen) {
                return true;
            }
            debug!("inputs of {} moved during refresh; retrying", node.path());
        }
    }

    /// Refresh every descendant of `node`, parents before children.
    ///
    /// `node` itself is not re-derived. Returns the number of nodes rewritten.
    pub fn refresh_subtree(&self, node: &Arc<Node>) -> usize {
        let mut refreshed = 0;
        let mut pending = vec![Arc::clone(node)];
        while let Some(dir) = pending.pop() {
            for child in dir.children() {
                if self.refresh_node(&child) {
                    refreshed += 1;
                }
                if child.is_dir() {
                    pending.push(child);
                }
            }
        }
        debug!("refreshed {} nodes under {}", refreshed, node.path());
        refreshed
    }
}
