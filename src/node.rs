// CLASSIFICATION: COMMUNITY
// Filename: node.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-16

//! In-memory node tree mirrored from the filesystem layer's dentries.
//!
//! Nodes are `Arc`-owned by their parent's children list. Parent and
//! top-ancestor links are `Weak` so the ownership graph stays acyclic.
//!
//! Lock discipline:
//! * each node has three independent `spin::Mutex`es: derived state,
//!   redirect state, children list;
//! * state is copied out of the parent before the child's state lock is
//!   taken; no two state or redirect locks are ever held together;
//! * the children lock only guards taking a snapshot or a single
//!   insert/remove and is never held across work on a child. The one
//!   nesting is name lookup, which reads children's names under it.
//!
//! Every state commit bumps the node's version under its state lock.
//! Re-derivation commits only if neither the node's version, its parent's
//! version nor its parent link moved since the inputs were read.
//!
//! Creation and rename within one directory are serialised by the caller.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use spin::{Mutex, MutexGuard, RwLock};

use crate::perm::{name_matches, PermissionState};
use crate::redirect::RedirectState;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

pub struct Node {
    id: u64,
    root: bool,
    is_dir: bool,
    lower_mode: u32,
    name: RwLock<String>,
    parent: RwLock<Weak<Node>>,
    children: Mutex<Vec<Arc<Node>>>,
    state: Mutex<PermissionState>,
    version: AtomicU64,
    redirect: Mutex<RedirectState>,
}

impl Node {
    /// Create a mount root. `seed` receives the root's own weak reference.
    pub fn new_root<F>(lower_mode: u32, seed: F) -> Arc<Node>
    where
        F: FnOnce(&Weak<Node>) -> PermissionState,
    {
        Arc::new_cyclic(|me| Node {
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            root: true,
            is_dir: true,
            lower_mode,
            name: RwLock::new(String::from("/")),
            parent: RwLock::new(Weak::new()),
            children: Mutex::new(Vec::new()),
            state: Mutex::new(seed(me)),
            version: AtomicU64::new(0),
            redirect: Mutex::new(RedirectState::default()),
        })
    }

    /// Create an unlinked child of `parent` with its state computed by `derive`.
    ///
    /// The state exists from the moment the node does.
    pub fn new_child<F>(
        parent: &Arc<Node>,
        name: &str,
        is_dir: bool,
        lower_mode: u32,
        derive: F,
    ) -> Arc<Node>
    where
        F: FnOnce(&Weak<Node>) -> PermissionState,
    {
        Arc::new_cyclic(|me| Node {
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            root: false,
            is_dir,
            lower_mode,
            name: RwLock::new(name.to_string()),
            parent: RwLock::new(Arc::downgrade(parent)),
            children: Mutex::new(Vec::new()),
            state: Mutex::new(derive(me)),
            version: AtomicU64::new(0),
            redirect: Mutex::new(RedirectState::default()),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Mode bits of the lower inode, type bits included.
    pub fn lower_mode(&self) -> u32 {
        self.lower_mode
    }

    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    pub fn parent(&self) -> Option<Arc<Node>> {
        self.parent.read().upgrade()
    }

    /// Copy of the current derived state.
    pub fn state(&self) -> PermissionState {
        self.state.lock().clone()
    }

    /// Number of state commits since creation.
    pub(crate) fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    pub(crate) fn commit_state(&self, state: PermissionState) {
        let mut guard = self.state.lock();
        *guard = state;
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Commit `state` only if it was derived from current inputs.
    ///
    /// `seen` is this node's version and `parent_seen` the parent's version
    /// observed before the parent's state was read.
    pub(crate) fn commit_state_if_current(
        &self,
        state: PermissionState,
        seen: u64,
        parent: &Arc<Node>,
        parent_seen: u64,
    ) -> bool {
        let mut guard = self.state.lock();
        let linked = self
            .parent
            .read()
            .upgrade()
            .map_or(false, |p| Arc::ptr_eq(&p, parent));
        if !linked || self.version() != seen || parent.version() != parent_seen {
            return false;
        }
        *guard = state;
        self.version.fetch_add(1, Ordering::SeqCst);
        true
    }

    pub(crate) fn redirect_state(&self) -> MutexGuard<'_, RedirectState> {
        self.redirect.lock()
    }

    #[cfg(test)]
    pub(crate) fn try_redirect_state(&self) -> Option<MutexGuard<'_, RedirectState>> {
        self.redirect.try_lock()
    }

    /// Snapshot of the children list. The lock is released on return.
    pub fn children(&self) -> Vec<Arc<Node>> {
        self.children.lock().clone()
    }

    /// Find a linked child by case-insensitive name.
    pub fn child(&self, name: &str) -> Option<Arc<Node>> {
        self.children
            .lock()
            .iter()
            .find(|c| name_matches(&c.name.read(), name))
            .cloned()
    }

    pub(crate) fn attach(&self, child: Arc<Node>) {
        self.children.lock().push(child);
    }

    /// Unlink `child`. The removed node no longer reports a parent.
    pub(crate) fn detach(&self, child: &Node) -> Option<Arc<Node>> {
        let removed = {
            let mut children = self.children.lock();
            let pos = children.iter().position(|c| c.id == child.id)?;
            children.swap_remove(pos)
        };
        *removed.parent.write() = Weak::new();
        Some(removed)
    }

    /// Whether `self` is `other` or lies beneath it.
    pub fn is_within(&self, other: &Node) -> bool {
        if self.id == other.id {
            return true;
        }
        let mut cursor = self.parent();
        while let Some(node) = cursor {
            if node.id == other.id {
                return true;
            }
            cursor = node.parent();
        }
        false
    }

    /// Move this node under `new_parent` as `new_name`.
    pub(crate) fn relink(self: &Arc<Self>, new_parent: &Arc<Node>, new_name: &str) {
        if let Some(old_parent) = self.parent() {
            old_parent.detach(self);
        }
        *self.name.write() = new_name.to_string();
        *self.parent.write() = Arc::downgrade(new_parent);
        new_parent.attach(Arc::clone(self));
    }

    /// Slash-joined path from the mount root.
    pub fn path(&self) -> String {
        let mut parts = Vec::new();
        if !self.root {
            parts.push(self.name());
        }
        let mut cursor = self.parent();
        while let Some(node) = cursor {
            if node.root {
                break;
            }
            parts.push(node.name());
            cursor = node.parent();
        }
        parts.reverse();
        format!("/{}", parts.join("/"))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &*self.name.read())
            .field("is_dir", &self.is_dir)
            .finish()
    }
}
