// CLASSIFICATION: COMMUNITY
// Filename: mount.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-16

//! Entry points called by the filesystem layer.
//!
//! The layer reports lookups, creations, renames and removals; the mount
//! keeps the node tree's derived labels current and answers the OBB
//! redirection questions the layer asks before exposing a directory.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::attrs::{presented_attrs, NodeAttrs};
use crate::config::MountOptions;
use crate::error::{Result, SdcardError};
use crate::handle::PathHandle;
use crate::ids::{AppIdentity, AID_ROOT};
use crate::node::Node;
use crate::perm::{derive, parse_user_id, PermissionClass, PermissionState};
use crate::redirect::{self, RedirectStatus, RedirectionController};
use crate::refresh::SubtreeRefresher;

const ROOT_MODE: u32 = 0o040771;

/// Result of [`SdcardMount::derive_for_new_entry`].
#[derive(Debug)]
pub struct NewEntry {
    pub node: Arc<Node>,
    /// The caller must call [`SdcardMount::establish_redirect`] before
    /// exposing the node.
    pub needs_graft: bool,
}

/// One mounted view and its derived-permission tree.
pub struct SdcardMount {
    options: MountOptions,
    ids: Arc<dyn AppIdentity>,
    redirect: RedirectionController,
    root: Arc<Node>,
}

impl SdcardMount {
    /// Seed the root: `PreRoot` for multi-user layouts, `Root` otherwise.
    pub fn new(options: MountOptions, ids: Arc<dyn AppIdentity>) -> Self {
        let class = if options.multiuser {
            PermissionClass::PreRoot
        } else {
            PermissionClass::Root
        };
        let user_id = options.fs_user_id;
        let root = Node::new_root(ROOT_MODE, |me| {
            PermissionState::seed(class, user_id, AID_ROOT, me.clone())
        });
        let redirect = RedirectionController::new(options.obb_root());
        info!(
            "sdcardfs view over {} (multiuser={}, obb root {})",
            options.source,
            options.multiuser,
            redirect.obb_root()
        );
        Self {
            options,
            ids,
            redirect,
            root,
        }
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    pub fn options(&self) -> &MountOptions {
        &self.options
    }

    pub fn redirection(&self) -> &RedirectionController {
        &self.redirect
    }

    /// Walk `path` from the root, matching components case-insensitively.
    pub fn lookup(&self, path: &str) -> Option<Arc<Node>> {
        let mut node = Arc::clone(&self.root);
        for part in path.split('/').filter(|p| !p.is_empty()) {
            node = node.child(part)?;
        }
        Some(node)
    }

    /// Instantiate `name` under `parent` with its derived state.
    ///
    /// A name already linked under `parent` is re-derived and returned.
    pub fn derive_for_new_entry(
        &self,
        parent: &Arc<Node>,
        name: &str,
        is_dir: bool,
        lower_mode: u32,
    ) -> NewEntry {
        let parent_state = parent.state();
        let needs_graft = is_dir
            && redirect::needs_graft(
                parent_state.class,
                self.options.multiuser,
                parent_state.user_id,
                name,
            );

        if let Some(existing) = parent.child(name) {
            self.refresher().refresh_node(&existing);
            return NewEntry {
                node: existing,
                needs_graft,
            };
        }

        if is_dir && parent_state.class == PermissionClass::PreRoot {
            if let Err(e) = parse_user_id(name) {
                warn!("{}; treating as user 0", e);
            }
        }

        let node = Node::new_child(parent, name, is_dir, lower_mode, |me| {
            derive(&parent_state, me, name, is_dir, &*self.ids)
        });
        parent.attach(Arc::clone(&node));
        debug!("new entry {} -> {:?}", node.path(), node.state().class);
        NewEntry { node, needs_graft }
    }

    /// Commit the label `node` will carry as `new_name` under `new_parent`.
    ///
    /// Must run before the node becomes visible under its new name.
    pub fn derive_for_rename(&self, new_parent: &Arc<Node>, node: &Arc<Node>, new_name: &str) {
        let parent_state = new_parent.state();
        let state = derive(
            &parent_state,
            &Arc::downgrade(node),
            new_name,
            node.is_dir(),
            &*self.ids,
        );
        node.commit_state(state);
    }

    /// Rename `node` to `new_name` under `new_parent` and relabel its subtree.
    ///
    /// A different node already linked under the target name is replaced.
    /// The root cannot be moved and no node can move beneath itself.
    /// Returns the number of descendants relabelled.
    pub fn rename(
        &self,
        node: &Arc<Node>,
        new_parent: &Arc<Node>,
        new_name: &str,
    ) -> Result<usize> {
        if node.is_root() {
            return Err(SdcardError::InvalidRename(String::from("/")));
        }
        if new_parent.is_within(node) {
            return Err(SdcardError::InvalidRename(node.path()));
        }
        self.derive_for_rename(new_parent, node, new_name);
        if let Some(existing) = new_parent.child(new_name) {
            if existing.id() != node.id() {
                new_parent.detach(&existing);
            }
        }
        node.relink(new_parent, new_name);
        // Settles any refresh that read the old link before relink.
        self.refresh_node(node);
        let refreshed = self.refresh_subtree(node);
        debug!("renamed to {} ({} descendants relabelled)", node.path(), refreshed);
        Ok(refreshed)
    }

    /// Unlink `node` after a successful rmdir/unlink. The root cannot be removed.
    pub fn remove(&self, node: &Arc<Node>) -> bool {
        if node.is_root() {
            return false;
        }
        match node.parent() {
            Some(parent) => parent.detach(node).is_some(),
            None => false,
        }
    }

    pub fn refresh_node(&self, node: &Arc<Node>) -> bool {
        self.refresher().refresh_node(node)
    }

    pub fn refresh_subtree(&self, node: &Arc<Node>) -> usize {
        self.refresher().refresh_subtree(node)
    }

    /// Whether `node` sits where the shared OBB root is exposed.
    pub fn is_redirect_candidate(&self, node: &Node) -> bool {
        self.parent_predicate(node, redirect::is_redirect_candidate)
    }

    /// Whether `node` must be grafted onto the shared OBB root.
    pub fn needs_graft(&self, node: &Node) -> bool {
        self.parent_predicate(node, redirect::needs_graft)
    }

    /// Whether mkdir/rmdir of `node` itself must target its natural location.
    pub fn is_base_obb_path(&self, node: &Node) -> bool {
        node.is_dir() && self.is_redirect_candidate(node)
    }

    pub fn establish_redirect(&self, node: &Node, natural: PathHandle) -> Result<PathHandle> {
        self.redirect.establish(node, natural)
    }

    pub fn is_redirect_stale(&self, node: &Node) -> bool {
        self.redirect.is_stale(node)
    }

    pub fn redirect_status(&self, node: &Node) -> RedirectStatus {
        self.redirect.status(node)
    }

    pub fn validate_redirect(&self, node: &Node) -> Result<()> {
        self.redirect.validate(node)
    }

    /// Attributes to present for `node`.
    pub fn attributes(&self, node: &Node) -> NodeAttrs {
        presented_attrs(&node.state(), node.lower_mode(), &self.options)
    }

    fn refresher(&self) -> SubtreeRefresher<'_> {
        SubtreeRefresher::new(&*self.ids)
    }

    fn parent_predicate<F>(&self, node: &Node, pred: F) -> bool
    where
        F: Fn(PermissionClass, bool, u32, &str) -> bool,
    {
        match node.parent() {
            Some(parent) => {
                let ps = parent.state();
                pred(ps.class, self.options.multiuser, ps.user_id, &node.name())
            }
            None => false,
        }
    }
}
