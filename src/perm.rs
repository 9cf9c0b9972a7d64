// CLASSIFICATION: COMMUNITY
// Filename: perm.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-16

//! Derived permission labels.
//!
//! Every node carries a [`PermissionState`] computed from its parent's
//! state and its own component name. Nothing here is stored on the lower
//! filesystem; re-deriving one node only needs its parent's current state.

use std::sync::{Arc, Weak};

use crate::error::{Result, SdcardError};
use crate::ids::{AppIdentity, Uid, UserId};
use crate::node::Node;

/// Label classes produced by the derivation grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PermissionClass {
    /// No dedicated rule fired; behaves as the parent.
    Inherit,
    /// Synthetic top of a multi-user layout; children are per-user roots.
    PreRoot,
    /// Root of one user's view.
    Root,
    /// `<root>/Android`
    Android,
    /// `<root>/Android/data`
    AndroidData,
    /// `<root>/Android/obb`
    AndroidObb,
    /// `<root>/Android/media`
    AndroidMedia,
    /// A package directory under data, obb or media.
    AndroidPackage,
    /// `cache` directly under a package directory.
    AndroidPackageCache,
}

/// Per-node derived record.
#[derive(Clone, Debug)]
pub struct PermissionState {
    pub class: PermissionClass,
    pub user_id: UserId,
    pub derived_uid: Uid,
    pub under_android: bool,
    pub under_cache: bool,
    pub under_obb: bool,
    /// Most specific ancestor (possibly self) owning this region. Lookup only.
    pub top: Weak<Node>,
}

impl PartialEq for PermissionState {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class
            && self.user_id == other.user_id
            && self.derived_uid == other.derived_uid
            && self.under_android == other.under_android
            && self.under_cache == other.under_cache
            && self.under_obb == other.under_obb
            && Weak::ptr_eq(&self.top, &other.top)
    }
}

impl Eq for PermissionState {}

impl PermissionState {
    /// Seed state for a mount root. All sticky flags start cleared.
    pub fn seed(class: PermissionClass, user_id: UserId, uid: Uid, top: Weak<Node>) -> Self {
        Self {
            class,
            user_id,
            derived_uid: uid,
            under_android: false,
            under_cache: false,
            under_obb: false,
            top,
        }
    }

    /// Copy of `parent` with the class reset to [`PermissionClass::Inherit`].
    pub fn inherit(parent: &PermissionState) -> Self {
        Self {
            class: PermissionClass::Inherit,
            ..parent.clone()
        }
    }

    /// Upgrade the top-ancestor reference if the node is still alive.
    pub fn top_ancestor(&self) -> Option<Arc<Node>> {
        self.top.upgrade()
    }
}

/// Whole-component, ASCII case-insensitive name match.
pub fn name_matches(name: &str, expected: &str) -> bool {
    name.eq_ignore_ascii_case(expected)
}

/// Strict decimal parse of a per-user root directory name.
pub fn parse_user_id(name: &str) -> Result<UserId> {
    name.trim_end_matches('\n')
        .parse::<UserId>()
        .map_err(|_| SdcardError::MalformedUserId(name.to_string()))
}

/// Derive the state of `child` named `name` under `parent`.
///
/// `name` is caller supplied and may differ from the node's stored name,
/// which is what lets renames derive the new label before relinking.
pub fn derive(
    parent: &PermissionState,
    child: &Weak<Node>,
    name: &str,
    is_dir: bool,
    ids: &dyn AppIdentity,
) -> PermissionState {
    let mut state = PermissionState::inherit(parent);
    if !is_dir {
        return state;
    }

    let fired = match parent.class {
        PermissionClass::Inherit | PermissionClass::AndroidPackageCache => false,
        PermissionClass::PreRoot => {
            state.class = PermissionClass::Root;
            state.user_id = parse_user_id(name).unwrap_or(0);
            true
        }
        PermissionClass::Root => {
            if name_matches(name, "Android") {
                state.class = PermissionClass::Android;
                state.under_android = true;
                true
            } else {
                false
            }
        }
        PermissionClass::Android => {
            if name_matches(name, "data") {
                state.class = PermissionClass::AndroidData;
                true
            } else if name_matches(name, "obb") {
                state.class = PermissionClass::AndroidObb;
                state.under_obb = true;
                true
            } else if name_matches(name, "media") {
                state.class = PermissionClass::AndroidMedia;
                true
            } else {
                false
            }
        }
        PermissionClass::AndroidData
        | PermissionClass::AndroidObb
        | PermissionClass::AndroidMedia => {
            state.class = PermissionClass::AndroidPackage;
            let app_id = ids.app_id_of(name);
            if app_id != 0 && !ids.is_excluded(name, parent.user_id) {
                state.derived_uid = ids.derive_uid(parent.user_id, app_id);
            }
            true
        }
        PermissionClass::AndroidPackage => {
            if name_matches(name, "cache") {
                state.class = PermissionClass::AndroidPackageCache;
                state.under_cache = true;
                true
            } else {
                false
            }
        }
    };

    if fired {
        state.top = child.clone();
    }
    state
}
