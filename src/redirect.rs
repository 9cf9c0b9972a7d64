// CLASSIFICATION: COMMUNITY
// Filename: redirect.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-16

//! OBB redirection.
//!
//! One logical directory per view (`Android/obb`, or `obb` directly under
//! the pre-root in multi-user layouts) is served from a single shared OBB
//! root instead of its natural location. The natural location is kept so
//! mkdir/rmdir of the alias point still reach the real backing directory.

use std::fmt;
use std::path::PathBuf;

use log::{debug, info, warn};
use spin::RwLock;

use crate::error::{Result, SdcardError};
use crate::handle::{PathHandle, PathPin};
use crate::ids::UserId;
use crate::node::Node;
use crate::perm::{name_matches, PermissionClass};

/// Per-directory redirect record. Guarded by the node's redirect lock.
#[derive(Debug, Default)]
pub struct RedirectState {
    natural: Option<PathHandle>,
    active: Option<PathHandle>,
    redirected: bool,
}

/// Why an established redirect can no longer be trusted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StaleReason {
    /// Original location recorded but nothing is being served.
    MissingActive,
    /// The served directory was removed or replaced.
    Unlinked,
    /// The served directory is no longer the configured OBB root.
    RootMismatch,
    /// The served path cannot be rendered for comparison.
    Unresolvable,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StaleReason::MissingActive => "no active location",
            StaleReason::Unlinked => "active location unlinked",
            StaleReason::RootMismatch => "active location differs from configured obb root",
            StaleReason::Unresolvable => "active location path unresolvable",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedirectStatus {
    /// No redirect metadata on this node.
    NotRedirected,
    Live,
    Stale(StaleReason),
}

impl RedirectStatus {
    pub fn is_stale(&self) -> bool {
        matches!(self, RedirectStatus::Stale(_))
    }
}

/// True when `name` under a `parent_class` directory is the base OBB point.
pub fn is_redirect_candidate(
    parent_class: PermissionClass,
    multiuser: bool,
    _user_id: UserId,
    name: &str,
) -> bool {
    if !name_matches(name, "obb") {
        return false;
    }
    if multiuser {
        parent_class == PermissionClass::PreRoot
    } else {
        parent_class == PermissionClass::Android
    }
}

/// True when `Android/obb` must be grafted onto the shared OBB root.
///
/// Single-user user 0 is skipped: its `Android/obb` already is the root.
pub fn needs_graft(
    parent_class: PermissionClass,
    multiuser: bool,
    user_id: UserId,
    name: &str,
) -> bool {
    parent_class == PermissionClass::Android
        && name_matches(name, "obb")
        && !(!multiuser && user_id == 0)
}

/// Pin the node's active location, or report why there is none.
fn pin_active(node: &Node) -> std::result::Result<PathPin, RedirectStatus> {
    let rs = node.redirect_state();
    if rs.natural.is_none() {
        return Err(RedirectStatus::NotRedirected);
    }
    match (rs.redirected, rs.active.as_ref()) {
        (true, Some(active)) => Ok(active.pin()),
        _ => Err(RedirectStatus::Stale(StaleReason::MissingActive)),
    }
}

/// Establishes and validates OBB redirects against the configured root.
pub struct RedirectionController {
    obb_root: RwLock<String>,
}

impl RedirectionController {
    pub fn new(obb_root: impl Into<String>) -> Self {
        Self {
            obb_root: RwLock::new(obb_root.into()),
        }
    }

    /// Currently configured OBB root path text.
    pub fn obb_root(&self) -> String {
        self.obb_root.read().clone()
    }

    /// Reconfigure the OBB root. Existing redirects become stale if they
    /// no longer match.
    pub fn set_obb_root(&self, root: impl Into<String>) {
        let root = root.into();
        info!("obb root reconfigured to {:?}", root);
        *self.obb_root.write() = root;
    }

    /// Graft `node` onto the configured OBB root.
    ///
    /// On success `natural` is kept as the node's original location and the
    /// resolved root becomes the served location. On failure the node's
    /// redirect state is left exactly as it was.
    pub fn establish(&self, node: &Node, natural: PathHandle) -> Result<PathHandle> {
        let root = self.obb_root();
        let resolved = PathHandle::resolve_dir(&root).map_err(|source| {
            info!("obb root {:?} is not available: {}", root, source);
            SdcardError::RedirectUnavailable {
                path: PathBuf::from(&root),
                source,
            }
        })?;

        let mut rs = node.redirect_state();
        rs.natural = Some(natural);
        rs.active = Some(resolved.clone());
        rs.redirected = true;
        debug!("grafted {} onto {}", node.path(), resolved.path().display());
        Ok(resolved)
    }

    /// Classify the node's redirect against the configured root.
    ///
    /// The active location is pinned under the redirect lock; the
    /// filesystem probe runs after the lock is released.
    pub fn status(&self, node: &Node) -> RedirectStatus {
        let root = self.obb_root();
        let pin = match pin_active(node) {
            Ok(pin) => pin,
            Err(status) => return status,
        };
        if pin.is_unlinked() {
            return RedirectStatus::Stale(StaleReason::Unlinked);
        }
        match pin.path().to_str() {
            Some(text) if text.eq_ignore_ascii_case(&root) => RedirectStatus::Live,
            Some(_) => RedirectStatus::Stale(StaleReason::RootMismatch),
            None => RedirectStatus::Stale(StaleReason::Unresolvable),
        }
    }

    pub fn is_stale(&self, node: &Node) -> bool {
        let status = self.status(node);
        if let RedirectStatus::Stale(reason) = status {
            debug!("redirect of {} is stale: {}", node.path(), reason);
        }
        status.is_stale()
    }

    /// Typed form of [`Self::status`] for callers that propagate errors.
    pub fn validate(&self, node: &Node) -> Result<()> {
        match self.status(node) {
            RedirectStatus::NotRedirected | RedirectStatus::Live => Ok(()),
            RedirectStatus::Stale(StaleReason::MissingActive) => {
                Err(SdcardError::InconsistentRedirectState)
            }
            RedirectStatus::Stale(reason) => Err(SdcardError::StaleRedirect(reason)),
        }
    }

    /// Drop the served location, keeping the original for re-grafting.
    ///
    /// Returns the dropped active handle.
    pub fn tear_down(&self, node: &Node) -> Option<PathHandle> {
        let mut rs = node.redirect_state();
        rs.redirected = false;
        let dropped = rs.active.take();
        if dropped.is_some() {
            warn!("redirect of {} torn down", node.path());
        }
        dropped
    }

    /// Location the layer should serve I/O from.
    pub fn served_location(&self, node: &Node) -> Option<PathHandle> {
        let rs = node.redirect_state();
        if rs.redirected {
            rs.active.clone()
        } else {
            rs.natural.clone()
        }
    }

    /// Original backing location of a grafted node.
    pub fn natural_location(&self, node: &Node) -> Option<PathHandle> {
        node.redirect_state().natural.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_depends_on_layout() {
        assert!(is_redirect_candidate(PermissionClass::Android, false, 0, "obb"));
        assert!(is_redirect_candidate(PermissionClass::Android, false, 0, "OBB"));
        assert!(!is_redirect_candidate(PermissionClass::Android, true, 0, "obb"));
        assert!(is_redirect_candidate(PermissionClass::PreRoot, true, 0, "obb"));
        assert!(!is_redirect_candidate(PermissionClass::PreRoot, false, 0, "obb"));
        assert!(!is_redirect_candidate(PermissionClass::Android, false, 0, "data"));
    }

    #[test]
    fn graft_skips_single_user_zero() {
        assert!(!needs_graft(PermissionClass::Android, false, 0, "obb"));
        assert!(needs_graft(PermissionClass::Android, false, 5, "obb"));
        assert!(needs_graft(PermissionClass::Android, true, 0, "Obb"));
        assert!(!needs_graft(PermissionClass::PreRoot, true, 0, "obb"));
        assert!(!needs_graft(PermissionClass::Android, true, 3, "media"));
    }

    #[test]
    fn active_pin_outlives_redirect_lock() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let node = Node::new_root(0o040771, |me| {
            crate::perm::PermissionState::seed(PermissionClass::Root, 0, 0, me.clone())
        });
        let ctl = RedirectionController::new(root.to_str().unwrap());
        assert_eq!(pin_active(&node).err(), Some(RedirectStatus::NotRedirected));

        let natural = PathHandle::resolve_dir(dir.path()).unwrap();
        let active = ctl.establish(&node, natural).unwrap();
        let pin = pin_active(&node).unwrap();
        assert!(node.try_redirect_state().is_some());
        assert_eq!(active.pin_count(), 1);
        drop(pin);
        assert_eq!(active.pin_count(), 0);
        assert_eq!(ctl.status(&node), RedirectStatus::Live);
    }

    #[test]
    fn stale_reason_text() {
        assert_eq!(StaleReason::Unlinked.to_string(), "active location unlinked");
        assert!(RedirectStatus::Stale(StaleReason::RootMismatch).is_stale());
        assert!(!RedirectStatus::Live.is_stale());
    }
}
