// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v1.1
// Author: Lukas Bower
// Date Modified: 2026-10-16

//! Derived permission overlay for an sdcard-style stackable filesystem.
//!
//! Each node's owner and traversal rights are derived from its parent's
//! label and its own name rather than stored. The `obb` expansion-file
//! directory is grafted onto one shared physical root and checked for
//! staleness when that root moves.

/// Presented uid/gid/mode
pub mod attrs;

/// Mount options
pub mod config;

pub mod error;

/// Reference-counted lower filesystem locations
pub mod handle;

/// Android user and app id collaborators
pub mod ids;

/// Filesystem-layer entry points
pub mod mount;

/// Node tree and lock discipline
pub mod node;

/// Derivation grammar
pub mod perm;

/// OBB grafting and staleness
pub mod redirect;

/// Subtree re-derivation
pub mod refresh;

pub use attrs::NodeAttrs;
pub use config::MountOptions;
pub use error::{Result, SdcardError};
pub use handle::{PathHandle, PathPin};
pub use ids::{AppIdentity, PackageTable};
pub use mount::{NewEntry, SdcardMount};
pub use node::Node;
pub use perm::{derive, PermissionClass, PermissionState};
pub use redirect::{
    is_redirect_candidate, needs_graft, RedirectStatus, RedirectionController, StaleReason,
};
pub use refresh::SubtreeRefresher;
