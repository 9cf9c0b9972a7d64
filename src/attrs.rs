// CLASSIFICATION: COMMUNITY
// Filename: attrs.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-16

//! Ownership and mode presented to callers for a node.

use crate::config::MountOptions;
use crate::ids::{multiuser_get_uid, Gid, Uid, AID_SDCARD_RW};
use crate::perm::{PermissionClass, PermissionState};

const S_IFMT: u32 = 0o170000;

/// Attributes an enforcement layer should present for a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeAttrs {
    pub uid: Uid,
    pub gid: Gid,
    pub mode: u32,
}

/// Compute presented attributes from derived state and the lower mode.
pub fn presented_attrs(state: &PermissionState, lower_mode: u32, opts: &MountOptions) -> NodeAttrs {
    let mut visible = 0o775 & !opts.mask;
    if state.class == PermissionClass::PreRoot {
        // Secondary users must be able to traverse into their own root.
        visible = 0o711;
    } else if state.under_android {
        // Only the owning user's apps belong under Android; keep +x for the default view.
        if opts.gid == AID_SDCARD_RW {
            visible &= !0o006;
        } else {
            visible &= !0o007;
        }
    }

    let owner = lower_mode & 0o700;
    let filtered = visible & (owner | (owner >> 3) | (owner >> 6));

    NodeAttrs {
        uid: state.derived_uid,
        gid: presented_gid(state, opts),
        mode: (lower_mode & S_IFMT) | filtered,
    }
}

fn presented_gid(state: &PermissionState, opts: &MountOptions) -> Gid {
    if opts.gid == AID_SDCARD_RW {
        AID_SDCARD_RW
    } else {
        multiuser_get_uid(state.user_id, opts.gid)
    }
}
