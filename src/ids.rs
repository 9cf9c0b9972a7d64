// CLASSIFICATION: COMMUNITY
// Filename: ids.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-16

//! Android identity collaborators.
//!
//! Package name to app id resolution lives outside this crate. The
//! [`AppIdentity`] trait is the seam the derivation grammar calls
//! through; [`PackageTable`] is a plain lookup table implementation
//! for hosts that already hold the package list in memory.

use std::collections::{HashMap, HashSet};

use spin::RwLock;

/// Numeric Android user namespace id.
pub type UserId = u32;
/// Numeric Android application id (0 means "not a package").
pub type AppId = u32;
/// Effective uid presented for a node.
pub type Uid = u32;
/// Effective gid presented for a node.
pub type Gid = u32;

pub const AID_ROOT: Uid = 0;
pub const AID_SDCARD_RW: Gid = 1015;
pub const AID_USER_OFFSET: u32 = 100_000;

/// Compose a per-user uid from a user id and an app id.
pub fn multiuser_get_uid(user_id: UserId, app_id: AppId) -> Uid {
    user_id
        .wrapping_mul(AID_USER_OFFSET)
        .wrapping_add(app_id % AID_USER_OFFSET)
}

/// External lookups consumed by permission derivation.
pub trait AppIdentity: Send + Sync {
    /// App id owning the package directory `name`, or 0 if unknown.
    fn app_id_of(&self, name: &str) -> AppId;

    /// Whether `name` is excluded from per-app ownership for `user_id`.
    fn is_excluded(&self, name: &str, user_id: UserId) -> bool;

    /// Effective uid for (`user_id`, `app_id`).
    fn derive_uid(&self, user_id: UserId, app_id: AppId) -> Uid {
        multiuser_get_uid(user_id, app_id)
    }
}

/// In-memory package table keyed by case-folded package name.
#[derive(Default)]
pub struct PackageTable {
    packages: RwLock<HashMap<String, AppId>>,
    excluded: RwLock<HashSet<(String, UserId)>>,
}

impl PackageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a package mapping.
    pub fn insert(&self, name: &str, app_id: AppId) {
        self.packages.write().insert(name.to_ascii_lowercase(), app_id);
    }

    /// Drop a package mapping. Returns the previous app id if present.
    pub fn remove(&self, name: &str) -> Option<AppId> {
        self.packages.write().remove(&name.to_ascii_lowercase())
    }

    /// Exclude `name` from per-app ownership for `user_id`.
    pub fn exclude(&self, name: &str, user_id: UserId) {
        self.excluded
            .write()
            .insert((name.to_ascii_lowercase(), user_id));
    }

    pub fn len(&self) -> usize {
        self.packages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.read().is_empty()
    }
}

impl AppIdentity for PackageTable {
    fn app_id_of(&self, name: &str) -> AppId {
        self.packages
            .read()
            .get(&name.to_ascii_lowercase())
            .copied()
            .unwrap_or(0)
    }

    fn is_excluded(&self, name: &str, user_id: UserId) -> bool {
        self.excluded
            .read()
            .contains(&(name.to_ascii_lowercase(), user_id))
    }
}
