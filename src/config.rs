// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-16

//! Mount-time configuration.
//!
//! Options come from an optional TOML file (`SDCARDFS_CONFIG`) and are then
//! overridden by individual environment variables.

use std::env;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::error::{Result, SdcardError};
use crate::ids::{Gid, UserId, AID_SDCARD_RW};

/// Options fixed for the lifetime of one mount.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MountOptions {
    /// Lower directory the view is stacked on.
    pub source: String,
    /// Enables the pre-root layout with per-user roots.
    pub multiuser: bool,
    /// Shared OBB store. Derived from `source` when unset.
    pub obb_root: Option<String>,
    /// User id seeded into the root state.
    pub fs_user_id: UserId,
    /// Group presented on every node.
    pub gid: Gid,
    /// Mode bits masked off presented permissions.
    pub mask: u32,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            source: String::from("/data/media"),
            multiuser: false,
            obb_root: None,
            fs_user_id: 0,
            gid: AID_SDCARD_RW,
            mask: 0,
        }
    }
}

impl MountOptions {
    /// Parse options from TOML text; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SdcardError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Load from `SDCARDFS_CONFIG` (if set) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let base = match env::var("SDCARDFS_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        base.with_env_overrides()
    }

    /// Apply `SDCARDFS_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(v) = env::var("SDCARDFS_SOURCE") {
            self.source = v;
        }
        if let Ok(v) = env::var("SDCARDFS_OBB_ROOT") {
            self.obb_root = Some(v);
        }
        if let Ok(v) = env::var("SDCARDFS_MULTIUSER") {
            self.multiuser = parse_bool("SDCARDFS_MULTIUSER", &v)?;
        }
        if let Ok(v) = env::var("SDCARDFS_USERID") {
            self.fs_user_id = parse_num("SDCARDFS_USERID", &v, 10)?;
        }
        if let Ok(v) = env::var("SDCARDFS_GID") {
            self.gid = parse_num("SDCARDFS_GID", &v, 10)?;
        }
        if let Ok(v) = env::var("SDCARDFS_MASK") {
            self.mask = parse_num("SDCARDFS_MASK", &v, 8)?;
        }
        debug!("mount options: {:?}", self);
        Ok(self)
    }

    /// Configured OBB root, or the layout default under `source`.
    pub fn obb_root(&self) -> String {
        match &self.obb_root {
            Some(root) => root.clone(),
            None => {
                let base = self.source.trim_end_matches('/');
                if self.multiuser {
                    format!("{}/obb", base)
                } else {
                    format!("{}/Android/obb", base)
                }
            }
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SdcardError::Config(format!("{}: invalid bool {:?}", key, other))),
    }
}

fn parse_num(key: &str, value: &str, radix: u32) -> Result<u32> {
    u32::from_str_radix(value.trim(), radix)
        .map_err(|e| SdcardError::Config(format!("{}: {}", key, e)))
}
