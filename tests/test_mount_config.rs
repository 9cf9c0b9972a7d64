// CLASSIFICATION: COMMUNITY
// Filename: test_mount_config.rs v0.1
// Date Modified: 2026-10-16
// Author: Lukas Bower

use std::env;
use std::fs;
use std::sync::Arc;

use sdcardfs::ids::AID_SDCARD_RW;
use sdcardfs::{MountOptions, PackageTable, PermissionClass, SdcardError, SdcardMount};
use serial_test::serial;
use tempfile::tempdir;

const KEYS: &[&str] = &[
    "SDCARDFS_CONFIG",
    "SDCARDFS_SOURCE",
    "SDCARDFS_OBB_ROOT",
    "SDCARDFS_MULTIUSER",
    "SDCARDFS_USERID",
    "SDCARDFS_GID",
    "SDCARDFS_MASK",
];

struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    fn new() -> Self {
        let saved = KEYS.iter().map(|k| (*k, env::var(k).ok())).collect();
        for k in KEYS {
            env::remove_var(k);
        }
        EnvGuard { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (k, v) in &self.saved {
            match v {
                Some(v) => env::set_var(k, v),
                None => env::remove_var(k),
            }
        }
    }
}

#[test]
#[serial]
fn defaults_without_environment() {
    let _ = env_logger::builder().is_test(true).try_init();
    let _guard = EnvGuard::new();
    let opts = MountOptions::load().unwrap();
    assert_eq!(opts, MountOptions::default());
    assert_eq!(opts.obb_root(), "/data/media/Android/obb");
    assert_eq!(opts.gid, AID_SDCARD_RW);
}

#[test]
#[serial]
fn file_then_environment_overrides() {
    let _ = env_logger::builder().is_test(true).try_init();
    let _guard = EnvGuard::new();
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("sdcardfs.toml");
    fs::write(
        &cfg,
        "source = \"/mnt/runtime\"\nmultiuser = true\nfs_user_id = 3\n",
    )
    .unwrap();
    env::set_var("SDCARDFS_CONFIG", &cfg);
    env::set_var("SDCARDFS_MASK", "0027");
    env::set_var("SDCARDFS_OBB_ROOT", "/mnt/obb");

    let opts = MountOptions::load().unwrap();
    assert!(opts.multiuser);
    assert_eq!(opts.source, "/mnt/runtime");
    assert_eq!(opts.fs_user_id, 3);
    assert_eq!(opts.mask, 0o027);
    assert_eq!(opts.obb_root(), "/mnt/obb");

    let m = SdcardMount::new(opts, Arc::new(PackageTable::new()));
    assert_eq!(m.root().state().class, PermissionClass::PreRoot);
    assert_eq!(m.root().state().user_id, 3);
    assert_eq!(m.redirection().obb_root(), "/mnt/obb");
}

#[test]
#[serial]
fn invalid_override_is_reported() {
    let _ = env_logger::builder().is_test(true).try_init();
    let _guard = EnvGuard::new();
    env::set_var("SDCARDFS_MULTIUSER", "sometimes");
    assert!(matches!(MountOptions::load(), Err(SdcardError::Config(_))));
}

#[test]
#[serial]
fn missing_config_file_is_io_error() {
    let _ = env_logger::builder().is_test(true).try_init();
    let _guard = EnvGuard::new();
    env::set_var("SDCARDFS_CONFIG", "/nonexistent/sdcardfs.toml");
    assert!(matches!(MountOptions::load(), Err(SdcardError::Io(_))));
}
