// CLASSIFICATION: COMMUNITY
// Filename: handle.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-16

//! Reference-counted handles to physical locations on the lower filesystem.
//!
//! A [`PathHandle`] captures the device, inode and canonical path of a
//! directory at resolution time. Clones share one location record.
//! Comparisons that must keep the location alive for their duration take
//! a [`PathPin`], which is released when dropped on every exit path.

use std::fmt;
use std::fs;
use std::io;
use std::ops::Deref;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Location {
    dev: u64,
    ino: u64,
    path: PathBuf,
    pins: AtomicUsize,
}

/// Shared capability to one physical location.
#[derive(Clone)]
pub struct PathHandle {
    inner: Arc<Location>,
}

impl PathHandle {
    /// Resolve `path`, following symlinks.
    pub fn resolve(path: impl AsRef<Path>) -> io::Result<Self> {
        let canonical = fs::canonicalize(path.as_ref())?;
        let meta = fs::metadata(&canonical)?;
        Ok(Self {
            inner: Arc::new(Location {
                dev: meta.dev(),
                ino: meta.ino(),
                path: canonical,
                pins: AtomicUsize::new(0),
            }),
        })
    }

    /// Resolve `path`, following symlinks, and require a directory.
    pub fn resolve_dir(path: impl AsRef<Path>) -> io::Result<Self> {
        let handle = Self::resolve(path)?;
        if !fs::metadata(handle.path())?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", handle.path().display()),
            ));
        }
        Ok(handle)
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Acquire the location for the lifetime of the returned pin.
    pub fn pin(&self) -> PathPin {
        self.inner.pins.fetch_add(1, Ordering::AcqRel);
        PathPin {
            handle: self.clone(),
        }
    }

    /// Number of outstanding pins.
    pub fn pin_count(&self) -> usize {
        self.inner.pins.load(Ordering::Acquire)
    }

    /// Number of handles sharing this location record.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether both handles name the same (device, inode) pair.
    pub fn same_object(&self, other: &PathHandle) -> bool {
        self.inner.dev == other.inner.dev && self.inner.ino == other.inner.ino
    }

    /// True when the captured path no longer reaches the captured object.
    pub fn is_unlinked(&self) -> bool {
        match fs::metadata(&self.inner.path) {
            Ok(meta) => meta.dev() != self.inner.dev || meta.ino() != self.inner.ino,
            Err(_) => true,
        }
    }
}

impl PartialEq for PathHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_object(other)
    }
}

impl Eq for PathHandle {}

impl fmt::Debug for PathHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathHandle")
            .field("dev", &self.inner.dev)
            .field("ino", &self.inner.ino)
            .field("path", &self.inner.path)
            .finish()
    }
}

/// Acquired reference to a [`PathHandle`]; released on drop.
pub struct PathPin {
    handle: PathHandle,
}

impl Deref for PathPin {
    type Target = PathHandle;

    fn deref(&self) -> &PathHandle {
        &self.handle
    }
}

impl Drop for PathPin {
    fn drop(&mut self) {
        self.handle.inner.pins.fetch_sub(1, Ordering::AcqRel);
    }
}
