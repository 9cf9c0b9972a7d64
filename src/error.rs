// CLASSIFICATION: COMMUNITY
// Filename: error.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-16

//! Error types for the derived-permission core.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::redirect::StaleReason;

/// Errors returned to the filesystem layer.
#[derive(Debug, Error)]
pub enum SdcardError {
    /// A per-user root directory name is not a decimal user id.
    #[error("malformed user directory name {0:?}")]
    MalformedUserId(String),

    /// The configured OBB root could not be resolved to a directory.
    #[error("obb root {path:?} unavailable: {source}")]
    RedirectUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Redirect metadata is present but no active location is recorded.
    #[error("redirect state inconsistent: original recorded without active location")]
    InconsistentRedirectState,

    /// An established redirect no longer points at the configured root.
    #[error("redirect is stale: {0}")]
    StaleRedirect(StaleReason),

    /// A rename would move the root or place a node beneath itself.
    #[error("cannot rename {0:?} beneath itself")]
    InvalidRename(String),

    /// Mount configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, SdcardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_unavailable_keeps_source() {
        use std::error::Error as _;
        let err = SdcardError::RedirectUnavailable {
            path: PathBuf::from("/data/media/obb"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/data/media/obb"));
        assert!(err.source().is_some());
    }

    #[test]
    fn stale_reason_in_message() {
        let err = SdcardError::StaleRedirect(StaleReason::RootMismatch);
        assert!(err.to_string().starts_with("redirect is stale"));
    }
}
