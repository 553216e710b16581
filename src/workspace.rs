//! Scoped scratch directory for one generator run

use crate::config::WorkspaceConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Temporary directory holding the extracted and simplified GeoJSON
///
/// Removed when dropped. A run that fails can call
/// [`release_after_failure`](Self::release_after_failure) to keep it around
/// for diagnosis instead, depending on configuration.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    keep_on_failure: bool,
}

impl Workspace {
    /// Create a fresh workspace under the configured parent (or the system temp dir)
    pub fn create(config: &WorkspaceConfig) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("tzshapefilegen-");
        let parent = config
            .parent_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);

        let dir = builder
            .tempdir_in(&parent)
            .map_err(|source| Error::Workspace { parent, source })?;
        debug!(path = ?dir.path(), "created workspace");

        Ok(Self {
            dir,
            keep_on_failure: config.keep_on_failure,
        })
    }

    /// Workspace root
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of `name` inside the workspace
    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove the workspace, logging instead of failing if removal fails
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!(?path, error = %e, "failed to remove workspace");
        }
    }

    /// Dispose of the workspace after a failed run
    ///
    /// Returns the kept path when `keep_on_failure` is set.
    pub fn release_after_failure(self) -> Option<PathBuf> {
        if self.keep_on_failure {
            let path = self.dir.keep();
            info!(?path, "keeping workspace for diagnosis");
            Some(path)
        } else {
            self.close();
            None
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(parent: &Path, keep_on_failure: bool) -> WorkspaceConfig {
        WorkspaceConfig {
            parent_dir: Some(parent.to_path_buf()),
            keep_on_failure,
        }
    }

    #[test]
    fn removed_on_close() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = Workspace::create(&config_in(parent.path(), false)).unwrap();
        std::fs::write(workspace.join("combined.json"), b"{}").unwrap();
        let path = workspace.path().to_path_buf();
        assert!(path.starts_with(parent.path()));

        workspace.close();

        assert!(!path.exists());
    }

    #[test]
    fn removed_on_drop() {
        let parent = tempfile::tempdir().unwrap();
        let path = {
            let workspace = Workspace::create(&config_in(parent.path(), true)).unwrap();
            workspace.path().to_path_buf()
        };

        assert!(!path.exists());
    }

    #[test]
    fn failure_policy_controls_retention() {
        let parent = tempfile::tempdir().unwrap();

        let discarded = Workspace::create(&config_in(parent.path(), false)).unwrap();
        let discarded_path = discarded.path().to_path_buf();
        assert_eq!(discarded.release_after_failure(), None);
        assert!(!discarded_path.exists());

        let kept = Workspace::create(&config_in(parent.path(), true)).unwrap();
        let kept_path = kept.release_after_failure().unwrap();
        assert!(kept_path.is_dir());
    }

    #[test]
    fn unwritable_parent_is_an_environment_error() {
        let parent = tempfile::tempdir().unwrap();
        let missing = parent.path().join("does/not/exist");

        let err = Workspace::create(&config_in(&missing, false)).unwrap_err();

        assert!(matches!(err, Error::Workspace { .. }));
        assert_eq!(err.stage(), crate::error::Stage::Environment);
    }
}
