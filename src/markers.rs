//! On-disk layout of the Keycloak deployment and its install marker.
//!
//! ```text
//! <workdir>/
//!   keycloak/        state volume, mounted into the container
//!     version.txt    written by the container once installation completes
//!   certs/           TLS material, provisioned externally
//! ```
//!
//! The supervisor only ever *reads* the marker: its existence is the sole
//! signal that the install ritual has completed at least once.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

const STATE_DIR_NAME: &str = "keycloak";
const CERTS_DIR_NAME: &str = "certs";
const VERSION_MARKER_NAME: &str = "version.txt";

/// Paths of the persistent state directory, certificates and version marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerStore {
    state_dir: PathBuf,
    certs_dir: PathBuf,
    marker_file: PathBuf,
}

impl MarkerStore {
    pub fn for_workdir(workdir: &Path) -> Self {
        let state_dir = workdir.join(STATE_DIR_NAME);
        Self {
            marker_file: state_dir.join(VERSION_MARKER_NAME),
            certs_dir: workdir.join(CERTS_DIR_NAME),
            state_dir,
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn certs_dir(&self) -> &Path {
        &self.certs_dir
    }

    pub fn marker_file(&self) -> &Path {
        &self.marker_file
    }

    /// Create the state directory (mode 0700) if it does not exist yet.
    ///
    /// An existing directory is left untouched, including its permissions.
    pub fn ensure_state_dir(&self) -> Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder
            .create(&self.state_dir)
            .map_err(|e| Error::filesystem(&self.state_dir, e))
    }

    /// Whether the version marker exists. Its content is never read.
    pub fn is_installed(&self) -> Result<bool> {
        self.marker_file
            .try_exists()
            .map_err(|e| Error::filesystem(&self.marker_file, e))
    }

    /// Whether the externally provisioned certificates directory is present.
    pub fn has_certs_dir(&self) -> bool {
        self.certs_dir.is_dir()
    }
}
