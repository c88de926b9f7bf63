//! Working-directory provisioning.
//!
//! Each session owns one uniquely named directory that is bind-mounted into
//! the container as the communication bridge between host and tool. The
//! provider is an injected collaborator so tests (and embedding hosts) can
//! control where directories come from.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::error::{Error, Result};
use crate::paths;

/// Allocates and releases uniquely named directories.
pub trait DirProvider {
    /// Create a fresh directory whose base name is unique on this host.
    fn allocate(&self) -> anyhow::Result<PathBuf>;

    /// Remove a directory previously handed out by [`allocate`](Self::allocate).
    fn release(&self, path: &Path) -> anyhow::Result<()>;
}

/// Default provider backed by the OS temp directory.
#[derive(Debug, Clone)]
pub struct TempProvider {
    prefix: String,
    root: Option<PathBuf>,
}

impl TempProvider {
    pub fn new() -> Self {
        Self {
            prefix: "dockhand-".to_string(),
            root: None,
        }
    }

    /// Root all allocated directories under `root` instead of the OS temp dir.
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            prefix: "dockhand-".to_string(),
            root: Some(root.into()),
        }
    }
}

impl Default for TempProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DirProvider for TempProvider {
    fn allocate(&self) -> anyhow::Result<PathBuf> {
        let root = match &self.root {
            Some(r) => r.clone(),
            None => std::env::temp_dir(),
        };
        let dir = tempfile::Builder::new()
            .prefix(&self.prefix)
            .tempdir_in(&root)
            .with_context(|| format!("creating a directory under {}", root.display()))?;
        Ok(dir.keep())
    }

    fn release(&self, path: &Path) -> anyhow::Result<()> {
        fs::remove_dir_all(path).with_context(|| format!("removing {}", path.display()))
    }
}

/// Mint a guaranteed-unique single-component name for a read-only mount.
///
/// The directory itself is never used on the host; it is allocated and
/// immediately released purely to harvest a name no concurrent session can
/// be holding.
pub fn mint_mount_name(provider: &dyn DirProvider) -> Result<String> {
    let phantom = provider.allocate().map_err(Error::Provision)?;
    let name = paths::mount_name(&phantom);
    provider.release(&phantom).map_err(Error::Provision)?;
    Ok(name)
}

/// Scoped owner of one session's working directory.
///
/// The directory tree is removed when the value is dropped, on every exit
/// path. Call [`persist`](WorkDir::persist) to keep it on disk instead.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    keep: bool,
}

impl WorkDir {
    pub fn create(provider: &dyn DirProvider) -> Result<Self> {
        let path = provider.allocate().map_err(Error::Provision)?;
        Ok(Self { path, keep: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The container-side mount-point name (the directory's base name).
    pub fn mount_name(&self) -> String {
        paths::mount_name(&self.path)
    }

    /// Host path of `rel` inside the working directory.
    pub fn file_path(&self, rel: &str) -> PathBuf {
        self.path.join(rel)
    }

    /// Leave the directory on disk when this value is dropped.
    pub fn persist(&mut self) {
        self.keep = true;
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if !self.keep {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                log::warn!(
                    "could not remove working directory {}: {e}",
                    self.path.display()
                );
            }
        }
    }
}
