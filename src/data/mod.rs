//! The reader/writer collaborator seam.
//!
//! The embedding application decides what a data object *is* and how it is
//! persisted; the orchestration core only needs to save objects into the
//! working directory, load produced artifacts back, and inspect where an
//! object originally came from.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Saves and loads data objects, choosing the on-disk format by extension.
///
/// A single file may expand to several objects on load (multi-frame
/// formats), hence the `Vec` return.
pub trait Codec {
    type Data;

    /// Persist `data` at `path`. The extension of `path` selects the format.
    fn save(&self, data: &Self::Data, path: &Path) -> anyhow::Result<()>;

    /// Load every data object contained in the file at `path`.
    fn load(&self, path: &Path) -> anyhow::Result<Vec<Self::Data>>;

    /// The on-disk location `data` was originally read from, if any.
    ///
    /// When this points at a file whose extension already matches what a
    /// task needs, staging mounts that file instead of re-exporting it.
    fn source_path(&self, data: &Self::Data) -> Option<PathBuf> {
        let _ = data;
        None
    }
}

/// A data object that is just bytes, with optional provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBytes {
    pub bytes: Vec<u8>,
    pub source: Option<PathBuf>,
}

impl RawBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            source: None,
        }
    }

    /// Read a file into memory, recording where it came from.
    pub fn from_file(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let bytes =
            fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        Ok(Self {
            bytes,
            source: Some(path),
        })
    }
}

/// Byte-for-byte codec: no format conversion, any extension accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl Codec for RawCodec {
    type Data = RawBytes;

    fn save(&self, data: &RawBytes, path: &Path) -> anyhow::Result<()> {
        fs::write(path, &data.bytes).with_context(|| format!("writing {}", path.display()))
    }

    fn load(&self, path: &Path) -> anyhow::Result<Vec<RawBytes>> {
        Ok(vec![RawBytes {
            bytes: fs::read(path).with_context(|| format!("reading {}", path.display()))?,
            source: Some(path.to_path_buf()),
        }])
    }

    fn source_path(&self, data: &RawBytes) -> Option<PathBuf> {
        data.source.clone()
    }
}
