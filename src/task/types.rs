use std::path::PathBuf;

use crate::error::{Error, Result};

/// Enumeration placeholder in set name patterns, replaced by the zero-based
/// object index: `"masks/mask_{}"` → `masks/mask_0`, `masks/mask_1`, ...
pub const SET_TOKEN: &str = "{}";

/// One input bound for the container, keyed by its argument flag.
#[derive(Debug)]
pub struct SaveEntry<D> {
    pub arg: String,
    /// Logical name without extension; for sets, a folder-qualified pattern
    /// containing [`SET_TOKEN`].
    pub name: String,
    /// Dot-prefixed target extension, e.g. `".nrrd"` or `".nii.gz"`.
    pub extension: String,
    pub data: Vec<D>,
    /// Write through the codec during staging; when off, only the target
    /// path is reserved and recorded.
    pub auto_save: bool,
    /// Set mode: a directory of enumerated files instead of a single file.
    pub multi: bool,
    /// Host-side path decided during staging (export target, or the
    /// provenance file when the entry is mounted instead of exported).
    pub(crate) resolved: Option<PathBuf>,
    /// Minted mount-point name for a provenance mount, recorded so that
    /// re-assembly reproduces identical arguments.
    pub(crate) mount: Option<String>,
}

impl<D> SaveEntry<D> {
    /// A single-file input. Fails fast on malformed name/extension.
    pub fn single(
        arg: impl Into<String>,
        name: impl Into<String>,
        extension: impl Into<String>,
        data: D,
        auto_save: bool,
    ) -> Result<Self> {
        let arg = arg.into();
        let name = name.into();
        let extension = extension.into();
        validate_extension(&extension)?;
        if name.is_empty() {
            return Err(Error::Configuration(format!(
                "input `{arg}`: name must not be empty"
            )));
        }
        if name.contains('.') {
            return Err(Error::Configuration(format!(
                "input `{arg}`: name `{name}` must not contain a dot; pass the \
                 extension separately"
            )));
        }
        if name.contains(SET_TOKEN) {
            return Err(Error::Configuration(format!(
                "input `{arg}`: name `{name}` contains the enumeration token, \
                 which is only valid for sets"
            )));
        }
        Ok(Self {
            arg,
            name,
            extension,
            data: vec![data],
            auto_save,
            multi: false,
            resolved: None,
            mount: None,
        })
    }

    /// A set of inputs staged as one directory of enumerated files.
    ///
    /// `pattern` must be folder-qualified (`"masks/mask_{}"`): the portion
    /// before the first separator becomes the staged subdirectory, and the
    /// container receives that directory as the argument value.
    pub fn set(
        arg: impl Into<String>,
        pattern: impl Into<String>,
        extension: impl Into<String>,
        data: Vec<D>,
    ) -> Result<Self> {
        let arg = arg.into();
        let pattern = pattern.into();
        let extension = extension.into();
        validate_extension(&extension)?;
        match pattern.split_once('/') {
            None => {
                return Err(Error::Configuration(format!(
                    "input set `{arg}`: pattern `{pattern}` must be folder-qualified \
                     (contain a path separator)"
                )));
            }
            Some((folder, _)) if folder.is_empty() => {
                return Err(Error::Configuration(format!(
                    "input set `{arg}`: pattern `{pattern}` has an empty folder name"
                )));
            }
            Some(_) => {}
        }
        if !pattern.contains(SET_TOKEN) {
            return Err(Error::Configuration(format!(
                "input set `{arg}`: pattern `{pattern}` is missing the `{SET_TOKEN}` \
                 enumeration token"
            )));
        }
        Ok(Self {
            arg,
            name: pattern,
            extension,
            data,
            auto_save: true,
            multi: true,
            resolved: None,
            mount: None,
        })
    }

    /// Host path resolved during staging, if staging has run.
    pub fn resolved_path(&self) -> Option<&PathBuf> {
        self.resolved.as_ref()
    }

    /// Subdirectory a set stages into (pattern portion before the first `/`).
    pub(crate) fn set_folder(&self) -> &str {
        self.name.split('/').next().unwrap_or(&self.name)
    }
}

fn validate_extension(extension: &str) -> Result<()> {
    if !extension.starts_with('.') {
        return Err(Error::Configuration(format!(
            "extension `{extension}` must start with a dot"
        )));
    }
    Ok(())
}

/// One output expected under the working directory after the run.
#[derive(Debug, Clone)]
pub struct LoadEntry {
    pub arg: String,
    /// Path relative to the working directory (file or directory).
    pub path: String,
    /// Load through the codec right after the run; when off, only the path
    /// is resolved for the caller.
    pub auto_load: bool,
    /// Pass the argument flag without the path value.
    pub flag_only: bool,
    pub directory: bool,
    /// Member filenames expected inside a directory output. Empty means
    /// "scan the directory for anything loadable".
    pub expected: Vec<String>,
}

impl LoadEntry {
    pub fn file(
        arg: impl Into<String>,
        path: impl Into<String>,
        auto_load: bool,
        flag_only: bool,
    ) -> Self {
        Self {
            arg: arg.into(),
            path: path.into(),
            auto_load,
            flag_only,
            directory: false,
            expected: Vec::new(),
        }
    }

    pub fn directory(
        arg: impl Into<String>,
        path: impl Into<String>,
        expected: Vec<String>,
    ) -> Self {
        Self {
            arg: arg.into(),
            path: path.into(),
            auto_load: true,
            flag_only: false,
            directory: true,
            expected,
        }
    }
}

/// The two ordered halves of the assembled command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// Engine `run` arguments: mounts, then user extras.
    pub runtime: Vec<String>,
    /// Entrypoint-application arguments: user extras, then input pairs,
    /// then output pairs, in registration order.
    pub app: Vec<String>,
}
