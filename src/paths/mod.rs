//! Host ↔ container path translation.
//!
//! The working directory's base name doubles as the mount-point name inside
//! the container, so every container-side path is `/<mount>/<relative>`.
//! The container filesystem is POSIX-separated regardless of host OS; all
//! functions here normalize to forward slashes on the container side only.

use std::path::Path;

/// Mount-point name for a host directory: its final path component.
///
/// Working directories are created as a single path component, so this is
/// total for every path the crate produces itself.
pub fn mount_name(host_dir: &Path) -> String {
    host_dir
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

/// Container-side absolute path for `rel` under the mount `mount`.
pub fn to_container(mount: &str, rel: &str) -> String {
    let rel = rel.replace('\\', "/");
    let rel = rel.trim_start_matches('/');
    if rel.is_empty() {
        format!("/{mount}")
    } else {
        format!("/{mount}/{rel}")
    }
}

/// A `-v` bind-mount value: `<host>:/<mount>[:ro]`.
pub fn bind_mount(host: &Path, mount: &str, read_only: bool) -> String {
    let suffix = if read_only { ":ro" } else { "" };
    format!("{}:/{mount}{suffix}", host.display())
}

/// Extension of the final path component, from its *first* dot.
///
/// Compound extensions common in imaging formats count as one unit:
/// `scan.nii.gz` → `.nii.gz`. Returns `None` for dotless names.
pub fn file_extension(path: &str) -> Option<&str> {
    let name = final_component(path);
    name.find('.').map(|i| &name[i..])
}

/// Final path component with everything from the first dot stripped.
pub fn file_stem(path: &str) -> &str {
    let name = final_component(path);
    match name.find('.') {
        Some(i) => &name[..i],
        None => name,
    }
}

fn final_component(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
