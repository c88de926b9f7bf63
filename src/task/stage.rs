use std::fs;
use std::path::Path;

use crate::data::Codec;
use crate::error::{Error, Result};
use crate::paths;
use crate::workdir::{DirProvider, WorkDir, mint_mount_name};

use super::types::{LoadEntry, RunArgs, SaveEntry, SET_TOKEN};

/// Stage every registered input and assemble both argument vectors.
///
/// Staging decisions are recorded on the entries, so calling this again on
/// an unmodified session performs no further exports or minting and yields
/// byte-identical vectors.
pub(crate) fn assemble<C: Codec>(
    codec: &C,
    provider: &dyn DirProvider,
    workdir: &WorkDir,
    saves: &mut [SaveEntry<C::Data>],
    loads: &[LoadEntry],
    extra_run: &[String],
    extra_app: &[String],
) -> Result<RunArgs> {
    let mount = workdir.mount_name();

    let mut ro_mounts = Vec::new();
    let mut input_pairs = Vec::new();

    for entry in saves.iter_mut() {
        if entry.multi {
            stage_set(codec, workdir, &mount, entry, &mut input_pairs)?;
        } else {
            stage_single(
                codec,
                provider,
                workdir,
                &mount,
                entry,
                &mut ro_mounts,
                &mut input_pairs,
            )?;
        }
    }

    // ── runtime half: primary rw mount, staging ro mounts, user extras ──
    let mut runtime = vec![
        "-v".to_string(),
        paths::bind_mount(workdir.path(), &mount, false),
    ];
    runtime.extend(ro_mounts);
    runtime.extend(extra_run.iter().cloned());

    // ── application half: user extras, input pairs, output pairs ──
    let mut app: Vec<String> = extra_app.to_vec();
    app.extend(input_pairs);

    for entry in loads {
        app.push(entry.arg.clone());
        if !entry.flag_only {
            app.push(paths::to_container(&mount, &entry.path));
        }
        if entry.directory {
            // A dot in a directory path is usually a misregistered file.
            if paths::file_extension(&entry.path).is_some() {
                log::warn!("directory path [{}] contains a dot", entry.path);
            }
            if !entry.flag_only {
                let host_dir = workdir.file_path(&entry.path);
                fs::create_dir_all(&host_dir).map_err(|e| Error::io(&host_dir, e))?;
            }
        }
    }

    Ok(RunArgs { runtime, app })
}

/// Stage one set: a subdirectory of pattern-enumerated files, passed to the
/// container as a directory argument.
fn stage_set<C: Codec>(
    codec: &C,
    workdir: &WorkDir,
    mount: &str,
    entry: &mut SaveEntry<C::Data>,
    input_pairs: &mut Vec<String>,
) -> Result<()> {
    let folder = entry.set_folder().to_string();
    let host_folder = workdir.file_path(&folder);

    if entry.resolved.is_none() {
        fs::create_dir_all(&host_folder).map_err(|e| Error::io(&host_folder, e))?;
        for (index, object) in entry.data.iter().enumerate() {
            let rel = format!(
                "{}{}",
                entry.name.replacen(SET_TOKEN, &index.to_string(), 1),
                entry.extension
            );
            let host_path = workdir.file_path(&rel);
            codec
                .save(object, &host_path)
                .map_err(|e| Error::codec(&host_path, e))?;
            log::debug!("staged [{}] -> {}", entry.arg, host_path.display());
        }
        entry.resolved = Some(host_folder);
    }

    input_pairs.push(entry.arg.clone());
    input_pairs.push(paths::to_container(mount, &folder));
    Ok(())
}

/// Stage one single-file input.
///
/// Data already on disk with the right extension is not exported again: its
/// parent directory is mounted read-only under a minted unique name and the
/// container path is reconstructed from there.
fn stage_single<C: Codec>(
    codec: &C,
    provider: &dyn DirProvider,
    workdir: &WorkDir,
    mount: &str,
    entry: &mut SaveEntry<C::Data>,
    ro_mounts: &mut Vec<String>,
    input_pairs: &mut Vec<String>,
) -> Result<()> {
    let object = entry
        .data
        .first()
        .ok_or_else(|| Error::Configuration(format!("input `{}` holds no data", entry.arg)))?;

    let source = codec.source_path(object);
    let reusable = source
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .filter(|p| paths::file_extension(p) == Some(entry.extension.as_str()));

    match (reusable, source) {
        (Some(source_str), Some(source_path)) => {
            // Zero-copy: mount the file's parent directory read-only.
            let ro_name = match entry.mount.clone() {
                Some(name) => name,
                None => {
                    let name = mint_mount_name(provider)?;
                    entry.mount = Some(name.clone());
                    entry.resolved = Some(source_path.clone());
                    log::debug!(
                        "reusing on-disk input [{}] at {}",
                        entry.arg,
                        source_path.display()
                    );
                    name
                }
            };
            let parent = source_path.parent().unwrap_or(Path::new(""));
            ro_mounts.push("-v".to_string());
            ro_mounts.push(paths::bind_mount(parent, &ro_name, true));

            let file = format!("{}{}", paths::file_stem(&source_str), entry.extension);
            input_pairs.push(entry.arg.clone());
            input_pairs.push(paths::to_container(&ro_name, &file));
        }
        _ => {
            // Export (or reserve) under the working directory.
            let rel = format!("{}{}", entry.name, entry.extension);
            let host_path = workdir.file_path(&rel);
            if entry.resolved.is_none() {
                if entry.auto_save {
                    codec
                        .save(object, &host_path)
                        .map_err(|e| Error::codec(&host_path, e))?;
                    log::debug!("staged [{}] -> {}", entry.arg, host_path.display());
                }
                entry.resolved = Some(host_path);
            }
            input_pairs.push(entry.arg.clone());
            input_pairs.push(paths::to_container(mount, &rel));
        }
    }
    Ok(())
}
