use std::path::Path;

use walkdir::WalkDir;

use crate::data::Codec;
use crate::error::{Error, Result};
use crate::workdir::WorkDir;

use super::types::LoadEntry;

/// Load produced artifacts back through the codec, in registration order.
///
/// Missing artifacts are tolerated: containerized tools may legitimately
/// skip conditional outputs. Whole-working-directory files are skipped
/// silently; registered single files warn.
pub(crate) fn collect<C: Codec>(
    codec: &C,
    workdir: &WorkDir,
    workdir_files: &[String],
    loads: &[LoadEntry],
) -> Result<Vec<C::Data>> {
    let mut outputs = Vec::new();

    for filename in workdir_files {
        let path = workdir.file_path(filename);
        if path.exists() {
            let loaded = codec.load(&path).map_err(|e| Error::codec(&path, e))?;
            log::info!("loaded [working directory]: {}", path.display());
            outputs.extend(loaded);
        }
    }

    for entry in loads.iter().filter(|e| e.auto_load) {
        if entry.directory {
            let dir = workdir.file_path(&entry.path);
            if entry.expected.is_empty() {
                scan_directory(codec, &dir, &entry.arg, &mut outputs);
            } else {
                for name in &entry.expected {
                    let path = dir.join(name);
                    if path.exists() {
                        let loaded =
                            codec.load(&path).map_err(|e| Error::codec(&path, e))?;
                        log::info!(
                            "loaded [directory]: {} for argument {}",
                            path.display(),
                            entry.arg
                        );
                        outputs.extend(loaded);
                    }
                }
            }
        } else {
            let path = workdir.file_path(&entry.path);
            if path.exists() {
                let loaded = codec.load(&path).map_err(|e| Error::codec(&path, e))?;
                log::info!(
                    "loaded [file]: {} for argument {}",
                    path.display(),
                    entry.arg
                );
                outputs.extend(loaded);
            } else {
                log::warn!(
                    "expected output {} for argument {} was not produced",
                    path.display(),
                    entry.arg
                );
            }
        }
    }

    Ok(outputs)
}

/// Directory output with no expected-member list: pick up whatever the
/// codec can read, in deterministic name order.
fn scan_directory<C: Codec>(codec: &C, dir: &Path, arg: &str, outputs: &mut Vec<C::Data>) {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok());

    for entry in walker {
        if !entry.file_type().is_file() {
            continue;
        }
        match codec.load(entry.path()) {
            Ok(loaded) => {
                log::info!(
                    "loaded [directory scan]: {} for argument {arg}",
                    entry.path().display()
                );
                outputs.extend(loaded);
            }
            Err(e) => {
                log::warn!("skipping unloadable {}: {e}", entry.path().display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::data::{RawBytes, RawCodec};
    use crate::workdir::TempProvider;

    fn fixture() -> (TempProvider, WorkDir) {
        let provider = TempProvider::new();
        let workdir = WorkDir::create(&provider).unwrap();
        (provider, workdir)
    }

    #[test]
    fn loads_exactly_the_expected_members_that_exist() {
        let (_provider, workdir) = fixture();
        fs::create_dir_all(workdir.file_path("results")).unwrap();
        fs::write(workdir.file_path("results/liver.nii"), b"liver").unwrap();
        fs::write(workdir.file_path("results/spleen.nii"), b"spleen").unwrap();

        let loads = vec![LoadEntry::directory(
            "-o",
            "results",
            vec!["liver.nii".into(), "kidney.nii".into(), "spleen.nii".into()],
        )];

        let outputs = collect(&RawCodec, &workdir, &[], &loads).unwrap();
        // kidney.nii is absent and simply skipped; nothing substituted.
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].bytes, b"liver");
        assert_eq!(outputs[1].bytes, b"spleen");
        assert!(!workdir.file_path("results/kidney.nii").exists());
    }

    #[test]
    fn empty_expected_list_scans_the_directory_in_name_order() {
        let (_provider, workdir) = fixture();
        fs::create_dir_all(workdir.file_path("results")).unwrap();
        fs::write(workdir.file_path("results/b.nii"), b"b").unwrap();
        fs::write(workdir.file_path("results/a.nii"), b"a").unwrap();

        let loads = vec![LoadEntry::directory("-o", "results", vec![])];
        let outputs = collect(&RawCodec, &workdir, &[], &loads).unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].bytes, b"a");
        assert_eq!(outputs[1].bytes, b"b");
    }

    #[test]
    fn missing_single_file_warns_but_does_not_fail() {
        let (_provider, workdir) = fixture();
        let loads = vec![LoadEntry::file("--preview", "out.png", true, false)];
        let outputs = collect(&RawCodec, &workdir, &[], &loads).unwrap();
        assert!(outputs.is_empty());
    }

    #[test]
    fn load_later_entries_are_never_loaded() {
        let (_provider, workdir) = fixture();
        fs::write(workdir.file_path("table.csv"), b"1,2,3").unwrap();

        let loads = vec![LoadEntry::file("--csv", "table.csv", false, false)];
        let outputs = collect(&RawCodec, &workdir, &[], &loads).unwrap();
        assert!(outputs.is_empty());
    }

    #[test]
    fn workdir_files_come_first_and_absent_ones_are_skipped() {
        let (_provider, workdir) = fixture();
        fs::write(workdir.file_path("summary.txt"), b"summary").unwrap();
        fs::write(workdir.file_path("out.png"), b"png").unwrap();

        let workdir_files = vec!["summary.txt".to_string(), "absent.txt".to_string()];
        let loads = vec![LoadEntry::file("--preview", "out.png", true, false)];

        let outputs = collect(&RawCodec, &workdir, &workdir_files, &loads).unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].bytes, b"summary");
        assert_eq!(outputs[1].bytes, b"png");
    }

    #[test]
    fn one_file_may_expand_to_multiple_objects() {
        struct SplittingCodec;
        impl Codec for SplittingCodec {
            type Data = RawBytes;
            fn save(&self, data: &RawBytes, path: &Path) -> anyhow::Result<()> {
                RawCodec.save(data, path)
            }
            fn load(&self, path: &Path) -> anyhow::Result<Vec<RawBytes>> {
                // One object per line, like a multi-frame format.
                Ok(fs::read_to_string(path)?
                    .lines()
                    .map(|l| RawBytes::new(l.as_bytes().to_vec()))
                    .collect())
            }
        }

        let (_provider, workdir) = fixture();
        fs::write(workdir.file_path("frames.txt"), b"one\ntwo\nthree").unwrap();

        let loads = vec![LoadEntry::file("--frames", "frames.txt", true, false)];
        let outputs = collect(&SplittingCodec, &workdir, &[], &loads).unwrap();
        assert_eq!(outputs.len(), 3);
    }
}
