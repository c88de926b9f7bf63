use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::data::Codec;
use crate::docker::{CancelToken, engine};
use crate::error::{Error, Result};
use crate::workdir::{DirProvider, TempProvider, WorkDir};

use super::load;
use super::stage;
use super::types::{LoadEntry, RunArgs, SaveEntry};

/// One containerized task: stage inputs, run the image, load outputs.
///
/// A session owns a uniquely named working directory that is bind-mounted
/// into the container; the directory is removed when the session is dropped
/// unless the caller opts out. Sessions are single-use: registration first,
/// then [`run`](ContainerTask::run).
///
/// ```no_run
/// use dockhand::data::{RawBytes, RawCodec};
/// use dockhand::task::ContainerTask;
///
/// # fn main() -> Result<(), dockhand::Error> {
/// let codec = RawCodec;
/// let mut task = ContainerTask::new("acme/segmenter:1.2", &codec)?;
/// task.save_input(RawBytes::new(vec![0; 64]), "--input", "scan", ".nrrd")?;
/// task.load_output("--preview", "preview.png")?;
/// let outputs = task.run()?;
/// # let _ = outputs;
/// # Ok(())
/// # }
/// ```
pub struct ContainerTask<'c, C: Codec> {
    image: String,
    config: Config,
    codec: &'c C,
    provider: Box<dyn DirProvider>,
    workdir: WorkDir,
    saves: Vec<SaveEntry<C::Data>>,
    loads: Vec<LoadEntry>,
    extra_run: Vec<String>,
    extra_app: Vec<String>,
    workdir_files: Vec<String>,
    auto_remove_container: bool,
    auto_remove_image: bool,
    gpus: Option<String>,
    run_as_user: bool,
}

impl<'c, C: Codec> ContainerTask<'c, C> {
    /// Session with default configuration.
    pub fn new(image: impl Into<String>, codec: &'c C) -> Result<Self> {
        Self::with_config(image, codec, Config::default())
    }

    pub fn with_config(image: impl Into<String>, codec: &'c C, config: Config) -> Result<Self> {
        Self::with_provider(image, codec, config, Box::new(TempProvider::new()))
    }

    /// Full-control constructor with an injected directory provider.
    pub fn with_provider(
        image: impl Into<String>,
        codec: &'c C,
        config: Config,
        provider: Box<dyn DirProvider>,
    ) -> Result<Self> {
        let extra_run = config
            .split_extra_run_args()
            .map_err(|e| Error::Configuration(e.to_string()))?;
        let mut workdir = WorkDir::create(provider.as_ref())?;
        if config.keep_working_dir {
            workdir.persist();
        }
        Ok(Self {
            image: image.into(),
            auto_remove_container: config.auto_remove_container,
            auto_remove_image: config.auto_remove_image,
            gpus: config.gpus.clone(),
            run_as_user: config.run_as_user,
            config,
            codec,
            provider,
            workdir,
            saves: Vec::new(),
            loads: Vec::new(),
            extra_run,
            extra_app: Vec::new(),
            workdir_files: Vec::new(),
        })
    }

    // ── registration ───────────────────────────────────────────────────

    /// Register an input exported into the working directory during staging.
    pub fn save_input(
        &mut self,
        data: C::Data,
        arg: &str,
        name: &str,
        extension: &str,
    ) -> Result<()> {
        self.push_save(SaveEntry::single(arg, name, extension, data, true)?)
    }

    /// Register an input whose export is deferred: staging only reserves the
    /// target path (readable via [`input_path`](ContainerTask::input_path)).
    pub fn save_input_later(
        &mut self,
        data: C::Data,
        arg: &str,
        name: &str,
        extension: &str,
    ) -> Result<()> {
        self.push_save(SaveEntry::single(arg, name, extension, data, false)?)
    }

    /// Register a set of inputs staged as one directory of enumerated files;
    /// the container receives the directory as the argument value.
    pub fn save_input_set(
        &mut self,
        data: Vec<C::Data>,
        arg: &str,
        pattern: &str,
        extension: &str,
    ) -> Result<()> {
        self.push_save(SaveEntry::set(arg, pattern, extension, data)?)
    }

    /// Register an output loaded back right after the run.
    pub fn load_output(&mut self, arg: &str, path: &str) -> Result<()> {
        self.push_load(LoadEntry::file(arg, path, true, false))
    }

    /// Like [`load_output`](ContainerTask::load_output), but the argument is
    /// passed without the path value.
    pub fn load_output_flag(&mut self, arg: &str, path: &str) -> Result<()> {
        self.push_load(LoadEntry::file(arg, path, true, true))
    }

    /// Register an output directory; the subset of `expected` filenames that
    /// exists after the run is loaded. An empty list scans the directory.
    pub fn load_output_dir(&mut self, arg: &str, path: &str, expected: &[&str]) -> Result<()> {
        let expected = expected.iter().map(|s| s.to_string()).collect();
        self.push_load(LoadEntry::directory(arg, path, expected))
    }

    /// Register an output that is only path-resolved, never loaded.
    pub fn resolve_output(&mut self, arg: &str, path: &str) -> Result<()> {
        self.push_load(LoadEntry::file(arg, path, false, false))
    }

    /// Like [`resolve_output`](ContainerTask::resolve_output), flag-only.
    pub fn resolve_output_flag(&mut self, arg: &str, path: &str) -> Result<()> {
        self.push_load(LoadEntry::file(arg, path, false, true))
    }

    /// Load `filename` from the working directory after the run, if the tool
    /// produced it. Absence is not an error.
    pub fn expect_workdir_file(&mut self, filename: &str) {
        self.workdir_files.push(filename.to_string());
    }

    /// Extra engine `run` argument (single token).
    pub fn add_run_arg(&mut self, arg: &str) {
        self.extra_run.push(arg.to_string());
    }

    /// Extra engine `run` argument with a value, e.g. `("--shm-size", "2g")`.
    pub fn add_run_arg_value(&mut self, arg: &str, value: &str) {
        self.extra_run.push(arg.to_string());
        self.extra_run.push(value.to_string());
    }

    /// Extra entrypoint-application argument (single token).
    pub fn add_app_arg(&mut self, arg: &str) {
        self.extra_app.push(arg.to_string());
    }

    /// Extra entrypoint-application argument with a value.
    pub fn add_app_arg_value(&mut self, arg: &str, value: &str) {
        self.extra_app.push(arg.to_string());
        self.extra_app.push(value.to_string());
    }

    /// Request GPUs for the run, e.g. `"all"` or `"device=0"`.
    pub fn use_gpus(&mut self, spec: &str) {
        self.gpus = Some(spec.to_string());
    }

    pub fn auto_remove_container(&mut self, value: bool) {
        self.auto_remove_container = value;
    }

    pub fn auto_remove_image(&mut self, value: bool) {
        self.auto_remove_image = value;
    }

    /// Leave the working directory on disk after the session ends.
    pub fn keep_working_dir(&mut self) {
        self.workdir.persist();
    }

    // ── lookups ────────────────────────────────────────────────────────

    pub fn working_dir(&self) -> &Path {
        self.workdir.path()
    }

    /// Host path of `rel` inside the working directory.
    pub fn file_path(&self, rel: &str) -> PathBuf {
        self.workdir.file_path(rel)
    }

    /// Host path an input was (or would be) staged at. `None` until staging
    /// has run or for unknown flags.
    pub fn input_path(&self, arg: &str) -> Option<PathBuf> {
        self.saves
            .iter()
            .find(|e| e.arg == arg)
            .and_then(|e| e.resolved_path().cloned())
    }

    /// Host path a registered output will appear at.
    pub fn output_path(&self, arg: &str) -> Option<PathBuf> {
        self.loads
            .iter()
            .find(|e| e.arg == arg)
            .map(|e| self.workdir.file_path(&e.path))
    }

    // ── orchestration ──────────────────────────────────────────────────

    /// Stage inputs and build both argument vectors without running.
    ///
    /// [`run`](ContainerTask::run) performs the same assembly; calling this
    /// first (for inspection) changes nothing about the eventual command.
    pub fn assemble_args(&mut self) -> Result<RunArgs> {
        stage::assemble(
            self.codec,
            self.provider.as_ref(),
            &self.workdir,
            &mut self.saves,
            &self.loads,
            &self.extra_run,
            &self.extra_app,
        )
    }

    /// Health-check the engine, stage inputs, run the container, and load
    /// produced outputs.
    pub fn run(&mut self) -> Result<Vec<C::Data>> {
        self.run_with(CancelToken::new())
    }

    /// Like [`run`](ContainerTask::run), with a caller-held cancel token.
    pub fn run_with(&mut self, cancel: CancelToken) -> Result<Vec<C::Data>> {
        engine::ensure_available(&self.config.engine)?;

        let args = self.assemble_args()?;
        let run_args = self.run_vector(args);

        log::info!("running image {} via {}", self.image, self.config.engine);
        engine::execute(
            &self.config.engine,
            "run",
            run_args,
            self.timeout(),
            &cancel,
        )?;

        let outputs = load::collect(self.codec, &self.workdir, &self.workdir_files, &self.loads)?;
        log::info!("collected {} output object(s)", outputs.len());

        if self.auto_remove_image {
            // Results are already in hand; image cleanup is best-effort.
            if let Err(e) =
                engine::remove_image(&self.config.engine, &self.image, self.timeout(), &cancel)
            {
                log::warn!("could not remove image {}: {e}", self.image);
            }
        }

        Ok(outputs)
    }

    fn timeout(&self) -> Option<Duration> {
        (self.config.timeout > 0).then(|| Duration::from_secs(self.config.timeout))
    }

    /// Final `run` argument vector (everything after the subcommand):
    /// runtime args, auto flags unless user-specified, image, app args.
    fn run_vector(&self, args: RunArgs) -> Vec<String> {
        let mut v = args.runtime;
        if self.auto_remove_container && !v.iter().any(|a| a == "--rm") {
            v.push("--rm".to_string());
        }
        if let Some(gpus) = &self.gpus
            && !v.iter().any(|a| a == "--gpus")
        {
            v.push("--gpus".to_string());
            v.push(gpus.clone());
        }
        if self.run_as_user && !v.iter().any(|a| a == "--user") {
            v.extend(engine::user_args());
        }
        v.push(self.image.clone());
        v.extend(args.app);
        v
    }

    fn push_save(&mut self, entry: SaveEntry<C::Data>) -> Result<()> {
        if self.saves.iter().any(|e| e.arg == entry.arg) {
            return Err(Error::Configuration(format!(
                "input argument `{}` is already registered",
                entry.arg
            )));
        }
        self.saves.push(entry);
        Ok(())
    }

    fn push_load(&mut self, entry: LoadEntry) -> Result<()> {
        if self.loads.iter().any(|e| e.arg == entry.arg) {
            return Err(Error::Configuration(format!(
                "output argument `{}` is already registered",
                entry.arg
            )));
        }
        self.loads.push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RawBytes, RawCodec};

    fn task() -> ContainerTask<'static, RawCodec> {
        static CODEC: RawCodec = RawCodec;
        ContainerTask::new("acme/tool:1", &CODEC).unwrap()
    }

    #[test]
    fn duplicate_input_flag_is_rejected() {
        let mut t = task();
        t.save_input(RawBytes::new(vec![1]), "--input", "a", ".nrrd")
            .unwrap();
        let err = t
            .save_input(RawBytes::new(vec![2]), "--input", "b", ".nrrd")
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn duplicate_output_flag_is_rejected() {
        let mut t = task();
        t.load_output("--preview", "out.png").unwrap();
        let err = t.resolve_output("--preview", "other.png").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn same_flag_may_name_an_input_and_an_output() {
        // The two collections are keyed independently, as in tools that
        // reuse a flag across directions.
        let mut t = task();
        t.save_input(RawBytes::new(vec![1]), "-d", "a", ".nrrd")
            .unwrap();
        t.load_output("-d", "out.png").unwrap();
    }

    #[test]
    fn malformed_registration_fails_before_any_run() {
        let mut t = task();
        assert!(
            t.save_input(RawBytes::new(vec![1]), "--input", "a.nrrd", ".nrrd")
                .is_err()
        );
        assert!(t.save_input_set(vec![], "--masks", "no_folder_{}", ".nii").is_err());
    }

    #[test]
    fn output_path_resolves_under_the_working_directory() {
        let mut t = task();
        t.resolve_output_flag("--stats", "stats.json").unwrap();
        assert_eq!(
            t.output_path("--stats").unwrap(),
            t.working_dir().join("stats.json")
        );
        assert!(t.output_path("--unknown").is_none());
    }

    #[test]
    fn input_path_is_unresolved_until_staging() {
        let mut t = task();
        t.save_input_later(RawBytes::new(vec![1]), "--csv", "table", ".csv")
            .unwrap();
        assert!(t.input_path("--csv").is_none());
        t.assemble_args().unwrap();
        assert_eq!(
            t.input_path("--csv").unwrap(),
            t.working_dir().join("table.csv")
        );
    }

    #[test]
    fn run_vector_appends_auto_flags_once() {
        let mut t = task();
        t.auto_remove_container(true);
        t.use_gpus("device=0");

        let args = t.assemble_args().unwrap();
        let v = t.run_vector(args);

        assert_eq!(v.iter().filter(|a| *a == "--rm").count(), 1);
        let gpus_at = v.iter().position(|a| a == "--gpus").unwrap();
        assert_eq!(v[gpus_at + 1], "device=0");
        // Image comes after every runtime flag, before app args.
        let image_at = v.iter().position(|a| a == "acme/tool:1").unwrap();
        assert!(image_at > gpus_at);
    }

    #[test]
    fn user_specified_flags_suppress_auto_flags() {
        let mut t = task();
        t.auto_remove_container(true);
        t.use_gpus("all");
        t.add_run_arg("--rm");
        t.add_run_arg_value("--gpus", "device=1");

        let args = t.assemble_args().unwrap();
        let v = t.run_vector(args);

        assert_eq!(v.iter().filter(|a| *a == "--rm").count(), 1);
        assert_eq!(v.iter().filter(|a| *a == "--gpus").count(), 1);
        let gpus_at = v.iter().position(|a| a == "--gpus").unwrap();
        assert_eq!(v[gpus_at + 1], "device=1");
    }

    #[test]
    fn extra_args_from_config_are_applied() {
        let codec = RawCodec;
        let cfg = Config {
            extra_run_args: "--ipc=host".into(),
            ..Config::default()
        };
        let mut t = ContainerTask::with_config("acme/tool:1", &codec, cfg).unwrap();
        let args = t.assemble_args().unwrap();
        assert!(args.runtime.contains(&"--ipc=host".to_string()));
    }

    #[test]
    fn malformed_config_extra_args_fail_at_construction() {
        let codec = RawCodec;
        let cfg = Config {
            extra_run_args: "--label \"broken".into(),
            ..Config::default()
        };
        match ContainerTask::with_config("acme/tool:1", &codec, cfg) {
            Err(Error::Configuration(_)) => {}
            other => panic!("expected Configuration error, got {:?}", other.map(|_| ())),
        }
    }
}
