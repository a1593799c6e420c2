use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use log::{info, warn};

use crate::RevMixError;

/// Worker count used to produce the reference mixtures.
///
/// The external tool's output ordering and random-seed consumption depend on
/// its parallelism degree, so a run is only guaranteed to reproduce the
/// reference dataset when it requests exactly this many workers.
pub const REFERENCE_WORKERS: usize = 8;

/// Program invoked when no explicit tool path is configured.
pub const DEFAULT_TOOL: &str = "reverberate-data";

/// Default file name of the mix-info manifest, relative to the output directory.
pub const DEFAULT_MIX_INFO: &str = "mix_info.tsv";

/// Default file name of the source-list manifest, relative to the output directory.
pub const DEFAULT_SOURCE_LIST: &str = "src_list.tsv";

/// Default file name of the RIR-list manifest, relative to the output directory.
pub const DEFAULT_RIR_LIST: &str = "rir_list.tsv";

/// Named subset of the room impulse response collection applied to a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RirSubset {
    Train,
    Validation,
    Eval,
}

impl RirSubset {
    /// All recognised subsets, in the order they are usually generated.
    pub const ALL: [RirSubset; 3] = [RirSubset::Train, RirSubset::Validation, RirSubset::Eval];

    /// The lowercase name passed on the external tool's command line.
    pub fn as_str(self) -> &'static str {
        match self {
            RirSubset::Train => "train",
            RirSubset::Validation => "validation",
            RirSubset::Eval => "eval",
        }
    }
}

impl fmt::Display for RirSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RirSubset {
    type Err = RevMixError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "train" => Ok(RirSubset::Train),
            "validation" => Ok(RirSubset::Validation),
            "eval" => Ok(RirSubset::Eval),
            other => Err(RevMixError::UnknownSubset(other.to_owned())),
        }
    }
}

/// Configuration for one invocation of the external reverberation tool.
#[derive(Clone, Debug)]
pub struct ReverbConfig {
    /// Canonicalized directory holding the dry source audio.
    pub audio_dir: PathBuf,
    /// Canonicalized directory holding the room impulse responses.
    pub rir_dir: PathBuf,
    /// Impulse response subset applied to this run.
    pub subset: RirSubset,
    /// Directory the reverberated mixtures are written to; created by [`run`].
    pub output_dir: PathBuf,
    /// Manifest recording which source and RIR produced each mixture.
    pub mix_info: PathBuf,
    /// Manifest listing the source audio consumed by the run.
    pub source_list: PathBuf,
    /// Manifest listing the impulse responses consumed by the run.
    pub rir_list: PathBuf,
    /// Worker processes requested from the tool.
    pub workers: usize,
    /// The external program to invoke.
    pub program: PathBuf,
}

impl ReverbConfig {
    /// Start building a configuration from the three mandatory directories.
    pub fn builder<P, Q, R>(audio_dir: P, rir_dir: Q, output_dir: R) -> ReverbConfigBuilder
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        ReverbConfigBuilder {
            audio_dir: audio_dir.as_ref().to_path_buf(),
            rir_dir: rir_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            subset: RirSubset::Train,
            mix_info: None,
            source_list: None,
            rir_list: None,
            workers: REFERENCE_WORKERS,
            program: PathBuf::from(DEFAULT_TOOL),
        }
    }

    /// The exact argument vector handed to the external tool.
    ///
    /// The flag order is fixed so that an invocation is a pure function of the
    /// configuration.
    pub fn command_args(&self) -> Vec<OsString> {
        let mut args = Vec::with_capacity(16);
        let mut push = |flag: &str, value: OsString| {
            args.push(OsString::from(flag));
            args.push(value);
        };

        push("--input_dir", self.audio_dir.as_os_str().to_owned());
        push("--rir_dir", self.rir_dir.as_os_str().to_owned());
        push("--rir_subset", OsString::from(self.subset.as_str()));
        push("--output_dir", self.output_dir.as_os_str().to_owned());
        push("--mix_info_file", self.mix_info.as_os_str().to_owned());
        push("--src_list_file", self.source_list.as_os_str().to_owned());
        push("--rir_list_file", self.rir_list.as_os_str().to_owned());
        push("--nproc", OsString::from(self.workers.to_string()));

        args
    }

    /// A ready-to-spawn [`Command`] for this configuration.
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.command_args());
        command
    }

    /// Single-line rendering of the invocation, for dry runs and logs.
    pub fn render(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in self.command_args() {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Builder for [`ReverbConfig`]; validation happens in [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct ReverbConfigBuilder {
    audio_dir: PathBuf,
    rir_dir: PathBuf,
    output_dir: PathBuf,
    subset: RirSubset,
    mix_info: Option<PathBuf>,
    source_list: Option<PathBuf>,
    rir_list: Option<PathBuf>,
    workers: usize,
    program: PathBuf,
}

impl ReverbConfigBuilder {
    pub fn subset(mut self, subset: RirSubset) -> Self {
        self.subset = subset;
        self
    }

    pub fn mix_info<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.mix_info = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn source_list<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source_list = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn rir_list<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.rir_list = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn program<P: AsRef<Path>>(mut self, program: P) -> Self {
        self.program = program.as_ref().to_path_buf();
        self
    }

    /// Validate the inputs and produce a [`ReverbConfig`].
    ///
    /// The audio and RIR directories must already exist and are canonicalized;
    /// the output paths are left untouched so that building a configuration
    /// has no side effects.
    pub fn build(self) -> Result<ReverbConfig, RevMixError> {
        if self.workers == 0 {
            return Err(RevMixError::InvalidWorkerCount);
        }

        let audio_dir = canonical_dir(&self.audio_dir)
            .ok_or_else(|| RevMixError::MissingAudioDir(self.audio_dir.clone()))?;
        let rir_dir = canonical_dir(&self.rir_dir)
            .ok_or_else(|| RevMixError::MissingRirDir(self.rir_dir.clone()))?;

        let mix_info = self
            .mix_info
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_MIX_INFO));
        let source_list = self
            .source_list
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_SOURCE_LIST));
        let rir_list = self
            .rir_list
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_RIR_LIST));

        Ok(ReverbConfig {
            audio_dir,
            rir_dir,
            subset: self.subset,
            output_dir: self.output_dir,
            mix_info,
            source_list,
            rir_list,
            workers: self.workers,
            program: self.program,
        })
    }
}

fn canonical_dir(path: &Path) -> Option<PathBuf> {
    fs::canonicalize(path).ok().filter(|p| p.is_dir())
}

/// Run the external reverberation tool described by `config`.
///
/// Creates the output directory and the manifest parent directories, then
/// spawns the tool with inherited stdio and blocks until it exits. There is
/// no retry or recovery: a launch failure or a non-zero exit status is
/// reported as-is through the returned error.
pub fn run(config: &ReverbConfig) -> Result<(), RevMixError> {
    if config.workers != REFERENCE_WORKERS {
        warn!(
            "requested {} worker(s) instead of the reference {}; \
             generated mixtures may not match the reference dataset",
            config.workers, REFERENCE_WORKERS
        );
    }

    fs::create_dir_all(&config.output_dir)?;
    for manifest in [&config.mix_info, &config.source_list, &config.rir_list] {
        if let Some(parent) = manifest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
    }

    info!("invoking {}", config.render());

    let program = config.program.display().to_string();
    let status = config
        .command()
        .status()
        .map_err(|source| RevMixError::ToolLaunch {
            program: program.clone(),
            source,
        })?;

    if !status.success() {
        return Err(RevMixError::ToolFailed { program, status });
    }

    info!("'{program}' finished successfully");
    Ok(())
}
